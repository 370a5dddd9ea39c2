//! End-to-end Boolean runs on primitive solids.

#![allow(clippy::unwrap_used)]

use approx::assert_abs_diff_eq;

use geolis_bop::math::{Point3, Vector3};
use geolis_bop::operations::boolean::{
    BooleanOperation, BooleanOptions, Common, Cut, Fuse, Operation, Section, Warning,
};
use geolis_bop::operations::creation::{MakeBox, MakeCylinder, MakeFace, MakeSphere, MakeWire};
use geolis_bop::operations::query::{IsValid, Length, Volume};
use geolis_bop::topology::{EdgeCurve, Shape, SolidId, TopologyStore};
use tracing_subscriber::EnvFilter;

/// Routes the crate's spans to the test output, filtered by `RUST_LOG`.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn unit_cube(store: &mut TopologyStore, x: f64, y: f64, z: f64) -> SolidId {
    MakeBox::new(Point3::new(x, y, z), Point3::new(x + 1.0, y + 1.0, z + 1.0))
        .execute(store)
        .unwrap()
}

fn volume(store: &TopologyStore, shape: Shape) -> f64 {
    Volume::new(shape).execute(store).unwrap()
}

#[test]
fn overlapping_cubes_fuse_into_one_closed_solid() {
    init_logging();
    let mut store = TopologyStore::new();
    let a = unit_cube(&mut store, 0.0, 0.0, 0.0);
    let b = unit_cube(&mut store, 0.5, 0.5, 0.5);
    let result = Fuse::new(a, b).execute(&mut store).unwrap();
    let shape = result.shape.unwrap();
    assert!(matches!(shape, Shape::Solid(_)));
    assert!(IsValid::new(shape).execute(&store));
    assert_eq!(store.faces_of(shape).unwrap().len(), 12);
    assert_abs_diff_eq!(volume(&store, shape), 1.875, epsilon = 1e-9);
    assert!(!result.report.has_warnings());
}

#[test]
fn overlapping_cubes_common_and_cut() {
    let mut store = TopologyStore::new();
    let a = unit_cube(&mut store, 0.0, 0.0, 0.0);
    let b = unit_cube(&mut store, 0.5, 0.5, 0.5);

    let common = Common::new(a, b).execute(&mut store).unwrap().shape.unwrap();
    assert_eq!(store.faces_of(common).unwrap().len(), 6);
    assert_abs_diff_eq!(volume(&store, common), 0.125, epsilon = 1e-9);

    let cut = Cut::new(a, b).execute(&mut store).unwrap().shape.unwrap();
    assert!(IsValid::new(cut).execute(&store));
    assert_abs_diff_eq!(volume(&store, cut), 0.875, epsilon = 1e-9);
}

#[test]
fn touching_cubes_have_no_common_part() {
    let mut store = TopologyStore::new();
    let a = unit_cube(&mut store, 0.0, 0.0, 0.0);
    let b = unit_cube(&mut store, 1.0, 0.0, 0.0);
    let result = Common::new(a, b).execute(&mut store).unwrap();
    assert!(result.shape.is_none());
    assert!(result.report.contains(|w| *w == Warning::EmptyResult));
}

#[test]
fn touching_cubes_fuse() {
    let mut store = TopologyStore::new();
    let a = unit_cube(&mut store, 0.0, 0.0, 0.0);
    let b = unit_cube(&mut store, 1.0, 0.0, 0.0);
    let fused = Fuse::new(a, b).execute(&mut store).unwrap().shape.unwrap();
    assert!(IsValid::new(fused).execute(&store));
    assert_eq!(store.faces_of(fused).unwrap().len(), 10);
    assert_abs_diff_eq!(volume(&store, fused), 2.0, epsilon = 1e-9);

    let unified = Fuse::new(a, b)
        .with_options(BooleanOptions::default().with_unify_faces(true))
        .execute(&mut store)
        .unwrap()
        .shape
        .unwrap();
    assert!(IsValid::new(unified).execute(&store));
    assert_eq!(store.faces_of(unified).unwrap().len(), 6);
    assert_abs_diff_eq!(volume(&store, unified), 2.0, epsilon = 1e-9);
}

#[test]
fn cylinder_inside_a_box_is_cut_away() {
    let mut store = TopologyStore::new();
    let cylinder = MakeCylinder::new(Point3::origin(), 5.0, Vector3::z(), 80.0)
        .execute(&mut store)
        .unwrap();
    let block = MakeBox::new(Point3::new(-10.0, -10.0, -10.0), Point3::new(10.0, 10.0, 90.0))
        .execute(&mut store)
        .unwrap();
    let result = Cut::new(cylinder, block).execute(&mut store).unwrap();
    assert!(result.shape.is_none());
    assert!(result.report.contains(|w| *w == Warning::EmptyResult));
}

#[test]
fn drilled_plate_loses_the_cylinder_volume() {
    init_logging();
    let mut store = TopologyStore::new();
    let plate = MakeBox::new(Point3::new(-2.0, -2.0, 0.0), Point3::new(2.0, 2.0, 1.0))
        .execute(&mut store)
        .unwrap();
    let drill = MakeCylinder::new(Point3::new(0.0, 0.0, -1.0), 0.5, Vector3::z(), 3.0)
        .execute(&mut store)
        .unwrap();
    let result = Cut::new(plate, drill).execute(&mut store).unwrap();
    let shape = result.shape.unwrap();
    assert!(IsValid::new(shape).execute(&store));
    let expected = 16.0 - std::f64::consts::PI * 0.25;
    assert_abs_diff_eq!(volume(&store, shape), expected, epsilon = 1e-2);
}

#[test]
fn sphere_section_with_a_plane_face_is_a_circle() {
    let mut store = TopologyStore::new();
    let sphere = MakeSphere::new(Point3::origin(), 1.0).execute(&mut store).unwrap();
    let square = MakeWire::new(
        vec![
            Point3::new(-2.0, -2.0, 0.0),
            Point3::new(2.0, -2.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(-2.0, 2.0, 0.0),
        ],
        true,
    )
    .execute(&mut store)
    .unwrap();
    let face = MakeFace::new(square, vec![]).execute(&mut store).unwrap();

    let result = Section::new(sphere, face).execute(&mut store).unwrap();
    let Some(Shape::Compound(section)) = result.shape else {
        panic!("expected a compound section");
    };
    let edges: Vec<_> = store
        .compound(section)
        .unwrap()
        .shapes
        .iter()
        .filter_map(|s| match s {
            Shape::Edge(e) => Some(*e),
            _ => None,
        })
        .collect();
    assert!(!edges.is_empty());
    let mut total = 0.0;
    let mut vertices = std::collections::BTreeSet::new();
    for &e in &edges {
        let data = store.edge(e).unwrap();
        let EdgeCurve::Circle(circle) = &data.curve else {
            panic!("section edge is not circular");
        };
        assert_abs_diff_eq!(circle.radius(), 1.0, epsilon = 1e-9);
        vertices.insert(data.start);
        vertices.insert(data.end);
        total += Length::new(e).execute(&store).unwrap();
    }
    assert_abs_diff_eq!(total, std::f64::consts::TAU, epsilon = 1e-6);
    // Only the seam of the sphere crosses the circle.
    assert_eq!(vertices.len(), 1);
}

#[test]
fn common_of_a_fuse_with_its_object_gives_the_object_back() {
    let mut store = TopologyStore::new();
    let a = unit_cube(&mut store, 0.0, 0.0, 0.0);
    let b = unit_cube(&mut store, 0.5, 0.5, 0.5);
    let fused = Fuse::new(a, b).execute(&mut store).unwrap().shape.unwrap();
    let back = Common::new(fused, a).execute(&mut store).unwrap().shape.unwrap();
    assert!(IsValid::new(back).execute(&store));
    assert_abs_diff_eq!(volume(&store, back), 1.0, epsilon = 1e-9);
}

#[test]
fn cut_reversed_subtracts_the_objects_from_the_tools() {
    let mut store = TopologyStore::new();
    let a = unit_cube(&mut store, 0.0, 0.0, 0.0);
    let b = MakeBox::new(Point3::new(0.5, 0.0, 0.0), Point3::new(3.0, 1.0, 1.0))
        .execute(&mut store)
        .unwrap();
    let result = BooleanOperation::new(Operation::CutReversed, vec![a.into()], vec![b.into()])
        .execute(&mut store)
        .unwrap();
    assert_abs_diff_eq!(volume(&store, result.shape.unwrap()), 2.0, epsilon = 1e-9);
}

#[test]
fn parallel_and_sequential_runs_agree() {
    let mut store = TopologyStore::new();
    let a = unit_cube(&mut store, 0.0, 0.0, 0.0);
    let b = unit_cube(&mut store, 0.25, 0.5, -0.5);
    let seq = Fuse::new(a, b).execute(&mut store).unwrap().shape.unwrap();
    let par = Fuse::new(a, b)
        .with_options(BooleanOptions::default().with_parallel(true))
        .execute(&mut store)
        .unwrap()
        .shape
        .unwrap();
    assert_eq!(store.faces_of(seq).unwrap().len(), store.faces_of(par).unwrap().len());
    assert_abs_diff_eq!(volume(&store, seq), volume(&store, par), epsilon = 1e-12);
}

fn vertex_tolerances(store: &TopologyStore, solid: SolidId) -> Vec<f64> {
    let mut out = Vec::new();
    for face in store.faces_of(solid.into()).unwrap() {
        for oe in store.face_edges(face).unwrap() {
            let start = store.edge(oe.edge).unwrap().start;
            out.push(store.vertex(start).unwrap().tolerance);
        }
    }
    out
}

#[test]
fn destructive_mode_builds_the_same_result() {
    init_logging();
    let mut store = TopologyStore::new();
    let a = unit_cube(&mut store, 0.0, 0.0, 0.0);
    let b = unit_cube(&mut store, 0.5, 0.5, 0.5);
    let before = vertex_tolerances(&store, a);
    let fused = Fuse::new(a, b)
        .with_options(BooleanOptions::default().with_non_destructive(false))
        .execute(&mut store)
        .unwrap()
        .shape
        .unwrap();
    assert!(IsValid::new(fused).execute(&store));
    assert_abs_diff_eq!(volume(&store, fused), 1.875, epsilon = 1e-9);
    // Exact boxes never grow a tolerance, so nothing is written back.
    assert_eq!(before, vertex_tolerances(&store, a));
}
