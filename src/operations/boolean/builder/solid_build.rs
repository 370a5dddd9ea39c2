//! Assembly of the kept faces into shells and solids.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::error::Result;
use crate::math::{Point3, PRECISION_CONFUSION};
use crate::operations::creation::solid_from_faces;
use crate::operations::query::{faces_are_closed, signed_volume};
use crate::topology::{
    CompoundData, EdgeId, FaceData, FaceId, Shape, ShellData, SolidId, TopologyStore,
};

use crate::operations::boolean::ds::State;
use crate::operations::boolean::oracle::{GeometryOracle, SolidClassifier};
use crate::operations::boolean::report::{Report, Warning};

/// A copy of `face` facing the other way.
///
/// # Errors
///
/// Returns an error if the face or one of its wires is missing.
pub(super) fn flipped_face(store: &mut TopologyStore, face: FaceId) -> Result<FaceId> {
    let data = store.face(face)?.clone();
    let outer = store.wire(data.outer_wire)?.reversed();
    let outer_wire = store.add_wire(outer);
    let mut inner_wires = Vec::with_capacity(data.inner_wires.len());
    for &wire in &data.inner_wires {
        let reversed = store.wire(wire)?.reversed();
        inner_wires.push(store.add_wire(reversed));
    }
    Ok(store.add_face(FaceData {
        outer_wire,
        inner_wires,
        same_sense: !data.same_sense,
        ..data
    }))
}

/// Groups faces connected through edges shared by exactly two of them.
///
/// Edges used by more faces are where solids touch; they do not connect.
fn connected_shells(store: &TopologyStore, faces: &[FaceId]) -> Result<Vec<Vec<FaceId>>> {
    let mut by_edge: HashMap<EdgeId, Vec<usize>> = HashMap::new();
    for (i, &face) in faces.iter().enumerate() {
        for oe in store.face_edges(face)? {
            if !store.edge(oe.edge)?.degenerate {
                by_edge.entry(oe.edge).or_default().push(i);
            }
        }
    }
    let mut seen = vec![false; faces.len()];
    let mut shells = Vec::new();
    for seed in 0..faces.len() {
        if seen[seed] {
            continue;
        }
        seen[seed] = true;
        let mut shell = Vec::new();
        let mut queue = VecDeque::from([seed]);
        while let Some(i) = queue.pop_front() {
            shell.push(faces[i]);
            for oe in store.face_edges(faces[i])? {
                let Some(users) = by_edge.get(&oe.edge).filter(|u| u.len() == 2) else {
                    continue;
                };
                for &j in users {
                    if !seen[j] {
                        seen[j] = true;
                        queue.push_back(j);
                    }
                }
            }
        }
        shells.push(shell);
    }
    Ok(shells)
}

fn first_vertex(store: &TopologyStore, faces: &[FaceId]) -> Result<Option<Point3>> {
    for &face in faces {
        if let Some(oe) = store.face_edges(face)?.first() {
            let start = store.edge(oe.edge)?.start;
            return Ok(Some(store.vertex(start)?.point));
        }
    }
    Ok(None)
}

/// Builds solids from `faces`.
///
/// Closed shells enclosing a positive volume become solids; the others
/// become voids of the smallest solid around them. Open shells are
/// reported and left out.
///
/// # Errors
///
/// Returns an error if the topology cannot be read or a void cannot be
/// placed by classification.
pub(super) fn assemble_solids(
    store: &mut TopologyStore,
    oracle: &dyn GeometryOracle,
    faces: &[FaceId],
    report: &mut Report,
) -> Result<Vec<SolidId>> {
    let mut outers = Vec::new();
    let mut voids = Vec::new();
    for shell in connected_shells(store, faces)? {
        if !faces_are_closed(store, &shell)? {
            report.add(Warning::UnclosedShell { faces: shell.len() });
            continue;
        }
        let volume = signed_volume(store, &shell)?;
        if volume >= 0.0 {
            outers.push((volume, shell));
        } else if let Some(sample) = first_vertex(store, &shell)? {
            voids.push((sample, shell));
        }
    }
    outers.sort_by(|a, b| a.0.total_cmp(&b.0));
    let solids: Vec<SolidId> = outers
        .into_iter()
        .map(|(_, shell)| solid_from_faces(store, shell))
        .collect();

    for (sample, shell) in voids {
        let mut owner = None;
        for &solid in &solids {
            let classifier = SolidClassifier::new(store, &[solid])?;
            if classifier.classify(oracle, &sample, PRECISION_CONFUSION)? == State::In {
                owner = Some(solid);
                break;
            }
        }
        match owner {
            Some(solid) => {
                let void = store.add_shell(ShellData {
                    faces: shell,
                    is_closed: true,
                });
                store.solid_mut(solid)?.inner_shells.push(void);
            }
            None => debug!(faces = shell.len(), "void outside every solid dropped"),
        }
    }
    Ok(solids)
}

/// The shape standing for `solids`: nothing, the solid, or a compound.
pub(super) fn result_shape(store: &mut TopologyStore, solids: Vec<SolidId>) -> Option<Shape> {
    match solids.as_slice() {
        [] => None,
        [solid] => Some(Shape::Solid(*solid)),
        _ => Some(Shape::Compound(store.add_compound(CompoundData {
            shapes: solids.into_iter().map(Shape::Solid).collect(),
        }))),
    }
}
