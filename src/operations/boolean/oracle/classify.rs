use crate::error::{BopError, Result};
use crate::geometry::curve::Line;
use crate::geometry::Surface;
use crate::math::{Point2, Point3, Vector3};
use crate::operations::query::{face_box, Aabb, FaceLoops};
use crate::topology::{EdgeCurve, FaceSurface, SolidId, TopologyStore, TrimmedCurve};

use super::{CurveSurfaceHit, GeometryOracle};
use crate::operations::boolean::ds::State;

/// Rays used for parity counting, away from the coordinate axes.
const RAY_DIRECTIONS: [[f64; 3]; 6] = [
    [0.577_350, 0.617_213, 0.534_522],
    [-0.707_107, 0.301_511, 0.639_602],
    [0.267_261, -0.801_784, 0.534_522],
    [0.801_784, 0.110_432, -0.587_427],
    [-0.301_511, -0.503_871, -0.809_427],
    [0.136_083, 0.952_579, -0.272_166],
];

pub(super) fn point_on_face(
    point: &Point3,
    surface: &FaceSurface,
    loops: &FaceLoops,
    tol: f64,
) -> Result<State> {
    if loops.boundary_distance(point)? <= tol {
        return Ok(State::On);
    }
    let (u, v) = surface.inverse(point);
    Ok(if loops.contains_uv(&Point2::new(u, v)) {
        State::In
    } else {
        State::Out
    })
}

struct ClassifierFace {
    surface: FaceSurface,
    loops: FaceLoops,
}

struct ClassifierSolid {
    faces: Vec<ClassifierFace>,
    bbox: Aabb,
}

enum RayCastResult {
    Clear(State),
    Degenerate,
}

/// Point-in-solid classification against a fixed set of solids.
///
/// Casts rays from the point and counts face crossings: odd means inside.
/// Rays grazing a face, running along it or hitting a face boundary are
/// retried in another direction.
pub struct SolidClassifier {
    solids: Vec<ClassifierSolid>,
}

impl SolidClassifier {
    /// Prepares the faces of every shell of `solids`.
    ///
    /// # Errors
    ///
    /// Returns an error if the topology of a solid cannot be read.
    pub fn new(store: &TopologyStore, solids: &[SolidId]) -> Result<Self> {
        let mut out = Vec::with_capacity(solids.len());
        for &solid in solids {
            let mut faces = Vec::new();
            let mut bbox = Aabb::empty();
            for face in store.faces_of(solid.into())? {
                bbox.add_box(&face_box(store, face)?);
                faces.push(ClassifierFace {
                    surface: store.face(face)?.surface.clone(),
                    loops: FaceLoops::new(store, face)?,
                });
            }
            out.push(ClassifierSolid { faces, bbox });
        }
        Ok(Self { solids: out })
    }

    /// Returns `true` if there is nothing to classify against.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.solids.is_empty()
    }

    /// Classifies `point`: `In` if it lies inside any solid, `On` if it
    /// lies on a boundary and inside none.
    ///
    /// # Errors
    ///
    /// Returns [`BopError::NoClassification`] if every ray is degenerate.
    pub fn classify(&self, oracle: &dyn GeometryOracle, point: &Point3, tol: f64) -> Result<State> {
        let mut on = false;
        for solid in &self.solids {
            match classify_in_solid(oracle, solid, point, tol)? {
                State::In => return Ok(State::In),
                State::On => on = true,
                State::Out => {}
            }
        }
        Ok(if on { State::On } else { State::Out })
    }
}

fn classify_in_solid(
    oracle: &dyn GeometryOracle,
    solid: &ClassifierSolid,
    point: &Point3,
    tol: f64,
) -> Result<State> {
    if !solid.bbox.enlarged(tol).contains_point(point) {
        return Ok(State::Out);
    }
    let center = nalgebra::center(&solid.bbox.min, &solid.bbox.max);
    let length = 2.0 * (solid.bbox.diagonal() + (point - center).norm()) + 1.0;
    for dir in RAY_DIRECTIONS {
        let dir = Vector3::new(dir[0], dir[1], dir[2]).normalize();
        if let RayCastResult::Clear(state) = ray_cast(oracle, solid, point, &dir, length, tol)? {
            return Ok(state);
        }
    }
    Err(BopError::NoClassification(format!("point ({}, {}, {})", point.x, point.y, point.z)).into())
}

fn ray_cast(
    oracle: &dyn GeometryOracle,
    solid: &ClassifierSolid,
    point: &Point3,
    dir: &Vector3,
    length: f64,
    tol: f64,
) -> Result<RayCastResult> {
    let ray = TrimmedCurve::new(EdgeCurve::Line(Line::new(*point, *dir)?), 0.0, length);
    let boundary_tol = tol.max(1e-9);
    let mut crossings = 0u32;
    for face in &solid.faces {
        for hit in oracle.curve_surface(&ray, &face.surface, boundary_tol)? {
            let CurveSurfaceHit::Point { t, uv, point: hit_point } = hit else {
                // Ray lies in the surface.
                if point_on_face(point, &face.surface, &face.loops, boundary_tol)? != State::Out {
                    return Ok(RayCastResult::Clear(State::On));
                }
                return Ok(RayCastResult::Degenerate);
            };
            let state = point_on_face(&hit_point, &face.surface, &face.loops, boundary_tol)?;
            if t <= boundary_tol {
                if state != State::Out {
                    return Ok(RayCastResult::Clear(State::On));
                }
                continue;
            }
            match state {
                State::Out => {}
                State::On => return Ok(RayCastResult::Degenerate),
                State::In => {
                    let normal = face.surface.normal(uv.x, uv.y)?;
                    if normal.dot(dir).abs() < 1e-6 {
                        return Ok(RayCastResult::Degenerate);
                    }
                    crossings += 1;
                }
            }
        }
    }
    Ok(RayCastResult::Clear(if crossings % 2 == 1 {
        State::In
    } else {
        State::Out
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::boolean::oracle::AnalyticOracle;
    use crate::operations::creation::{MakeBox, MakeCylinder, MakeSphere};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn box_classifier(store: &mut TopologyStore) -> SolidClassifier {
        let solid = MakeBox::new(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0)).execute(store).unwrap();
        SolidClassifier::new(store, &[solid]).unwrap()
    }

    #[test]
    fn center_is_inside() {
        let mut store = TopologyStore::new();
        let c = box_classifier(&mut store);
        assert_eq!(c.classify(&AnalyticOracle, &p(1.0, 1.0, 1.0), 1e-7).unwrap(), State::In);
    }

    #[test]
    fn far_point_is_outside() {
        let mut store = TopologyStore::new();
        let c = box_classifier(&mut store);
        assert_eq!(c.classify(&AnalyticOracle, &p(10.0, 10.0, 10.0), 1e-7).unwrap(), State::Out);
        assert_eq!(c.classify(&AnalyticOracle, &p(1.0, 1.0, -1.0), 1e-7).unwrap(), State::Out);
    }

    #[test]
    fn point_on_face_is_on() {
        let mut store = TopologyStore::new();
        let c = box_classifier(&mut store);
        assert_eq!(c.classify(&AnalyticOracle, &p(1.0, 1.0, 0.0), 1e-7).unwrap(), State::On);
    }

    #[test]
    fn point_just_inside() {
        let mut store = TopologyStore::new();
        let c = box_classifier(&mut store);
        assert_eq!(c.classify(&AnalyticOracle, &p(0.001, 0.001, 0.001), 1e-7).unwrap(), State::In);
    }

    #[test]
    fn curved_solids() {
        let mut store = TopologyStore::new();
        let cyl = MakeCylinder::new(p(0.0, 0.0, 0.0), 1.0, Vector3::z(), 2.0)
            .execute(&mut store)
            .unwrap();
        let sphere = MakeSphere::new(p(5.0, 0.0, 0.0), 1.0).execute(&mut store).unwrap();
        let c = SolidClassifier::new(&store, &[cyl, sphere]).unwrap();
        assert_eq!(c.classify(&AnalyticOracle, &p(0.2, 0.3, 1.0), 1e-7).unwrap(), State::In);
        assert_eq!(c.classify(&AnalyticOracle, &p(0.9, 0.9, 1.0), 1e-7).unwrap(), State::Out);
        assert_eq!(c.classify(&AnalyticOracle, &p(5.3, 0.2, -0.4), 1e-7).unwrap(), State::In);
        assert_eq!(c.classify(&AnalyticOracle, &p(6.0, 0.0, 0.0), 1e-7).unwrap(), State::On);
    }
}
