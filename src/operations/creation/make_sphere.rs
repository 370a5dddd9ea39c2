use std::f64::consts::FRAC_PI_2;

use crate::error::{OperationError, Result};
use crate::geometry::curve::{Circle, Line};
use crate::geometry::surface::Sphere;
use crate::math::{perpendicular, Point3, Vector3, TOLERANCE};
use crate::topology::{
    EdgeCurve, EdgeData, FaceData, FaceSurface, OrientedEdge, SolidId, TopologyStore, VertexData,
    WireData,
};

use super::make_solid::solid_from_faces;

/// Creates a sphere solid from center and radius.
///
/// The single spherical face is bounded by a meridian seam at `u = 0` and
/// two degenerate edges at the poles.
pub struct MakeSphere {
    center: Point3,
    radius: f64,
    axis: Vector3,
}

impl MakeSphere {
    /// Creates a new `MakeSphere` operation with its axis along `+Z`.
    #[must_use]
    pub fn new(center: Point3, radius: f64) -> Self {
        Self {
            center,
            radius,
            axis: Vector3::z(),
        }
    }

    /// Sets the polar axis.
    #[must_use]
    pub fn with_axis(mut self, axis: Vector3) -> Self {
        self.axis = axis;
        self
    }

    /// Executes the operation, creating the sphere in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is near zero or the axis is degenerate.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<SolidId> {
        if self.radius < TOLERANCE {
            return Err(
                OperationError::InvalidInput("sphere radius must be positive".into()).into(),
            );
        }
        let axis_len = self.axis.norm();
        if axis_len < TOLERANCE {
            return Err(OperationError::InvalidInput("sphere axis must be non-zero".into()).into());
        }
        let axis = self.axis / axis_len;
        let ref_dir = if axis == Vector3::z() {
            Vector3::x()
        } else {
            perpendicular(&axis)
        };
        let r = self.radius;
        let c = self.center;

        let south = c - axis * r;
        let north = c + axis * r;
        let v_south = store.add_vertex(VertexData::new(south));
        let v_north = store.add_vertex(VertexData::new(north));

        // P(t) = c + r*cos(t)*ref_dir + r*sin(t)*axis runs from pole to pole at u = 0.
        let meridian = Circle::new(c, r, ref_dir.cross(&axis), ref_dir)?;
        let e_seam = store.add_edge(EdgeData::new(
            v_south,
            v_north,
            EdgeCurve::Circle(meridian),
            -FRAC_PI_2,
            FRAC_PI_2,
        ));
        let binormal = axis.cross(&ref_dir);
        let e_south = store.add_edge(EdgeData::degenerated(
            v_south,
            EdgeCurve::Line(Line::new(south, binormal)?),
        ));
        let e_north = store.add_edge(EdgeData::degenerated(
            v_north,
            EdgeCurve::Line(Line::new(north, binormal)?),
        ));

        let wire = store.add_wire(WireData {
            edges: vec![
                OrientedEdge::new(e_south, true),
                OrientedEdge::new(e_seam, true),
                OrientedEdge::new(e_north, true),
                OrientedEdge::new(e_seam, false),
            ],
            is_closed: true,
        });
        let face = store.add_face(FaceData::new(
            FaceSurface::Sphere(Sphere::new(c, r, axis, ref_dir)?),
            wire,
            vec![],
            true,
        ));
        Ok(solid_from_faces(store, vec![face]))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::Curve;

    #[test]
    fn seam_runs_between_poles() {
        let mut store = TopologyStore::new();
        let solid = MakeSphere::new(Point3::new(1.0, 0.0, 0.0), 2.0)
            .execute(&mut store)
            .unwrap();
        let face = store.faces_of(solid.into()).unwrap()[0];
        let seam = store
            .face_edges(face)
            .unwrap()
            .into_iter()
            .map(|oe| store.edge(oe.edge).unwrap())
            .find(|e| !e.degenerate)
            .unwrap();
        let start = seam.curve.evaluate(seam.t_start).unwrap();
        let mid = seam.midpoint().unwrap();
        assert!((start - Point3::new(1.0, 0.0, -2.0)).norm() < 1e-12);
        assert!((mid - Point3::new(3.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn tilted_axis() {
        let mut store = TopologyStore::new();
        let solid = MakeSphere::new(Point3::origin(), 1.0)
            .with_axis(Vector3::x())
            .execute(&mut store)
            .unwrap();
        assert_eq!(store.faces_of(solid.into()).unwrap().len(), 1);
    }

    #[test]
    fn invalid_radius() {
        let mut store = TopologyStore::new();
        assert!(MakeSphere::new(Point3::origin(), 0.0).execute(&mut store).is_err());
    }
}
