use std::f64::consts::TAU;

use crate::error::{OperationError, Result};
use crate::geometry::curve::{Circle, Line};
use crate::geometry::surface::{Cylinder, Plane};
use crate::math::{perpendicular, Point3, Vector3, TOLERANCE};
use crate::topology::{
    EdgeCurve, EdgeData, FaceData, FaceSurface, OrientedEdge, SolidId, TopologyStore, VertexData,
    WireData,
};

use super::make_solid::solid_from_faces;

/// Creates a cylinder solid from base center, radius, axis and height.
///
/// The solid has three faces: the lateral face, closed by a seam line at
/// `u = 0`, and two planar disks. Each boundary circle starts and ends on
/// the seam.
pub struct MakeCylinder {
    center: Point3,
    radius: f64,
    axis: Vector3,
    height: f64,
}

impl MakeCylinder {
    /// Creates a new `MakeCylinder` operation.
    #[must_use]
    pub fn new(center: Point3, radius: f64, axis: Vector3, height: f64) -> Self {
        Self {
            center,
            radius,
            axis,
            height,
        }
    }

    /// Executes the operation, creating the cylinder in the topology store.
    ///
    /// A negative height extends the cylinder below `center`.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius or height is near zero, or the axis
    /// direction is degenerate.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<SolidId> {
        if self.radius < TOLERANCE {
            return Err(
                OperationError::InvalidInput("cylinder radius must be positive".into()).into(),
            );
        }
        if self.height.abs() < TOLERANCE {
            return Err(
                OperationError::InvalidInput("cylinder height must be non-zero".into()).into(),
            );
        }
        let axis_len = self.axis.norm();
        if axis_len < TOLERANCE {
            return Err(
                OperationError::InvalidInput("cylinder axis must be non-zero".into()).into(),
            );
        }
        let axis = self.axis / axis_len;
        let (base, h) = if self.height > 0.0 {
            (self.center, self.height)
        } else {
            (self.center + axis * self.height, -self.height)
        };
        let r = self.radius;
        let ref_dir = perpendicular(&axis);
        let binormal = axis.cross(&ref_dir);
        let top = base + axis * h;

        let v_bottom = store.add_vertex(VertexData::new(base + ref_dir * r));
        let v_top = store.add_vertex(VertexData::new(top + ref_dir * r));

        let bottom_circle = Circle::new(base, r, axis, ref_dir)?;
        let top_circle = Circle::new(top, r, axis, ref_dir)?;
        let seam = Line::new(base + ref_dir * r, axis)?;

        let e_bottom = store.add_edge(EdgeData::new(
            v_bottom,
            v_bottom,
            EdgeCurve::Circle(bottom_circle),
            0.0,
            TAU,
        ));
        let e_top = store.add_edge(EdgeData::new(
            v_top,
            v_top,
            EdgeCurve::Circle(top_circle),
            0.0,
            TAU,
        ));
        let e_seam = store.add_edge(EdgeData::new(v_bottom, v_top, EdgeCurve::Line(seam), 0.0, h));

        let lateral_wire = store.add_wire(WireData {
            edges: vec![
                OrientedEdge::new(e_bottom, true),
                OrientedEdge::new(e_seam, true),
                OrientedEdge::new(e_top, false),
                OrientedEdge::new(e_seam, false),
            ],
            is_closed: true,
        });
        let lateral = store.add_face(FaceData::new(
            FaceSurface::Cylinder(Cylinder::new(base, r, axis, ref_dir)?),
            lateral_wire,
            vec![],
            true,
        ));

        let bottom_wire = store.add_wire(WireData {
            edges: vec![OrientedEdge::new(e_bottom, false)],
            is_closed: true,
        });
        let bottom = store.add_face(FaceData::new(
            FaceSurface::Plane(Plane::new(base, ref_dir, -binormal)?),
            bottom_wire,
            vec![],
            true,
        ));

        let top_wire = store.add_wire(WireData {
            edges: vec![OrientedEdge::new(e_top, true)],
            is_closed: true,
        });
        let top_face = store.add_face(FaceData::new(
            FaceSurface::Plane(Plane::new(top, ref_dir, binormal)?),
            top_wire,
            vec![],
            true,
        ));

        Ok(solid_from_faces(store, vec![lateral, bottom, top_face]))
    }
}
