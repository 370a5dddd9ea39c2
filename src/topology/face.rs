use crate::error::Result;
use crate::geometry::surface::{Cylinder, Plane, Sphere, Surface, SurfaceDomain};
use crate::math::{Point3, Vector3, PRECISION_CONFUSION};

use super::wire::WireId;

slotmap::new_key_type! {
    /// Unique identifier for a face in the topology store.
    pub struct FaceId;
}

/// The geometric surface associated with a face.
#[derive(Debug, Clone)]
pub enum FaceSurface {
    /// A planar surface.
    Plane(Plane),
    /// A cylindrical surface.
    Cylinder(Cylinder),
    /// A spherical surface.
    Sphere(Sphere),
}

impl Surface for FaceSurface {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        match self {
            Self::Plane(s) => s.evaluate(u, v),
            Self::Cylinder(s) => s.evaluate(u, v),
            Self::Sphere(s) => s.evaluate(u, v),
        }
    }

    fn normal(&self, u: f64, v: f64) -> Result<Vector3> {
        match self {
            Self::Plane(s) => s.normal(u, v),
            Self::Cylinder(s) => s.normal(u, v),
            Self::Sphere(s) => s.normal(u, v),
        }
    }

    fn domain(&self) -> SurfaceDomain {
        match self {
            Self::Plane(s) => s.domain(),
            Self::Cylinder(s) => s.domain(),
            Self::Sphere(s) => s.domain(),
        }
    }

    fn inverse(&self, point: &Point3) -> (f64, f64) {
        match self {
            Self::Plane(s) => s.inverse(point),
            Self::Cylinder(s) => s.inverse(point),
            Self::Sphere(s) => s.inverse(point),
        }
    }

    fn u_period(&self) -> Option<f64> {
        match self {
            Self::Plane(s) => s.u_period(),
            Self::Cylinder(s) => s.u_period(),
            Self::Sphere(s) => s.u_period(),
        }
    }

    fn is_singular_v(&self, v: f64) -> bool {
        match self {
            Self::Plane(s) => s.is_singular_v(v),
            Self::Cylinder(s) => s.is_singular_v(v),
            Self::Sphere(s) => s.is_singular_v(v),
        }
    }
}

/// Data associated with a topological face.
///
/// A face is a bounded region on a surface, defined by an outer wire
/// and optionally inner wires (holes).
#[derive(Debug, Clone)]
pub struct FaceData {
    /// The geometric surface on which this face lies.
    pub surface: FaceSurface,
    /// The outer boundary wire.
    pub outer_wire: WireId,
    /// Inner boundary wires (holes).
    pub inner_wires: Vec<WireId>,
    /// If `true`, the face normal agrees with the surface normal.
    pub same_sense: bool,
    /// Maximum deviation allowed between the surface and its boundary.
    pub tolerance: f64,
}

impl FaceData {
    /// Creates a face with the default tolerance.
    #[must_use]
    pub fn new(
        surface: FaceSurface,
        outer_wire: WireId,
        inner_wires: Vec<WireId>,
        same_sense: bool,
    ) -> Self {
        Self {
            surface,
            outer_wire,
            inner_wires,
            same_sense,
            tolerance: PRECISION_CONFUSION,
        }
    }

    /// Iterates over all wires, outer first.
    pub fn wires(&self) -> impl Iterator<Item = WireId> + '_ {
        std::iter::once(self.outer_wire).chain(self.inner_wires.iter().copied())
    }

    /// Outward normal of the face at `(u, v)`, honoring `same_sense`.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface normal is degenerate.
    pub fn outward_normal(&self, u: f64, v: f64) -> Result<Vector3> {
        let n = self.surface.normal(u, v)?;
        Ok(if self.same_sense { n } else { -n })
    }
}
