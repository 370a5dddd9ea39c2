use std::f64::consts::TAU;

use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{Curve, CurveDomain};

/// A circle in 3D space, periodic with period `2*pi`.
///
/// `P(t) = center + r*cos(t)*ref_dir + r*sin(t)*binormal` with
/// `binormal = normal x ref_dir`. Any real `t` may be evaluated; arcs are
/// represented by a parameter range on an edge.
#[derive(Debug, Clone)]
pub struct Circle {
    center: Point3,
    radius: f64,
    normal: Vector3,
    ref_dir: Vector3,
}

impl Circle {
    /// Creates a new circle.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive, the normal is zero-length,
    /// or the reference direction is not perpendicular to the normal.
    pub fn new(center: Point3, radius: f64, normal: Vector3, ref_dir: Vector3) -> Result<Self> {
        if radius < TOLERANCE {
            return Err(GeometryError::Degenerate("circle radius must be positive".into()).into());
        }
        let normal_len = normal.norm();
        let ref_len = ref_dir.norm();
        if normal_len < TOLERANCE || ref_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / normal_len;
        let ref_dir = ref_dir / ref_len;
        if normal.dot(&ref_dir).abs() > TOLERANCE {
            return Err(GeometryError::Degenerate(
                "reference direction must be perpendicular to normal".into(),
            )
            .into());
        }
        Ok(Self {
            center,
            radius,
            normal,
            ref_dir,
        })
    }

    /// Returns the center of the circle.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Returns the radius of the circle.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Returns the normal of the circle plane.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Returns the reference direction (`t = 0`).
    #[must_use]
    pub fn ref_dir(&self) -> &Vector3 {
        &self.ref_dir
    }

    /// Returns `normal x ref_dir`, the direction at `t = pi/2`.
    #[must_use]
    pub fn binormal(&self) -> Vector3 {
        self.normal.cross(&self.ref_dir)
    }
}

impl Curve for Circle {
    fn evaluate(&self, t: f64) -> Result<Point3> {
        let (s, c) = t.sin_cos();
        Ok(self.center + (self.ref_dir * c + self.binormal() * s) * self.radius)
    }

    fn tangent(&self, t: f64) -> Result<Vector3> {
        let (s, c) = t.sin_cos();
        Ok(self.binormal() * c - self.ref_dir * s)
    }

    fn derivative(&self, t: f64) -> Result<Vector3> {
        Ok(self.tangent(t)? * self.radius)
    }

    fn closest_parameter(&self, point: &Point3) -> f64 {
        let d = point - self.center;
        let x = d.dot(&self.ref_dir);
        let y = d.dot(&self.binormal());
        if x.abs() < TOLERANCE && y.abs() < TOLERANCE {
            return 0.0;
        }
        y.atan2(x).rem_euclid(TAU)
    }

    fn domain(&self) -> CurveDomain {
        CurveDomain::new(0.0, TAU)
    }

    fn is_closed(&self) -> bool {
        true
    }
}
