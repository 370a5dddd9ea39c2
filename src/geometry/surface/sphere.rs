use std::f64::consts::{FRAC_PI_2, TAU};

use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{Surface, SurfaceDomain};

/// A spherical surface.
///
/// `P(u, v) = center + r*cos(v)*(cos(u)*ref_dir + sin(u)*binormal) + r*sin(v)*axis`
/// with `binormal = axis x ref_dir`, longitude `u` in `[0, 2*pi)` and
/// latitude `v` in `[-pi/2, pi/2]`. The poles are at `center +- r*axis`.
#[derive(Debug, Clone)]
pub struct Sphere {
    center: Point3,
    radius: f64,
    axis: Vector3,
    ref_dir: Vector3,
}

impl Sphere {
    /// Creates a new sphere.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive, the axis is zero-length,
    /// or the reference direction is not perpendicular to the axis.
    pub fn new(center: Point3, radius: f64, axis: Vector3, ref_dir: Vector3) -> Result<Self> {
        if radius < TOLERANCE {
            return Err(GeometryError::Degenerate("sphere radius must be positive".into()).into());
        }
        let axis_len = axis.norm();
        let ref_len = ref_dir.norm();
        if axis_len < TOLERANCE || ref_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let axis = axis / axis_len;
        let ref_dir = ref_dir / ref_len;
        if axis.dot(&ref_dir).abs() > TOLERANCE {
            return Err(GeometryError::Degenerate(
                "reference direction must be perpendicular to axis".into(),
            )
            .into());
        }
        Ok(Self {
            center,
            radius,
            axis,
            ref_dir,
        })
    }

    /// Returns the center of the sphere.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Returns the radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Returns the axis direction (north pole, unit vector).
    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    /// Returns the reference direction (u = 0 on the equator).
    #[must_use]
    pub fn ref_dir(&self) -> &Vector3 {
        &self.ref_dir
    }

    /// Returns `axis x ref_dir`.
    #[must_use]
    pub fn binormal(&self) -> Vector3 {
        self.axis.cross(&self.ref_dir)
    }

    /// Returns `true` when `v` is at one of the poles.
    #[must_use]
    pub fn is_pole(v: f64) -> bool {
        FRAC_PI_2 - v.abs() < 1e-9
    }
}

impl Surface for Sphere {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        Ok(self.center + self.normal(u, v)? * self.radius)
    }

    fn normal(&self, u: f64, v: f64) -> Result<Vector3> {
        let (su, cu) = u.sin_cos();
        let (sv, cv) = v.sin_cos();
        Ok(self.ref_dir * (cv * cu) + self.binormal() * (cv * su) + self.axis * sv)
    }

    fn domain(&self) -> SurfaceDomain {
        SurfaceDomain::new(0.0, TAU, -FRAC_PI_2, FRAC_PI_2)
    }

    fn inverse(&self, point: &Point3) -> (f64, f64) {
        let d = point - self.center;
        let len = d.norm();
        if len < TOLERANCE {
            return (0.0, 0.0);
        }
        let d = d / len;
        let v = d.dot(&self.axis).clamp(-1.0, 1.0).asin();
        let x = d.dot(&self.ref_dir);
        let y = d.dot(&self.binormal());
        let u = if x.abs() < TOLERANCE && y.abs() < TOLERANCE {
            0.0
        } else {
            y.atan2(x).rem_euclid(TAU)
        };
        (u, v)
    }

    fn u_period(&self) -> Option<f64> {
        Some(TAU)
    }

    fn is_singular_v(&self, v: f64) -> bool {
        Self::is_pole(v)
    }
}
