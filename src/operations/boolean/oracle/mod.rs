//! Geometric queries the Boolean pipeline depends on.
//!
//! Every stage talks to geometry through [`GeometryOracle`], so the
//! intersection machinery can be swapped without touching the stages.
//! [`AnalyticOracle`] answers with closed-form solutions for lines,
//! circles, planes, cylinders and spheres.

mod classify;
mod curve_curve;
mod curve_surface;
mod surface_surface;

pub use classify::SolidClassifier;

use std::f64::consts::TAU;

use crate::error::Result;
use crate::geometry::curve::{adjust_periodic, Curve};
use crate::geometry::Surface;
use crate::math::{Point2, Point3};
use crate::operations::query::{closest_point_bounded, Aabb, ClosestPointResult, FaceLoops};
use crate::topology::{EdgeCurve, FaceSurface, TrimmedCurve};

use super::ds::State;

/// Projection of a point onto a surface.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceProjection {
    /// Surface parameters of the foot point.
    pub uv: Point2,
    /// The foot point.
    pub point: Point3,
    /// Distance from the query point to the foot point.
    pub distance: f64,
}

/// One result of a curve/curve intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveCurveHit {
    /// The curves cross or touch.
    Point {
        /// Parameter on the first curve.
        t1: f64,
        /// Parameter on the second curve.
        t2: f64,
        /// Point halfway between both curve points.
        point: Point3,
    },
    /// The curves coincide over a range.
    Overlap {
        /// Range on the first curve.
        t1: (f64, f64),
        /// Range on the second curve, increasing.
        t2: (f64, f64),
    },
}

/// One result of a curve/surface intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveSurfaceHit {
    /// The curve meets the surface at one point.
    Point {
        /// Curve parameter.
        t: f64,
        /// Surface parameters.
        uv: Point2,
        /// The point on the curve.
        point: Point3,
    },
    /// The curve lies on the surface over a range.
    Overlap {
        /// First parameter.
        t1: f64,
        /// Last parameter.
        t2: f64,
    },
}

/// Result of a surface/surface intersection.
#[derive(Debug, Clone, Default)]
pub struct SurfaceSurfaceResult {
    /// The surfaces are the same within tolerance.
    pub coincident: bool,
    /// Bounded intersection curves.
    pub curves: Vec<TrimmedCurve>,
    /// Isolated tangency points.
    pub points: Vec<Point3>,
}

/// Geometric services used by the filler and the builder.
pub trait GeometryOracle: Send + Sync {
    /// Nearest point of the bounded curve.
    ///
    /// # Errors
    ///
    /// Returns an error if the curve cannot be evaluated.
    fn project_point_on_curve(&self, point: &Point3, curve: &TrimmedCurve)
        -> Result<ClosestPointResult>;

    /// Nearest point of the unbounded surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be evaluated.
    fn project_point_on_surface(
        &self,
        point: &Point3,
        surface: &FaceSurface,
    ) -> Result<SurfaceProjection>;

    /// Crossings and overlaps of two bounded curves within `tol`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pair is not supported.
    fn curve_curve(&self, c1: &TrimmedCurve, c2: &TrimmedCurve, tol: f64)
        -> Result<Vec<CurveCurveHit>>;

    /// Crossings and overlaps of a bounded curve with a surface within `tol`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pair is not supported.
    fn curve_surface(
        &self,
        curve: &TrimmedCurve,
        surface: &FaceSurface,
        tol: f64,
    ) -> Result<Vec<CurveSurfaceHit>>;

    /// Intersection curves of two surfaces, bounded to `region`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pair is not supported.
    fn surface_surface(
        &self,
        s1: &FaceSurface,
        s2: &FaceSurface,
        region: &Aabb,
        tol: f64,
    ) -> Result<SurfaceSurfaceResult>;

    /// Position of a point lying on the face surface relative to the face.
    ///
    /// # Errors
    ///
    /// Returns an error if a boundary curve cannot be evaluated.
    fn classify_point_on_face(
        &self,
        point: &Point3,
        surface: &FaceSurface,
        loops: &FaceLoops,
        tol: f64,
    ) -> Result<State>;
}

/// Closed-form intersections of the supported curve and surface types.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticOracle;

impl GeometryOracle for AnalyticOracle {
    fn project_point_on_curve(
        &self,
        point: &Point3,
        curve: &TrimmedCurve,
    ) -> Result<ClosestPointResult> {
        closest_point_bounded(curve, point)
    }

    fn project_point_on_surface(
        &self,
        point: &Point3,
        surface: &FaceSurface,
    ) -> Result<SurfaceProjection> {
        let (u, v) = surface.inverse(point);
        let foot = surface.evaluate(u, v)?;
        Ok(SurfaceProjection {
            uv: Point2::new(u, v),
            point: foot,
            distance: (point - foot).norm(),
        })
    }

    fn curve_curve(
        &self,
        c1: &TrimmedCurve,
        c2: &TrimmedCurve,
        tol: f64,
    ) -> Result<Vec<CurveCurveHit>> {
        curve_curve::intersect(c1, c2, tol)
    }

    fn curve_surface(
        &self,
        curve: &TrimmedCurve,
        surface: &FaceSurface,
        tol: f64,
    ) -> Result<Vec<CurveSurfaceHit>> {
        curve_surface::intersect(curve, surface, tol)
    }

    fn surface_surface(
        &self,
        s1: &FaceSurface,
        s2: &FaceSurface,
        region: &Aabb,
        tol: f64,
    ) -> Result<SurfaceSurfaceResult> {
        surface_surface::intersect(s1, s2, region, tol)
    }

    fn classify_point_on_face(
        &self,
        point: &Point3,
        surface: &FaceSurface,
        loops: &FaceLoops,
        tol: f64,
    ) -> Result<State> {
        classify::point_on_face(point, surface, loops, tol)
    }
}

/// Parameter step covering a 3D distance `tol` on the curve.
pub(crate) fn parameter_tolerance(curve: &EdgeCurve, tol: f64) -> f64 {
    match curve {
        EdgeCurve::Line(_) => tol,
        EdgeCurve::Circle(c) => tol / c.radius(),
    }
}

/// Parameter of `point` on the bounded curve if its foot lies inside the range.
///
/// Periodic parameters are moved into the range window; values within the
/// parameter tolerance of an end are clamped to it.
pub(crate) fn parameter_on(curve: &TrimmedCurve, point: &Point3, tol: f64) -> Option<f64> {
    let raw = curve.curve.closest_parameter(point);
    range_parameter(curve, raw, tol)
}

/// Moves a raw curve parameter into the range of `curve`, if it falls there.
pub(crate) fn range_parameter(curve: &TrimmedCurve, raw: f64, tol: f64) -> Option<f64> {
    let eps = parameter_tolerance(&curve.curve, tol);
    let t = match curve.curve.period() {
        Some(period) => adjust_periodic(raw, curve.t_start - eps, period),
        None => raw,
    };
    if t < curve.t_start - eps || t > curve.t_end + eps {
        return None;
    }
    Some(t.clamp(curve.t_start, curve.t_end))
}

/// Solves `a cos t + b sin t = c`, returning angles in `[-pi, 2 pi]`.
///
/// A right-hand side just out of reach (within `slack`) is treated as a
/// tangency.
pub(crate) fn solve_trig(a: f64, b: f64, c: f64, slack: f64) -> Vec<f64> {
    let r = a.hypot(b);
    if r < 1e-15 {
        return Vec::new();
    }
    if c.abs() > r + slack {
        return Vec::new();
    }
    let phi = b.atan2(a);
    let delta = (c / r).clamp(-1.0, 1.0).acos();
    if delta < 1e-9 {
        vec![phi]
    } else {
        vec![phi - delta, (phi + delta).rem_euclid(TAU)]
    }
}
