//! Parameter-space images of 3D curves lying on surfaces.
//!
//! A p-curve is kept as a polyline in `(u, v)`. Periodic surfaces are
//! unwrapped so consecutive samples never jump by more than half a period,
//! and the whole polyline can then be moved into a chosen period window.

use crate::error::Result;
use crate::math::Point2;

use super::curve::Curve;
use super::surface::Surface;

/// Samples `curve` on `[t0, t1]` and maps every sample to `(u, v)` on `surface`.
///
/// Samples sitting on a singular iso-line (a sphere pole) take the `u` of
/// their nearest regular neighbour so the polyline stays continuous.
///
/// # Errors
///
/// Returns an error if the curve cannot be evaluated.
pub fn project_polyline<C, S>(
    curve: &C,
    t0: f64,
    t1: f64,
    segments: usize,
    surface: &S,
) -> Result<Vec<Point2>>
where
    C: Curve + ?Sized,
    S: Surface + ?Sized,
{
    let segments = segments.max(1);
    let mut uv = Vec::with_capacity(segments + 1);
    let mut singular = Vec::with_capacity(segments + 1);
    for i in 0..=segments {
        #[allow(clippy::cast_precision_loss)]
        let t = t0 + (t1 - t0) * (i as f64) / (segments as f64);
        let (u, v) = surface.inverse(&curve.evaluate(t)?);
        singular.push(surface.is_singular_v(v));
        uv.push(Point2::new(u, v));
    }

    if let Some(period) = surface.u_period() {
        unwrap_u(&mut uv, &singular, period);
    }
    Ok(uv)
}

/// Makes `u` continuous along the polyline and back-fills singular samples.
fn unwrap_u(uv: &mut [Point2], singular: &[bool], period: f64) {
    let mut last_regular: Option<f64> = None;
    for (p, &sing) in uv.iter_mut().zip(singular) {
        if sing {
            continue;
        }
        if let Some(prev) = last_regular {
            p.x += ((prev - p.x) / period).round() * period;
        }
        last_regular = Some(p.x);
    }

    let Some(first_regular) = singular.iter().position(|s| !s) else {
        return;
    };
    let mut fill = uv[first_regular].x;
    for (p, &sing) in uv.iter_mut().zip(singular) {
        if sing {
            p.x = fill;
        } else {
            fill = p.x;
        }
    }
}

/// Returns the `u` value halfway along the polyline.
#[must_use]
pub fn mid_u(points: &[Point2]) -> f64 {
    match points.len() {
        0 => 0.0,
        n if n % 2 == 1 => points[n / 2].x,
        n => 0.5 * (points[n / 2 - 1].x + points[n / 2].x),
    }
}

/// Translates the polyline by whole periods so that its middle lies in
/// `[lo, lo + period)`.
pub fn shift_into_period(points: &mut [Point2], lo: f64, period: f64) {
    let k = ((mid_u(points) - lo) / period).floor();
    if k != 0.0 {
        for p in points.iter_mut() {
            p.x -= k * period;
        }
    }
}

/// Translates the polyline by whole periods so that its middle is as close as
/// possible to `target`.
pub fn shift_towards(points: &mut [Point2], target: f64, period: f64) {
    let k = ((target - mid_u(points)) / period).round();
    if k != 0.0 {
        for p in points.iter_mut() {
            p.x += k * period;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::curve::{Circle, Line};
    use crate::geometry::surface::{Cylinder, Plane, Sphere};
    use crate::math::{Point3, Vector3};
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    #[test]
    fn line_on_plane_maps_linearly() {
        let plane = Plane::from_normal(Point3::origin(), Vector3::z()).unwrap();
        let line = Line::through(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)).unwrap();
        let pts = project_polyline(&line, 0.0, 2.0, 4, &plane).unwrap();
        assert_eq!(pts.len(), 5);
        let d0 = pts[1] - pts[0];
        let d1 = pts[4] - pts[3];
        assert!((d0 - d1).norm() < 1e-12);
    }

    #[test]
    fn circle_on_cylinder_is_unwrapped() {
        let cyl = Cylinder::new(Point3::origin(), 1.0, Vector3::z(), Vector3::x()).unwrap();
        let circle =
            Circle::new(Point3::new(0.0, 0.0, 2.0), 1.0, Vector3::z(), Vector3::x()).unwrap();
        let pts = project_polyline(&circle, 0.0, TAU, 64, &cyl).unwrap();
        assert!(pts.first().unwrap().x.abs() < 1e-9);
        assert!((pts.last().unwrap().x - TAU).abs() < 1e-9);
        assert!(pts.windows(2).all(|w| w[1].x > w[0].x));
        assert!(pts.iter().all(|p| (p.y - 2.0).abs() < 1e-9));
    }

    #[test]
    fn reversed_circle_runs_backwards_after_shift() {
        let cyl = Cylinder::new(Point3::origin(), 1.0, Vector3::z(), Vector3::x()).unwrap();
        let circle = Circle::new(Point3::origin(), 1.0, -Vector3::z(), Vector3::x()).unwrap();
        let mut pts = project_polyline(&circle, 0.0, TAU, 32, &cyl).unwrap();
        shift_into_period(&mut pts, 0.0, TAU);
        assert!((pts.first().unwrap().x - TAU).abs() < 1e-9);
        assert!(pts.last().unwrap().x.abs() < 1e-9);
    }

    #[test]
    fn meridian_poles_are_back_filled() {
        let sphere = Sphere::new(Point3::origin(), 1.0, Vector3::z(), Vector3::x()).unwrap();
        let meridian = Circle::new(Point3::origin(), 1.0, -Vector3::y(), Vector3::x()).unwrap();
        let pts = project_polyline(&meridian, -FRAC_PI_2, FRAC_PI_2, 16, &sphere).unwrap();
        assert!(pts.iter().all(|p| p.x.abs() < 1e-9));
        assert!((pts[0].y + FRAC_PI_2).abs() < 1e-9);
        assert!((pts[16].y - FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn shift_towards_target() {
        let mut pts = vec![Point2::new(0.1, 0.0), Point2::new(0.1, 1.0)];
        shift_towards(&mut pts, TAU, TAU);
        assert!((pts[0].x - (TAU + 0.1)).abs() < 1e-12);
        shift_towards(&mut pts, PI, TAU);
        assert!((pts[0].x - 0.1).abs() < 1e-12);
    }
}
