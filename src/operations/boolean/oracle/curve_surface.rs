use crate::error::Result;
use crate::geometry::curve::{Circle, Curve, Line};
use crate::geometry::surface::{Cylinder, Plane, Sphere};
use crate::geometry::Surface;
use crate::math::{solve_quadratic, Point2, PRECISION_ANGULAR};
use crate::topology::{EdgeCurve, FaceSurface, TrimmedCurve};

use super::{parameter_tolerance, range_parameter, solve_trig, CurveSurfaceHit};

/// Samples per full turn when a circle/cylinder pair has to be searched.
const CIRCLE_SAMPLES: usize = 96;

enum Roots {
    Params(Vec<f64>),
    Overlap,
}

pub(super) fn intersect(
    curve: &TrimmedCurve,
    surface: &FaceSurface,
    tol: f64,
) -> Result<Vec<CurveSurfaceHit>> {
    let roots = match (&curve.curve, surface) {
        (EdgeCurve::Line(l), FaceSurface::Plane(s)) => line_plane(l, s, tol),
        (EdgeCurve::Line(l), FaceSurface::Cylinder(s)) => line_cylinder(l, s, tol),
        (EdgeCurve::Line(l), FaceSurface::Sphere(s)) => line_sphere(l, s, tol),
        (EdgeCurve::Circle(c), FaceSurface::Plane(s)) => circle_plane(c, s, tol),
        (EdgeCurve::Circle(c), FaceSurface::Sphere(s)) => circle_sphere(c, s, tol),
        (EdgeCurve::Circle(c), FaceSurface::Cylinder(s)) => circle_cylinder(curve, c, s, tol)?,
    };
    let params = match roots {
        Roots::Overlap => {
            return Ok(vec![CurveSurfaceHit::Overlap {
                t1: curve.t_start,
                t2: curve.t_end,
            }])
        }
        Roots::Params(params) => params,
    };

    let eps = parameter_tolerance(&curve.curve, tol);
    let mut hits: Vec<CurveSurfaceHit> = Vec::new();
    for raw in params {
        let Some(t) = range_parameter(curve, raw, tol) else {
            continue;
        };
        if hits
            .iter()
            .any(|h| matches!(h, CurveSurfaceHit::Point { t: u, .. } if (u - t).abs() <= eps))
        {
            continue;
        }
        let point = curve.evaluate(t)?;
        let (u, v) = surface.inverse(&point);
        hits.push(CurveSurfaceHit::Point {
            t,
            uv: Point2::new(u, v),
            point,
        });
    }
    hits.sort_by(|a, b| hit_param(a).total_cmp(&hit_param(b)));
    Ok(hits)
}

fn hit_param(hit: &CurveSurfaceHit) -> f64 {
    match hit {
        CurveSurfaceHit::Point { t, .. } => *t,
        CurveSurfaceHit::Overlap { t1, .. } => *t1,
    }
}

fn line_plane(line: &Line, plane: &Plane, tol: f64) -> Roots {
    let normal = plane.plane_normal();
    let denom = line.direction().dot(normal);
    let offset = (plane.origin() - line.origin()).dot(normal);
    if denom.abs() < PRECISION_ANGULAR.sqrt() {
        return if offset.abs() <= tol {
            Roots::Overlap
        } else {
            Roots::Params(Vec::new())
        };
    }
    Roots::Params(vec![offset / denom])
}

/// Reduces to a circle/line problem in the plane across the axis.
fn line_cylinder(line: &Line, cyl: &Cylinder, tol: f64) -> Roots {
    let axis = cyl.axis();
    let dp = line.origin() - cyl.center();
    let dp_perp = dp - axis * dp.dot(axis);
    let dir_perp = line.direction() - axis * line.direction().dot(axis);
    let a = dir_perp.dot(&dir_perp);
    let r = cyl.radius();
    if a < PRECISION_ANGULAR {
        return if (dp_perp.norm() - r).abs() <= tol {
            Roots::Overlap
        } else {
            Roots::Params(Vec::new())
        };
    }
    let t0 = -dp_perp.dot(&dir_perp) / a;
    let closest = (dp_perp + dir_perp * t0).norm();
    if (closest - r).abs() <= tol {
        return Roots::Params(vec![t0]);
    }
    Roots::Params(solve_quadratic(a, 2.0 * dp_perp.dot(&dir_perp), dp_perp.dot(&dp_perp) - r * r))
}

fn line_sphere(line: &Line, sphere: &Sphere, tol: f64) -> Roots {
    let dp = line.origin() - sphere.center();
    let t0 = -dp.dot(line.direction());
    let closest = (dp + line.direction() * t0).norm();
    let r = sphere.radius();
    if (closest - r).abs() <= tol {
        return Roots::Params(vec![t0]);
    }
    Roots::Params(solve_quadratic(1.0, 2.0 * dp.dot(line.direction()), dp.dot(&dp) - r * r))
}

fn circle_plane(circle: &Circle, plane: &Plane, tol: f64) -> Roots {
    let n = plane.plane_normal();
    let offset = (plane.origin() - circle.center()).dot(n);
    let r = circle.radius();
    let a = r * circle.ref_dir().dot(n);
    let b = r * circle.binormal().dot(n);
    if a.hypot(b) < PRECISION_ANGULAR.sqrt() * r {
        return if offset.abs() <= tol {
            Roots::Overlap
        } else {
            Roots::Params(Vec::new())
        };
    }
    Roots::Params(solve_trig(a, b, offset, tol))
}

fn circle_sphere(circle: &Circle, sphere: &Sphere, tol: f64) -> Roots {
    // |C(t) - s|^2 = R^2 is linear in cos t and sin t.
    let w = circle.center() - sphere.center();
    let r = circle.radius();
    let big_r = sphere.radius();
    let a = 2.0 * r * w.dot(circle.ref_dir());
    let b = 2.0 * r * w.dot(&circle.binormal());
    let c = big_r * big_r - w.dot(&w) - r * r;
    if a.hypot(b) < PRECISION_ANGULAR.sqrt() * r {
        return if c.abs() <= 2.0 * big_r * tol {
            Roots::Overlap
        } else {
            Roots::Params(Vec::new())
        };
    }
    Roots::Params(solve_trig(a, b, c, 2.0 * big_r * tol))
}

fn circle_cylinder(
    curve: &TrimmedCurve,
    circle: &Circle,
    cyl: &Cylinder,
    tol: f64,
) -> Result<Roots> {
    let coaxial = circle.normal().cross(cyl.axis()).norm() < PRECISION_ANGULAR.sqrt()
        && cyl.axis_distance(circle.center()) <= tol;
    if coaxial {
        return Ok(if (circle.radius() - cyl.radius()).abs() <= tol {
            Roots::Overlap
        } else {
            Roots::Params(Vec::new())
        });
    }
    let gap =
        |t: f64| -> Result<f64> { Ok(cyl.axis_distance(&circle.evaluate(t)?) - cyl.radius()) };
    let span = curve.t_end - curve.t_start;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let n = ((span / std::f64::consts::TAU * CIRCLE_SAMPLES as f64).ceil() as usize).max(8);
    let mut roots = Vec::new();
    #[allow(clippy::cast_precision_loss)]
    let at = |i: usize| curve.t_start + span * i as f64 / n as f64;
    let mut prev = gap(at(0))?;
    if prev.abs() <= tol {
        roots.push(at(0));
    }
    for i in 1..=n {
        let t = at(i);
        let cur = gap(t)?;
        if cur.abs() <= tol {
            roots.push(t);
        } else if prev.abs() > tol && (prev < 0.0) != (cur < 0.0) {
            let (mut lo, mut hi, mut f_lo) = (at(i - 1), t, prev);
            for _ in 0..60 {
                let mid = 0.5 * (lo + hi);
                let f_mid = gap(mid)?;
                if (f_mid < 0.0) == (f_lo < 0.0) {
                    lo = mid;
                    f_lo = f_mid;
                } else {
                    hi = mid;
                }
            }
            roots.push(0.5 * (lo + hi));
        }
        prev = cur;
    }
    Ok(Roots::Params(roots))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Point3, Vector3};
    use std::f64::consts::TAU;

    fn ray(origin: Point3, dir: Vector3, len: f64) -> TrimmedCurve {
        TrimmedCurve::new(EdgeCurve::Line(Line::new(origin, dir).unwrap()), 0.0, len)
    }

    fn z_cylinder(r: f64) -> FaceSurface {
        let cylinder = Cylinder::new(Point3::origin(), r, Vector3::z(), Vector3::x()).unwrap();
        FaceSurface::Cylinder(cylinder)
    }

    #[test]
    fn line_through_cylinder_gives_two_hits() {
        let line = ray(Point3::new(-5.0, 0.0, 1.0), Vector3::x(), 10.0);
        let hits = intersect(&line, &z_cylinder(2.0), 1e-7).unwrap();
        assert_eq!(hits.len(), 2);
        let CurveSurfaceHit::Point { t, .. } = hits[0] else {
            panic!("expected a point");
        };
        assert!((t - 3.0).abs() < 1e-9);
    }

    #[test]
    fn line_tangent_to_sphere_gives_one_hit() {
        let sphere = Sphere::new(Point3::origin(), 1.0, Vector3::z(), Vector3::x()).unwrap();
        let sphere = FaceSurface::Sphere(sphere);
        let line = ray(Point3::new(-2.0, 1.0, 0.0), Vector3::x(), 4.0);
        let hits = intersect(&line, &sphere, 1e-7).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn line_on_plane_overlaps() {
        let plane = FaceSurface::Plane(Plane::from_normal(Point3::origin(), Vector3::z()).unwrap());
        let hits = intersect(&ray(Point3::origin(), Vector3::x(), 1.0), &plane, 1e-7).unwrap();
        assert_eq!(hits, vec![CurveSurfaceHit::Overlap { t1: 0.0, t2: 1.0 }]);
    }

    #[test]
    fn hits_outside_range_are_dropped() {
        let plane = Plane::from_normal(Point3::new(0.0, 0.0, 5.0), Vector3::z()).unwrap();
        let plane = FaceSurface::Plane(plane);
        let hits = intersect(&ray(Point3::origin(), Vector3::z(), 1.0), &plane, 1e-7).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn circle_crosses_plane_twice() {
        let circle = Circle::new(Point3::origin(), 1.0, Vector3::y(), Vector3::x()).unwrap();
        let full = TrimmedCurve::new(EdgeCurve::Circle(circle), 0.0, TAU);
        let plane = Plane::from_normal(Point3::new(0.0, 0.0, 0.5), Vector3::z()).unwrap();
        let plane = FaceSurface::Plane(plane);
        let hits = intersect(&full, &plane, 1e-7).unwrap();
        assert_eq!(hits.len(), 2);
        for hit in hits {
            let CurveSurfaceHit::Point { point, .. } = hit else {
                panic!("expected a point");
            };
            assert!((point.z - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn tilted_circle_crosses_cylinder() {
        let circle =
            Circle::new(Point3::new(2.0, 0.0, 0.0), 1.5, Vector3::y(), Vector3::x()).unwrap();
        let full = TrimmedCurve::new(EdgeCurve::Circle(circle), 0.0, TAU);
        let hits = intersect(&full, &z_cylinder(1.0), 1e-7).unwrap();
        assert_eq!(hits.len(), 2);
        for hit in hits {
            let CurveSurfaceHit::Point { point, .. } = hit else {
                panic!("expected a point");
            };
            assert!((point.x.hypot(point.y) - 1.0).abs() < 1e-7);
        }
    }
}
