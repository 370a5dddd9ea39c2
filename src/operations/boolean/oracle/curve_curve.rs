use std::f64::consts::TAU;

use crate::error::Result;
use crate::geometry::curve::{adjust_periodic, Circle, Curve, Line};
use crate::math::intersect_3d::line_line_closest;
use crate::math::{solve_quadratic, Point3, PRECISION_ANGULAR};
use crate::topology::{EdgeCurve, TrimmedCurve};

use super::{parameter_on, parameter_tolerance, solve_trig, CurveCurveHit};

pub(super) fn intersect(
    c1: &TrimmedCurve,
    c2: &TrimmedCurve,
    tol: f64,
) -> Result<Vec<CurveCurveHit>> {
    let candidates = match (&c1.curve, &c2.curve) {
        (EdgeCurve::Line(l1), EdgeCurve::Line(l2)) => {
            if let Some(hit) = parallel_lines(c1, l1, c2, l2, tol)? {
                return Ok(hit);
            }
            let closest =
                line_line_closest(l1.origin(), l1.direction(), l2.origin(), l2.direction());
            let Some((s, _)) = closest else {
                return Ok(Vec::new());
            };
            vec![l1.evaluate(s)?]
        }
        (EdgeCurve::Line(line), EdgeCurve::Circle(circle)) => {
            line_circle_points(line, circle, tol)?
        }
        (EdgeCurve::Circle(circle), EdgeCurve::Line(line)) => {
            line_circle_points(line, circle, tol)?
        }
        (EdgeCurve::Circle(a), EdgeCurve::Circle(b)) => {
            if same_circle(a, b, tol) {
                return coincident_arcs(c1, c2, tol);
            }
            circle_circle_points(a, b, tol)?
        }
    };
    points_to_hits(c1, c2, &candidates, tol)
}

/// Keeps candidate points lying on both bounded curves.
fn points_to_hits(
    c1: &TrimmedCurve,
    c2: &TrimmedCurve,
    candidates: &[Point3],
    tol: f64,
) -> Result<Vec<CurveCurveHit>> {
    let mut hits: Vec<CurveCurveHit> = Vec::new();
    let eps1 = parameter_tolerance(&c1.curve, tol);
    for candidate in candidates {
        let on_both = (parameter_on(c1, candidate, tol), parameter_on(c2, candidate, tol));
        let (Some(t1), Some(t2)) = on_both else {
            continue;
        };
        let p1 = c1.evaluate(t1)?;
        let p2 = c2.evaluate(t2)?;
        if (p1 - p2).norm() > tol {
            continue;
        }
        let duplicate = hits
            .iter()
            .any(|h| matches!(h, CurveCurveHit::Point { t1: u, .. } if (u - t1).abs() <= eps1));
        if !duplicate {
            hits.push(CurveCurveHit::Point {
                t1,
                t2,
                point: nalgebra::center(&p1, &p2),
            });
        }
    }
    Ok(hits)
}

/// Overlap or touch of two collinear segments, `None` if the lines are not parallel.
fn parallel_lines(
    c1: &TrimmedCurve,
    l1: &Line,
    c2: &TrimmedCurve,
    l2: &Line,
    tol: f64,
) -> Result<Option<Vec<CurveCurveHit>>> {
    if l1.direction().cross(l2.direction()).norm() > PRECISION_ANGULAR.sqrt() {
        return Ok(None);
    }
    let offset = l2.origin() - l1.origin();
    let across = offset - l1.direction() * offset.dot(l1.direction());
    if across.norm() > tol {
        return Ok(Some(Vec::new()));
    }
    let a = l1.closest_parameter(&c2.evaluate(c2.t_start)?);
    let b = l1.closest_parameter(&c2.evaluate(c2.t_end)?);
    let lo = a.min(b).max(c1.t_start);
    let hi = a.max(b).min(c1.t_end);
    if hi < lo - tol {
        return Ok(Some(Vec::new()));
    }
    let p_lo = l1.evaluate(lo)?;
    let p_hi = l1.evaluate(hi)?;
    let s_lo = l2.closest_parameter(&p_lo).clamp(c2.t_start, c2.t_end);
    let s_hi = l2.closest_parameter(&p_hi).clamp(c2.t_start, c2.t_end);
    if hi - lo <= tol {
        return Ok(Some(vec![CurveCurveHit::Point {
            t1: lo,
            t2: s_lo,
            point: p_lo,
        }]));
    }
    Ok(Some(vec![CurveCurveHit::Overlap {
        t1: (lo, hi),
        t2: (s_lo.min(s_hi), s_lo.max(s_hi)),
    }]))
}

fn line_circle_points(line: &Line, circle: &Circle, tol: f64) -> Result<Vec<Point3>> {
    let n = circle.normal();
    let d = line.direction();
    let to_center = circle.center() - line.origin();
    if d.dot(n).abs() < PRECISION_ANGULAR.sqrt() {
        if to_center.dot(n).abs() > tol {
            return Ok(Vec::new());
        }
        let t0 = to_center.dot(d);
        let foot = line.evaluate(t0)?;
        let dist = (foot - circle.center()).norm();
        let r = circle.radius();
        if (dist - r).abs() <= tol {
            return Ok(vec![foot]);
        }
        let roots = solve_quadratic(1.0, -2.0 * t0, t0 * t0 + dist * dist - r * r);
        return roots.into_iter().map(|t| line.evaluate(t)).collect();
    }
    let t = to_center.dot(n) / d.dot(n);
    let p = line.evaluate(t)?;
    if ((p - circle.center()).norm() - circle.radius()).abs() <= tol {
        Ok(vec![p])
    } else {
        Ok(Vec::new())
    }
}

fn same_circle(a: &Circle, b: &Circle, tol: f64) -> bool {
    (a.center() - b.center()).norm() <= tol
        && (a.radius() - b.radius()).abs() <= tol
        && a.normal().cross(b.normal()).norm() < PRECISION_ANGULAR.sqrt()
}

fn circle_circle_points(a: &Circle, b: &Circle, tol: f64) -> Result<Vec<Point3>> {
    let coplanar = a.normal().cross(b.normal()).norm() < PRECISION_ANGULAR.sqrt();
    if coplanar {
        if (b.center() - a.center()).dot(a.normal()).abs() > tol {
            return Ok(Vec::new());
        }
        let delta = b.center() - a.center();
        let d = delta.norm();
        let (r1, r2) = (a.radius(), b.radius());
        if d < tol || d > r1 + r2 + tol || d < (r1 - r2).abs() - tol {
            return Ok(Vec::new());
        }
        let e = delta / d;
        let along = (d * d + r1 * r1 - r2 * r2) / (2.0 * d);
        let h = (r1 * r1 - along * along).max(0.0).sqrt();
        let base = a.center() + e * along;
        if h <= tol {
            return Ok(vec![base]);
        }
        let w = a.normal().cross(&e);
        return Ok(vec![base + w * h, base - w * h]);
    }
    // Points of `a` on the plane of `b`, then kept if they lie on `b`.
    let n = b.normal();
    let r = a.radius();
    let ts = solve_trig(
        r * a.ref_dir().dot(n),
        r * a.binormal().dot(n),
        (b.center() - a.center()).dot(n),
        tol,
    );
    let mut out = Vec::new();
    for t in ts {
        let p = a.evaluate(t)?;
        if ((p - b.center()).norm() - b.radius()).abs() <= tol {
            out.push(p);
        }
    }
    Ok(out)
}

/// Common arcs of two arcs on the same circle.
fn coincident_arcs(c1: &TrimmedCurve, c2: &TrimmedCurve, tol: f64) -> Result<Vec<CurveCurveHit>> {
    let eps1 = parameter_tolerance(&c1.curve, tol);
    let start2 = c1.curve.closest_parameter(&c2.evaluate(c2.t_start)?);
    let end2 = c1.curve.closest_parameter(&c2.evaluate(c2.t_end)?);
    let mid2 = c1.curve.closest_parameter(&c2.midpoint()?);
    let len2 = c2.t_end - c2.t_start;
    // Arc 2 expressed on circle 1 as [lo, lo + len2].
    let same_direction = (adjust_periodic(mid2 - start2, 0.0, TAU) - 0.5 * len2).abs() < 1e-6
        || len2 >= TAU - 1e-9;
    let lo = if same_direction { start2 } else { end2 };
    let lo = adjust_periodic(lo, c1.t_start - TAU, TAU);

    let mut hits = Vec::new();
    for k in 0..3 {
        #[allow(clippy::cast_precision_loss)]
        let a = lo + TAU * k as f64;
        let from = a.max(c1.t_start);
        let to = (a + len2).min(c1.t_end);
        if to < from - eps1 {
            continue;
        }
        let p_from = c1.evaluate(from)?;
        let p_to = c1.evaluate(to)?;
        let ends = (parameter_on(c2, &p_from, tol), parameter_on(c2, &p_to, tol));
        let (Some(s_from), Some(s_to)) = ends else {
            continue;
        };
        if to - from <= eps1 {
            let duplicate = hits
                .iter()
                .any(|h| matches!(h, CurveCurveHit::Point { t1, .. } if (t1 - from).abs() <= eps1));
            if !duplicate {
                hits.push(CurveCurveHit::Point {
                    t1: from,
                    t2: s_from,
                    point: p_from,
                });
            }
            continue;
        }
        let (mut s_lo, mut s_hi) = (s_from.min(s_to), s_from.max(s_to));
        if s_hi - s_lo < 1e-12 && len2 >= TAU - 1e-9 {
            s_lo = c2.t_start;
            s_hi = c2.t_end;
        }
        hits.push(CurveCurveHit::Overlap {
            t1: (from, to),
            t2: (s_lo, s_hi),
        });
    }
    if hits.iter().any(|h| matches!(h, CurveCurveHit::Overlap { .. })) {
        hits.retain(|h| matches!(h, CurveCurveHit::Overlap { .. }));
    }
    Ok(hits)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector3;

    fn segment(a: Point3, b: Point3) -> TrimmedCurve {
        let len = (b - a).norm();
        TrimmedCurve::new(EdgeCurve::Line(Line::through(a, b).unwrap()), 0.0, len)
    }

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn crossing_segments() {
        let a = segment(p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0));
        let b = segment(p(1.0, -1.0, 0.0), p(1.0, 1.0, 0.0));
        let hits = intersect(&a, &b, 1e-7).unwrap();
        assert_eq!(hits.len(), 1);
        let CurveCurveHit::Point { t1, t2, .. } = hits[0] else {
            panic!("expected a point");
        };
        assert!((t1 - 1.0).abs() < 1e-12);
        assert!((t2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn skew_segments_miss() {
        let a = segment(p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0));
        let b = segment(p(1.0, -1.0, 0.5), p(1.0, 1.0, 0.5));
        assert!(intersect(&a, &b, 1e-7).unwrap().is_empty());
    }

    #[test]
    fn collinear_segments_overlap() {
        let a = segment(p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0));
        let b = segment(p(3.0, 0.0, 0.0), p(1.0, 0.0, 0.0));
        let hits = intersect(&a, &b, 1e-7).unwrap();
        assert_eq!(
            hits,
            vec![CurveCurveHit::Overlap {
                t1: (1.0, 2.0),
                t2: (1.0, 2.0)
            }]
        );
    }

    #[test]
    fn line_through_circle() {
        let circle = Circle::new(Point3::origin(), 1.0, Vector3::z(), Vector3::x()).unwrap();
        let full = TrimmedCurve::new(EdgeCurve::Circle(circle), 0.0, TAU);
        let line = segment(p(-2.0, 0.0, 0.0), p(2.0, 0.0, 0.0));
        assert_eq!(intersect(&line, &full, 1e-7).unwrap().len(), 2);
        let piercing = segment(p(0.0, 1.0, -1.0), p(0.0, 1.0, 1.0));
        assert_eq!(intersect(&full, &piercing, 1e-7).unwrap().len(), 1);
    }

    #[test]
    fn arcs_of_one_circle_overlap() {
        let circle = Circle::new(Point3::origin(), 2.0, Vector3::z(), Vector3::x()).unwrap();
        let a = TrimmedCurve::new(EdgeCurve::Circle(circle.clone()), 0.0, 2.0);
        let b = TrimmedCurve::new(EdgeCurve::Circle(circle), 1.0, 3.0);
        let hits = intersect(&a, &b, 1e-7).unwrap();
        assert_eq!(hits.len(), 1);
        let CurveCurveHit::Overlap { t1, t2 } = hits[0] else {
            panic!("expected an overlap");
        };
        assert!((t1.0 - 1.0).abs() < 1e-9 && (t1.1 - 2.0).abs() < 1e-9);
        assert!((t2.0 - 1.0).abs() < 1e-9 && (t2.1 - 2.0).abs() < 1e-9);
    }
}
