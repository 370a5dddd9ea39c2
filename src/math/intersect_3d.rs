use crate::geometry::surface::Plane;

use super::{Point3, Vector3, PRECISION_ANGULAR};

/// Relationship between two planes.
#[derive(Debug)]
pub enum PlanePairRelation {
    /// Planes intersect along a line.
    IntersectionLine {
        origin: Point3,
        direction: Vector3,
    },
    /// Planes are parallel but not coincident.
    Parallel { distance: f64 },
    /// Planes are the same (coincident), possibly with opposite normals.
    Coincident,
}

/// Computes the intersection of two planes.
///
/// Planes whose normals are parallel and whose distance is below `tol`
/// are reported as [`Coincident`](PlanePairRelation::Coincident).
#[must_use]
pub fn plane_plane_intersect(a: &Plane, b: &Plane, tol: f64) -> PlanePairRelation {
    let na = a.plane_normal();
    let nb = b.plane_normal();

    let dir = na.cross(nb);
    let dir_len = dir.norm();

    if dir_len < PRECISION_ANGULAR.sqrt() {
        let dist = (b.origin() - a.origin()).dot(na).abs();
        if dist <= tol {
            PlanePairRelation::Coincident
        } else {
            PlanePairRelation::Parallel { distance: dist }
        }
    } else {
        let dir = dir / dir_len;

        // p = oa + s*na + t*nb satisfies both plane equations.
        let d2 = nb.dot(&(b.origin() - a.origin()));
        let dot_nn = na.dot(nb);
        let denom = 1.0 - dot_nn * dot_nn;
        let s = -dot_nn * d2 / denom;
        let t = d2 / denom;
        let origin = a.origin() + na * s + nb * t;

        PlanePairRelation::IntersectionLine {
            origin,
            direction: dir,
        }
    }
}

/// Closest points between the lines `o1 + s*d1` and `o2 + t*d2`.
///
/// Returns `None` for parallel lines. Directions need not be unit length.
#[must_use]
pub fn line_line_closest(
    o1: &Point3,
    d1: &Vector3,
    o2: &Point3,
    d2: &Vector3,
) -> Option<(f64, f64)> {
    let w = o1 - o2;
    let a = d1.dot(d1);
    let b = d1.dot(d2);
    let c = d2.dot(d2);
    let d = d1.dot(&w);
    let e = d2.dot(&w);
    let denom = a * c - b * b;
    if denom.abs() <= PRECISION_ANGULAR * a * c {
        return None;
    }
    let s = (b * e - c * d) / denom;
    let t = (a * e - b * d) / denom;
    Some((s, t))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn v(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3::new(x, y, z)
    }

    fn signed_distance_to_plane(point: &Point3, plane: &Plane) -> f64 {
        plane.plane_normal().dot(&(point - plane.origin()))
    }

    #[test]
    fn perpendicular_planes_intersect() {
        let xy = Plane::from_normal(p(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0)).unwrap();
        let xz = Plane::from_normal(p(0.0, 0.0, 0.0), v(0.0, 1.0, 0.0)).unwrap();

        match plane_plane_intersect(&xy, &xz, 1e-7) {
            PlanePairRelation::IntersectionLine { direction, .. } => {
                assert!(direction.x.abs() > 0.99, "got {direction:?}");
            }
            other => panic!("expected IntersectionLine, got {other:?}"),
        }
    }

    #[test]
    fn intersection_point_lies_on_both_planes() {
        let a = Plane::from_normal(p(1.0, 0.0, 0.0), v(1.0, 0.0, 0.0)).unwrap();
        let b = Plane::from_normal(p(0.0, 2.0, 0.0), v(0.0, 1.0, 1.0)).unwrap();

        match plane_plane_intersect(&a, &b, 1e-7) {
            PlanePairRelation::IntersectionLine { origin, .. } => {
                assert!(signed_distance_to_plane(&origin, &a).abs() < 1e-12);
                assert!(signed_distance_to_plane(&origin, &b).abs() < 1e-12);
            }
            other => panic!("expected IntersectionLine, got {other:?}"),
        }
    }

    #[test]
    fn near_coincident_planes_within_tolerance() {
        let a = Plane::from_normal(p(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0)).unwrap();
        let b = Plane::from_normal(p(3.0, 1.0, 1e-8), v(0.0, 0.0, -1.0)).unwrap();
        assert!(matches!(
            plane_plane_intersect(&a, &b, 1e-7),
            PlanePairRelation::Coincident
        ));
    }

    #[test]
    fn parallel_planes_report_distance() {
        let a = Plane::from_normal(p(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0)).unwrap();
        let b = Plane::from_normal(p(0.0, 0.0, 3.0), v(0.0, 0.0, -1.0)).unwrap();
        match plane_plane_intersect(&a, &b, 1e-7) {
            PlanePairRelation::Parallel { distance } => assert!((distance - 3.0).abs() < 1e-12),
            other => panic!("expected Parallel, got {other:?}"),
        }
    }

    #[test]
    fn skew_lines_closest_points() {
        let (s, t) = line_line_closest(
            &p(0.0, 0.0, 0.0),
            &v(1.0, 0.0, 0.0),
            &p(2.0, -1.0, 1.0),
            &v(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert!((s - 2.0).abs() < 1e-12);
        assert!((t - 1.0).abs() < 1e-12);
    }

    #[test]
    fn parallel_lines_have_no_closest_pair() {
        assert!(line_line_closest(
            &p(0.0, 0.0, 0.0),
            &v(1.0, 0.0, 0.0),
            &p(0.0, 1.0, 0.0),
            &v(2.0, 0.0, 0.0),
        )
        .is_none());
    }
}
