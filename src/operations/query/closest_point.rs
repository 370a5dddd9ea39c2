use crate::error::Result;
use crate::geometry::curve::{adjust_periodic, Curve};
use crate::math::Point3;
use crate::topology::{EdgeId, TopologyStore, TrimmedCurve};

/// Result of a closest point query.
#[derive(Debug, Clone, Copy)]
pub struct ClosestPointResult {
    /// The closest point on the curve.
    pub point: Point3,
    /// The parameter value at the closest point.
    pub parameter: f64,
    /// The distance from the query point to the closest point.
    pub distance: f64,
}

/// Finds the closest point on an edge to a given point.
pub struct ClosestPointOnCurve {
    edge: EdgeId,
    point: Point3,
}

impl ClosestPointOnCurve {
    /// Creates a new `ClosestPointOnCurve` query.
    #[must_use]
    pub fn new(edge: EdgeId, point: Point3) -> Self {
        Self { edge, point }
    }

    /// Executes the query, returning the closest point within the edge range.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not found.
    pub fn execute(&self, store: &TopologyStore) -> Result<ClosestPointResult> {
        closest_point_bounded(&store.edge(self.edge)?.trimmed(), &self.point)
    }
}

/// Projects `point` onto a trimmed curve.
///
/// The unbounded foot point is used when it falls inside the range; otherwise
/// the nearer range end wins. For lines and circles the distance along the
/// range has a single minimum, so this is exact.
///
/// # Errors
///
/// Returns an error if the curve cannot be evaluated.
pub fn closest_point_bounded(curve: &TrimmedCurve, point: &Point3) -> Result<ClosestPointResult> {
    let (t0, t1) = (curve.t_start, curve.t_end);
    let mut t = curve.curve.closest_parameter(point);
    if let Some(period) = curve.curve.period() {
        t = adjust_periodic(t, t0, period);
    }

    let candidate = if t >= t0 && t <= t1 {
        Some(t)
    } else {
        None
    };
    let mut best: Option<ClosestPointResult> = None;
    for param in candidate.into_iter().chain([t0, t1]) {
        let p = curve.evaluate(param)?;
        let distance = (point - p).norm();
        if best.is_none_or(|b| distance < b.distance) {
            best = Some(ClosestPointResult {
                point: p,
                parameter: param,
                distance,
            });
        }
    }
    best.ok_or_else(|| crate::error::GeometryError::Degenerate("empty curve range".into()).into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::curve::{Circle, Line};
    use crate::math::Vector3;
    use crate::topology::EdgeCurve;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn line_projection_is_clamped() {
        let line = Line::new(Point3::origin(), Vector3::x()).unwrap();
        let tc = TrimmedCurve::new(EdgeCurve::Line(line), 0.0, 1.0);
        let r = closest_point_bounded(&tc, &Point3::new(3.0, 1.0, 0.0)).unwrap();
        assert!((r.parameter - 1.0).abs() < 1e-12);
        assert!((r.distance - 5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn arc_projection_inside_range() {
        let circle = Circle::new(Point3::origin(), 2.0, Vector3::z(), Vector3::x()).unwrap();
        let tc = TrimmedCurve::new(EdgeCurve::Circle(circle), 0.0, PI);
        let r = closest_point_bounded(&tc, &Point3::new(0.0, 5.0, 0.0)).unwrap();
        assert!((r.parameter - FRAC_PI_2).abs() < 1e-12);
        assert!((r.distance - 3.0).abs() < 1e-12);
    }

    #[test]
    fn arc_projection_outside_range_picks_end() {
        let circle = Circle::new(Point3::origin(), 1.0, Vector3::z(), Vector3::x()).unwrap();
        let tc = TrimmedCurve::new(EdgeCurve::Circle(circle), 0.0, FRAC_PI_2);
        let r = closest_point_bounded(&tc, &Point3::new(0.1, -3.0, 0.0)).unwrap();
        assert!(r.parameter.abs() < 1e-12);
    }

    #[test]
    fn range_past_period_is_respected() {
        let circle = Circle::new(Point3::origin(), 1.0, Vector3::z(), Vector3::x()).unwrap();
        let tc = TrimmedCurve::new(EdgeCurve::Circle(circle), PI, 2.5 * PI);
        let r = closest_point_bounded(&tc, &Point3::new(0.0, 4.0, 0.0)).unwrap();
        assert!((r.parameter - 2.5 * PI).abs() < 1e-12);
        assert!((r.distance - 3.0).abs() < 1e-12);
    }
}
