mod circle;
mod line;

pub use circle::Circle;
pub use line::Line;

use crate::error::Result;
use crate::math::{Point3, Vector3};

/// Parameter domain for a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveDomain {
    /// Start of the parameter range.
    pub t_min: f64,
    /// End of the parameter range.
    pub t_max: f64,
}

impl CurveDomain {
    /// Creates a new curve domain.
    #[must_use]
    pub fn new(t_min: f64, t_max: f64) -> Self {
        Self { t_min, t_max }
    }
}

/// Trait for parametric curves in 3D space.
pub trait Curve {
    /// Evaluates the curve at parameter `t`, returning the 3D point.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is out of range or evaluation fails.
    fn evaluate(&self, t: f64) -> Result<Point3>;

    /// Computes the unit tangent vector at parameter `t`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is out of range or the tangent is degenerate.
    fn tangent(&self, t: f64) -> Result<Vector3>;

    /// Computes the first derivative `dC/dt` at parameter `t`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is out of range.
    fn derivative(&self, t: f64) -> Result<Vector3>;

    /// Returns the parameter of the point of the unbounded curve closest to `point`.
    ///
    /// Periodic curves return a value inside their natural domain.
    fn closest_parameter(&self, point: &Point3) -> f64;

    /// Returns the parameter domain of the curve.
    fn domain(&self) -> CurveDomain;

    /// Returns whether the curve is closed.
    fn is_closed(&self) -> bool;
}

/// Maps a periodic parameter into `[lo, lo + period)`.
#[must_use]
pub fn adjust_periodic(t: f64, lo: f64, period: f64) -> f64 {
    let shifted = (t - lo).rem_euclid(period);
    lo + shifted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    #[test]
    fn adjust_periodic_wraps_both_ways() {
        assert!((adjust_periodic(-0.5, 0.0, TAU) - (TAU - 0.5)).abs() < 1e-12);
        assert!((adjust_periodic(TAU + 0.25, 0.0, TAU) - 0.25).abs() < 1e-12);
        assert!((adjust_periodic(1.0, 1.0, TAU) - 1.0).abs() < 1e-12);
    }
}
