use std::f64::consts::TAU;

use crate::error::Result;
use crate::geometry::curve::{Circle, Curve, CurveDomain, Line};
use crate::math::{Point3, Vector3, PRECISION_CONFUSION};

use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for an edge in the topology store.
    pub struct EdgeId;
}

/// Number of polyline segments used to approximate a full circle.
const SEGMENTS_PER_TURN: f64 = 128.0;

/// The geometric curve associated with an edge.
#[derive(Debug, Clone)]
pub enum EdgeCurve {
    /// A straight line.
    Line(Line),
    /// A circle; arcs are bounded by the edge parameter range.
    Circle(Circle),
}

impl EdgeCurve {
    /// Returns the period of the curve, if it is periodic.
    #[must_use]
    pub fn period(&self) -> Option<f64> {
        match self {
            Self::Line(_) => None,
            Self::Circle(_) => Some(TAU),
        }
    }

    /// Number of segments of a polyline following the curve over `[t0, t1]`.
    #[must_use]
    pub fn polyline_segments(&self, t0: f64, t1: f64) -> usize {
        match self {
            Self::Line(_) => 1,
            Self::Circle(_) => {
                let n = ((t1 - t0).abs() / TAU * SEGMENTS_PER_TURN).ceil();
                // Bounded by SEGMENTS_PER_TURN times the number of turns.
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let n = n as usize;
                n.max(2)
            }
        }
    }
}

impl Curve for EdgeCurve {
    fn evaluate(&self, t: f64) -> Result<Point3> {
        match self {
            Self::Line(c) => c.evaluate(t),
            Self::Circle(c) => c.evaluate(t),
        }
    }

    fn tangent(&self, t: f64) -> Result<Vector3> {
        match self {
            Self::Line(c) => c.tangent(t),
            Self::Circle(c) => c.tangent(t),
        }
    }

    fn derivative(&self, t: f64) -> Result<Vector3> {
        match self {
            Self::Line(c) => c.derivative(t),
            Self::Circle(c) => c.derivative(t),
        }
    }

    fn closest_parameter(&self, point: &Point3) -> f64 {
        match self {
            Self::Line(c) => c.closest_parameter(point),
            Self::Circle(c) => c.closest_parameter(point),
        }
    }

    fn domain(&self) -> CurveDomain {
        match self {
            Self::Line(c) => c.domain(),
            Self::Circle(c) => c.domain(),
        }
    }

    fn is_closed(&self) -> bool {
        match self {
            Self::Line(c) => c.is_closed(),
            Self::Circle(c) => c.is_closed(),
        }
    }
}

/// A curve restricted to the parameter range `[t_start, t_end]`.
#[derive(Debug, Clone)]
pub struct TrimmedCurve {
    /// The supporting curve.
    pub curve: EdgeCurve,
    /// First parameter of the range.
    pub t_start: f64,
    /// Last parameter of the range.
    pub t_end: f64,
}

impl TrimmedCurve {
    /// Creates a trimmed curve.
    #[must_use]
    pub fn new(curve: EdgeCurve, t_start: f64, t_end: f64) -> Self {
        Self {
            curve,
            t_start,
            t_end,
        }
    }

    /// Evaluates the curve at `t`.
    ///
    /// # Errors
    ///
    /// Returns an error if the curve cannot be evaluated.
    pub fn evaluate(&self, t: f64) -> Result<Point3> {
        self.curve.evaluate(t)
    }

    /// Evaluates the middle of the range.
    ///
    /// # Errors
    ///
    /// Returns an error if the curve cannot be evaluated.
    pub fn midpoint(&self) -> Result<Point3> {
        self.curve.evaluate(0.5 * (self.t_start + self.t_end))
    }

    /// Length of the trimmed range in 3D.
    #[must_use]
    pub fn length(&self) -> f64 {
        let span = (self.t_end - self.t_start).abs();
        match &self.curve {
            EdgeCurve::Line(_) => span,
            EdgeCurve::Circle(c) => c.radius() * span,
        }
    }
}

/// Data associated with a topological edge.
///
/// An edge connects two vertices and carries the curve between the
/// parameters `t_start < t_end`. Closed edges (a full circle) use the same
/// vertex at both ends. A degenerate edge collapses to a single point, such
/// as the pole of a sphere, and only exists to close a parametric loop.
#[derive(Debug, Clone)]
pub struct EdgeData {
    /// Start vertex of the edge.
    pub start: VertexId,
    /// End vertex of the edge.
    pub end: VertexId,
    /// The geometric curve defining this edge's shape.
    pub curve: EdgeCurve,
    /// Parameter on the curve corresponding to the start vertex.
    pub t_start: f64,
    /// Parameter on the curve corresponding to the end vertex.
    pub t_end: f64,
    /// Maximum deviation allowed between the curve and the adjacent faces.
    pub tolerance: f64,
    /// Whether the edge is collapsed to a point.
    pub degenerate: bool,
}

impl EdgeData {
    /// Creates an edge with the default tolerance.
    #[must_use]
    pub fn new(start: VertexId, end: VertexId, curve: EdgeCurve, t_start: f64, t_end: f64) -> Self {
        Self {
            start,
            end,
            curve,
            t_start,
            t_end,
            tolerance: PRECISION_CONFUSION,
            degenerate: false,
        }
    }

    /// Creates a degenerate edge sitting on `vertex`.
    #[must_use]
    pub fn degenerated(vertex: VertexId, curve: EdgeCurve) -> Self {
        Self {
            start: vertex,
            end: vertex,
            curve,
            t_start: 0.0,
            t_end: 0.0,
            tolerance: PRECISION_CONFUSION,
            degenerate: true,
        }
    }

    /// Returns whether both ends share one vertex.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.start == self.end && !self.degenerate
    }

    /// Returns the bounded curve of the edge.
    #[must_use]
    pub fn trimmed(&self) -> TrimmedCurve {
        TrimmedCurve::new(self.curve.clone(), self.t_start, self.t_end)
    }

    /// Evaluates the point in the middle of the parameter range.
    ///
    /// # Errors
    ///
    /// Returns an error if the curve cannot be evaluated.
    pub fn midpoint(&self) -> Result<Point3> {
        self.curve.evaluate(0.5 * (self.t_start + self.t_end))
    }
}
