use crate::math::Point2;
use crate::operations::query::Aabb;
use crate::topology::TrimmedCurve;

use super::pave::{Pave, PaveBlockId};

/// Position of a point relative to a face or solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Inside.
    In,
    /// Outside.
    Out,
    /// On the boundary.
    On,
}

/// States of an edge just before and just after it crosses a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State before the crossing point.
    pub before: State,
    /// State after the crossing point.
    pub after: State,
}

/// Two vertices merged into a new same-domain vertex.
#[derive(Debug, Clone)]
pub struct InterfVV {
    /// First vertex.
    pub vertex1: usize,
    /// Second vertex.
    pub vertex2: usize,
    /// The same-domain vertex standing for both.
    pub new_vertex: usize,
}

/// A vertex lying on an edge.
#[derive(Debug, Clone)]
pub struct InterfVE {
    /// The vertex.
    pub vertex: usize,
    /// The edge.
    pub edge: usize,
    /// Parameter of the vertex on the edge curve.
    pub param: f64,
}

/// Geometric support of an edge/edge interference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeEdgeSupport {
    /// A crossing at `t1` on the first edge and `t2` on the second.
    Point {
        /// Parameter on the first edge.
        t1: f64,
        /// Parameter on the second edge.
        t2: f64,
    },
    /// The edges coincide over the given ranges.
    Overlap {
        /// Range on the first edge.
        t1: (f64, f64),
        /// Range on the second edge.
        t2: (f64, f64),
    },
}

/// An edge/edge crossing or coincidence.
#[derive(Debug, Clone)]
pub struct InterfEE {
    /// First edge.
    pub edge1: usize,
    /// Second edge.
    pub edge2: usize,
    /// Where the edges meet.
    pub support: EdgeEdgeSupport,
    /// Vertex created for a crossing, if no existing vertex was reused.
    pub new_vertex: Option<usize>,
}

/// A vertex lying inside a face.
#[derive(Debug, Clone)]
pub struct InterfVF {
    /// The vertex.
    pub vertex: usize,
    /// The face.
    pub face: usize,
    /// Surface parameters of the vertex.
    pub uv: Point2,
}

/// Geometric support of an edge/face interference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeFaceSupport {
    /// The edge crosses the face at `t`.
    Point {
        /// Parameter on the edge.
        t: f64,
        /// Surface parameters of the crossing.
        uv: Point2,
    },
    /// The edge lies on the face between `t1` and `t2`.
    Overlap {
        /// First parameter.
        t1: f64,
        /// Last parameter.
        t2: f64,
    },
}

/// An edge crossing or lying on a face.
#[derive(Debug, Clone)]
pub struct InterfEF {
    /// The edge.
    pub edge: usize,
    /// The face.
    pub face: usize,
    /// Where they meet.
    pub support: EdgeFaceSupport,
    /// Vertex created or reused at a crossing.
    pub new_vertex: Option<usize>,
    /// Edge states around a crossing.
    pub transition: Option<Transition>,
}

/// A face/face intersection curve.
#[derive(Debug, Clone)]
pub struct SectionCurve {
    /// The bounded 3D curve.
    pub curve: TrimmedCurve,
    /// Tolerance of the section.
    pub tolerance: f64,
    /// Box of the bounded curve.
    pub bbox: Aabb,
    /// Paves collected on the curve, sorted after post-treatment.
    pub paves: Vec<Pave>,
    /// Section blocks built from the paves.
    pub pave_blocks: Vec<PaveBlockId>,
}

/// The intersection of two faces.
#[derive(Debug, Clone)]
pub struct InterfFF {
    /// First face.
    pub face1: usize,
    /// Second face.
    pub face2: usize,
    /// The supporting surfaces coincide.
    pub tangent: bool,
    /// Intersection curves.
    pub curves: Vec<SectionCurve>,
    /// Isolated touching points, as vertex indices.
    pub points: Vec<usize>,
}
