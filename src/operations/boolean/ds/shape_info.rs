use crate::math::Point3;
use crate::operations::query::{Aabb, FaceLoops};
use crate::topology::{FaceSurface, Shape, ShapeKind, TrimmedCurve};

/// Geometry of a vertex as seen by the intersection stages.
#[derive(Debug, Clone)]
pub struct VertexGeometry {
    /// Position.
    pub point: Point3,
    /// Radius of the tolerance sphere.
    pub tolerance: f64,
}

/// Geometry of an edge as seen by the intersection stages.
#[derive(Debug, Clone)]
pub struct EdgeGeometry {
    /// Bounded curve of the edge.
    pub curve: TrimmedCurve,
    /// Edge tolerance.
    pub tolerance: f64,
    /// Collapsed to a point (pole of a sphere).
    pub degenerate: bool,
    /// DS indices of the start and end vertices.
    pub vertices: (usize, usize),
}

/// Geometry of a face as seen by the intersection stages.
#[derive(Debug, Clone)]
pub struct FaceGeometry {
    /// Supporting surface.
    pub surface: FaceSurface,
    /// Orientation of the face relative to its surface.
    pub same_sense: bool,
    /// Face tolerance.
    pub tolerance: f64,
    /// Boundary in parameter space, for point-in-face tests.
    pub loops: FaceLoops,
}

/// Cached geometry of a DS shape.
#[derive(Debug, Clone)]
pub enum ShapeGeometry {
    /// A vertex.
    Vertex(VertexGeometry),
    /// An edge.
    Edge(EdgeGeometry),
    /// A face.
    Face(Box<FaceGeometry>),
    /// Wires, shells, solids and compounds carry no geometry of their own.
    Container,
}

/// One entry of the DS shape list.
#[derive(Debug, Clone)]
pub struct ShapeInfo {
    /// The topology handle, `None` for shapes created by the filler.
    pub shape: Option<Shape>,
    /// The shape type.
    pub kind: ShapeKind,
    /// DS indices of the direct sub-shapes.
    pub sub_shapes: Vec<usize>,
    /// Index of the argument the shape came from, `None` for new shapes.
    pub rank: Option<usize>,
    /// Box enlarged by the shape tolerance.
    pub bbox: Aabb,
    /// Cached geometry.
    pub geometry: ShapeGeometry,
}

impl ShapeInfo {
    /// Returns `true` for degenerate edges.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        matches!(&self.geometry, ShapeGeometry::Edge(e) if e.degenerate)
    }

    /// Tolerance of vertices, edges and faces; zero for containers.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        match &self.geometry {
            ShapeGeometry::Vertex(v) => v.tolerance,
            ShapeGeometry::Edge(e) => e.tolerance,
            ShapeGeometry::Face(f) => f.tolerance,
            ShapeGeometry::Container => 0.0,
        }
    }
}
