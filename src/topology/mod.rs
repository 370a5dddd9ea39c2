pub mod compound;
pub mod edge;
pub mod face;
pub mod shape;
pub mod shell;
pub mod solid;
pub mod vertex;
pub mod wire;

pub use compound::{CompoundData, CompoundId};
pub use edge::{EdgeCurve, EdgeData, EdgeId, TrimmedCurve};
pub use face::{FaceData, FaceId, FaceSurface};
pub use shape::{Shape, ShapeKind};
pub use shell::{ShellData, ShellId};
pub use solid::{SolidData, SolidId};
pub use vertex::{VertexData, VertexId};
pub use wire::{OrientedEdge, WireData, WireId};

use crate::error::TopologyError;
use slotmap::SlotMap;

/// Central arena that owns all topological entities.
///
/// Entities reference each other via typed IDs (generational indices),
/// avoiding self-referential structures and enabling safe mutation.
#[derive(Debug, Default)]
pub struct TopologyStore {
    vertices: SlotMap<VertexId, VertexData>,
    edges: SlotMap<EdgeId, EdgeData>,
    wires: SlotMap<WireId, WireData>,
    faces: SlotMap<FaceId, FaceData>,
    shells: SlotMap<ShellId, ShellData>,
    solids: SlotMap<SolidId, SolidData>,
    compounds: SlotMap<CompoundId, CompoundData>,
}

impl TopologyStore {
    /// Creates a new, empty topology store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Vertex operations ---

    /// Inserts a vertex and returns its ID.
    pub fn add_vertex(&mut self, data: VertexData) -> VertexId {
        self.vertices.insert(data)
    }

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData, TopologyError> {
        self.vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Returns a mutable reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut VertexData, TopologyError> {
        self.vertices
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    // --- Edge operations ---

    /// Inserts an edge and returns its ID.
    pub fn add_edge(&mut self, data: EdgeData) -> EdgeId {
        self.edges.insert(data)
    }

    /// Returns a reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeData, TopologyError> {
        self.edges
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    /// Returns a mutable reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn edge_mut(&mut self, id: EdgeId) -> Result<&mut EdgeData, TopologyError> {
        self.edges
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    // --- Wire operations ---

    /// Inserts a wire and returns its ID.
    pub fn add_wire(&mut self, data: WireData) -> WireId {
        self.wires.insert(data)
    }

    /// Returns a reference to the wire data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn wire(&self, id: WireId) -> Result<&WireData, TopologyError> {
        self.wires
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("wire".into()))
    }

    /// Returns a mutable reference to the wire data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn wire_mut(&mut self, id: WireId) -> Result<&mut WireData, TopologyError> {
        self.wires
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("wire".into()))
    }

    // --- Face operations ---

    /// Inserts a face and returns its ID.
    pub fn add_face(&mut self, data: FaceData) -> FaceId {
        self.faces.insert(data)
    }

    /// Returns a reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn face(&self, id: FaceId) -> Result<&FaceData, TopologyError> {
        self.faces
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))
    }

    /// Returns a mutable reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn face_mut(&mut self, id: FaceId) -> Result<&mut FaceData, TopologyError> {
        self.faces
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))
    }

    // --- Shell operations ---

    /// Inserts a shell and returns its ID.
    pub fn add_shell(&mut self, data: ShellData) -> ShellId {
        self.shells.insert(data)
    }

    /// Returns a reference to the shell data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn shell(&self, id: ShellId) -> Result<&ShellData, TopologyError> {
        self.shells
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("shell".into()))
    }

    /// Returns a mutable reference to the shell data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn shell_mut(&mut self, id: ShellId) -> Result<&mut ShellData, TopologyError> {
        self.shells
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("shell".into()))
    }

    // --- Solid operations ---

    /// Inserts a solid and returns its ID.
    pub fn add_solid(&mut self, data: SolidData) -> SolidId {
        self.solids.insert(data)
    }

    /// Returns a reference to the solid data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn solid(&self, id: SolidId) -> Result<&SolidData, TopologyError> {
        self.solids
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("solid".into()))
    }

    /// Returns a mutable reference to the solid data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn solid_mut(&mut self, id: SolidId) -> Result<&mut SolidData, TopologyError> {
        self.solids
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("solid".into()))
    }

    // --- Compound operations ---

    /// Inserts a compound and returns its ID.
    pub fn add_compound(&mut self, data: CompoundData) -> CompoundId {
        self.compounds.insert(data)
    }

    /// Returns a reference to the compound data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn compound(&self, id: CompoundId) -> Result<&CompoundData, TopologyError> {
        self.compounds
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("compound".into()))
    }

    // --- Traversal ---

    /// Returns whether the shape exists in the store.
    #[must_use]
    pub fn contains(&self, shape: Shape) -> bool {
        match shape {
            Shape::Vertex(id) => self.vertices.contains_key(id),
            Shape::Edge(id) => self.edges.contains_key(id),
            Shape::Wire(id) => self.wires.contains_key(id),
            Shape::Face(id) => self.faces.contains_key(id),
            Shape::Shell(id) => self.shells.contains_key(id),
            Shape::Solid(id) => self.solids.contains_key(id),
            Shape::Compound(id) => self.compounds.contains_key(id),
        }
    }

    /// Returns the direct sub-shapes of a shape, in storage order.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape or one of its children is missing.
    pub fn sub_shapes(&self, shape: Shape) -> Result<Vec<Shape>, TopologyError> {
        Ok(match shape {
            Shape::Vertex(_) => Vec::new(),
            Shape::Edge(id) => {
                let edge = self.edge(id)?;
                if edge.start == edge.end {
                    vec![Shape::Vertex(edge.start)]
                } else {
                    vec![Shape::Vertex(edge.start), Shape::Vertex(edge.end)]
                }
            }
            Shape::Wire(id) => self.wire(id)?.edges.iter().map(|oe| Shape::Edge(oe.edge)).collect(),
            Shape::Face(id) => self.face(id)?.wires().map(Shape::Wire).collect(),
            Shape::Shell(id) => self.shell(id)?.faces.iter().map(|&f| Shape::Face(f)).collect(),
            Shape::Solid(id) => self.solid(id)?.shells().map(Shape::Shell).collect(),
            Shape::Compound(id) => self.compound(id)?.shapes.clone(),
        })
    }

    /// Collects every face reachable from `shape`, without duplicates.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced entity is missing.
    pub fn faces_of(&self, shape: Shape) -> Result<Vec<FaceId>, TopologyError> {
        let mut out = Vec::new();
        self.collect_faces(shape, &mut out)?;
        Ok(out)
    }

    fn collect_faces(&self, shape: Shape, out: &mut Vec<FaceId>) -> Result<(), TopologyError> {
        match shape {
            Shape::Face(id) => {
                if !out.contains(&id) {
                    out.push(id);
                }
            }
            Shape::Shell(_) | Shape::Solid(_) | Shape::Compound(_) => {
                for child in self.sub_shapes(shape)? {
                    self.collect_faces(child, out)?;
                }
            }
            Shape::Vertex(_) | Shape::Edge(_) | Shape::Wire(_) => {}
        }
        Ok(())
    }

    /// Collects every solid reachable from `shape`.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced compound is missing.
    pub fn solids_of(&self, shape: Shape) -> Result<Vec<SolidId>, TopologyError> {
        match shape {
            Shape::Solid(id) => Ok(vec![id]),
            Shape::Compound(id) => {
                let mut out = Vec::new();
                for &child in &self.compound(id)?.shapes {
                    out.extend(self.solids_of(child)?);
                }
                Ok(out)
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Returns all oriented edges of a face, outer wire first.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or one of its wires is missing.
    pub fn face_edges(&self, face: FaceId) -> Result<Vec<OrientedEdge>, TopologyError> {
        let data = self.face(face)?;
        let mut out = Vec::new();
        for wire in data.wires() {
            out.extend_from_slice(&self.wire(wire)?.edges);
        }
        Ok(out)
    }

    /// Returns the `(first, last)` vertices of an edge as traversed.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is missing.
    pub fn oriented_vertices(
        &self,
        oe: OrientedEdge,
    ) -> Result<(VertexId, VertexId), TopologyError> {
        let edge = self.edge(oe.edge)?;
        Ok(if oe.forward {
            (edge.start, edge.end)
        } else {
            (edge.end, edge.start)
        })
    }
}
