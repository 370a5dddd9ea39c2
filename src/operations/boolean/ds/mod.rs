//! The intersection data structure shared by every stage of the pipeline.
//!
//! The DS indexes every argument and its sub-shapes with a plain integer,
//! caches their geometry and collects what the filler learns: same-domain
//! vertices, pave blocks and common blocks, interferences and per-face
//! information. Vertices and edges created by the filler live only here
//! until the builder turns them into topology.

mod face_info;
mod interference;
mod pave;
mod pave_blocks;
mod shape_info;

pub use face_info::FaceInfo;
pub use interference::{
    EdgeEdgeSupport, EdgeFaceSupport, InterfEE, InterfEF, InterfFF, InterfVE, InterfVF, InterfVV,
    SectionCurve, State, Transition,
};
pub use pave::{BlockSource, CommonBlock, CommonBlockId, Pave, PaveBlock, PaveBlockId, ShrunkData};
pub use shape_info::{EdgeGeometry, FaceGeometry, ShapeGeometry, ShapeInfo, VertexGeometry};

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ops::Range;

use slotmap::SlotMap;
use tracing::debug;

use crate::error::{BopError, Result};
use crate::math::{Point2, Point3};
use crate::operations::query::{curve_box, face_box, Aabb, FaceLoops};
use crate::topology::{Shape, ShapeKind, TopologyStore, TrimmedCurve};

/// Minimum number of arguments of a Boolean run.
pub const MIN_ARGUMENTS: usize = 2;

/// A compact, comparable digest of a filled DS.
///
/// Two runs over the same inputs and options produce equal summaries.
#[derive(Debug, Clone, PartialEq)]
pub struct DsSummary {
    /// Number of DS shapes, new ones included.
    pub shapes: usize,
    /// Interference counts in VV, VE, EE, VF, EF, FF order.
    pub interferences: [usize; 6],
    /// Paves of every edge, by edge index.
    pub edge_paves: Vec<(usize, Vec<(usize, f64)>)>,
    /// Number of common blocks.
    pub common_blocks: usize,
    /// Number of section blocks.
    pub section_blocks: usize,
}

/// The shared intersection store.
#[derive(Debug, Default)]
pub struct Ds {
    shapes: Vec<ShapeInfo>,
    index: HashMap<Shape, usize>,
    arguments: Vec<Shape>,
    ranges: Vec<Range<usize>>,
    same_domain: HashMap<usize, usize>,
    pave_blocks: SlotMap<PaveBlockId, PaveBlock>,
    edge_pave_blocks: BTreeMap<usize, Vec<PaveBlockId>>,
    common_blocks: SlotMap<CommonBlockId, CommonBlock>,
    face_infos: BTreeMap<usize, FaceInfo>,
    interf_vv: Vec<InterfVV>,
    interf_ve: Vec<InterfVE>,
    interf_ee: Vec<InterfEE>,
    interf_vf: Vec<InterfVF>,
    interf_ef: Vec<InterfEF>,
    interf_ff: Vec<InterfFF>,
    interfering: HashSet<(usize, usize)>,
    increased: BTreeSet<usize>,
    pcurves: HashMap<(usize, usize), Vec<Point2>>,
    fuzzy: f64,
}

impl Ds {
    /// Creates an empty DS.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops everything, ready for another run.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Indexes the arguments and all their sub-shapes.
    ///
    /// A sub-shape shared by several arguments is indexed once, under the
    /// first argument that reaches it.
    ///
    /// # Errors
    ///
    /// Returns [`BopError::TooFewArguments`] for fewer than two arguments
    /// and [`BopError::NullInputShape`] for missing or empty arguments.
    pub fn init(&mut self, store: &TopologyStore, arguments: &[Shape], fuzzy: f64) -> Result<()> {
        self.clear();
        if arguments.len() < MIN_ARGUMENTS {
            return Err(BopError::TooFewArguments {
                required: MIN_ARGUMENTS,
                given: arguments.len(),
            }
            .into());
        }
        for (rank, &argument) in arguments.iter().enumerate() {
            if !store.contains(argument) {
                let message = format!("argument {rank} is not in the store");
                return Err(BopError::NullInputShape(message).into());
            }
            if let Shape::Compound(id) = argument {
                if store.compound(id)?.shapes.is_empty() {
                    let message = format!("argument {rank} is an empty compound");
                    return Err(BopError::NullInputShape(message).into());
                }
            }
        }
        self.fuzzy = fuzzy;
        self.arguments = arguments.to_vec();
        for (rank, &argument) in arguments.iter().enumerate() {
            let start = self.shapes.len();
            self.append_shape(store, argument, rank)?;
            self.ranges.push(start..self.shapes.len());
        }
        debug!(shapes = self.shapes.len(), arguments = arguments.len(), "DS initialized");
        Ok(())
    }

    fn append_shape(&mut self, store: &TopologyStore, shape: Shape, rank: usize) -> Result<usize> {
        if let Some(&i) = self.index.get(&shape) {
            return Ok(i);
        }
        let children = store.sub_shapes(shape)?;
        let mut sub_shapes = Vec::with_capacity(children.len());
        for child in children {
            sub_shapes.push(self.append_shape(store, child, rank)?);
        }
        let (geometry, bbox) = match shape {
            Shape::Vertex(id) => {
                let v = store.vertex(id)?;
                (
                    ShapeGeometry::Vertex(VertexGeometry {
                        point: v.point,
                        tolerance: v.tolerance,
                    }),
                    Aabb::from_point(v.point).enlarged(v.tolerance),
                )
            }
            Shape::Edge(id) => {
                let e = store.edge(id)?;
                let first = sub_shapes.first().copied().unwrap_or_default();
                let last = sub_shapes.last().copied().unwrap_or(first);
                let bbox = if e.degenerate {
                    self.shapes[first].bbox
                } else {
                    curve_box(&e.trimmed())?
                };
                (
                    ShapeGeometry::Edge(EdgeGeometry {
                        curve: e.trimmed(),
                        tolerance: e.tolerance,
                        degenerate: e.degenerate,
                        vertices: (first, last),
                    }),
                    bbox.enlarged(e.tolerance),
                )
            }
            Shape::Face(id) => {
                let f = store.face(id)?;
                (
                    ShapeGeometry::Face(Box::new(FaceGeometry {
                        surface: f.surface.clone(),
                        same_sense: f.same_sense,
                        tolerance: f.tolerance,
                        loops: FaceLoops::new(store, id)?,
                    })),
                    face_box(store, id)?,
                )
            }
            Shape::Wire(_) | Shape::Shell(_) | Shape::Solid(_) | Shape::Compound(_) => {
                let mut bbox = Aabb::empty();
                for &s in &sub_shapes {
                    bbox.add_box(&self.shapes[s].bbox);
                }
                (ShapeGeometry::Container, bbox)
            }
        };
        let i = self.shapes.len();
        self.shapes.push(ShapeInfo {
            shape: Some(shape),
            kind: shape.kind(),
            sub_shapes,
            rank: Some(rank),
            bbox,
            geometry,
        });
        self.index.insert(shape, i);
        Ok(i)
    }

    /// The arguments, in rank order.
    #[must_use]
    pub fn arguments(&self) -> &[Shape] {
        &self.arguments
    }

    /// DS indices of the shapes of argument `rank`.
    #[must_use]
    pub fn rank_range(&self, rank: usize) -> Range<usize> {
        self.ranges.get(rank).cloned().unwrap_or(0..0)
    }

    /// Number of DS shapes, new ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns `true` before [`Ds::init`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Fuzzy value of the run.
    #[must_use]
    pub fn fuzzy(&self) -> f64 {
        self.fuzzy
    }

    /// Entry `i` of the shape list.
    ///
    /// # Errors
    ///
    /// Returns an error if `i` is out of range.
    pub fn shape_info(&self, i: usize) -> Result<&ShapeInfo> {
        self.shapes
            .get(i)
            .ok_or_else(|| BopError::IntersectionFailed(format!("no DS shape {i}")).into())
    }

    /// DS index of a topology handle.
    #[must_use]
    pub fn index_of(&self, shape: Shape) -> Option<usize> {
        self.index.get(&shape).copied()
    }

    /// Argument rank of shape `i`, `None` for new shapes.
    #[must_use]
    pub fn rank(&self, i: usize) -> Option<usize> {
        self.shapes.get(i).and_then(|s| s.rank)
    }

    /// Returns `true` for shapes created by the filler.
    #[must_use]
    pub fn is_new_shape(&self, i: usize) -> bool {
        self.shapes.get(i).is_some_and(|s| s.shape.is_none())
    }

    /// All indices of one shape type, in index order.
    #[must_use]
    pub fn indices_of_kind(&self, kind: ShapeKind) -> Vec<usize> {
        (0..self.shapes.len()).filter(|&i| self.shapes[i].kind == kind).collect()
    }

    /// Vertex geometry of shape `i`.
    ///
    /// # Errors
    ///
    /// Returns an error if `i` is not a vertex.
    pub fn vertex(&self, i: usize) -> Result<&VertexGeometry> {
        match &self.shape_info(i)?.geometry {
            ShapeGeometry::Vertex(v) => Ok(v),
            _ => Err(BopError::IntersectionFailed(format!("DS shape {i} is not a vertex")).into()),
        }
    }

    /// Edge geometry of shape `i`.
    ///
    /// # Errors
    ///
    /// Returns an error if `i` is not an edge.
    pub fn edge(&self, i: usize) -> Result<&EdgeGeometry> {
        match &self.shape_info(i)?.geometry {
            ShapeGeometry::Edge(e) => Ok(e),
            _ => Err(BopError::IntersectionFailed(format!("DS shape {i} is not an edge")).into()),
        }
    }

    /// Face geometry of shape `i`.
    ///
    /// # Errors
    ///
    /// Returns an error if `i` is not a face.
    pub fn face(&self, i: usize) -> Result<&FaceGeometry> {
        match &self.shape_info(i)?.geometry {
            ShapeGeometry::Face(f) => Ok(f),
            _ => Err(BopError::IntersectionFailed(format!("DS shape {i} is not a face")).into()),
        }
    }

    /// Position of vertex `i`.
    ///
    /// # Errors
    ///
    /// Returns an error if `i` is not a vertex.
    pub fn vertex_point(&self, i: usize) -> Result<Point3> {
        Ok(self.vertex(i)?.point)
    }

    /// Tolerance of shape `i`, zero for containers and unknown indices.
    #[must_use]
    pub fn tolerance(&self, i: usize) -> f64 {
        self.shapes.get(i).map_or(0.0, ShapeInfo::tolerance)
    }

    /// Edges of face `f`, each once, in wire order.
    #[must_use]
    pub fn face_edges(&self, f: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let Some(face) = self.shapes.get(f) else {
            return out;
        };
        for &wire in &face.sub_shapes {
            for &edge in &self.shapes[wire].sub_shapes {
                if !out.contains(&edge) {
                    out.push(edge);
                }
            }
        }
        out
    }

    /// Vertices of the boundary of face `f`, resolved to their same-domain vertex.
    #[must_use]
    pub fn face_vertices(&self, f: usize) -> BTreeSet<usize> {
        self.face_edges(f)
            .into_iter()
            .flat_map(|e| self.shapes[e].sub_shapes.clone())
            .map(|v| self.same_domain_index(v))
            .collect()
    }

    /// Faces of argument `rank`.
    #[must_use]
    pub fn faces_of_rank(&self, rank: usize) -> Vec<usize> {
        self.rank_range(rank)
            .filter(|&i| self.shapes[i].kind == ShapeKind::Face)
            .collect()
    }

    /// Adds a vertex created by the filler.
    pub fn append_vertex(&mut self, point: Point3, tolerance: f64) -> usize {
        let i = self.shapes.len();
        self.shapes.push(ShapeInfo {
            shape: None,
            kind: ShapeKind::Vertex,
            sub_shapes: Vec::new(),
            rank: None,
            bbox: Aabb::from_point(point).enlarged(tolerance),
            geometry: ShapeGeometry::Vertex(VertexGeometry { point, tolerance }),
        });
        i
    }

    /// Adds an edge created by the filler.
    ///
    /// # Errors
    ///
    /// Returns an error if the curve cannot be evaluated.
    pub fn append_edge(
        &mut self,
        curve: TrimmedCurve,
        tolerance: f64,
        v1: usize,
        v2: usize,
    ) -> Result<usize> {
        let bbox = curve_box(&curve)?.enlarged(tolerance);
        let i = self.shapes.len();
        let sub_shapes = if v1 == v2 { vec![v1] } else { vec![v1, v2] };
        self.shapes.push(ShapeInfo {
            shape: None,
            kind: ShapeKind::Edge,
            sub_shapes,
            rank: None,
            bbox,
            geometry: ShapeGeometry::Edge(EdgeGeometry {
                curve,
                tolerance,
                degenerate: false,
                vertices: (v1, v2),
            }),
        });
        Ok(i)
    }

    /// Raises the tolerance of a vertex, edge or face to `tolerance`.
    ///
    /// Tolerances never decrease; the shape is remembered as increased.
    pub fn increase_tolerance(&mut self, i: usize, tolerance: f64) {
        let Some(info) = self.shapes.get_mut(i) else {
            return;
        };
        let slot = match &mut info.geometry {
            ShapeGeometry::Vertex(v) => &mut v.tolerance,
            ShapeGeometry::Edge(e) => &mut e.tolerance,
            ShapeGeometry::Face(f) => &mut f.tolerance,
            ShapeGeometry::Container => return,
        };
        if tolerance > *slot {
            let grow = tolerance - *slot;
            *slot = tolerance;
            info.bbox.enlarge(grow);
            self.increased.insert(i);
        }
    }

    /// Shapes whose tolerance was raised.
    #[must_use]
    pub fn increased(&self) -> &BTreeSet<usize> {
        &self.increased
    }

    /// Records that shape `i` is represented by `sd`.
    pub fn add_same_domain(&mut self, i: usize, sd: usize) {
        if i != sd {
            self.same_domain.insert(i, sd);
        }
    }

    /// Follows the same-domain chain of `i` to its representative.
    #[must_use]
    pub fn same_domain_index(&self, i: usize) -> usize {
        let mut current = i;
        for _ in 0..self.shapes.len().max(1) {
            match self.same_domain.get(&current) {
                Some(&next) if next != current => current = next,
                _ => break,
            }
        }
        current
    }

    /// Returns `true` if `i` is represented by another shape.
    #[must_use]
    pub fn has_same_domain(&self, i: usize) -> bool {
        self.same_domain.contains_key(&i)
    }

    /// Shapes represented by `sd`, directly or through a chain.
    #[must_use]
    pub fn same_domain_members(&self, sd: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .same_domain
            .keys()
            .copied()
            .filter(|&i| self.same_domain_index(i) == sd)
            .collect();
        out.sort_unstable();
        out
    }

    fn mark_interfering(&mut self, i: usize, j: usize) {
        self.interfering.insert((i.min(j), i.max(j)));
    }

    /// Returns `true` if an interference between `i` and `j` was recorded.
    #[must_use]
    pub fn has_interf(&self, i: usize, j: usize) -> bool {
        self.interfering.contains(&(i.min(j), i.max(j)))
    }

    /// Records a vertex/vertex interference.
    pub fn add_interf_vv(&mut self, interf: InterfVV) {
        self.mark_interfering(interf.vertex1, interf.vertex2);
        self.interf_vv.push(interf);
    }

    /// Records a vertex/edge interference.
    pub fn add_interf_ve(&mut self, interf: InterfVE) {
        self.mark_interfering(interf.vertex, interf.edge);
        self.interf_ve.push(interf);
    }

    /// Records an edge/edge interference.
    pub fn add_interf_ee(&mut self, interf: InterfEE) {
        self.mark_interfering(interf.edge1, interf.edge2);
        self.interf_ee.push(interf);
    }

    /// Records a vertex/face interference.
    pub fn add_interf_vf(&mut self, interf: InterfVF) {
        self.mark_interfering(interf.vertex, interf.face);
        self.interf_vf.push(interf);
    }

    /// Records an edge/face interference.
    pub fn add_interf_ef(&mut self, interf: InterfEF) {
        self.mark_interfering(interf.edge, interf.face);
        self.interf_ef.push(interf);
    }

    /// Records a face/face interference and returns its index.
    pub fn add_interf_ff(&mut self, interf: InterfFF) -> usize {
        self.mark_interfering(interf.face1, interf.face2);
        self.interf_ff.push(interf);
        self.interf_ff.len() - 1
    }

    /// Vertex/vertex interferences.
    #[must_use]
    pub fn interf_vv(&self) -> &[InterfVV] {
        &self.interf_vv
    }

    /// Vertex/edge interferences.
    #[must_use]
    pub fn interf_ve(&self) -> &[InterfVE] {
        &self.interf_ve
    }

    /// Edge/edge interferences.
    #[must_use]
    pub fn interf_ee(&self) -> &[InterfEE] {
        &self.interf_ee
    }

    /// Vertex/face interferences.
    #[must_use]
    pub fn interf_vf(&self) -> &[InterfVF] {
        &self.interf_vf
    }

    /// Edge/face interferences.
    #[must_use]
    pub fn interf_ef(&self) -> &[InterfEF] {
        &self.interf_ef
    }

    /// Face/face interferences.
    #[must_use]
    pub fn interf_ff(&self) -> &[InterfFF] {
        &self.interf_ff
    }

    /// Mutable access to the face/face interferences.
    pub fn interf_ff_mut(&mut self) -> &mut [InterfFF] {
        &mut self.interf_ff
    }

    /// Returns `true` if shapes of different arguments interfere anywhere.
    #[must_use]
    pub fn has_cross_rank_interferences(&self) -> bool {
        let cross = |a: usize, b: usize| {
            let (ra, rb) = (self.rank(a), self.rank(b));
            ra.is_none() || rb.is_none() || ra != rb
        };
        self.interf_vv.iter().any(|i| cross(i.vertex1, i.vertex2))
            || self.interf_ve.iter().any(|i| cross(i.vertex, i.edge))
            || self.interf_ee.iter().any(|i| cross(i.edge1, i.edge2))
            || self.interf_vf.iter().any(|i| cross(i.vertex, i.face))
            || self.interf_ef.iter().any(|i| cross(i.edge, i.face))
            || self
                .interf_ff
                .iter()
                .any(|i| i.tangent || !i.curves.is_empty() || !i.points.is_empty())
    }

    /// Information collected for face `f`.
    #[must_use]
    pub fn face_info(&self, f: usize) -> Option<&FaceInfo> {
        self.face_infos.get(&f)
    }

    /// Information of face `f`, created empty on first access.
    pub fn face_info_mut(&mut self, f: usize) -> &mut FaceInfo {
        self.face_infos.entry(f).or_default()
    }

    /// Faces that have information.
    #[must_use]
    pub fn faces_with_info(&self) -> Vec<usize> {
        self.face_infos.keys().copied().collect()
    }

    /// Stores the parameter-space polyline of edge `edge` on face `face`.
    pub fn set_pcurve(&mut self, edge: usize, face: usize, uv: Vec<Point2>) {
        self.pcurves.insert((edge, face), uv);
    }

    /// Parameter-space polyline of edge `edge` on face `face`, if computed.
    #[must_use]
    pub fn pcurve(&self, edge: usize, face: usize) -> Option<&[Point2]> {
        self.pcurves.get(&(edge, face)).map(Vec::as_slice)
    }

    /// Digest used to compare runs.
    #[must_use]
    pub fn summary(&self) -> DsSummary {
        let edge_paves = self
            .edge_pave_blocks
            .keys()
            .map(|&e| {
                let paves =
                    self.paves_of_edge(e).into_iter().map(|p| (p.vertex, p.param)).collect();
                (e, paves)
            })
            .collect();
        DsSummary {
            shapes: self.shapes.len(),
            interferences: [
                self.interf_vv.len(),
                self.interf_ve.len(),
                self.interf_ee.len(),
                self.interf_vf.len(),
                self.interf_ef.len(),
                self.interf_ff.len(),
            ],
            edge_paves,
            common_blocks: self.common_blocks.len(),
            section_blocks: self
                .interf_ff
                .iter()
                .flat_map(|ff| &ff.curves)
                .map(|c| c.pave_blocks.len())
                .sum(),
        }
    }
}
