use std::collections::BTreeSet;

use crate::operations::query::Aabb;

slotmap::new_key_type! {
    /// Identifier of a pave block in the DS pool.
    pub struct PaveBlockId;
}

slotmap::new_key_type! {
    /// Identifier of a common block in the DS pool.
    pub struct CommonBlockId;
}

/// A vertex sitting on an edge or section curve at parameter `param`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pave {
    /// DS index of the vertex.
    pub vertex: usize,
    /// Curve parameter.
    pub param: f64,
}

impl Pave {
    /// Creates a pave.
    #[must_use]
    pub fn new(vertex: usize, param: f64) -> Self {
        Self { vertex, param }
    }
}

/// Where the curve of a pave block comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSource {
    /// A part of an argument edge (DS index).
    Edge(usize),
    /// A part of a face/face section curve.
    Section {
        /// Index of the face/face interference.
        interference: usize,
        /// Index of the curve inside the interference.
        curve: usize,
    },
}

/// The pave range shrunk by the end vertex tolerances.
#[derive(Debug, Clone)]
pub struct ShrunkData {
    /// Shrunk first parameter.
    pub t1: f64,
    /// Shrunk last parameter.
    pub t2: f64,
    /// Box of the shrunk range.
    pub bbox: Aabb,
    /// `false` when the shrunk ends do not clear the vertex tolerances.
    pub is_splittable: bool,
}

/// The interval between two consecutive paves of one edge or curve.
#[derive(Debug, Clone)]
pub struct PaveBlock {
    /// Supporting curve.
    pub source: BlockSource,
    /// First pave.
    pub pave1: Pave,
    /// Last pave.
    pub pave2: Pave,
    /// Paves found strictly inside the block, pending a split.
    pub ext_paves: Vec<Pave>,
    /// Range clear of the vertex tolerances, once computed.
    pub shrunk: Option<ShrunkData>,
    /// DS index of the edge standing for this block in the result.
    pub split_edge: Option<usize>,
    /// Membership in a common block.
    pub common_block: Option<CommonBlockId>,
}

impl PaveBlock {
    /// Creates a block between two paves.
    #[must_use]
    pub fn new(source: BlockSource, pave1: Pave, pave2: Pave) -> Self {
        Self {
            source,
            pave1,
            pave2,
            ext_paves: Vec::new(),
            shrunk: None,
            split_edge: None,
            common_block: None,
        }
    }

    /// The original edge, for blocks of argument edges.
    #[must_use]
    pub fn edge(&self) -> Option<usize> {
        match self.source {
            BlockSource::Edge(e) => Some(e),
            BlockSource::Section { .. } => None,
        }
    }

    /// Parameter range `(first, last)`.
    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        (self.pave1.param, self.pave2.param)
    }

    /// Both end vertices, smaller index first.
    #[must_use]
    pub fn vertex_key(&self) -> (usize, usize) {
        let (a, b) = (self.pave1.vertex, self.pave2.vertex);
        (a.min(b), a.max(b))
    }

    /// Returns `true` if `t` lies strictly inside the range, `eps` away from the ends.
    #[must_use]
    pub fn contains_param(&self, t: f64, eps: f64) -> bool {
        t > self.pave1.param + eps && t < self.pave2.param - eps
    }

    /// Records a pave found inside the block.
    ///
    /// Returns `false` for a pave already recorded, by vertex or parameter.
    pub fn append_ext_pave(&mut self, pave: Pave, eps: f64) -> bool {
        let duplicate = self
            .ext_paves
            .iter()
            .any(|p| p.vertex == pave.vertex || (p.param - pave.param).abs() <= eps);
        if !duplicate {
            self.ext_paves.push(pave);
        }
        !duplicate
    }
}

/// Pave blocks proven to coincide, plus the faces they lie on.
///
/// The first block is the representative used for the shared result edge.
#[derive(Debug, Clone, Default)]
pub struct CommonBlock {
    /// Member blocks, representative first.
    pub pave_blocks: Vec<PaveBlockId>,
    /// DS indices of faces the block lies in.
    pub faces: BTreeSet<usize>,
}
