use std::collections::BTreeSet;

use super::pave::PaveBlockId;

/// What the filler learned about one face.
///
/// `On` holds the blocks and vertices of the face boundary, `In` those of
/// other arguments lying inside the face, and `Sc` the section blocks and
/// vertices produced by face/face intersections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaceInfo {
    /// Blocks of the face's own edges.
    pub pave_blocks_on: BTreeSet<PaveBlockId>,
    /// Blocks of foreign edges lying inside the face.
    pub pave_blocks_in: BTreeSet<PaveBlockId>,
    /// Section blocks.
    pub pave_blocks_sc: BTreeSet<PaveBlockId>,
    /// Vertices of the boundary.
    pub vertices_on: BTreeSet<usize>,
    /// Foreign vertices inside the face.
    pub vertices_in: BTreeSet<usize>,
    /// Section vertices.
    pub vertices_sc: BTreeSet<usize>,
}

impl FaceInfo {
    /// Every vertex known to lie on or in the face.
    pub fn all_vertices(&self) -> impl Iterator<Item = usize> + '_ {
        self.vertices_on
            .iter()
            .chain(&self.vertices_in)
            .chain(&self.vertices_sc)
            .copied()
    }

    /// Blocks that cut the face: foreign in-edges and sections.
    pub fn cutting_blocks(&self) -> impl Iterator<Item = PaveBlockId> + '_ {
        self.pave_blocks_in
            .iter()
            .chain(&self.pave_blocks_sc)
            .copied()
    }
}
