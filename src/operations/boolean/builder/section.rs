use std::collections::BTreeSet;

use tracing::debug;

use crate::error::Result;
use crate::topology::{CompoundData, Shape, TopologyStore};

use super::Builder;
use crate::operations::boolean::ds::PaveBlockId;

impl Builder<'_, '_> {
    /// The section of the arguments: edges along face/face intersection
    /// curves, edges lying on another argument, and isolated touching
    /// points.
    pub(super) fn build_section(&mut self, store: &mut TopologyStore) -> Result<Option<Shape>> {
        let filler = self.filler;
        let ds = filler.ds();

        let mut blocks: Vec<PaveBlockId> = Vec::new();
        for ff in ds.interf_ff() {
            for curve in &ff.curves {
                blocks.extend(curve.pave_blocks.iter().map(|&pb| ds.real_pave_block(pb)));
            }
        }
        for (_, cb) in ds.common_blocks() {
            let ranks: BTreeSet<Option<usize>> = cb
                .pave_blocks
                .iter()
                .filter_map(|&pb| ds.pave_block(pb).ok())
                .map(|pb| pb.edge().and_then(|e| ds.rank(e)))
                .collect();
            if !cb.faces.is_empty() || ranks.len() > 1 {
                blocks.extend(cb.pave_blocks.first().copied());
            }
        }

        let mut seen = BTreeSet::new();
        let mut shapes = Vec::new();
        for pb in blocks {
            let Some(e) = ds.pave_block(pb)?.split_edge else {
                continue;
            };
            if seen.insert(e) {
                shapes.push(Shape::Edge(self.images.edge(ds, store, e)?));
            }
        }
        let mut points = BTreeSet::new();
        for ff in ds.interf_ff() {
            for &v in &ff.points {
                if points.insert(ds.same_domain_index(v)) {
                    shapes.push(Shape::Vertex(self.images.vertex(ds, store, v)?));
                }
            }
        }
        debug!(edges = seen.len(), vertices = points.len(), "section built");
        if shapes.is_empty() {
            return Ok(None);
        }
        Ok(Some(Shape::Compound(store.add_compound(CompoundData { shapes }))))
    }
}
