//! Topology standing for DS vertices and edges in the result.

use std::collections::HashMap;

use crate::error::Result;
use crate::topology::{EdgeData, EdgeId, Shape, TopologyStore, VertexData, VertexId};

use crate::operations::boolean::ds::Ds;

/// Images of DS vertices and edges, created on first use.
///
/// An argument vertex or edge is reused as long as it still describes the
/// DS entry: same end vertices and no tolerance growth. In destructive mode
/// a grown tolerance is written back into the argument instead.
#[derive(Debug, Default)]
pub(super) struct Images {
    vertices: HashMap<usize, VertexId>,
    edges: HashMap<usize, EdgeId>,
    destructive: bool,
}

impl Images {
    pub(super) fn new(destructive: bool) -> Self {
        Self {
            destructive,
            ..Self::default()
        }
    }

    pub(super) fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
    }

    /// Image of DS vertex `i`, shared by its whole same-domain group.
    pub(super) fn vertex(
        &mut self,
        ds: &Ds,
        store: &mut TopologyStore,
        i: usize,
    ) -> Result<VertexId> {
        let sd = ds.same_domain_index(i);
        if let Some(&id) = self.vertices.get(&sd) {
            return Ok(id);
        }
        let geometry = ds.vertex(sd)?;
        let grown = ds.increased().contains(&sd);
        let id = match ds.shape_info(sd)?.shape {
            Some(Shape::Vertex(id)) if !grown => id,
            Some(Shape::Vertex(id)) if self.destructive => {
                store.vertex_mut(id)?.tolerance = geometry.tolerance;
                id
            }
            _ => store.add_vertex(VertexData::with_tolerance(geometry.point, geometry.tolerance)),
        };
        self.vertices.insert(sd, id);
        Ok(id)
    }

    /// Image of DS edge `e`.
    pub(super) fn edge(&mut self, ds: &Ds, store: &mut TopologyStore, e: usize) -> Result<EdgeId> {
        if let Some(&id) = self.edges.get(&e) {
            return Ok(id);
        }
        let geometry = ds.edge(e)?;
        let start = self.vertex(ds, store, geometry.vertices.0)?;
        let end = if geometry.degenerate {
            start
        } else {
            self.vertex(ds, store, geometry.vertices.1)?
        };
        let original = match ds.shape_info(e)?.shape {
            Some(Shape::Edge(id)) => {
                let data = store.edge(id)?;
                (data.start == start && data.end == end).then_some(id)
            }
            _ => None,
        };
        let grown = ds.increased().contains(&e);
        let id = match original {
            Some(id) if !grown => id,
            Some(id) if self.destructive => {
                store.edge_mut(id)?.tolerance = geometry.tolerance;
                id
            }
            _ if geometry.degenerate => {
                let mut data = EdgeData::degenerated(start, geometry.curve.curve.clone());
                data.tolerance = geometry.tolerance;
                store.add_edge(data)
            }
            _ => {
                let curve = &geometry.curve;
                let mut data =
                    EdgeData::new(start, end, curve.curve.clone(), curve.t_start, curve.t_end);
                data.tolerance = geometry.tolerance;
                store.add_edge(data)
            }
        };
        self.edges.insert(e, id);
        Ok(id)
    }

    /// Returns `true` if DS edge `e` already has an image.
    pub(super) fn has_edge(&self, e: usize) -> bool {
        self.edges.contains_key(&e)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::boolean::filler::PaveFiller;
    use crate::operations::boolean::options::BooleanOptions;
    use crate::operations::creation::MakeBox;
    use crate::topology::ShapeKind;

    #[test]
    fn untouched_edges_are_reused() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let b = MakeBox::new(Point3::new(0.5, 0.5, 0.5), Point3::new(1.5, 1.5, 1.5))
            .execute(&mut store)
            .unwrap();
        let mut filler = PaveFiller::new(vec![a.into(), b.into()], BooleanOptions::default());
        filler.perform(&store).unwrap();
        let ds = filler.ds();
        let mut images = Images::new(false);
        let (mut reused, mut split) = (0, 0);
        for e in ds.indices_of_kind(ShapeKind::Edge) {
            let Some(Shape::Edge(original)) = ds.shape_info(e).unwrap().shape else {
                continue;
            };
            let blocks = ds.pave_blocks_of(e).to_vec();
            for &pb in &blocks {
                let piece = ds.pave_block(ds.real_pave_block(pb)).unwrap().split_edge.unwrap();
                let image = images.edge(ds, &mut store, piece).unwrap();
                assert!(images.has_edge(piece));
                if blocks.len() == 1 {
                    assert_eq!(image, original);
                } else {
                    assert_ne!(image, original);
                }
            }
            if blocks.len() == 1 {
                reused += 1;
            } else {
                split += 1;
            }
        }
        // Three edges of each box run into the other box.
        assert_eq!(split, 6);
        assert_eq!(reused, 18);
    }

    #[test]
    fn same_domain_vertices_share_one_image() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let b = MakeBox::new(Point3::new(1.0, 1.0, 1.0), Point3::new(2.0, 2.0, 2.0))
            .execute(&mut store)
            .unwrap();
        let mut filler = PaveFiller::new(vec![a.into(), b.into()], BooleanOptions::default());
        filler.perform(&store).unwrap();
        let ds = filler.ds();
        let mut images = Images::new(false);
        let shared: Vec<usize> = ds
            .indices_of_kind(ShapeKind::Vertex)
            .into_iter()
            .filter(|&v| ds.has_same_domain(v))
            .collect();
        // Both corners at (1, 1, 1) map onto one new vertex.
        assert_eq!(shared.len(), 2);
        assert_eq!(ds.same_domain_index(shared[0]), ds.same_domain_index(shared[1]));
        let first = images.vertex(ds, &mut store, shared[0]).unwrap();
        let second = images.vertex(ds, &mut store, shared[1]).unwrap();
        assert_eq!(first, second);
    }
}
