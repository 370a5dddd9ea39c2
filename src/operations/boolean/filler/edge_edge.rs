use std::collections::BTreeSet;

use crate::error::Result;
use crate::math::Point3;
use crate::topology::ShapeKind;

use super::{log_stage, run_pairs, PaveFiller};
use crate::operations::boolean::ds::{EdgeEdgeSupport, InterfEE, Pave, PaveBlockId};
use crate::operations::boolean::iterator::{candidate_pairs, PairScope};
use crate::operations::boolean::oracle::{parameter_tolerance, CurveCurveHit};
use crate::operations::boolean::report::Warning;

#[derive(Clone, Copy)]
struct BlockPair {
    edge1: usize,
    block1: PaveBlockId,
    edge2: usize,
    block2: PaveBlockId,
}

impl PaveFiller<'_> {
    /// Intersects pave blocks of edges of different arguments.
    pub(super) fn perform_ee(&mut self) -> Result<()> {
        let before = self.ds.interf_ee().len();
        let tasks = self.edge_block_pairs()?;

        let ds = &self.ds;
        let oracle = self.oracle;
        let parallel = self.options.parallel;
        let results = run_pairs(parallel, &tasks, |pair| -> Result<Vec<CurveCurveHit>> {
            let c1 = ds.pave_block_curve(pair.block1)?;
            let c2 = ds.pave_block_curve(pair.block2)?;
            let tol = ds.tolerance(pair.edge1).max(ds.tolerance(pair.edge2)) + ds.fuzzy();
            oracle.curve_curve(&c1, &c2, tol)
        });

        let mut merge_pairs = Vec::new();
        let mut new_vertices = Vec::new();
        let mut overlaps = BTreeSet::new();
        for (pair, result) in tasks.iter().zip(results) {
            self.check_cancelled()?;
            let hits = match result {
                Ok(hits) => hits,
                Err(err) => {
                    self.report.add(Warning::IntersectionOfPairOfShapesFailed {
                        index1: pair.edge1,
                        index2: pair.edge2,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            let skip_crossings = self.glue_skips_crossings(pair.edge1, pair.edge2);
            for hit in hits {
                match hit {
                    CurveCurveHit::Point { t1, t2, point } if !skip_crossings => {
                        self.apply_crossing(
                            pair,
                            t1,
                            t2,
                            &point,
                            &mut merge_pairs,
                            &mut new_vertices,
                        )?;
                    }
                    CurveCurveHit::Point { .. } => {}
                    CurveCurveHit::Overlap { t1, t2 } => {
                        self.apply_overlap(pair, t1, t2)?;
                        overlaps.insert((pair.edge1, pair.edge2));
                    }
                }
            }
        }

        self.merge_vertices(&merge_pairs)?;
        self.treat_new_vertices(&new_vertices)?;
        self.split_pave_blocks()?;
        for (e1, e2) in overlaps {
            self.force_common_blocks(e1, e2)?;
        }
        log_stage("edge/edge", before, self.ds.interf_ee().len());
        Ok(())
    }

    fn edge_block_pairs(&self) -> Result<Vec<BlockPair>> {
        let mut tasks = Vec::new();
        let pairs =
            candidate_pairs(&self.ds, ShapeKind::Edge, ShapeKind::Edge, PairScope::CrossArgument);
        for (e1, e2) in pairs {
            for &b1 in self.ds.pave_blocks_of(e1) {
                let pb1 = self.ds.pave_block(b1)?;
                let Some(s1) = pb1.shrunk.as_ref().filter(|s| !s.bbox.is_empty()) else {
                    continue;
                };
                for &b2 in self.ds.pave_blocks_of(e2) {
                    let pb2 = self.ds.pave_block(b2)?;
                    if pb1.common_block.is_some() && pb1.common_block == pb2.common_block {
                        continue;
                    }
                    let Some(s2) = pb2.shrunk.as_ref() else {
                        continue;
                    };
                    if s1.bbox.overlaps(&s2.bbox) {
                        tasks.push(BlockPair {
                            edge1: e1,
                            block1: b1,
                            edge2: e2,
                            block2: b2,
                        });
                    }
                }
            }
        }
        Ok(tasks)
    }

    /// End vertex of block `id` at parameter `t` or near `point`.
    pub(super) fn block_end_near(
        &self,
        id: PaveBlockId,
        t: f64,
        point: &Point3,
    ) -> Result<Option<usize>> {
        let pb = self.ds.pave_block(id)?;
        let curve = self.ds.pave_block_curve(id)?;
        let edge_tol = self.ds.pave_block_tolerance(id)?;
        let mut best: Option<(f64, usize)> = None;
        for pave in [pb.pave1, pb.pave2] {
            let v = self.ds.vertex(pave.vertex)?;
            let d = (v.point - point).norm();
            let eps = parameter_tolerance(&curve.curve, v.tolerance + edge_tol + self.ds.fuzzy());
            if (d <= v.tolerance + self.ds.fuzzy() || (pave.param - t).abs() <= eps)
                && best.is_none_or(|(bd, _)| d < bd)
            {
                best = Some((d, pave.vertex));
            }
        }
        Ok(best.map(|(_, v)| v))
    }

    fn apply_crossing(
        &mut self,
        pair: &BlockPair,
        t1: f64,
        t2: f64,
        point: &Point3,
        merge_pairs: &mut Vec<(usize, usize)>,
        new_vertices: &mut Vec<usize>,
    ) -> Result<()> {
        let end1 = self.block_end_near(pair.block1, t1, point)?;
        let end2 = self.block_end_near(pair.block2, t2, point)?;
        let vertex = match (end1, end2) {
            (Some(a), Some(b)) => {
                if a == b {
                    return Ok(());
                }
                merge_pairs.push((a, b));
                a
            }
            (Some(a), None) => {
                self.put_vertex_on_block(a, pair.edge2, pair.block2, t2)?;
                a
            }
            (None, Some(b)) => {
                self.put_vertex_on_block(b, pair.edge1, pair.block1, t1)?;
                b
            }
            (None, None) => {
                let p1 = self.ds.pave_block_curve(pair.block1)?.evaluate(t1)?;
                let p2 = self.ds.pave_block_curve(pair.block2)?.evaluate(t2)?;
                let tolerance = self
                    .ds
                    .tolerance(pair.edge1)
                    .max(self.ds.tolerance(pair.edge2))
                    .max((p1 - point).norm())
                    .max((p2 - point).norm());
                let nv = self.ds.append_vertex(*point, tolerance);
                self.ds.add_ext_pave(pair.edge1, Pave::new(nv, t1))?;
                self.ds.add_ext_pave(pair.edge2, Pave::new(nv, t2))?;
                new_vertices.push(nv);
                nv
            }
        };
        self.ds.add_interf_ee(InterfEE {
            edge1: pair.edge1,
            edge2: pair.edge2,
            support: EdgeEdgeSupport::Point { t1, t2 },
            new_vertex: Some(vertex),
        });
        Ok(())
    }

    /// Puts vertex `v` on `block` of `edge` at `t`, growing its tolerance
    /// to reach the curve.
    fn put_vertex_on_block(
        &mut self,
        v: usize,
        edge: usize,
        block: PaveBlockId,
        t: f64,
    ) -> Result<()> {
        let foot = self.ds.pave_block_curve(block)?.evaluate(t)?;
        let distance = (self.ds.vertex_point(v)? - foot).norm();
        if self.ds.add_ext_pave(edge, Pave::new(v, t))? {
            self.ds.increase_tolerance(v, distance);
        }
        Ok(())
    }

    /// Records a coincident span and puts the vertices bounding it on the
    /// block that continues past them.
    fn apply_overlap(&mut self, pair: &BlockPair, t1: (f64, f64), t2: (f64, f64)) -> Result<()> {
        self.ds.add_interf_ee(InterfEE {
            edge1: pair.edge1,
            edge2: pair.edge2,
            support: EdgeEdgeSupport::Overlap { t1, t2 },
            new_vertex: None,
        });
        let sides = [
            (pair.edge1, pair.block1, pair.block2, t1.0),
            (pair.edge1, pair.block1, pair.block2, t1.1),
            (pair.edge2, pair.block2, pair.block1, t2.0),
            (pair.edge2, pair.block2, pair.block1, t2.1),
        ];
        for (edge, own, other, t) in sides {
            let curve = self.ds.pave_block_curve(own)?;
            let eps = parameter_tolerance(&curve.curve, self.ds.pave_block_tolerance(own)?);
            if !self.ds.pave_block(own)?.contains_param(t, eps) {
                continue;
            }
            let point = curve.evaluate(t)?;
            let other_pb = self.ds.pave_block(other)?;
            let mut best: Option<(f64, usize)> = None;
            for pave in [other_pb.pave1, other_pb.pave2] {
                let v = self.ds.vertex(pave.vertex)?;
                let d = (v.point - point).norm();
                let reach = v.tolerance + self.ds.tolerance(edge) + self.ds.fuzzy();
                if d <= reach && best.is_none_or(|(bd, _)| d < bd) {
                    best = Some((d, pave.vertex));
                }
            }
            if let Some((_, v)) = best {
                self.put_vertex_on_block(v, edge, own, t)?;
            }
        }
        Ok(())
    }

    /// Groups coincident blocks of two overlapping edges.
    fn force_common_blocks(&mut self, e1: usize, e2: usize) -> Result<()> {
        let first = self.ds.pave_blocks_of(e1).to_vec();
        let second = self.ds.pave_blocks_of(e2).to_vec();
        for &b1 in &first {
            for &b2 in &second {
                let (k1, k2) = (
                    self.ds.pave_block(b1)?.vertex_key(),
                    self.ds.pave_block(b2)?.vertex_key(),
                );
                if k1 != k2 {
                    continue;
                }
                let cb1 = self.ds.pave_block(b1)?.common_block;
                if cb1.is_some() && cb1 == self.ds.pave_block(b2)?.common_block {
                    continue;
                }
                if self.ds.check_coincidence(b1, b2)? {
                    self.ds.make_common_block(&[b1, b2], &BTreeSet::new());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::math::Point3;
    use crate::operations::boolean::ds::EdgeEdgeSupport;
    use crate::operations::boolean::filler::PaveFiller;
    use crate::operations::boolean::options::{BooleanOptions, GlueMode};
    use crate::operations::creation::MakeBox;
    use crate::topology::TopologyStore;

    fn side_by_side(store: &mut TopologyStore) -> Vec<crate::topology::Shape> {
        let a = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(store)
            .unwrap();
        // Shares part of the face x = 1, shifted up by half.
        let b = MakeBox::new(Point3::new(1.0, 0.0, 0.5), Point3::new(2.0, 1.0, 1.5))
            .execute(store)
            .unwrap();
        vec![a.into(), b.into()]
    }

    #[test]
    fn collinear_edges_form_common_blocks() {
        let mut store = TopologyStore::new();
        let args = side_by_side(&mut store);
        let mut filler = PaveFiller::new(args, BooleanOptions::default());
        filler.perform(&store).unwrap();
        let ds = filler.ds();
        let overlaps = ds
            .interf_ee()
            .iter()
            .filter(|i| matches!(i.support, EdgeEdgeSupport::Overlap { .. }))
            .count();
        assert_eq!(overlaps, 2);
        let shared: Vec<_> = ds
            .common_blocks()
            .filter(|(_, cb)| cb.pave_blocks.len() == 2)
            .collect();
        assert_eq!(shared.len(), 2);
        for (_, cb) in shared {
            let a = ds.pave_block(cb.pave_blocks[0]).unwrap();
            let b = ds.pave_block(cb.pave_blocks[1]).unwrap();
            assert_eq!(a.vertex_key(), b.vertex_key());
        }
    }

    #[test]
    fn full_glue_still_detects_overlaps() {
        let mut store = TopologyStore::new();
        let args = side_by_side(&mut store);
        let mut filler = PaveFiller::new(args, BooleanOptions::default().with_glue(GlueMode::Full));
        filler.perform(&store).unwrap();
        let ds = filler.ds();
        assert!(ds
            .interf_ee()
            .iter()
            .all(|i| matches!(i.support, EdgeEdgeSupport::Overlap { .. })));
        assert!(ds.common_blocks().count() >= 2);
    }
}
