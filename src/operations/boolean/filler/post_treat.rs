//! Turns section curves into section pave blocks.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::math::Point3;
use crate::operations::query::closest_point_bounded;
use crate::topology::TrimmedCurve;

use super::PaveFiller;
use crate::operations::boolean::ds::{BlockSource, PaveBlock, PaveBlockId, State};

impl PaveFiller<'_> {
    /// Builds the section blocks of every face/face curve.
    ///
    /// A block is kept only if its midpoint lies on both faces. A block
    /// repeating a block already on or in one of the faces is not created;
    /// the existing block takes both faces instead. Coinciding blocks of
    /// different face pairs share a common block.
    pub(super) fn post_treat_ff(&mut self) -> Result<()> {
        let mut merge_pairs = Vec::new();
        let mut created: Vec<(PaveBlockId, usize)> = Vec::new();
        for i in 0..self.ds.interf_ff().len() {
            let (f1, f2) = (self.ds.interf_ff()[i].face1, self.ds.interf_ff()[i].face2);
            for c in 0..self.ds.interf_ff()[i].curves.len() {
                let section = &self.ds.interf_ff()[i].curves[c];
                let paves = section.paves.clone();
                let base = section.curve.curve.clone();
                let tolerance = section.tolerance;
                for w in paves.windows(2) {
                    let (p1, p2) = (w[0], w[1]);
                    if p2.param - p1.param <= f64::EPSILON {
                        continue;
                    }
                    let piece = TrimmedCurve::new(base.clone(), p1.param, p2.param);
                    let mid = piece.midpoint()?;
                    let s1 = self.classify_on_face(&mid, f1, tolerance)?;
                    let s2 = self.classify_on_face(&mid, f2, tolerance)?;
                    if s1 == State::Out || s2 == State::Out {
                        continue;
                    }
                    let reach = self.ds.tolerance(p1.vertex) + self.ds.tolerance(p2.vertex);
                    if piece.length() <= reach {
                        if p1.vertex != p2.vertex {
                            merge_pairs.push((p1.vertex, p2.vertex));
                        }
                        continue;
                    }
                    if let Some(existing) =
                        self.existing_pave_block(f1, f2, p1.vertex, p2.vertex, &piece, tolerance)?
                    {
                        self.ds.make_common_block(&[existing], &BTreeSet::from([f1, f2]));
                        continue;
                    }
                    if s1 == State::On || s2 == State::On {
                        continue;
                    }
                    let id = self.ds.add_pave_block(PaveBlock::new(
                        BlockSource::Section { interference: i, curve: c },
                        p1,
                        p2,
                    ));
                    self.ds.fill_shrunk_data(id)?;
                    self.ds.interf_ff_mut()[i].curves[c].pave_blocks.push(id);
                    created.push((id, i));
                }
            }
        }
        self.share_coinciding_sections(&created)?;
        self.merge_vertices(&merge_pairs)?;
        Ok(())
    }

    fn classify_on_face(&self, point: &Point3, f: usize, tolerance: f64) -> Result<State> {
        let face = self.ds.face(f)?;
        self.oracle
            .classify_point_on_face(
                point,
                &face.surface,
                &face.loops,
                tolerance.max(face.tolerance),
            )
    }

    /// A block on or in `f1` or `f2` with the given ends, running along `piece`.
    fn existing_pave_block(
        &self,
        f1: usize,
        f2: usize,
        v1: usize,
        v2: usize,
        piece: &TrimmedCurve,
        tolerance: f64,
    ) -> Result<Option<PaveBlockId>> {
        let key = (v1.min(v2), v1.max(v2));
        let mid = piece.midpoint()?;
        for f in [f1, f2] {
            let Some(info) = self.ds.face_info(f) else {
                continue;
            };
            for &id in info.pave_blocks_on.iter().chain(&info.pave_blocks_in) {
                let Ok(pb) = self.ds.pave_block(id) else {
                    continue;
                };
                if pb.vertex_key() != key {
                    continue;
                }
                let curve = self.ds.pave_block_curve(id)?;
                let reach = self.ds.pave_block_tolerance(id)? + tolerance + self.ds.fuzzy();
                if closest_point_bounded(&curve, &mid)?.distance <= reach {
                    return Ok(Some(id));
                }
            }
        }
        Ok(None)
    }

    fn share_coinciding_sections(&mut self, created: &[(PaveBlockId, usize)]) -> Result<()> {
        for (k, &(a, ia)) in created.iter().enumerate() {
            for &(b, ib) in &created[k + 1..] {
                if ia == ib {
                    continue;
                }
                let cb = self.ds.pave_block(a)?.common_block;
                if cb.is_some() && cb == self.ds.pave_block(b)?.common_block {
                    continue;
                }
                if self.ds.check_coincidence(a, b)? {
                    let ff = self.ds.interf_ff();
                    let faces = BTreeSet::from([
                        ff[ia].face1,
                        ff[ia].face2,
                        ff[ib].face1,
                        ff[ib].face2,
                    ]);
                    self.ds.make_common_block(&[a, b], &faces);
                }
            }
        }
        Ok(())
    }
}
