//! Pave block and common block bookkeeping of the DS.

use std::collections::{BTreeSet, HashMap};

use crate::error::{BopError, Result};
use crate::math::PRECISION_CONFUSION;
use crate::operations::boolean::oracle::{parameter_on, parameter_tolerance};
use crate::operations::query::{closest_point_bounded, curve_box};
use crate::topology::TrimmedCurve;

use super::pave::{
    BlockSource, CommonBlock, CommonBlockId, Pave, PaveBlock, PaveBlockId, ShrunkData,
};
use super::Ds;

/// Parameter distance below which two paves are the same.
const PAVE_EPS: f64 = 1e-12;

impl Ds {
    /// Pave block `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the block was removed by a split.
    pub fn pave_block(&self, id: PaveBlockId) -> Result<&PaveBlock> {
        self.pave_blocks
            .get(id)
            .ok_or_else(|| BopError::IntersectionFailed("stale pave block".into()).into())
    }

    /// Mutable pave block `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the block was removed by a split.
    pub fn pave_block_mut(&mut self, id: PaveBlockId) -> Result<&mut PaveBlock> {
        self.pave_blocks
            .get_mut(id)
            .ok_or_else(|| BopError::IntersectionFailed("stale pave block".into()).into())
    }

    /// Adds a standalone block, such as a section block.
    pub fn add_pave_block(&mut self, pb: PaveBlock) -> PaveBlockId {
        self.pave_blocks.insert(pb)
    }

    /// Blocks of edge `e` in parameter order; empty if never initialized.
    #[must_use]
    pub fn pave_blocks_of(&self, e: usize) -> &[PaveBlockId] {
        self.edge_pave_blocks.get(&e).map_or(&[], Vec::as_slice)
    }

    /// Edges whose blocks were initialized.
    #[must_use]
    pub fn edges_with_pave_blocks(&self) -> Vec<usize> {
        self.edge_pave_blocks.keys().copied().collect()
    }

    /// Creates the single block spanning edge `e`, unless it exists already.
    ///
    /// Degenerate edges get no blocks.
    ///
    /// # Errors
    ///
    /// Returns an error if `e` is not an edge.
    pub fn init_pave_blocks(&mut self, e: usize) -> Result<()> {
        if self.edge_pave_blocks.contains_key(&e) {
            return Ok(());
        }
        let edge = self.edge(e)?;
        if edge.degenerate {
            return Ok(());
        }
        let v1 = self.same_domain_index(edge.vertices.0);
        let v2 = self.same_domain_index(edge.vertices.1);
        let pb = PaveBlock::new(
            BlockSource::Edge(e),
            Pave::new(v1, edge.curve.t_start),
            Pave::new(v2, edge.curve.t_end),
        );
        let id = self.pave_blocks.insert(pb);
        self.edge_pave_blocks.insert(e, vec![id]);
        Ok(())
    }

    /// Initializes the blocks of every non-degenerate edge.
    ///
    /// # Errors
    ///
    /// Returns an error if an edge cannot be read.
    pub fn init_all_pave_blocks(&mut self) -> Result<()> {
        for e in self.indices_of_kind(crate::topology::ShapeKind::Edge) {
            if self.shape_info(e)?.shape.is_some() {
                self.init_pave_blocks(e)?;
            }
        }
        Ok(())
    }

    /// Records a vertex found on edge `e` at `param`.
    ///
    /// The pave goes to the block whose range contains `param`; paves on a
    /// block end or already pending are ignored. Returns `true` if the pave
    /// was recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if `e` is not an edge.
    pub fn add_ext_pave(&mut self, e: usize, pave: Pave) -> Result<bool> {
        self.init_pave_blocks(e)?;
        let eps = parameter_tolerance(&self.edge(e)?.curve.curve, PRECISION_CONFUSION);
        let vertex = self.same_domain_index(pave.vertex);
        let ids = self.pave_blocks_of(e).to_vec();
        for id in ids {
            let pb = self.pave_block(id)?;
            if pb.pave1.vertex == vertex && (pb.pave1.param - pave.param).abs() <= eps
                || pb.pave2.vertex == vertex && (pb.pave2.param - pave.param).abs() <= eps
            {
                return Ok(false);
            }
            if pb.contains_param(pave.param, eps) {
                return Ok(self
                    .pave_block_mut(id)?
                    .append_ext_pave(Pave::new(vertex, pave.param), eps));
            }
        }
        Ok(false)
    }

    /// The bounded curve of a block.
    ///
    /// # Errors
    ///
    /// Returns an error if the block or its source is missing.
    pub fn pave_block_curve(&self, id: PaveBlockId) -> Result<TrimmedCurve> {
        let pb = self.pave_block(id)?;
        let base = match pb.source {
            BlockSource::Edge(e) => &self.edge(e)?.curve,
            BlockSource::Section { interference, curve } => {
                &self
                    .interf_ff
                    .get(interference)
                    .and_then(|ff| ff.curves.get(curve))
                    .ok_or_else(|| BopError::IntersectionFailed("missing section curve".into()))?
                    .curve
            }
        };
        Ok(TrimmedCurve::new(base.curve.clone(), pb.pave1.param, pb.pave2.param))
    }

    /// Tolerance of the curve a block lies on.
    ///
    /// # Errors
    ///
    /// Returns an error if the block or its source is missing.
    pub fn pave_block_tolerance(&self, id: PaveBlockId) -> Result<f64> {
        let pb = self.pave_block(id)?;
        Ok(match pb.source {
            BlockSource::Edge(e) => self.edge(e)?.tolerance,
            BlockSource::Section { interference, curve } => self
                .interf_ff
                .get(interference)
                .and_then(|ff| ff.curves.get(curve))
                .map_or(PRECISION_CONFUSION, |c| c.tolerance),
        })
    }

    /// All bound paves of edge `e`, in parameter order.
    #[must_use]
    pub fn paves_of_edge(&self, e: usize) -> Vec<Pave> {
        let mut out: Vec<Pave> = Vec::new();
        for &id in self.pave_blocks_of(e) {
            if let Some(pb) = self.pave_blocks.get(id) {
                for pave in [pb.pave1, pb.pave2] {
                    let known = out.iter().any(|p| {
                        p.vertex == pave.vertex && (p.param - pave.param).abs() <= PAVE_EPS
                    });
                    if !known {
                        out.push(pave);
                    }
                }
            }
        }
        out.sort_by(|a, b| a.param.total_cmp(&b.param));
        out
    }

    /// Splits every block with pending paves and refreshes common blocks.
    ///
    /// Paves found on one member of a common block are first projected onto
    /// the other members, so all members split at the same vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if a curve cannot be evaluated.
    pub fn update_pave_blocks(&mut self) -> Result<()> {
        self.propagate_common_block_paves()?;
        let mut replaced: HashMap<PaveBlockId, Vec<PaveBlockId>> = HashMap::new();
        let edges: Vec<usize> = self.edge_pave_blocks.keys().copied().collect();
        for e in edges {
            let old = self.edge_pave_blocks.get(&e).cloned().unwrap_or_default();
            if old
                .iter()
                .all(|&id| self.pave_blocks.get(id).is_none_or(|pb| pb.ext_paves.is_empty()))
            {
                continue;
            }
            let mut list = Vec::with_capacity(old.len() + 1);
            for id in old {
                let has_ext = self.pave_blocks.get(id).is_some_and(|pb| !pb.ext_paves.is_empty());
                if has_ext {
                    let pieces = self.split_pave_block(id)?;
                    list.extend(pieces.iter().copied());
                    replaced.insert(id, pieces);
                } else {
                    list.push(id);
                }
            }
            self.edge_pave_blocks.insert(e, list);
        }
        if !replaced.is_empty() {
            self.regroup_common_blocks(&replaced)?;
        }
        Ok(())
    }

    fn split_pave_block(&mut self, id: PaveBlockId) -> Result<Vec<PaveBlockId>> {
        let pb = self
            .pave_blocks
            .remove(id)
            .ok_or_else(|| BopError::IntersectionFailed("stale pave block".into()))?;
        let mut ext = pb.ext_paves.clone();
        ext.sort_by(|a, b| a.param.total_cmp(&b.param));
        let mut paves = Vec::with_capacity(ext.len() + 2);
        paves.push(pb.pave1);
        paves.extend(ext);
        paves.push(pb.pave2);
        let mut pieces = Vec::with_capacity(paves.len() - 1);
        for w in paves.windows(2) {
            if w[1].param - w[0].param <= PAVE_EPS {
                continue;
            }
            pieces.push(self.pave_blocks.insert(PaveBlock::new(pb.source, w[0], w[1])));
        }
        Ok(pieces)
    }

    fn propagate_common_block_paves(&mut self) -> Result<()> {
        let cbs: Vec<CommonBlockId> = self.common_blocks.keys().collect();
        for cb in cbs {
            let members = self.common_blocks[cb].pave_blocks.clone();
            let mut vertices: BTreeSet<usize> = BTreeSet::new();
            for &m in &members {
                vertices.extend(self.pave_block(m)?.ext_paves.iter().map(|p| p.vertex));
            }
            if vertices.is_empty() {
                continue;
            }
            for &m in &members {
                let curve = self.pave_block_curve(m)?;
                let tol = self.pave_block_tolerance(m)?;
                let eps = parameter_tolerance(&curve.curve, PRECISION_CONFUSION);
                for &v in &vertices {
                    let pb = self.pave_block(m)?;
                    if pb.pave1.vertex == v
                        || pb.pave2.vertex == v
                        || pb.ext_paves.iter().any(|p| p.vertex == v)
                    {
                        continue;
                    }
                    let vertex = self.vertex(v)?;
                    let reach = vertex.tolerance + tol + self.fuzzy;
                    let Some(t) = parameter_on(&curve, &vertex.point, reach) else {
                        continue;
                    };
                    if pb.contains_param(t, eps) {
                        self.pave_block_mut(m)?.append_ext_pave(Pave::new(v, t), eps);
                    }
                }
            }
        }
        Ok(())
    }

    /// Rebuilds common blocks whose members were split, pairing pieces
    /// that share end vertices and geometry.
    fn regroup_common_blocks(
        &mut self,
        replaced: &HashMap<PaveBlockId, Vec<PaveBlockId>>,
    ) -> Result<()> {
        let cbs: Vec<CommonBlockId> = self.common_blocks.keys().collect();
        for cb in cbs {
            let touched = self.common_blocks[cb]
                .pave_blocks
                .iter()
                .any(|m| replaced.contains_key(m));
            if !touched {
                continue;
            }
            let Some(old) = self.common_blocks.remove(cb) else {
                continue;
            };
            let mut pieces = Vec::new();
            for m in &old.pave_blocks {
                match replaced.get(m) {
                    Some(parts) => pieces.extend(parts.iter().copied()),
                    None => pieces.push(*m),
                }
            }
            let mut groups: Vec<Vec<PaveBlockId>> = Vec::new();
            for piece in pieces {
                let mut placed = false;
                for group in &mut groups {
                    if self.check_coincidence(group[0], piece)? {
                        group.push(piece);
                        placed = true;
                        break;
                    }
                }
                if !placed {
                    groups.push(vec![piece]);
                }
            }
            for group in groups {
                if group.len() > 1 || !old.faces.is_empty() {
                    let new_cb = self.common_blocks.insert(CommonBlock {
                        pave_blocks: group.clone(),
                        faces: old.faces.clone(),
                    });
                    for m in group {
                        self.pave_block_mut(m)?.common_block = Some(new_cb);
                    }
                } else {
                    self.pave_block_mut(group[0])?.common_block = None;
                }
            }
        }
        Ok(())
    }

    /// Returns `true` if two blocks share their end vertices and curve.
    ///
    /// # Errors
    ///
    /// Returns an error if a curve cannot be evaluated.
    pub fn check_coincidence(&self, a: PaveBlockId, b: PaveBlockId) -> Result<bool> {
        if a == b {
            return Ok(true);
        }
        let (pa, pb) = (self.pave_block(a)?, self.pave_block(b)?);
        if pa.vertex_key() != pb.vertex_key() {
            return Ok(false);
        }
        let tol = self.pave_block_tolerance(a)?.max(self.pave_block_tolerance(b)?) + self.fuzzy;
        let (ca, cb) = (self.pave_block_curve(a)?, self.pave_block_curve(b)?);
        Ok(closest_point_bounded(&cb, &ca.midpoint()?)?.distance <= tol
            && closest_point_bounded(&ca, &cb.midpoint()?)?.distance <= tol)
    }

    /// Groups blocks into one common block, merging blocks they already belong to.
    ///
    /// The first block becomes the representative unless one of the merged
    /// common blocks already has one. Faces of the arguments owning a member
    /// edge are dropped: such an edge bounds those faces, it does not lie in them.
    pub fn make_common_block(
        &mut self,
        blocks: &[PaveBlockId],
        faces: &BTreeSet<usize>,
    ) -> CommonBlockId {
        let mut members: Vec<PaveBlockId> = Vec::new();
        let mut all_faces = faces.clone();
        for &pb in blocks {
            let existing = self.pave_blocks.get(pb).and_then(|p| p.common_block);
            match existing.and_then(|cb| self.common_blocks.remove(cb)) {
                Some(old) => {
                    for m in old.pave_blocks {
                        if !members.contains(&m) {
                            members.push(m);
                        }
                    }
                    all_faces.extend(old.faces);
                }
                None => {
                    if !members.contains(&pb) {
                        members.push(pb);
                    }
                }
            }
        }
        let own_ranks: BTreeSet<usize> = members
            .iter()
            .filter_map(|&m| self.pave_blocks.get(m))
            .filter_map(|pb| pb.edge().and_then(|e| self.rank(e)))
            .collect();
        all_faces.retain(|&f| self.rank(f).is_none_or(|r| !own_ranks.contains(&r)));
        let id = self.common_blocks.insert(CommonBlock {
            pave_blocks: members.clone(),
            faces: all_faces,
        });
        for m in members {
            if let Some(pb) = self.pave_blocks.get_mut(m) {
                pb.common_block = Some(id);
            }
        }
        id
    }

    /// Common block of block `pb`.
    #[must_use]
    pub fn common_block_of(&self, pb: PaveBlockId) -> Option<&CommonBlock> {
        self.pave_blocks
            .get(pb)
            .and_then(|p| p.common_block)
            .and_then(|cb| self.common_blocks.get(cb))
    }

    /// All common blocks.
    pub fn common_blocks(&self) -> impl Iterator<Item = (CommonBlockId, &CommonBlock)> {
        self.common_blocks.iter()
    }

    /// The representative of the common block of `pb`, or `pb` itself.
    #[must_use]
    pub fn real_pave_block(&self, pb: PaveBlockId) -> PaveBlockId {
        self.common_block_of(pb)
            .and_then(|cb| cb.pave_blocks.first().copied())
            .unwrap_or(pb)
    }

    /// Returns `true` if the common block of `pb` contains a block of an argument edge.
    #[must_use]
    pub fn is_common_block_on_edge(&self, pb: PaveBlockId) -> bool {
        self.common_block_of(pb).is_some_and(|cb| {
            cb.pave_blocks
                .iter()
                .any(|&m| self.pave_blocks.get(m).is_some_and(|p| p.edge().is_some()))
        })
    }

    /// Computes the range of block `id` clear of its end vertex tolerances.
    ///
    /// A block whose shrunk range is empty is a micro block; a block whose
    /// end vertices sit farther from the curve ends than their tolerance
    /// is not splittable.
    ///
    /// # Errors
    ///
    /// Returns an error if the curve cannot be evaluated.
    pub fn fill_shrunk_data(&mut self, id: PaveBlockId) -> Result<()> {
        let curve = self.pave_block_curve(id)?;
        let edge_tol = self.pave_block_tolerance(id)?;
        let pb = self.pave_block(id)?;
        let (v1, v2) = (self.vertex(pb.pave1.vertex)?, self.vertex(pb.pave2.vertex)?);
        let t1 = curve.t_start + parameter_tolerance(&curve.curve, v1.tolerance + self.fuzzy);
        let t2 = curve.t_end - parameter_tolerance(&curve.curve, v2.tolerance + self.fuzzy);
        let slack = edge_tol + self.fuzzy + PRECISION_CONFUSION;
        let is_splittable = (curve.evaluate(curve.t_start)? - v1.point).norm()
            <= v1.tolerance + slack
            && (curve.evaluate(curve.t_end)? - v2.point).norm() <= v2.tolerance + slack;
        let bbox = if t2 > t1 {
            let trimmed = TrimmedCurve::new(curve.curve.clone(), t1, t2);
            curve_box(&trimmed)?.enlarged(edge_tol + self.fuzzy)
        } else {
            crate::operations::query::Aabb::empty()
        };
        self.pave_block_mut(id)?.shrunk = Some(ShrunkData {
            t1,
            t2,
            bbox,
            is_splittable,
        });
        Ok(())
    }

    /// Replaces every pave vertex by its same-domain representative.
    pub fn rewrite_same_domain_paves(&mut self) {
        let ids: Vec<PaveBlockId> = self.pave_blocks.keys().collect();
        for id in ids {
            let Some(pb) = self.pave_blocks.get(id) else {
                continue;
            };
            let v1 = self.same_domain_index(pb.pave1.vertex);
            let v2 = self.same_domain_index(pb.pave2.vertex);
            let ext: Vec<usize> =
                pb.ext_paves.iter().map(|p| self.same_domain_index(p.vertex)).collect();
            if let Some(pb) = self.pave_blocks.get_mut(id) {
                pb.pave1.vertex = v1;
                pb.pave2.vertex = v2;
                for (p, v) in pb.ext_paves.iter_mut().zip(ext) {
                    p.vertex = v;
                }
            }
        }
        for ff in 0..self.interf_ff.len() {
            for c in 0..self.interf_ff[ff].curves.len() {
                let paves: Vec<usize> = self.interf_ff[ff].curves[c]
                    .paves
                    .iter()
                    .map(|p| self.same_domain_index(p.vertex))
                    .collect();
                for (p, v) in self.interf_ff[ff].curves[c].paves.iter_mut().zip(paves) {
                    p.vertex = v;
                }
            }
        }
    }

    /// Drops block `id` from the list of edge `e`.
    pub fn remove_pave_block(&mut self, e: usize, id: PaveBlockId) {
        if let Some(list) = self.edge_pave_blocks.get_mut(&e) {
            list.retain(|&b| b != id);
        }
        if let Some(cb) = self.pave_blocks.get(id).and_then(|p| p.common_block) {
            if let Some(block) = self.common_blocks.get_mut(cb) {
                block.pave_blocks.retain(|&b| b != id);
                if block.pave_blocks.is_empty() {
                    self.common_blocks.remove(cb);
                }
            }
        }
        self.pave_blocks.remove(id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::curve::Line;
    use crate::math::{Point3, Vector3};
    use crate::operations::creation::MakeBox;
    use crate::topology::{EdgeCurve, ShapeKind, TopologyStore};

    fn boxes_ds() -> Ds {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let b = MakeBox::new(Point3::new(3.0, 0.0, 0.0), Point3::new(4.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let mut ds = Ds::new();
        ds.init(&store, &[a.into(), b.into()], 0.0).unwrap();
        ds.init_all_pave_blocks().unwrap();
        ds
    }

    #[test]
    fn ext_paves_split_blocks_in_order() {
        let mut ds = boxes_ds();
        let e = ds.indices_of_kind(ShapeKind::Edge)[0];
        let curve = ds.edge(e).unwrap().curve.clone();
        let v_late = ds.append_vertex(curve.evaluate(0.75).unwrap(), 1e-7);
        let v_early = ds.append_vertex(curve.evaluate(0.25).unwrap(), 1e-7);
        assert!(ds.add_ext_pave(e, Pave::new(v_late, 0.75)).unwrap());
        assert!(ds.add_ext_pave(e, Pave::new(v_early, 0.25)).unwrap());
        assert!(!ds.add_ext_pave(e, Pave::new(v_early, 0.25)).unwrap());
        ds.update_pave_blocks().unwrap();
        let paves = ds.paves_of_edge(e);
        let params: Vec<f64> = paves.iter().map(|p| p.param).collect();
        assert_eq!(params, vec![0.0, 0.25, 0.75, 1.0]);
        assert_eq!(paves[1].vertex, v_early);
        assert_eq!(ds.pave_blocks_of(e).len(), 3);
    }

    #[test]
    fn pending_paves_are_recorded_once() {
        let mut ds = boxes_ds();
        let e = ds.indices_of_kind(ShapeKind::Edge)[0];
        let curve = ds.edge(e).unwrap().curve.clone();
        let v1 = ds.append_vertex(curve.evaluate(0.5).unwrap(), 1e-7);
        let v2 = ds.append_vertex(curve.evaluate(0.5).unwrap(), 1e-7);
        assert!(ds.add_ext_pave(e, Pave::new(v1, 0.5)).unwrap());
        assert!(!ds.add_ext_pave(e, Pave::new(v1, 0.5)).unwrap());
        assert!(!ds.add_ext_pave(e, Pave::new(v2, 0.5)).unwrap());
        let block = ds.pave_blocks_of(e)[0];
        assert_eq!(ds.pave_block(block).unwrap().ext_paves.len(), 1);
    }

    #[test]
    fn coincident_blocks_share_splits() {
        let mut ds = Ds::new();
        let a0 = ds.append_vertex(Point3::origin(), 1e-7);
        let a1 = ds.append_vertex(Point3::new(2.0, 0.0, 0.0), 1e-7);
        let line = Line::new(Point3::origin(), Vector3::x()).unwrap();
        let reversed = Line::new(Point3::new(2.0, 0.0, 0.0), -Vector3::x()).unwrap();
        let e1 = ds
            .append_edge(TrimmedCurve::new(EdgeCurve::Line(line), 0.0, 2.0), 1e-7, a0, a1)
            .unwrap();
        let e2 = ds
            .append_edge(TrimmedCurve::new(EdgeCurve::Line(reversed), 0.0, 2.0), 1e-7, a1, a0)
            .unwrap();
        ds.init_pave_blocks(e1).unwrap();
        ds.init_pave_blocks(e2).unwrap();
        let (b1, b2) = (ds.pave_blocks_of(e1)[0], ds.pave_blocks_of(e2)[0]);
        assert!(ds.check_coincidence(b1, b2).unwrap());
        ds.make_common_block(&[b1, b2], &BTreeSet::new());

        let mid = ds.append_vertex(Point3::new(0.5, 0.0, 0.0), 1e-7);
        ds.add_ext_pave(e1, Pave::new(mid, 0.5)).unwrap();
        ds.update_pave_blocks().unwrap();
        assert_eq!(ds.pave_blocks_of(e1).len(), 2);
        assert_eq!(ds.pave_blocks_of(e2).len(), 2);
        assert_eq!(ds.common_blocks().count(), 2);
        for &pb in ds.pave_blocks_of(e2) {
            let cb = ds.common_block_of(pb).unwrap();
            assert_eq!(cb.pave_blocks.len(), 2);
        }
    }

    #[test]
    fn shrunk_range_clears_vertex_tolerances() {
        let mut ds = boxes_ds();
        let e = ds.indices_of_kind(ShapeKind::Edge)[0];
        let (v1, _) = ds.edge(e).unwrap().vertices;
        ds.increase_tolerance(v1, 0.1);
        let id = ds.pave_blocks_of(e)[0];
        ds.fill_shrunk_data(id).unwrap();
        let shrunk = ds.pave_block(id).unwrap().shrunk.clone().unwrap();
        assert!((shrunk.t1 - 0.1).abs() < 1e-9);
        assert!(shrunk.is_splittable);
        assert!(shrunk.t2 < 1.0);
    }
}
