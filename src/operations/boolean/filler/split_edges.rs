//! Splitting of pave blocks, split edges and per-face information.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::error::Result;
use crate::operations::query::edge_pcurve;
use crate::topology::ShapeKind;

use super::PaveFiller;
use crate::operations::boolean::ds::{EdgeFaceSupport, FaceInfo, PaveBlockId};
use crate::operations::boolean::report::Warning;

impl PaveFiller<'_> {
    /// Splits blocks at their pending paves and refreshes shrunk ranges.
    ///
    /// A block whose shrunk range vanished is a micro block: it is dropped
    /// and its end vertices are merged. A block whose ends are out of
    /// tolerance is kept but flagged as not splittable.
    pub(super) fn split_pave_blocks(&mut self) -> Result<()> {
        self.ds.update_pave_blocks()?;
        let mut micro_pairs = Vec::new();
        let mut dropped = Vec::new();
        for e in self.ds.edges_with_pave_blocks() {
            let blocks = self.ds.pave_blocks_of(e).to_vec();
            for id in blocks {
                let fresh = self.ds.pave_block(id)?.shrunk.is_none();
                self.ds.fill_shrunk_data(id)?;
                let pb = self.ds.pave_block(id)?;
                let Some(shrunk) = &pb.shrunk else {
                    continue;
                };
                if shrunk.t1 >= shrunk.t2 {
                    if fresh {
                        self.report.add(Warning::TooSmallEdge { edge: e });
                    }
                    micro_pairs.push((pb.pave1.vertex, pb.pave2.vertex));
                    dropped.push((e, id));
                } else if !shrunk.is_splittable && fresh {
                    self.report.add(Warning::NotSplittableEdge { edge: e });
                }
            }
        }
        for (e, id) in dropped {
            self.ds.remove_pave_block(e, id);
        }
        if !micro_pairs.is_empty() {
            self.merge_vertices(&micro_pairs)?;
        }
        Ok(())
    }

    /// Gives every real pave block its own edge.
    ///
    /// A block covering a whole argument edge keeps that edge; members of
    /// a common block share the edge of its representative.
    pub(super) fn make_split_edges(&mut self) -> Result<()> {
        for e in self.ds.edges_with_pave_blocks() {
            let blocks = self.ds.pave_blocks_of(e).to_vec();
            let single = blocks.len() == 1;
            for id in blocks {
                if self.ds.real_pave_block(id) != id {
                    continue;
                }
                let split = if single && self.is_whole_edge(e, id)? {
                    e
                } else {
                    self.append_block_edge(id)?
                };
                self.ds.pave_block_mut(id)?.split_edge = Some(split);
            }
        }

        let sections: Vec<PaveBlockId> = self
            .ds
            .interf_ff()
            .iter()
            .flat_map(|ff| &ff.curves)
            .flat_map(|c| c.pave_blocks.iter().copied())
            .collect();
        for id in sections {
            if self.ds.real_pave_block(id) == id && self.ds.pave_block(id)?.split_edge.is_none() {
                let split = self.append_block_edge(id)?;
                self.ds.pave_block_mut(id)?.split_edge = Some(split);
            }
        }

        let shared: Vec<(Vec<PaveBlockId>, Option<usize>)> = self
            .ds
            .common_blocks()
            .map(|(_, cb)| {
                let split = cb
                    .pave_blocks
                    .first()
                    .and_then(|&rep| self.ds.pave_block(rep).ok())
                    .and_then(|pb| pb.split_edge);
                (cb.pave_blocks.clone(), split)
            })
            .collect();
        for (members, split) in shared {
            for m in members {
                self.ds.pave_block_mut(m)?.split_edge = split;
            }
        }
        Ok(())
    }

    fn is_whole_edge(&self, e: usize, id: PaveBlockId) -> Result<bool> {
        let curve = &self.ds.edge(e)?.curve;
        let pb = self.ds.pave_block(id)?;
        Ok((pb.pave1.param - curve.t_start).abs() < f64::EPSILON
            && (pb.pave2.param - curve.t_end).abs() < f64::EPSILON)
    }

    fn append_block_edge(&mut self, id: PaveBlockId) -> Result<usize> {
        let curve = self.ds.pave_block_curve(id)?;
        let mut tolerance = self.ds.pave_block_tolerance(id)?;
        if let Some(cb) = self.ds.common_block_of(id) {
            for &m in &cb.pave_blocks {
                tolerance = tolerance.max(self.ds.pave_block_tolerance(m)?);
            }
        }
        let pb = self.ds.pave_block(id)?;
        let (v1, v2) = (pb.pave1.vertex, pb.pave2.vertex);
        self.ds.append_edge(curve, tolerance, v1, v2)
    }

    /// Faces every split edge lies on: the faces of its argument edge,
    /// the faces of its common block and the faces of its section.
    fn split_edge_faces(&self) -> Result<Vec<(usize, BTreeSet<usize>)>> {
        let mut edge_faces: HashMap<usize, BTreeSet<usize>> = HashMap::new();
        for f in self.ds.indices_of_kind(ShapeKind::Face) {
            for e in self.ds.face_edges(f) {
                edge_faces.entry(e).or_default().insert(f);
            }
        }
        let mut out: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
        for e in self.ds.edges_with_pave_blocks() {
            for &id in self.ds.pave_blocks_of(e) {
                let Some(split) = self.ds.pave_block(id)?.split_edge else {
                    continue;
                };
                let faces = out.entry(split).or_default();
                faces.extend(edge_faces.get(&e).into_iter().flatten().copied());
                if let Some(cb) = self.ds.common_block_of(id) {
                    faces.extend(cb.faces.iter().copied());
                }
            }
        }
        for ff in self.ds.interf_ff() {
            for curve in &ff.curves {
                for &id in &curve.pave_blocks {
                    if let Some(split) = self.ds.pave_block(id)?.split_edge {
                        out.entry(split).or_default().extend([ff.face1, ff.face2]);
                    }
                }
            }
        }
        Ok(out.into_iter().collect())
    }

    /// Computes the parameter-space polyline of every split edge on each of
    /// its faces, unless disabled.
    pub(super) fn make_pcurves(&mut self) {
        if self.options.avoid_pcurves {
            return;
        }
        let pairs = match self.split_edge_faces() {
            Ok(pairs) => pairs,
            Err(err) => {
                tracing::warn!(%err, "split edge faces unavailable");
                return;
            }
        };
        for (edge, faces) in pairs {
            for face in faces {
                let uv = self
                    .ds
                    .edge(edge)
                    .and_then(|e| Ok((e.curve.clone(), self.ds.face(face)?.surface.clone())))
                    .and_then(|(curve, surface)| edge_pcurve(&curve, true, &surface));
                match uv {
                    Ok(uv) if uv.len() >= 2 => self.ds.set_pcurve(edge, face, uv),
                    _ => self.report.add(Warning::PCurveBuildFailed { edge, face }),
                }
            }
        }
    }

    /// Recomputes the On, In and section sets of every argument face.
    pub(super) fn update_face_infos(&mut self) -> Result<()> {
        let faces: Vec<usize> = self
            .ds
            .indices_of_kind(ShapeKind::Face)
            .into_iter()
            .filter(|&f| self.ds.rank(f).is_some())
            .collect();
        for f in faces {
            let info = self.collect_face_info(f)?;
            *self.ds.face_info_mut(f) = info;
        }
        Ok(())
    }

    fn collect_face_info(&self, f: usize) -> Result<FaceInfo> {
        let ds = &self.ds;
        let mut info = FaceInfo::default();
        for e in ds.face_edges(f) {
            for &id in ds.pave_blocks_of(e) {
                let pb = ds.pave_block(id)?;
                info.pave_blocks_on.insert(ds.real_pave_block(id));
                info.vertices_on.insert(pb.pave1.vertex);
                info.vertices_on.insert(pb.pave2.vertex);
            }
            let (v1, v2) = ds.edge(e)?.vertices;
            info.vertices_on.insert(ds.same_domain_index(v1));
            info.vertices_on.insert(ds.same_domain_index(v2));
        }

        for (_, cb) in ds.common_blocks() {
            let Some(&rep) = cb.pave_blocks.first() else {
                continue;
            };
            if cb.faces.contains(&f) && !info.pave_blocks_on.contains(&rep) {
                let pb = ds.pave_block(rep)?;
                info.pave_blocks_in.insert(rep);
                info.vertices_in.extend([pb.pave1.vertex, pb.pave2.vertex]);
            }
        }
        for vf in ds.interf_vf().iter().filter(|vf| vf.face == f) {
            info.vertices_in.insert(ds.same_domain_index(vf.vertex));
        }
        for ef in ds.interf_ef().iter().filter(|ef| ef.face == f) {
            if let (EdgeFaceSupport::Point { .. }, Some(v)) = (ef.support, ef.new_vertex) {
                info.vertices_in.insert(ds.same_domain_index(v));
            }
        }

        for ff in ds.interf_ff().iter().filter(|ff| ff.face1 == f || ff.face2 == f) {
            for curve in &ff.curves {
                for &id in &curve.pave_blocks {
                    let real = ds.real_pave_block(id);
                    if info.pave_blocks_on.contains(&real) || info.pave_blocks_in.contains(&real) {
                        continue;
                    }
                    let pb = ds.pave_block(real)?;
                    info.pave_blocks_sc.insert(real);
                    info.vertices_sc.extend([pb.pave1.vertex, pb.pave2.vertex]);
                }
            }
            info.vertices_sc
                .extend(ff.points.iter().map(|&v| ds.same_domain_index(v)));
        }

        let on = info.vertices_on.clone();
        info.vertices_in.retain(|v| !on.contains(v));
        let on_in: BTreeSet<usize> = on.union(&info.vertices_in).copied().collect();
        info.vertices_sc.retain(|v| !on_in.contains(v));
        Ok(info)
    }

    /// Reports vertices of one argument that started to overlap because
    /// their tolerances grew.
    pub(super) fn check_acquired_self_intersections(&mut self) {
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let increased: Vec<usize> = self.ds.increased().iter().copied().collect();
        for v in increased {
            let (Some(rank), Ok(vv)) = (self.ds.rank(v), self.ds.vertex(v)) else {
                continue;
            };
            let (pv, tv) = (vv.point, vv.tolerance);
            for w in self.ds.rank_range(rank) {
                if w == v || self.ds.same_domain_index(w) == self.ds.same_domain_index(v) {
                    continue;
                }
                let Ok(vw) = self.ds.vertex(w) else {
                    continue;
                };
                let d = (vw.point - pv).norm();
                let before = self.initial_tolerance(v) + self.initial_tolerance(w);
                if d <= tv + vw.tolerance && d > before && seen.insert((v.min(w), v.max(w))) {
                    self.report.add(Warning::AcquiredSelfIntersection {
                        index1: v.min(w),
                        index2: v.max(w),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::math::Point3;
    use crate::operations::boolean::filler::PaveFiller;
    use crate::operations::boolean::options::BooleanOptions;
    use crate::operations::creation::MakeBox;
    use crate::topology::{ShapeKind, TopologyStore};

    #[test]
    fn untouched_edges_keep_their_index() {
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
        let mut split = 0;
        for e in ds.indices_of_kind(ShapeKind::Edge) {
            if ds.is_new_shape(e) {
                continue;
            }
            let blocks = ds.pave_blocks_of(e);
            if blocks.len() == 1 {
                assert_eq!(ds.pave_block(blocks[0]).unwrap().split_edge, Some(e));
            } else {
                split += 1;
                for &pb in blocks {
                    let image = ds.pave_block(pb).unwrap().split_edge.unwrap();
                    assert!(ds.is_new_shape(image));
                }
            }
        }
        // Three edges of each cube cross a face of the other.
        assert_eq!(split, 6);
    }

    #[test]
    fn pcurves_can_be_skipped() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let b = MakeBox::new(Point3::new(0.5, 0.5, 0.5), Point3::new(1.5, 1.5, 1.5))
            .execute(&mut store)
            .unwrap();
        let mut filler = PaveFiller::new(
            vec![a.into(), b.into()],
            BooleanOptions::default().with_avoid_pcurves(true),
        );
        filler.perform(&store).unwrap();
        let ds = filler.ds();
        let face = ds.faces_of_rank(0)[0];
        let edge = ds.face_edges(face)[0];
        assert!(ds.pcurve(edge, face).is_none());
    }
}
