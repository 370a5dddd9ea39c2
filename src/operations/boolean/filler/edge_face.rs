use std::collections::BTreeSet;

use crate::error::Result;
use crate::geometry::curve::Curve;
use crate::geometry::Surface;
use crate::math::{Point2, Point3};
use crate::topology::ShapeKind;

use super::{log_stage, run_pairs, PaveFiller};
use crate::operations::boolean::ds::{
    EdgeFaceSupport, InterfEF, Pave, PaveBlockId, State, Transition,
};
use crate::operations::boolean::iterator::{candidate_pairs, PairScope};
use crate::operations::boolean::oracle::CurveSurfaceHit;
use crate::operations::boolean::report::Warning;

/// Below this, the edge tangent counts as lying in the face.
const TANGENT_EPS: f64 = 1e-9;

#[derive(Clone, Copy)]
struct BlockFace {
    edge: usize,
    block: PaveBlockId,
    face: usize,
}

/// A crossing found inside the face.
struct Crossing {
    t: f64,
    uv: Point2,
    point: Point3,
    transition: Transition,
}

enum Found {
    Crossing(Crossing),
    Overlap(f64, f64),
}

impl PaveFiller<'_> {
    /// Intersects pave blocks with faces of other arguments.
    pub(super) fn perform_ef(&mut self) -> Result<()> {
        let before = self.ds.interf_ef().len();
        let tasks = self.edge_face_pairs()?;

        let ds = &self.ds;
        let oracle = self.oracle;
        let results = run_pairs(self.options.parallel, &tasks, |task| -> Result<Vec<Found>> {
            let curve = ds.pave_block_curve(task.block)?;
            let face = ds.face(task.face)?;
            let edge_tol = ds.tolerance(task.edge);
            let tol = edge_tol + face.tolerance + ds.fuzzy();
            let mut found = Vec::new();
            for hit in oracle.curve_surface(&curve, &face.surface, tol)? {
                match hit {
                    CurveSurfaceHit::Point { t, uv, point } => {
                        let state = oracle.classify_point_on_face(
                            &point,
                            &face.surface,
                            &face.loops,
                            edge_tol,
                        )?;
                        if state != State::In {
                            continue;
                        }
                        let tangent = curve.curve.tangent(t)?;
                        let normal = face.surface.normal(uv.x, uv.y)?;
                        let normal = if face.same_sense { normal } else { -normal };
                        found.push(Found::Crossing(Crossing {
                            t,
                            uv,
                            point,
                            transition: transition(tangent.dot(&normal)),
                        }));
                    }
                    CurveSurfaceHit::Overlap { t1, t2 } => found.push(Found::Overlap(t1, t2)),
                }
            }
            Ok(found)
        });

        let mut new_vertices = Vec::new();
        let mut lying = BTreeSet::new();
        for (task, result) in tasks.iter().zip(results) {
            self.check_cancelled()?;
            let found = match result {
                Ok(found) => found,
                Err(err) => {
                    self.report.add(Warning::IntersectionOfPairOfShapesFailed {
                        index1: task.edge,
                        index2: task.face,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            let skip_crossings = self.glue_skips_crossings(task.edge, task.face);
            for item in found {
                match item {
                    Found::Crossing(crossing) if !skip_crossings => {
                        self.apply_edge_face_crossing(task, &crossing, &mut new_vertices)?;
                    }
                    Found::Crossing(_) => {}
                    Found::Overlap(t1, t2) => {
                        self.ds.add_interf_ef(InterfEF {
                            edge: task.edge,
                            face: task.face,
                            support: EdgeFaceSupport::Overlap { t1, t2 },
                            new_vertex: None,
                            transition: None,
                        });
                        lying.insert((task.edge, task.face));
                    }
                }
            }
        }

        self.treat_new_vertices(&new_vertices)?;
        self.split_pave_blocks()?;
        for (e, f) in lying {
            self.force_blocks_on_face(e, f)?;
        }
        log_stage("edge/face", before, self.ds.interf_ef().len());
        Ok(())
    }

    fn edge_face_pairs(&self) -> Result<Vec<BlockFace>> {
        let mut tasks = Vec::new();
        let pairs =
            candidate_pairs(&self.ds, ShapeKind::Edge, ShapeKind::Face, PairScope::CrossArgument);
        for (e, f) in pairs {
            let face_box = self.ds.shape_info(f)?.bbox;
            for &b in self.ds.pave_blocks_of(e) {
                let pb = self.ds.pave_block(b)?;
                let Some(shrunk) = &pb.shrunk else {
                    continue;
                };
                if !shrunk.bbox.overlaps(&face_box) {
                    continue;
                }
                if self.ds.common_block_of(b).is_some_and(|cb| cb.faces.contains(&f)) {
                    continue;
                }
                tasks.push(BlockFace {
                    edge: e,
                    block: b,
                    face: f,
                });
            }
        }
        Ok(tasks)
    }

    fn apply_edge_face_crossing(
        &mut self,
        task: &BlockFace,
        crossing: &Crossing,
        new_vertices: &mut Vec<usize>,
    ) -> Result<()> {
        let vertex = match self.block_end_near(task.block, crossing.t, &crossing.point)? {
            Some(v) => {
                if self.ds.face_vertices(task.face).contains(&v) {
                    return Ok(());
                }
                v
            }
            None => {
                let tolerance = self.ds.tolerance(task.edge).max(self.ds.tolerance(task.face));
                let nv = self.ds.append_vertex(crossing.point, tolerance);
                self.ds.add_ext_pave(task.edge, Pave::new(nv, crossing.t))?;
                new_vertices.push(nv);
                nv
            }
        };
        self.ds.face_info_mut(task.face).vertices_in.insert(vertex);
        self.ds.add_interf_ef(InterfEF {
            edge: task.edge,
            face: task.face,
            support: EdgeFaceSupport::Point {
                t: crossing.t,
                uv: crossing.uv,
            },
            new_vertex: Some(vertex),
            transition: Some(crossing.transition),
        });
        Ok(())
    }

    /// Adds face `f` to the common block of every block of `e` lying inside it.
    fn force_blocks_on_face(&mut self, e: usize, f: usize) -> Result<()> {
        let blocks = self.ds.pave_blocks_of(e).to_vec();
        let faces = BTreeSet::from([f]);
        for b in blocks {
            if self.ds.common_block_of(b).is_some_and(|cb| cb.faces.contains(&f)) {
                continue;
            }
            let mid = self.ds.pave_block_curve(b)?.midpoint()?;
            let tol = self.ds.pave_block_tolerance(b)?;
            let face = self.ds.face(f)?;
            let foot = self.oracle.project_point_on_surface(&mid, &face.surface)?;
            if foot.distance > tol + face.tolerance + self.ds.fuzzy() {
                continue;
            }
            let state =
                self.oracle.classify_point_on_face(&mid, &face.surface, &face.loops, tol)?;
            if state == State::In {
                self.ds.make_common_block(&[b], &faces);
            }
        }
        Ok(())
    }
}

/// State of the edge relative to the face's solid before and after the crossing.
fn transition(dot: f64) -> Transition {
    if dot > TANGENT_EPS {
        Transition {
            before: State::In,
            after: State::Out,
        }
    } else if dot < -TANGENT_EPS {
        Transition {
            before: State::Out,
            after: State::In,
        }
    } else {
        Transition {
            before: State::On,
            after: State::On,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::boolean::filler::PaveFiller;
    use crate::operations::boolean::options::BooleanOptions;
    use crate::operations::creation::MakeBox;
    use crate::topology::TopologyStore;

    #[test]
    fn piercing_edges_get_transitions() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let b = MakeBox::new(Point3::new(0.5, 0.5, 0.5), Point3::new(1.5, 1.5, 1.5))
            .execute(&mut store)
            .unwrap();
        let mut filler = PaveFiller::new(vec![a.into(), b.into()], BooleanOptions::default());
        filler.perform(&store).unwrap();
        let points: Vec<_> = filler
            .ds()
            .interf_ef()
            .iter()
            .filter(|i| matches!(i.support, EdgeFaceSupport::Point { .. }))
            .collect();
        assert_eq!(points.len(), 6);
        for interf in points {
            let t = interf.transition.unwrap();
            assert_ne!(t.before, t.after);
        }
    }

    #[test]
    fn edge_lying_inside_face_joins_it() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(Point3::origin(), Point3::new(4.0, 4.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let b = MakeBox::new(Point3::new(1.0, 1.0, 1.0), Point3::new(2.0, 2.0, 2.0))
            .execute(&mut store)
            .unwrap();
        let mut filler = PaveFiller::new(vec![a.into(), b.into()], BooleanOptions::default());
        filler.perform(&store).unwrap();
        let ds = filler.ds();
        let with_faces = ds.common_blocks().filter(|(_, cb)| cb.faces.len() == 1).count();
        assert_eq!(with_faces, 4);
        // Only the slab's top face; never a side face of the box the edge bounds.
        for (_, cb) in ds.common_blocks() {
            for &pb in &cb.pave_blocks {
                let rank = ds.pave_block(pb).unwrap().edge().and_then(|e| ds.rank(e));
                assert!(cb.faces.iter().all(|&f| ds.rank(f) != rank));
            }
        }
    }

    #[test]
    fn transition_follows_the_normal() {
        assert_eq!(transition(1.0).after, State::Out);
        assert_eq!(transition(-1.0).after, State::In);
        assert_eq!(transition(0.0).before, State::On);
    }
}
