use crate::error::Result;
use crate::topology::ShapeKind;

use super::{log_stage, run_pairs, PaveFiller};
use crate::operations::boolean::ds::{InterfVF, State};
use crate::operations::boolean::iterator::{candidate_pairs, PairScope};
use crate::operations::boolean::oracle::SurfaceProjection;

impl PaveFiller<'_> {
    /// Finds vertices lying inside faces of other arguments.
    pub(super) fn perform_vf(&mut self) -> Result<()> {
        let before = self.ds.interf_vf().len();
        let mut tasks = Vec::new();
        let pairs = candidate_pairs(
            &self.ds,
            ShapeKind::Vertex,
            ShapeKind::Face,
            PairScope::CrossArgument,
        );
        for (v, f) in pairs {
            let sd = self.ds.same_domain_index(v);
            if self.ds.has_interf(sd, f) || self.ds.face_vertices(f).contains(&sd) {
                continue;
            }
            if self.ds.face_info(f).is_some_and(|info| info.all_vertices().any(|w| w == sd)) {
                continue;
            }
            tasks.push((sd, f));
        }
        tasks.sort_unstable();
        tasks.dedup();

        let ds = &self.ds;
        let oracle = self.oracle;
        let parallel = self.options.parallel;
        let hits = run_pairs(parallel, &tasks, |&(v, f)| -> Result<Option<SurfaceProjection>> {
            let vertex = ds.vertex(v)?;
            let face = ds.face(f)?;
            let foot = oracle.project_point_on_surface(&vertex.point, &face.surface)?;
            if foot.distance > vertex.tolerance + face.tolerance + ds.fuzzy() {
                return Ok(None);
            }
            let state = oracle.classify_point_on_face(
                &foot.point,
                &face.surface,
                &face.loops,
                vertex.tolerance,
            )?;
            Ok((state != State::Out).then_some(foot))
        });

        for (&(v, f), hit) in tasks.iter().zip(hits) {
            self.check_cancelled()?;
            let Some(foot) = hit? else {
                continue;
            };
            self.ds.add_interf_vf(InterfVF { vertex: v, face: f, uv: foot.uv });
            self.ds.increase_tolerance(v, foot.distance);
            self.ds.face_info_mut(f).vertices_in.insert(v);
        }
        log_stage("vertex/face", before, self.ds.interf_vf().len());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::math::Point3;
    use crate::operations::boolean::filler::PaveFiller;
    use crate::operations::boolean::options::BooleanOptions;
    use crate::operations::creation::MakeBox;
    use crate::topology::TopologyStore;

    #[test]
    fn small_box_corner_on_big_face() {
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
        assert_eq!(ds.interf_vf().len(), 4);
        let face = ds.interf_vf()[0].face;
        assert!(ds.interf_vf().iter().all(|i| i.face == face));
        let info = ds.face_info(face).unwrap();
        assert!(info.vertices_in.len() >= 4);
    }
}
