use crate::error::Result;
use crate::topology::ShapeKind;

use super::{log_stage, run_pairs, PaveFiller};
use crate::operations::boolean::ds::{InterfVE, Pave};
use crate::operations::boolean::iterator::{candidate_pairs, PairScope};

struct VertexOnEdge {
    vertex: usize,
    edge: usize,
    param: f64,
    distance: f64,
}

impl PaveFiller<'_> {
    /// Puts vertices lying on edges of other arguments as paves.
    pub(super) fn perform_ve(&mut self) -> Result<()> {
        let before = self.ds.interf_ve().len();
        let mut tasks = Vec::new();
        let pairs = candidate_pairs(
            &self.ds,
            ShapeKind::Vertex,
            ShapeKind::Edge,
            PairScope::CrossArgument,
        );
        for (v, e) in pairs {
            let sd = self.ds.same_domain_index(v);
            let (v1, v2) = self.ds.edge(e)?.vertices;
            if sd == self.ds.same_domain_index(v1) || sd == self.ds.same_domain_index(v2) {
                continue;
            }
            if self.ds.has_interf(sd, e) {
                continue;
            }
            tasks.push((sd, e));
        }
        tasks.sort_unstable();
        tasks.dedup();

        let ds = &self.ds;
        let oracle = self.oracle;
        let parallel = self.options.parallel;
        let hits = run_pairs(parallel, &tasks, |&(v, e)| -> Result<Option<VertexOnEdge>> {
            let vertex = ds.vertex(v)?;
            let edge = ds.edge(e)?;
            let foot = oracle.project_point_on_curve(&vertex.point, &edge.curve)?;
            let reach = vertex.tolerance + edge.tolerance + ds.fuzzy();
            Ok((foot.distance <= reach).then_some(VertexOnEdge {
                vertex: v,
                edge: e,
                param: foot.parameter,
                distance: foot.distance,
            }))
        });

        for hit in hits {
            self.check_cancelled()?;
            let Some(hit) = hit? else {
                continue;
            };
            if !self.ds.add_ext_pave(hit.edge, Pave::new(hit.vertex, hit.param))? {
                continue;
            }
            self.ds.add_interf_ve(InterfVE {
                vertex: hit.vertex,
                edge: hit.edge,
                param: hit.param,
            });
            self.ds.increase_tolerance(hit.vertex, hit.distance);
        }
        self.split_pave_blocks()?;
        log_stage("vertex/edge", before, self.ds.interf_ve().len());
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
    fn corner_on_edge_splits_it() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(Point3::origin(), Point3::new(2.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        // Sits on top of `a`; its bottom corners land on the two long top edges of `a`.
        let b = MakeBox::new(Point3::new(0.5, 0.0, 1.0), Point3::new(1.5, 1.0, 2.0))
            .execute(&mut store)
            .unwrap();
        let mut filler = PaveFiller::new(vec![a.into(), b.into()], BooleanOptions::default());
        filler.perform(&store).unwrap();
        let ds = filler.ds();
        assert_eq!(ds.interf_ve().len(), 4);
        for interf in ds.interf_ve() {
            let paves = ds.paves_of_edge(interf.edge);
            assert_eq!(paves.len(), 4);
            assert!(paves.windows(2).all(|w| w[0].param < w[1].param));
        }
    }

    #[test]
    fn merged_vertices_touch_an_edge_once() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(Point3::origin(), Point3::new(2.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        // `b` and `c` share their corners on the top edges of `a`.
        let b = MakeBox::new(Point3::new(0.5, 0.0, 1.0), Point3::new(1.5, 1.0, 2.0))
            .execute(&mut store)
            .unwrap();
        let c = MakeBox::new(Point3::new(0.5, -1.0, 1.0), Point3::new(1.5, 0.0, 2.0))
            .execute(&mut store)
            .unwrap();
        let arguments = vec![a.into(), b.into(), c.into()];
        let mut filler = PaveFiller::new(arguments, BooleanOptions::default());
        filler.perform(&store).unwrap();
        let ds = filler.ds();
        assert!(!ds.interf_ve().is_empty());
        let mut seen = std::collections::BTreeSet::new();
        for interf in ds.interf_ve() {
            assert!(seen.insert((interf.vertex, interf.edge)), "{interf:?} recorded twice");
            let paves = ds.paves_of_edge(interf.edge);
            assert!(paves
                .windows(2)
                .all(|w| w[0].vertex != w[1].vertex && w[0].param < w[1].param));
        }
    }
}
