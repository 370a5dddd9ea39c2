use tracing::debug;

use crate::error::Result;
use crate::topology::ShapeKind;

use super::PaveFiller;
use crate::operations::boolean::ds::InterfVV;
use crate::operations::boolean::iterator::{candidate_pairs, PairScope};
use crate::operations::boolean::report::Warning;

impl PaveFiller<'_> {
    /// Merges coinciding vertices of different arguments.
    pub(super) fn perform_vv(&mut self) -> Result<()> {
        self.check_self_interfering_vertices()?;

        let mut hits = Vec::new();
        let pairs = candidate_pairs(
            &self.ds,
            ShapeKind::Vertex,
            ShapeKind::Vertex,
            PairScope::CrossArgument,
        );
        for (i, j) in pairs {
            if self.ds.same_domain_index(i) == self.ds.same_domain_index(j) {
                continue;
            }
            let (vi, vj) = (self.ds.vertex(i)?, self.ds.vertex(j)?);
            if (vi.point - vj.point).norm() <= vi.tolerance.max(vj.tolerance) + self.ds.fuzzy() {
                hits.push((i, j));
            }
        }
        let merged = self.merge_vertices(&hits)?;
        for &(i, j) in &hits {
            let new_vertex = self.ds.same_domain_index(i);
            self.ds.add_interf_vv(InterfVV {
                vertex1: i,
                vertex2: j,
                new_vertex,
            });
        }
        debug!(pairs = hits.len(), groups = merged.len(), "vertex/vertex done");
        Ok(())
    }

    /// Reports distinct vertices of one argument that coincide.
    fn check_self_interfering_vertices(&mut self) -> Result<()> {
        let pairs = candidate_pairs(
            &self.ds,
            ShapeKind::Vertex,
            ShapeKind::Vertex,
            PairScope::SameArgument,
        );
        for (i, j) in pairs {
            let (vi, vj) = (self.ds.vertex(i)?, self.ds.vertex(j)?);
            if (vi.point - vj.point).norm() <= vi.tolerance.max(vj.tolerance) {
                let rank = self.ds.rank(i).unwrap_or_default();
                self.report.add(Warning::SelfInterferingArgument {
                    rank,
                    index1: i,
                    index2: j,
                });
            }
        }
        Ok(())
    }
}
