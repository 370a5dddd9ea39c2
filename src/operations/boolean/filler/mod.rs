//! The pave filler: intersects the arguments pairwise and fills the DS.
//!
//! Stages run in a fixed order, each one reading what the previous ones
//! recorded:
//!
//! 1. vertex/vertex, which merges coinciding vertices into same-domain ones;
//! 2. vertex/edge, which puts vertices lying on edges as paves;
//! 3. edge/edge, crossings and coincident spans;
//! 4. vertex/face;
//! 5. edge/face, crossings and edges lying on faces;
//! 6. face/face, section curves with their paves.
//!
//! Post-treatment then turns section curves into section pave blocks,
//! creates split edges and refreshes the per-face information.

mod edge_edge;
mod edge_face;
mod face_face;
mod post_treat;
mod same_domain;
mod split_edges;
mod vertex_edge;
mod vertex_face;
mod vertex_vertex;

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::topology::{Shape, TopologyStore};

use super::ds::Ds;
use super::options::{BooleanOptions, GlueMode};
use super::oracle::{AnalyticOracle, GeometryOracle};
use super::progress::check_cancelled;
use super::report::Report;

static ANALYTIC: AnalyticOracle = AnalyticOracle;

/// Intersects the arguments of a Boolean operation.
pub struct PaveFiller<'a> {
    arguments: Vec<Shape>,
    options: BooleanOptions,
    oracle: &'a dyn GeometryOracle,
    ds: Ds,
    report: Report,
    complete: bool,
    initial_tolerances: Vec<f64>,
}

impl std::fmt::Debug for PaveFiller<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaveFiller")
            .field("arguments", &self.arguments)
            .field("options", &self.options)
            .field("complete", &self.complete)
            .finish_non_exhaustive()
    }
}

impl PaveFiller<'static> {
    /// Creates a filler using the analytic oracle.
    #[must_use]
    pub fn new(arguments: Vec<Shape>, options: BooleanOptions) -> Self {
        PaveFiller::with_oracle(arguments, options, &ANALYTIC)
    }
}

impl<'a> PaveFiller<'a> {
    /// Creates a filler using a custom geometry oracle.
    #[must_use]
    pub fn with_oracle(
        arguments: Vec<Shape>,
        options: BooleanOptions,
        oracle: &'a dyn GeometryOracle,
    ) -> Self {
        Self {
            arguments,
            options,
            oracle,
            ds: Ds::new(),
            report: Report::new(),
            complete: false,
            initial_tolerances: Vec::new(),
        }
    }

    /// Runs every stage. Calling it again recomputes from scratch.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BopError::TooFewArguments`] or
    /// [`crate::BopError::NullInputShape`] for bad arguments,
    /// [`crate::BopError::Cancelled`] when cancelled, and
    /// [`crate::BopError::IntersectionFailed`] if the DS becomes inconsistent.
    #[instrument(skip_all, fields(arguments = self.arguments.len()))]
    pub fn perform(&mut self, store: &TopologyStore) -> Result<()> {
        self.complete = false;
        self.report.clear();
        self.ds.init(store, &self.arguments, self.options.fuzzy_value)?;
        self.initial_tolerances = (0..self.ds.len()).map(|i| self.ds.tolerance(i)).collect();
        self.ds.init_all_pave_blocks()?;

        self.check_cancelled()?;
        self.perform_vv()?;
        self.check_cancelled()?;
        self.perform_ve()?;
        self.check_cancelled()?;
        self.perform_ee()?;
        self.check_cancelled()?;
        self.perform_vf()?;
        self.check_cancelled()?;
        self.perform_ef()?;
        self.check_cancelled()?;
        self.perform_ff()?;
        self.check_cancelled()?;

        self.post_treat_ff()?;
        self.make_split_edges()?;
        self.make_pcurves();
        self.update_face_infos()?;
        self.check_acquired_self_intersections();

        self.complete = true;
        let counts = self.ds.summary().interferences;
        info!(
            vv = counts[0],
            ve = counts[1],
            ee = counts[2],
            vf = counts[3],
            ef = counts[4],
            ff = counts[5],
            warnings = self.report.warnings().len(),
            "pave filler done"
        );
        Ok(())
    }

    /// The filled DS.
    #[must_use]
    pub fn ds(&self) -> &Ds {
        &self.ds
    }

    #[must_use]
    pub fn report(&self) -> &Report {
        &self.report
    }

    #[must_use]
    pub fn options(&self) -> &BooleanOptions {
        &self.options
    }

    #[must_use]
    pub fn oracle(&self) -> &'a dyn GeometryOracle {
        self.oracle
    }

    #[must_use]
    pub fn arguments(&self) -> &[Shape] {
        &self.arguments
    }

    /// Returns `true` once [`PaveFiller::perform`] finished without error.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    fn check_cancelled(&self) -> Result<()> {
        check_cancelled(self.options.cancel.as_ref())
    }

    /// Returns `true` if gluing allows skipping crossings of `i` and `j`.
    fn glue_skips_crossings(&self, i: usize, j: usize) -> bool {
        match self.options.glue {
            GlueMode::Off => false,
            GlueMode::Full => true,
            GlueMode::Shift => {
                let (Ok(a), Ok(b)) = (self.ds.shape_info(i), self.ds.shape_info(j)) else {
                    return false;
                };
                let gap = a.tolerance().max(b.tolerance()) + self.ds.fuzzy();
                (a.bbox.min - b.bbox.min).amax() <= gap && (a.bbox.max - b.bbox.max).amax() <= gap
            }
        }
    }

    /// Tolerance of shape `i` when the run started.
    fn initial_tolerance(&self, i: usize) -> f64 {
        self.initial_tolerances.get(i).copied().unwrap_or(0.0)
    }
}

/// Maps `f` over `items`, on the rayon pool when `parallel` is set.
///
/// Results keep the order of `items`, so the single writer applying them
/// sees the same sequence either way.
fn run_pairs<T, R, F>(parallel: bool, items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    if parallel {
        items.par_iter().map(f).collect()
    } else {
        items.iter().map(f).collect()
    }
}

fn log_stage(stage: &str, before: usize, after: usize) {
    debug!(stage, found = after.saturating_sub(before), "stage done");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::boolean::progress::CancellationToken;
    use crate::operations::creation::MakeBox;
    use crate::{BopError, GeolisError};

    fn cubes(store: &mut TopologyStore, offset: f64) -> Vec<Shape> {
        let a = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)).execute(store).unwrap();
        let b = MakeBox::new(
            Point3::new(offset, offset, offset),
            Point3::new(offset + 1.0, offset + 1.0, offset + 1.0),
        )
        .execute(store)
        .unwrap();
        vec![a.into(), b.into()]
    }

    #[test]
    fn overlapping_cubes_produce_sections() {
        let mut store = TopologyStore::new();
        let args = cubes(&mut store, 0.5);
        let mut filler = PaveFiller::new(args, BooleanOptions::default());
        filler.perform(&store).unwrap();
        assert!(filler.is_complete());
        let ds = filler.ds();
        assert!(!ds.interf_ef().is_empty());
        let sections: usize = ds
            .interf_ff()
            .iter()
            .flat_map(|ff| &ff.curves)
            .map(|c| c.pave_blocks.len())
            .sum();
        assert_eq!(sections, 6);
    }

    #[test]
    fn running_twice_gives_the_same_ds() {
        let mut store = TopologyStore::new();
        let args = cubes(&mut store, 0.5);
        let mut filler = PaveFiller::new(args, BooleanOptions::default());
        filler.perform(&store).unwrap();
        let first = filler.ds().summary();
        filler.perform(&store).unwrap();
        assert_eq!(first, filler.ds().summary());
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut store = TopologyStore::new();
        let args = cubes(&mut store, 0.5);
        let mut seq = PaveFiller::new(args.clone(), BooleanOptions::default());
        seq.perform(&store).unwrap();
        let mut par = PaveFiller::new(args, BooleanOptions::default().with_parallel(true));
        par.perform(&store).unwrap();
        assert_eq!(seq.ds().summary(), par.ds().summary());
    }

    #[test]
    fn cancelled_run_is_incomplete() {
        let mut store = TopologyStore::new();
        let args = cubes(&mut store, 0.5);
        let token = CancellationToken::new();
        token.cancel();
        let mut filler = PaveFiller::new(args, BooleanOptions::default().with_cancel(token));
        let err = filler.perform(&store).unwrap_err();
        assert!(matches!(err, GeolisError::Boolean(BopError::Cancelled)));
        assert!(!filler.is_complete());
    }
}
