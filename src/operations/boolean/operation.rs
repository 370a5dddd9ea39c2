use tracing::instrument;

use crate::error::{BopError, Result};
use crate::topology::{Shape, TopologyStore};

use super::builder::Builder;
use super::filler::PaveFiller;
use super::options::BooleanOptions;
use super::report::Report;

/// The Boolean operation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// The part common to objects and tools.
    Common,
    /// Everything covered by objects or tools.
    Fuse,
    /// Objects minus tools.
    Cut,
    /// Tools minus objects.
    CutReversed,
    /// Edges and vertices where objects and tools meet.
    Section,
}

/// Outcome of a Boolean operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanResult {
    /// The result, `None` when empty.
    pub shape: Option<Shape>,
    /// Warnings of the intersection and building stages.
    pub report: Report,
}

/// A Boolean operation between a group of objects and a group of tools.
#[derive(Debug, Clone)]
pub struct BooleanOperation {
    operation: Operation,
    objects: Vec<Shape>,
    tools: Vec<Shape>,
    options: BooleanOptions,
}

impl BooleanOperation {
    #[must_use]
    pub fn new(operation: Operation, objects: Vec<Shape>, tools: Vec<Shape>) -> Self {
        Self {
            operation,
            objects,
            tools,
            options: BooleanOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: BooleanOptions) -> Self {
        self.options = options;
        self
    }

    /// Intersects the arguments and builds the result in `store`.
    ///
    /// # Errors
    ///
    /// Returns [`BopError::NullInputShape`] if either group is empty, and
    /// any error of [`PaveFiller::perform`] or [`Builder::perform`].
    #[instrument(skip_all, fields(operation = ?self.operation))]
    pub fn execute(&self, store: &mut TopologyStore) -> Result<BooleanResult> {
        if self.objects.is_empty() {
            return Err(BopError::NullInputShape("no objects".into()).into());
        }
        if self.tools.is_empty() {
            return Err(BopError::NullInputShape("no tools".into()).into());
        }
        let arguments: Vec<Shape> = self.objects.iter().chain(&self.tools).copied().collect();
        let mut filler = PaveFiller::new(arguments, self.options.clone());
        filler.perform(store)?;

        let mut builder = Builder::new(&filler);
        let shape = builder.perform(store, self.operation, self.objects.len())?;
        let mut report = filler.report().clone();
        report.merge(builder.report().clone());
        Ok(BooleanResult { shape, report })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::boolean::progress::CancellationToken;
    use crate::operations::creation::MakeBox;
    use crate::GeolisError;

    #[test]
    fn empty_groups_are_refused() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let err = BooleanOperation::new(Operation::Fuse, vec![a.into()], vec![])
            .execute(&mut store)
            .unwrap_err();
        assert!(matches!(err, GeolisError::Boolean(BopError::NullInputShape(_))));
        let err = BooleanOperation::new(Operation::Fuse, vec![], vec![a.into()])
            .execute(&mut store)
            .unwrap_err();
        assert!(matches!(err, GeolisError::Boolean(BopError::NullInputShape(_))));
    }

    #[test]
    fn cancelled_runs_stop() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let b = MakeBox::new(Point3::new(0.5, 0.5, 0.5), Point3::new(1.5, 1.5, 1.5))
            .execute(&mut store)
            .unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let err = BooleanOperation::new(Operation::Common, vec![a.into()], vec![b.into()])
            .with_options(BooleanOptions::default().with_cancel(token))
            .execute(&mut store)
            .unwrap_err();
        assert!(matches!(err, GeolisError::Boolean(BopError::Cancelled)));
    }

    #[test]
    fn several_tools_act_together() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(Point3::origin(), Point3::new(3.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let t1 = MakeBox::new(Point3::new(-0.5, -0.5, 0.5), Point3::new(0.5, 1.5, 1.5))
            .execute(&mut store)
            .unwrap();
        let t2 = MakeBox::new(Point3::new(2.5, -0.5, 0.5), Point3::new(3.5, 1.5, 1.5))
            .execute(&mut store)
            .unwrap();
        let tools = vec![t1.into(), t2.into()];
        let result = BooleanOperation::new(Operation::Cut, vec![a.into()], tools)
            .execute(&mut store)
            .unwrap();
        let volume = crate::operations::query::Volume::new(result.shape.unwrap())
            .execute(&store)
            .unwrap();
        assert!((volume - 2.5).abs() < 1e-9);
    }
}
