use crate::error::Result;
use crate::topology::{Shape, TopologyStore};

use super::operation::{BooleanOperation, BooleanResult, Operation};
use super::options::BooleanOptions;

/// Computes the boolean common part of two shapes.
#[derive(Debug, Clone)]
pub struct Common {
    shape_a: Shape,
    shape_b: Shape,
    options: BooleanOptions,
}

impl Common {
    /// Creates a new `Common` operation.
    #[must_use]
    pub fn new(shape_a: impl Into<Shape>, shape_b: impl Into<Shape>) -> Self {
        Self {
            shape_a: shape_a.into(),
            shape_b: shape_b.into(),
            options: BooleanOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: BooleanOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes the operation, creating the result in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<BooleanResult> {
        BooleanOperation::new(Operation::Common, vec![self.shape_a], vec![self.shape_b])
            .with_options(self.options.clone())
            .execute(store)
    }
}
