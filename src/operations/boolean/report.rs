//! Non-fatal findings of a Boolean run.

use thiserror::Error;
use tracing::warn;

/// A problem that did not stop the run.
///
/// Indices refer to shapes of the intersection data structure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Warning {
    #[error("argument {rank} interferes with itself at shapes {index1} and {index2}")]
    SelfInterferingArgument { rank: usize, index1: usize, index2: usize },
    #[error("edge {edge} is shorter than its vertex tolerances")]
    TooSmallEdge { edge: usize },
    #[error("edge {edge} cannot be split: its vertices are out of tolerance")]
    NotSplittableEdge { edge: usize },
    #[error("sub-shapes {index1} and {index2} of one argument interfere after tolerance growth")]
    AcquiredSelfIntersection { index1: usize, index2: usize },
    #[error("no parameter-space curve for edge {edge} on face {face}")]
    PCurveBuildFailed { edge: usize, face: usize },
    #[error("intersection of shapes {index1} and {index2} failed: {reason}")]
    IntersectionOfPairOfShapesFailed { index1: usize, index2: usize, reason: String },
    #[error("a shell of the result is not closed ({faces} faces dropped)")]
    UnclosedShell { faces: usize },
    #[error("the operation produced an empty result")]
    EmptyResult,
}

/// Warnings collected during a run, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    warnings: Vec<Warning>,
}

impl Report {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning and logs it.
    pub fn add(&mut self, warning: Warning) {
        warn!(%warning, "boolean warning");
        self.warnings.push(warning);
    }

    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Returns `true` if a warning matching `pred` was recorded.
    pub fn contains(&self, pred: impl Fn(&Warning) -> bool) -> bool {
        self.warnings.iter().any(pred)
    }

    /// Appends the warnings of another report.
    pub fn merge(&mut self, other: Report) {
        self.warnings.extend(other.warnings);
    }

    pub fn clear(&mut self) {
        self.warnings.clear();
    }
}
