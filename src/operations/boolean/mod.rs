//! Boolean operations on B-Rep shapes.
//!
//! A run has two stages. The [`PaveFiller`] intersects the arguments
//! pairwise and records everything it finds in the [`ds::Ds`]; the
//! [`Builder`] then splits the argument faces along those intersections,
//! classifies the pieces and assembles the result of one [`Operation`].

mod builder;
mod common;
mod cut;
pub mod ds;
mod filler;
mod fuse;
mod iterator;
mod operation;
mod options;
pub mod oracle;
mod progress;
mod report;
mod section;

pub use builder::{should_keep_face, Builder, FaceState, Group, KeepDecision};
pub use common::Common;
pub use cut::Cut;
pub use filler::PaveFiller;
pub use fuse::Fuse;
pub use operation::{BooleanOperation, BooleanResult, Operation};
pub use options::{BooleanOptions, GlueMode};
pub use oracle::{AnalyticOracle, GeometryOracle};
pub use progress::{check_cancelled, CancellationToken};
pub use report::{Report, Warning};
pub use section::Section;
