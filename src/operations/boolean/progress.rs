use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{BopError, Result};

/// A flag shared between the caller and a running operation.
///
/// The operation polls it between stages and between pairs, and stops with
/// [`BopError::Cancelled`] once it is set.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Fails with [`BopError::Cancelled`] if `token` is set.
///
/// # Errors
///
/// Returns [`BopError::Cancelled`] when cancellation was requested.
pub fn check_cancelled(token: Option<&CancellationToken>) -> Result<()> {
    if token.is_some_and(CancellationToken::is_cancelled) {
        return Err(BopError::Cancelled.into());
    }
    Ok(())
}
