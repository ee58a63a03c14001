//! Cooperative cancellation for blocking waits.
//!
//! A [`CancellationToken`] is a shared flag.  Cloning it yields another handle
//! to the same flag, so one clone can be kept by the owner while workers hold
//! the others.  Blocking operations in this crate re-check the flag at least
//! every [`CANCEL_POLL_INTERVAL`] and return [`Cancelled`] once it is set.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use thiserror::Error;

/// Longest time a blocked wait goes without re-checking its token.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Returned by a blocking operation that was interrupted before it could
/// complete.  The operation performed no action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("wait cancelled")]
pub struct Cancelled;

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag.  Every clone observes it; it cannot be cleared.
    pub fn cancel(&self) {
        // Release pairs with the Acquire in `is_cancelled` so state written
        // before cancelling is visible to threads that observe the flag.
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Returns `Err(Cancelled)` if the flag is set.
    ///
    /// Convenient at the top of a loop body: `token.check()?;`.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
