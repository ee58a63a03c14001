//! Counting gate that signals how many complete pairs are ready.
//!
//! The gate is a counting semaphore built from a `parking_lot::Mutex<usize>`
//! and a `Condvar`.  [`AvailabilityGate::release`] adds one permit per pair
//! published; [`AvailabilityGate::acquire`] removes one, blocking while none
//! are available.
//!
//! # Why poll the token? (for beginners)
//!
//! A condition variable only wakes when somebody notifies it, and the
//! cancellation token knows nothing about this gate.  Instead of wiring every
//! token to every gate, a blocked waiter sleeps for at most
//! [`CANCEL_POLL_INTERVAL`] at a time and re-checks the token on each wake-up.
//! A real `release` still wakes a waiter immediately.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::cancel::{CancellationToken, Cancelled, CANCEL_POLL_INTERVAL};

/// Counting availability signal.
#[derive(Debug, Default)]
pub struct AvailabilityGate {
    permits: Mutex<usize>,
    available: Condvar,
}

impl AvailabilityGate {
    /// Creates a gate with no permits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one permit and wakes one waiter.
    pub fn release(&self) {
        let mut permits = self.permits.lock();
        *permits += 1;
        self.available.notify_one();
    }

    /// Takes a permit if one is available, without blocking.
    pub fn try_acquire(&self) -> bool {
        let mut permits = self.permits.lock();
        if *permits > 0 {
            *permits -= 1;
            true
        } else {
            false
        }
    }

    /// Takes a permit, blocking until one is available.
    ///
    /// A permit that is already available is handed out even if `cancel` is
    /// set; cancellation only interrupts an actual wait.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if `cancel` is set while no permit is available.
    /// No permit is consumed in that case.
    pub fn acquire(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        let mut permits = self.permits.lock();
        loop {
            if *permits > 0 {
                *permits -= 1;
                return Ok(());
            }
            cancel.check()?;
            self.available.wait_for(&mut permits, CANCEL_POLL_INTERVAL);
        }
    }

    /// Like [`acquire`](Self::acquire) but gives up after `timeout`.
    ///
    /// Returns `Ok(true)` if a permit was taken and `Ok(false)` on timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if `cancel` is set while no permit is available.
    pub fn acquire_timeout(
        &self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<bool, Cancelled> {
        let deadline = Instant::now() + timeout;
        let mut permits = self.permits.lock();
        loop {
            if *permits > 0 {
                *permits -= 1;
                return Ok(true);
            }
            cancel.check()?;
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            let slice = (deadline - now).min(CANCEL_POLL_INTERVAL);
            self.available.wait_for(&mut permits, slice);
        }
    }

    /// Current number of unclaimed permits.
    ///
    /// Diagnostic only: the value can change as soon as the lock is released.
    pub fn available(&self) -> usize {
        *self.permits.lock()
    }
}
