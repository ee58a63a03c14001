//! Explorer crew: a fixed set of named OS threads running [`ExplorerWorker`]s.
//!
//! # Threading model
//!
//! Decoding is CPU-bound and the channel's waits are blocking, so each
//! explorer gets a dedicated OS thread rather than an async task.  Threads
//! are spawned with `std::thread::Builder` so they carry a readable name
//! (`explorer-0`, `explorer-1`, …) in debuggers and panic messages.
//!
//! The crew owns one [`CancellationToken`] shared by all of its workers.
//! [`ExplorerCrew::shutdown`] sets it and joins every thread; dropping the crew
//! does the same without reporting.

use std::io;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use deepspace_core::{CancellationToken, Channel, Transform};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::explore::{ExplorerLocks, ExplorerReport, ExplorerWorker};

/// Error type for crew lifecycle operations.
#[derive(Debug, Error)]
pub enum CrewError {
    /// The OS refused to create an explorer thread.
    #[error("failed to spawn {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    /// An explorer thread panicked instead of returning its report.
    #[error("{name} panicked")]
    WorkerPanicked { name: String },
}

/// A running group of explorers bound to one channel.
pub struct ExplorerCrew {
    cancel: CancellationToken,
    workers: Vec<(String, JoinHandle<ExplorerReport>)>,
}

impl ExplorerCrew {
    /// Spawns `count` explorers on `channel`.
    ///
    /// All explorers share one [`ExplorerLocks`] instance.
    ///
    /// # Errors
    ///
    /// Returns [`CrewError::Spawn`] if a thread cannot be created.  Explorers
    /// spawned before the failure are stopped and joined first.
    pub fn launch(
        count: usize,
        hash_iterations: NonZeroU32,
        channel: Arc<Channel>,
        transform: Arc<dyn Transform>,
    ) -> Result<Self, CrewError> {
        let mut crew = Self {
            cancel: CancellationToken::new(),
            workers: Vec::with_capacity(count),
        };
        let locks = Arc::new(ExplorerLocks::new());

        for id in 0..count {
            let worker = ExplorerWorker::new(
                id,
                hash_iterations,
                Arc::clone(&channel),
                Arc::clone(&locks),
                Arc::clone(&transform),
                crew.cancel.clone(),
            );
            let name = format!("explorer-{id}");
            // On error `crew` is dropped here, which stops the threads already running.
            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker.run())
                .map_err(|source| CrewError::Spawn {
                    name: name.clone(),
                    source,
                })?;
            crew.workers.push((name, handle));
        }

        info!("launched {count} explorers ({hash_iterations} hash iterations each)");
        Ok(crew)
    }

    /// Number of explorer threads in the crew.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Stops every explorer and collects their reports in launch order.
    ///
    /// # Errors
    ///
    /// Returns [`CrewError::WorkerPanicked`] for the first thread that
    /// panicked.  The remaining threads are still joined.
    pub fn shutdown(mut self) -> Result<Vec<ExplorerReport>, CrewError> {
        self.cancel.cancel();
        let workers = std::mem::take(&mut self.workers);

        let mut reports = Vec::with_capacity(workers.len());
        let mut first_panic = None;
        for (name, handle) in workers {
            match handle.join() {
                Ok(report) => {
                    debug!("{name} joined after {} pairs", report.pairs_decoded);
                    reports.push(report);
                }
                Err(_) => {
                    warn!("{name} panicked");
                    first_panic.get_or_insert(CrewError::WorkerPanicked { name });
                }
            }
        }

        match first_panic {
            Some(err) => Err(err),
            None => Ok(reports),
        }
    }
}

impl Drop for ExplorerCrew {
    fn drop(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.cancel.cancel();
        for (name, handle) in std::mem::take(&mut self.workers) {
            if handle.join().is_err() {
                warn!("{name} panicked during drop");
            }
        }
    }
}
