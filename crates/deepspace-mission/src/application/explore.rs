//! ExplorerWorker: claims a pair, decodes it, and reports the result.
//!
//! Each worker runs the same three-phase loop until its token is cancelled:
//!
//! ```text
//! WaitForPair ──► Decode ──► PostResult
//!      ▲                         │
//!      └─────────────────────────┘
//! ```
//!
//! - **WaitForPair** – block on the channel's availability gate, then, under
//!   the shared dequeue lock, take exactly two inbound messages: the context
//!   first, the work item second.
//! - **Decode** – apply the transform `hash_iterations` times to the work
//!   payload.  No lock is held, so this is where explorers run in parallel.
//! - **PostResult** – under the shared post lock, build the result message
//!   and hand it to the channel.
//!
//! # Locks shared between workers
//!
//! The dequeue lock and the post lock live in [`ExplorerLocks`], one instance
//! per channel, shared by every worker on that channel.  They are separate, so
//! one worker can be dequeuing while another posts.

use std::num::NonZeroU32;
use std::sync::Arc;

use deepspace_core::{decode, CancellationToken, Cancelled, Channel, Message, Transform};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Error type for one explorer iteration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExploreError {
    /// The token was cancelled while waiting; nothing was dequeued or posted.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    /// A pair permit was claimed but the inbound queue did not hold two
    /// messages.  Only possible when something other than an explorer drains
    /// the inbound queue.
    #[error("pair permit claimed but inbound queue held {found} of 2 messages")]
    IncompletePair { found: usize },
}

/// Locks shared by every explorer working on one channel.
#[derive(Debug, Default)]
pub struct ExplorerLocks {
    /// Serialises the two-message dequeue so pairs are never split.
    dequeue: Mutex<()>,
    /// Serialises result construction and posting.
    post: Mutex<()>,
}

impl ExplorerLocks {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Per-worker statistics returned when the loop exits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplorerReport {
    pub explorer: usize,
    pub pairs_decoded: u64,
    pub incomplete_pairs: u64,
}

/// One explorer.  Run it on its own thread with [`ExplorerWorker::run`].
pub struct ExplorerWorker {
    id: usize,
    hash_iterations: NonZeroU32,
    channel: Arc<Channel>,
    locks: Arc<ExplorerLocks>,
    transform: Arc<dyn Transform>,
    cancel: CancellationToken,
}

impl ExplorerWorker {
    pub fn new(
        id: usize,
        hash_iterations: NonZeroU32,
        channel: Arc<Channel>,
        locks: Arc<ExplorerLocks>,
        transform: Arc<dyn Transform>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            hash_iterations,
            channel,
            locks,
            transform,
            cancel,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Runs one `WaitForPair → Decode → PostResult` iteration.
    ///
    /// # Errors
    ///
    /// - [`ExploreError::Cancelled`] if the token is set before a pair is
    ///   claimed.  Nothing is dequeued or posted.
    /// - [`ExploreError::IncompletePair`] if the claimed pair was not in the
    ///   inbound queue.  Nothing is posted.
    pub fn step(&self) -> Result<(), ExploreError> {
        self.cancel.check()?;
        let (context, work) = self.wait_for_pair()?;
        let decoded = self.decode(&work);
        self.post_result(&context, &work, decoded);
        Ok(())
    }

    /// Loops over [`step`](Self::step) until cancelled.
    pub fn run(self) -> ExplorerReport {
        info!("explorer {} started", self.id);
        let mut report = ExplorerReport {
            explorer: self.id,
            ..ExplorerReport::default()
        };

        loop {
            match self.step() {
                Ok(()) => report.pairs_decoded += 1,
                Err(ExploreError::Cancelled(_)) => break,
                Err(e @ ExploreError::IncompletePair { .. }) => {
                    warn!("explorer {}: {e}", self.id);
                    report.incomplete_pairs += 1;
                }
            }
        }

        info!(
            "explorer {} stopped after {} pairs",
            self.id, report.pairs_decoded
        );
        report
    }

    // ── Phases ────────────────────────────────────────────────────────────────

    fn wait_for_pair(&self) -> Result<(Message, Message), ExploreError> {
        self.channel.wait_for_pair(&self.cancel)?;

        let _dequeue = self.locks.dequeue.lock();
        let Some(context) = self.channel.take_for_explorer() else {
            return Err(ExploreError::IncompletePair { found: 0 });
        };
        let Some(work) = self.channel.take_for_explorer() else {
            warn!("explorer {} dropping orphaned context {context}", self.id);
            return Err(ExploreError::IncompletePair { found: 1 });
        };
        trace!("explorer {} claimed pair {context} / {work}", self.id);
        Ok((context, work))
    }

    fn decode(&self, work: &Message) -> String {
        decode(
            self.transform.as_ref(),
            work.payload(),
            self.hash_iterations.get(),
        )
    }

    fn post_result(&self, context: &Message, work: &Message, decoded: String) {
        let _post = self.locks.post.lock();
        let result = Message::new(context.target_id(), work.target_id(), decoded);
        debug!("explorer {} posting result {result}", self.id);
        self.channel.post_from_explorer(result);
    }
}
