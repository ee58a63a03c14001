//! The pairing channel shared by headquarters and explorers.
//!
//! The channel owns two FIFO queues running in opposite directions:
//!
//! ```text
//!                   post_from_headquarters (pairs)
//! Headquarters  ─────────────►  inbound queue   ─────────────►  Explorers
//!                                                take_for_explorer (x2)
//!
//!                   take_for_headquarters
//! Headquarters  ◄─────────────  outbound queue  ◄─────────────  Explorers
//!                                                post_from_explorer
//! ```
//!
//! # The pairing protocol
//!
//! Headquarters send their messages two at a time: a *context* message and
//! then a *work* message.  Explorers must never observe one without the other.
//! So the inbound side does not append messages as they arrive:
//!
//! 1. Sentinel payloads (terminate/skip) are dropped.
//! 2. The first message from a producer is parked in that producer's staging
//!    slot.
//! 3. The second message from the same producer completes the pair.  Unless
//!    its origin has been published before, both messages are appended in
//!    order under one inbound lock and one availability permit is released.
//!    The staging slot is cleared either way.
//!
//! The whole decision runs under the pairing lock, so concurrent producers are
//! serialised and "check slot, decide, publish" is indivisible.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::cancel::{CancellationToken, Cancelled};
use super::gate::AvailabilityGate;
use super::producer::{ProducerHandle, ProducerId, ProducerIdAllocator};
use crate::domain::message::{Message, NodeId, Sentinel};

/// What [`Channel::post_from_headquarters`] did with a message.
///
/// Posting is fire-and-forget; the outcome exists for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    /// First of a pair; parked in the producer's staging slot.
    Staged,
    /// Second of a pair; both messages are now visible to explorers.
    Paired,
    /// Second of a pair whose origin was already published; both dropped.
    DuplicateOrigin(NodeId),
    /// Sentinel payload; dropped without touching any state.
    Discarded(Sentinel),
}

/// State guarded by the pairing (producer) lock.
#[derive(Debug, Default)]
struct PairingState {
    /// At most one parked message per producer.  Absent key = empty slot.
    staged: HashMap<ProducerId, Message>,
    /// Origins already published as a pair.  Never pruned.
    completed: HashSet<NodeId>,
}

/// Thread-safe, pairing-aware channel between headquarters and explorers.
///
/// Share it behind an `Arc`; every method takes `&self`.
#[derive(Debug, Default)]
pub struct Channel {
    /// Explorer → headquarters results.
    outbound: Mutex<VecDeque<Message>>,
    /// Headquarters → explorer pairs, always appended two at a time.
    inbound: Mutex<VecDeque<Message>>,
    /// Producer lock: staging slots and completed origins.
    pairing: Mutex<PairingState>,
    /// One permit per complete pair in `inbound`.
    gate: AvailabilityGate,
    producer_ids: ProducerIdAllocator,
}

impl Channel {
    /// Creates an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Producer registration ─────────────────────────────────────────────────

    /// Registers a new logical producer.
    ///
    /// Every headquarters thread (or task) registers once and passes the
    /// returned handle to each [`post_from_headquarters`](Self::post_from_headquarters)
    /// call.  Handles are only meaningful for the channel that issued them.
    pub fn register_producer(&self) -> ProducerHandle {
        let handle = ProducerHandle::new(self.producer_ids.next());
        debug!("registered {}", handle.id());
        handle
    }

    /// Retires a producer, returning the half-pair it left staged, if any.
    ///
    /// The completed-origin set is not touched.
    pub fn retire_producer(&self, producer: ProducerHandle) -> Option<Message> {
        let stranded = self.pairing.lock().staged.remove(&producer.id());
        match &stranded {
            Some(msg) => warn!("{} retired with a staged half-pair: {msg}", producer.id()),
            None => debug!("retired {}", producer.id()),
        }
        stranded
    }

    // ── Headquarters → explorers ──────────────────────────────────────────────

    /// Posts one headquarters message, pairing it with the producer's
    /// previous message.
    ///
    /// See the module documentation for the protocol.  Never fails; the
    /// returned [`PostOutcome`] only reports what happened.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deepspace_core::{Channel, Message, PostOutcome};
    ///
    /// let channel = Channel::new();
    /// let hq = channel.register_producer();
    ///
    /// assert_eq!(channel.post_from_headquarters(&hq, Message::new(1, 10, "A")), PostOutcome::Staged);
    /// assert_eq!(channel.available_pairs(), 0);
    /// assert_eq!(channel.post_from_headquarters(&hq, Message::new(1, 11, "seed")), PostOutcome::Paired);
    /// assert_eq!(channel.available_pairs(), 1);
    /// ```
    pub fn post_from_headquarters(&self, producer: &ProducerHandle, message: Message) -> PostOutcome {
        if let Some(sentinel) = message.sentinel() {
            trace!("{} posted {sentinel} sentinel; discarded", producer.id());
            return PostOutcome::Discarded(sentinel);
        }

        let mut pairing = self.pairing.lock();

        let Some(context) = pairing.staged.remove(&producer.id()) else {
            trace!("{} staged {message}", producer.id());
            pairing.staged.insert(producer.id(), message);
            return PostOutcome::Staged;
        };

        let origin = message.origin_id();
        if !pairing.completed.insert(origin) {
            debug!(
                "{} completed a pair for origin {origin} which was already published; dropped",
                producer.id()
            );
            return PostOutcome::DuplicateOrigin(origin);
        }

        {
            let mut inbound = self.inbound.lock();
            inbound.push_back(context);
            inbound.push_back(message);
        }
        self.gate.release();
        debug!("{} published pair for origin {origin}", producer.id());
        PostOutcome::Paired
    }

    /// Blocks until at least one complete pair is available and claims it.
    ///
    /// After this returns `Ok`, the caller is entitled to two
    /// [`take_for_explorer`](Self::take_for_explorer) calls.  Callers that
    /// share the channel with other consumers must make those two calls under
    /// a common lock so pairs are not split between consumers.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if `cancel` is set while no pair is available.
    pub fn wait_for_pair(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        self.gate.acquire(cancel)
    }

    /// Like [`wait_for_pair`](Self::wait_for_pair) but gives up after
    /// `timeout`, returning `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if `cancel` is set while no pair is available.
    pub fn wait_for_pair_timeout(
        &self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<bool, Cancelled> {
        self.gate.acquire_timeout(timeout, cancel)
    }

    /// Removes the oldest inbound message, or `None` if the queue is empty.
    pub fn take_for_explorer(&self) -> Option<Message> {
        self.inbound.lock().pop_front()
    }

    // ── Explorers → headquarters ──────────────────────────────────────────────

    /// Appends a result for headquarters.  No pairing is involved.
    pub fn post_from_explorer(&self, message: Message) {
        trace!("explorer result {message}");
        self.outbound.lock().push_back(message);
    }

    /// Removes the oldest result, or `None` if there is none yet.
    ///
    /// Non-blocking.  An empty poll is a normal outcome, not an error.
    pub fn take_for_headquarters(&self) -> Option<Message> {
        self.outbound.lock().pop_front()
    }

    // ── Diagnostics ───────────────────────────────────────────────────────────

    /// Complete pairs published but not yet claimed by an explorer.
    pub fn available_pairs(&self) -> usize {
        self.gate.available()
    }

    pub fn inbound_len(&self) -> usize {
        self.inbound.lock().len()
    }

    pub fn outbound_len(&self) -> usize {
        self.outbound.lock().len()
    }

    /// Number of producers currently holding a half-pair.
    pub fn staged_count(&self) -> usize {
        self.pairing.lock().staged.len()
    }

    /// Whether a pair with this origin has already been published.
    pub fn is_origin_completed(&self, origin: NodeId) -> bool {
        self.pairing.lock().completed.contains(&origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_inbound(channel: &Channel) -> Vec<Message> {
        std::iter::from_fn(|| channel.take_for_explorer()).collect()
    }

    // ── Staging and pairing ───────────────────────────────────────────────────

    #[test]
    fn test_first_message_is_staged_not_published() {
        // Arrange
        let channel = Channel::new();
        let hq = channel.register_producer();

        // Act
        let outcome = channel.post_from_headquarters(&hq, Message::new(1, 10, "A"));

        // Assert
        assert_eq!(outcome, PostOutcome::Staged);
        assert_eq!(channel.staged_count(), 1);
        assert_eq!(channel.inbound_len(), 0);
        assert_eq!(channel.available_pairs(), 0);
    }

    #[test]
    fn test_second_message_publishes_pair_in_order() {
        // Arrange
        let channel = Channel::new();
        let hq = channel.register_producer();
        let context = Message::new(1, 10, "A");
        let work = Message::new(1, 11, "seed");

        // Act
        channel.post_from_headquarters(&hq, context.clone());
        let outcome = channel.post_from_headquarters(&hq, work.clone());

        // Assert
        assert_eq!(outcome, PostOutcome::Paired);
        assert_eq!(channel.staged_count(), 0);
        assert_eq!(channel.available_pairs(), 1);
        assert!(channel.is_origin_completed(1));
        assert_eq!(drain_inbound(&channel), vec![context, work]);
    }

    #[test]
    fn test_producers_are_paired_independently() {
        // Arrange – two producers interleave their halves
        let channel = Channel::new();
        let a = channel.register_producer();
        let b = channel.register_producer();

        // Act
        channel.post_from_headquarters(&a, Message::new(1, 10, "a-context"));
        channel.post_from_headquarters(&b, Message::new(2, 20, "b-context"));
        channel.post_from_headquarters(&b, Message::new(2, 21, "b-work"));
        channel.post_from_headquarters(&a, Message::new(1, 11, "a-work"));

        // Assert – each pair is contiguous; b completed first so it is first
        let payloads: Vec<String> = drain_inbound(&channel)
            .into_iter()
            .map(|m| m.into_parts().2)
            .collect();
        assert_eq!(payloads, ["b-context", "b-work", "a-context", "a-work"]);
        assert_eq!(channel.available_pairs(), 2);
    }

    // ── Duplicate-origin guard ────────────────────────────────────────────────

    #[test]
    fn test_duplicate_origin_pair_is_dropped() {
        // Arrange
        let channel = Channel::new();
        let hq = channel.register_producer();
        channel.post_from_headquarters(&hq, Message::new(1, 10, "first-context"));
        channel.post_from_headquarters(&hq, Message::new(1, 11, "first-work"));

        // Act – a second full pair with the same origin
        let staged = channel.post_from_headquarters(&hq, Message::new(1, 12, "again-context"));
        let dup = channel.post_from_headquarters(&hq, Message::new(1, 13, "again-work"));

        // Assert
        assert_eq!(staged, PostOutcome::Staged);
        assert_eq!(dup, PostOutcome::DuplicateOrigin(1));
        assert_eq!(channel.available_pairs(), 1);
        assert_eq!(channel.inbound_len(), 2);
        assert_eq!(channel.staged_count(), 0, "slot is cleared even when dropped");
    }

    #[test]
    fn test_duplicate_guard_spans_producers() {
        let channel = Channel::new();
        let a = channel.register_producer();
        let b = channel.register_producer();
        channel.post_from_headquarters(&a, Message::new(7, 1, "x"));
        channel.post_from_headquarters(&a, Message::new(7, 2, "y"));

        channel.post_from_headquarters(&b, Message::new(7, 3, "x"));
        let outcome = channel.post_from_headquarters(&b, Message::new(7, 4, "y"));

        assert_eq!(outcome, PostOutcome::DuplicateOrigin(7));
        assert_eq!(channel.available_pairs(), 1);
    }

    #[test]
    fn test_duplicate_guard_keys_on_second_message_origin() {
        let channel = Channel::new();
        let hq = channel.register_producer();
        channel.post_from_headquarters(&hq, Message::new(1, 10, "c"));
        channel.post_from_headquarters(&hq, Message::new(1, 11, "w"));

        // The first message's origin is irrelevant to the guard.
        channel.post_from_headquarters(&hq, Message::new(1, 12, "c"));
        let outcome = channel.post_from_headquarters(&hq, Message::new(2, 13, "w"));

        assert_eq!(outcome, PostOutcome::Paired);
        assert!(channel.is_origin_completed(2));
    }

    // ── Sentinels ─────────────────────────────────────────────────────────────

    #[test]
    fn test_sentinels_never_touch_state() {
        // Arrange
        let channel = Channel::new();
        let hq = channel.register_producer();

        // Act
        let terminate = channel.post_from_headquarters(&hq, Message::terminate(1, 10));
        let skip = channel.post_from_headquarters(&hq, Message::skip(1, 11));

        // Assert
        assert_eq!(terminate, PostOutcome::Discarded(Sentinel::Terminate));
        assert_eq!(skip, PostOutcome::Discarded(Sentinel::Skip));
        assert_eq!(channel.staged_count(), 0);
        assert_eq!(channel.inbound_len(), 0);
        assert_eq!(channel.available_pairs(), 0);
        assert!(!channel.is_origin_completed(1));
    }

    #[test]
    fn test_sentinel_between_halves_does_not_break_pair() {
        let channel = Channel::new();
        let hq = channel.register_producer();

        channel.post_from_headquarters(&hq, Message::new(1, 10, "context"));
        channel.post_from_headquarters(&hq, Message::skip(1, 99));
        let outcome = channel.post_from_headquarters(&hq, Message::new(1, 11, "work"));

        assert_eq!(outcome, PostOutcome::Paired);
        let targets: Vec<NodeId> = drain_inbound(&channel).iter().map(Message::target_id).collect();
        assert_eq!(targets, [10, 11]);
    }

    // ── Retirement ────────────────────────────────────────────────────────────

    #[test]
    fn test_retire_returns_stranded_half_pair() {
        let channel = Channel::new();
        let hq = channel.register_producer();
        let context = Message::new(4, 40, "orphan");
        channel.post_from_headquarters(&hq, context.clone());

        let stranded = channel.retire_producer(hq);

        assert_eq!(stranded, Some(context));
        assert_eq!(channel.staged_count(), 0);
    }

    #[test]
    fn test_retire_without_staged_message_returns_none() {
        let channel = Channel::new();
        let hq = channel.register_producer();
        assert_eq!(channel.retire_producer(hq), None);
    }

    // ── Explorer → headquarters ───────────────────────────────────────────────

    #[test]
    fn test_outbound_is_fifo() {
        let channel = Channel::new();
        channel.post_from_explorer(Message::new(1, 2, "first"));
        channel.post_from_explorer(Message::new(3, 4, "second"));

        assert_eq!(channel.outbound_len(), 2);
        assert_eq!(channel.take_for_headquarters().map(|m| m.into_parts().2).as_deref(), Some("first"));
        assert_eq!(channel.take_for_headquarters().map(|m| m.into_parts().2).as_deref(), Some("second"));
        assert_eq!(channel.take_for_headquarters(), None);
    }

    #[test]
    fn test_empty_polls_return_none() {
        let channel = Channel::new();
        assert_eq!(channel.take_for_headquarters(), None);
        assert_eq!(channel.take_for_explorer(), None);
    }

    #[test]
    fn test_outbound_results_are_not_paired() {
        // A single explorer post is immediately visible and never gated.
        let channel = Channel::new();
        channel.post_from_explorer(Message::new(10, 11, "digest"));
        assert_eq!(channel.available_pairs(), 0);
        assert!(channel.take_for_headquarters().is_some());
    }

    // ── Availability wait ─────────────────────────────────────────────────────

    #[test]
    fn test_wait_for_pair_consumes_one_permit() {
        let channel = Channel::new();
        let hq = channel.register_producer();
        channel.post_from_headquarters(&hq, Message::new(1, 10, "c"));
        channel.post_from_headquarters(&hq, Message::new(1, 11, "w"));

        assert_eq!(channel.wait_for_pair(&CancellationToken::new()), Ok(()));
        assert_eq!(channel.available_pairs(), 0);
        assert_eq!(channel.inbound_len(), 2, "waiting does not dequeue");
    }

    #[test]
    fn test_wait_for_pair_timeout_on_empty_channel() {
        let channel = Channel::new();
        let result = channel.wait_for_pair_timeout(Duration::from_millis(10), &CancellationToken::new());
        assert_eq!(result, Ok(false));
    }

    #[test]
    fn test_wait_for_pair_cancelled_on_empty_channel() {
        let channel = Channel::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(channel.wait_for_pair(&cancel), Err(Cancelled));
    }

    #[test]
    fn test_producer_ids_are_distinct() {
        let channel = Channel::new();
        let a = channel.register_producer();
        let b = channel.register_producer();
        assert_ne!(a.id(), b.id());
    }
}
