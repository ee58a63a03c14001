//! Producer identities for the pairing protocol.
//!
//! # Why explicit handles? (for beginners)
//!
//! The channel pairs each producer's two consecutive messages.  To do that it
//! must know *which* producer sent a message.  Instead of guessing from the
//! calling thread, every producer registers once and gets a
//! [`ProducerHandle`].  The handle works the same whether the producer is an
//! OS thread, a task on an async runtime, or a plain loop in a test.
//!
//! Handles are deliberately not `Clone`: one handle is one logical producer,
//! and two threads sharing a handle would interleave their pairs.
//!
//! # Thread safety
//!
//! Ids are issued by [`ProducerIdAllocator`], which wraps an `AtomicU64`.
//! An atomic operation reads, modifies, and writes a value as a single
//! indivisible step, so concurrent registrations never receive the same id.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of a registered producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProducerId(u64);

impl ProducerId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "producer-{}", self.0)
    }
}

/// Proof of registration handed to one logical producer.
///
/// Obtain one from [`crate::Channel::register_producer`] and pass it to every
/// [`crate::Channel::post_from_headquarters`] call made by that producer.
#[derive(Debug)]
pub struct ProducerHandle {
    id: ProducerId,
}

impl ProducerHandle {
    pub(crate) fn new(id: ProducerId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> ProducerId {
        self.id
    }
}

/// A thread-safe, monotonically increasing source of [`ProducerId`]s.
///
/// Ids start at 0 and increment by 1 per call to [`next`](Self::next).
#[derive(Debug, Default)]
pub struct ProducerIdAllocator {
    inner: AtomicU64,
}

impl ProducerIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next unused id.
    ///
    /// `Ordering::Relaxed` is enough: uniqueness comes from the atomicity of
    /// `fetch_add`, and no other memory is published through this counter.
    pub fn next(&self) -> ProducerId {
        ProducerId(self.inner.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of ids issued so far.
    pub fn issued(&self) -> u64 {
        self.inner.load(Ordering::Relaxed)
    }
}
