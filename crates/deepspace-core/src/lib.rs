//! # deepspace-core
//!
//! Shared library for the deepspace mission containing the pairing channel,
//! the pair-availability gate, cooperative cancellation, and the decode
//! transform.
//!
//! This crate is used by the mission crate's explorer workers and by any
//! headquarters orchestration layer.  It never spawns threads or touches the
//! file system.
//!
//! # Architecture overview (for beginners)
//!
//! Two populations of threads share one [`Channel`]:
//!
//! - **Headquarters** threads post messages in pairs: first a *context*
//!   message, then a *work* message.  The channel holds the first one in a
//!   per-producer staging slot until its partner arrives, then publishes both
//!   together so nobody ever observes half a pair.
//!
//! - **Explorer** threads wait until a whole pair is available, take both
//!   messages, run the decode transform on the work payload, and post a single
//!   result back on the opposite queue for headquarters to poll.
//!
//! The modules:
//!
//! - **`domain`** – The immutable [`Message`] value and its reserved
//!   [`Sentinel`] payloads.
//!
//! - **`channel`** – The [`Channel`] itself plus the synchronisation pieces it
//!   is built from: the counting [`AvailabilityGate`], the
//!   [`CancellationToken`] every blocking wait honours, and the
//!   [`ProducerHandle`] that identifies one logical producer.
//!
//! - **`decode`** – The [`Transform`] seam and the SHA-256 implementation
//!   applied repeatedly by explorers.

pub mod channel;
pub mod decode;
pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `deepspace_core::Channel` instead of `deepspace_core::channel::pairing::Channel`.
pub use channel::cancel::{CancellationToken, Cancelled, CANCEL_POLL_INTERVAL};
pub use channel::gate::AvailabilityGate;
pub use channel::pairing::{Channel, PostOutcome};
pub use channel::producer::{ProducerHandle, ProducerId};
pub use decode::digest::{decode, Sha256Transform, Transform, DIGEST_HEX_LEN};
pub use domain::message::{Message, NodeId, Sentinel, SKIP_PAYLOAD, TERMINATE_PAYLOAD};
