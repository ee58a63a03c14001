//! The headquarters/explorer channel and its synchronisation primitives.
//!
//! # Which primitive does what? (for beginners)
//!
//! Two kinds of synchronisation are at work here and they are kept apart:
//!
//! - **Mutual exclusion** – `parking_lot::Mutex` guards each critical section:
//!   the producer-side pairing decision, the inbound queue, and the outbound
//!   queue.  A mutex says "one thread at a time in here".
//!
//! - **Counting availability** – [`gate::AvailabilityGate`] counts how many
//!   complete pairs are ready.  A consumer takes one permit before touching
//!   the inbound queue, so it can never arrive early and find half a pair.
//!
//! Blocking waits accept a [`cancel::CancellationToken`] and report
//! interruption as an explicit [`cancel::Cancelled`] error.
//!
//! # Lock order
//!
//! The pairing lock may take the inbound queue lock while held.  Explorer
//! dequeue locks (owned by the mission crate) also nest the inbound lock.
//! The outbound lock never nests with anything.  Every nesting acquires the
//! inbound lock last, so no cycle exists.

pub mod cancel;
pub mod gate;
pub mod pairing;
pub mod producer;

pub use cancel::{CancellationToken, Cancelled};
pub use gate::AvailabilityGate;
pub use pairing::{Channel, PostOutcome};
pub use producer::{ProducerHandle, ProducerId};
