//! The immutable message value and its reserved sentinel payloads.
//!
//! Every message carries two identifiers and an opaque string payload:
//!
//! - `origin_id` – the pairing context.  Headquarters give both messages of a
//!   pair the same origin, and the channel publishes each origin at most once.
//! - `target_id` – the unit being described: the parent node for a context
//!   message, the node to decode for a work message.
//! - `payload` – free-form text.  It may be empty.  Two values are reserved
//!   (see [`Sentinel`]) and never travel through the channel.

use std::fmt;

/// Identifier for a node (pairing context, parent, or decoded unit).
///
/// Signed because orchestration layers commonly use `-1` for "no parent";
/// the channel attaches no meaning to any particular value.
pub type NodeId = i32;

/// Reserved payload telling the channel a producer is done.
pub const TERMINATE_PAYLOAD: &str = "EXIT";

/// Reserved payload marking a unit the producer chose not to send.
pub const SKIP_PAYLOAD: &str = "END";

/// A reserved payload value that is dropped on the producer path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    /// The producer has nothing more to send.
    Terminate,
    /// The producer is skipping this unit.
    Skip,
}

impl Sentinel {
    /// Classifies `payload`, returning `None` for ordinary data.
    pub fn from_payload(payload: &str) -> Option<Self> {
        match payload {
            TERMINATE_PAYLOAD => Some(Sentinel::Terminate),
            SKIP_PAYLOAD => Some(Sentinel::Skip),
            _ => None,
        }
    }

    /// The reserved payload string for this sentinel.
    pub fn as_payload(self) -> &'static str {
        match self {
            Sentinel::Terminate => TERMINATE_PAYLOAD,
            Sentinel::Skip => SKIP_PAYLOAD,
        }
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_payload())
    }
}

/// A single message moved through the channel.
///
/// Fields are private so a message cannot be altered once built; ownership
/// moves from producer to channel to consumer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    origin_id: NodeId,
    target_id: NodeId,
    payload: String,
}

impl Message {
    /// Builds a message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deepspace_core::Message;
    ///
    /// let msg = Message::new(1, 11, "seed");
    /// assert_eq!(msg.origin_id(), 1);
    /// assert_eq!(msg.target_id(), 11);
    /// assert_eq!(msg.payload(), "seed");
    /// ```
    pub fn new(origin_id: NodeId, target_id: NodeId, payload: impl Into<String>) -> Self {
        Self {
            origin_id,
            target_id,
            payload: payload.into(),
        }
    }

    /// Builds a message carrying the terminate sentinel.
    pub fn terminate(origin_id: NodeId, target_id: NodeId) -> Self {
        Self::new(origin_id, target_id, TERMINATE_PAYLOAD)
    }

    /// Builds a message carrying the skip sentinel.
    pub fn skip(origin_id: NodeId, target_id: NodeId) -> Self {
        Self::new(origin_id, target_id, SKIP_PAYLOAD)
    }

    pub fn origin_id(&self) -> NodeId {
        self.origin_id
    }

    pub fn target_id(&self) -> NodeId {
        self.target_id
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Returns the sentinel this message carries, if any.
    pub fn sentinel(&self) -> Option<Sentinel> {
        Sentinel::from_payload(&self.payload)
    }

    /// Splits the message into `(origin_id, target_id, payload)`.
    pub fn into_parts(self) -> (NodeId, NodeId, String) {
        (self.origin_id, self.target_id, self.payload)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({} bytes)",
            self.origin_id,
            self.target_id,
            self.payload.len()
        )
    }
}
