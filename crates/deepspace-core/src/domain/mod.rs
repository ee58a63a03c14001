//! Domain values exchanged through the channel.
//!
//! Nothing in here knows about locks or threads.  A [`message::Message`] is
//! created by a producer, moved into the channel, and moved out again by
//! exactly one consumer.

pub mod message;
