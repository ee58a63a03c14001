//! Application layer: the two roles that sit on either end of the channel.
//!
//! # What is the "application" layer? (for beginners)
//!
//! `deepspace-core` only knows how messages travel.  The application layer
//! decides *what* travels and what happens to it:
//!
//! - **`explore`** – the explorer loop.  Claims a pair, decodes the work
//!   payload, and posts the result back to headquarters.
//!
//! - **`headquarters`** – the producer side.  Builds a mission plan, turns
//!   each assignment into a context/work pair, and collects the results.
//!
//! Nothing here spawns threads or reads files; that belongs to
//! `infrastructure`.

pub mod explore;
pub mod headquarters;
