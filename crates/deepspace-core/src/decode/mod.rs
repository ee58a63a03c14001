//! The decode transform applied by explorers to work payloads.
//!
//! Decoding is a one-way digest applied repeatedly.  The [`digest::Transform`]
//! trait is the seam: production code uses [`digest::Sha256Transform`], tests
//! may substitute anything deterministic.

pub mod digest;
