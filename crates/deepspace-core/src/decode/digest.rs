//! Repeated SHA-256 digest used to decode a work payload.
//!
//! Each application hashes the UTF-8 bytes of its input with SHA-256 and
//! renders the 32-byte digest as 64 lowercase hexadecimal characters.  The
//! next application hashes that hex string, and so on.  Because every step is
//! a pure function of its input:
//!
//! - decoding the same input the same number of times always yields the same
//!   output, and
//! - decoding `k` times equals decoding once more after `k - 1` rounds.

use sha2::{Digest, Sha256};

/// Length of one hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// One application of a deterministic, one-way string transform.
///
/// Implementations must be pure: the same input always maps to the same
/// output.  `Send + Sync` lets one instance be shared by every explorer.
pub trait Transform: Send + Sync {
    /// Applies the transform once.
    fn apply(&self, input: &str) -> String;
}

/// SHA-256 over UTF-8 bytes, lowercase hex output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Transform;

impl Transform for Sha256Transform {
    fn apply(&self, input: &str) -> String {
        hex::encode(Sha256::digest(input.as_bytes()))
    }
}

/// Applies `transform` to `input` `rounds` times.
///
/// Zero rounds returns the input unchanged.
///
/// # Examples
///
/// ```rust
/// use deepspace_core::{decode, Sha256Transform, Transform};
///
/// let once = decode(&Sha256Transform, "seed", 1);
/// assert_eq!(once, Sha256Transform.apply("seed"));
/// assert_eq!(decode(&Sha256Transform, "seed", 3), decode(&Sha256Transform, &decode(&Sha256Transform, "seed", 2), 1));
/// ```
pub fn decode<T: Transform + ?Sized>(transform: &T, input: &str, rounds: u32) -> String {
    (0..rounds).fold(input.to_owned(), |acc, _| transform.apply(&acc))
}
