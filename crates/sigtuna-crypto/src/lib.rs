#![forbid(unsafe_code)]

//! Cryptographic primitives for the Sigtuna verification engine.
//!
//! Verification only: digests over reference data and checks of
//! `SignatureValue` against a public key taken from the signer
//! certificate.

pub mod digest;
pub mod sign;

pub use digest::DigestAlgorithm;
pub use sign::{SignatureAlgorithm, VerifyingKey};

/// Compare two byte strings without short-circuiting on the first
/// differing byte.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
