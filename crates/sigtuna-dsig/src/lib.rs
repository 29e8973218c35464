#![forbid(unsafe_code)]

//! XML Digital Signature processing for the Sigtuna verification engine.
//!
//! [`extract`] finds the `ds:Signature` elements of a container's
//! signature manifest; [`verify`] checks one of them cryptographically:
//! reference digests, key selection from `ds:KeyInfo`, and the
//! `SignatureValue` over the canonical `SignedInfo`.

pub mod context;
pub mod extract;
pub mod reference;
pub mod verify;

pub use context::DsigContext;
pub use reference::Reference;
pub use verify::{verify_signature, ValidatedSignature, VerifyResult};

#[cfg(test)]
mod testing;
