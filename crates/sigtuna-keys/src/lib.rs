#![forbid(unsafe_code)]

//! Key material for the Sigtuna verification engine.
//!
//! Signer certificates are taken from `ds:KeyInfo/ds:X509Data`; the leaf
//! certificate supplies the verifying key. Trust decisions are not made
//! here.

pub mod cert;
pub mod keyinfo;

pub use cert::SignerCertificate;
pub use keyinfo::{KeyInfoKeySelector, KeySelector, SelectedKey};

#[cfg(test)]
mod testing;
