#![forbid(unsafe_code)]

//! XAdES (ETSI TS 101 903) support for the Sigtuna verification engine.
//!
//! After a signature has passed cryptographic validation, its
//! `xades:QualifyingProperties` are located and checked: the signed
//! properties must be covered by the signature, the signing certificate
//! reference must match the certificate that verified it, and trust,
//! revocation and time-stamp decisions are delegated to the validators in
//! [`validator`]. The outcome is a [`SignatureInfo`].

pub mod info;
pub mod properties;
pub mod validation;
pub mod validator;

pub use info::{SignatureInfo, SignatureProductionPlace};
pub use properties::QualifyingProperties;
pub use validation::{XadesPolicy, XadesValidation};
pub use validator::{
    AcceptAllRevocation, AcceptAllTimestamps, AcceptAllTrust, RevocationValidator,
    TimestampValidator, TrustValidator, ValidatorError,
};

#[cfg(test)]
mod testing;
