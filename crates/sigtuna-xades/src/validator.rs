#![forbid(unsafe_code)]

//! Decisions delegated to external services: trust in a certificate
//! chain, revocation status, and time-stamp tokens.
//!
//! Any error from these validators rejects the signature being checked;
//! it never aborts verification of the other signatures.

use chrono::{DateTime, Utc};
use sigtuna_keys::SignerCertificate;

/// Why a validator did not approve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidatorError {
    /// The service examined the input and refused it.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The service could not reach a decision.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// Decides whether a certificate chain is trusted within a trust domain.
pub trait TrustValidator: Send + Sync {
    /// `chain` is leaf first; `at` is the time the chain must be valid at.
    fn validate(
        &self,
        chain: &[SignerCertificate],
        trust_domain: &str,
        at: DateTime<Utc>,
    ) -> Result<(), ValidatorError>;
}

/// Validates an RFC 3161 time-stamp token over `signed_data`.
pub trait TimestampValidator: Send + Sync {
    /// `claimed_time` is the signer's `SigningTime`, if any; the token's
    /// authority must be trusted within `trust_domain`.
    fn validate(
        &self,
        token: &[u8],
        signed_data: &[u8],
        claimed_time: Option<DateTime<Utc>>,
        trust_domain: &str,
    ) -> Result<(), ValidatorError>;
}

/// Checks that `certificate` was not revoked at `at`.
pub trait RevocationValidator: Send + Sync {
    fn check(
        &self,
        certificate: &SignerCertificate,
        issuer: Option<&SignerCertificate>,
        at: DateTime<Utc>,
    ) -> Result<(), ValidatorError>;
}

/// Trusts every chain.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAllTrust;

impl TrustValidator for AcceptAllTrust {
    fn validate(
        &self,
        chain: &[SignerCertificate],
        trust_domain: &str,
        _at: DateTime<Utc>,
    ) -> Result<(), ValidatorError> {
        log::debug!(
            "accepting chain of {} certificate(s) for trust domain {trust_domain} without checks",
            chain.len()
        );
        Ok(())
    }
}

/// Accepts every time-stamp token.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAllTimestamps;

impl TimestampValidator for AcceptAllTimestamps {
    fn validate(
        &self,
        _token: &[u8],
        _signed_data: &[u8],
        _claimed_time: Option<DateTime<Utc>>,
        _trust_domain: &str,
    ) -> Result<(), ValidatorError> {
        Ok(())
    }
}

/// Reports every certificate as not revoked.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAllRevocation;

impl RevocationValidator for AcceptAllRevocation {
    fn check(
        &self,
        _certificate: &SignerCertificate,
        _issuer: Option<&SignerCertificate>,
        _at: DateTime<Utc>,
    ) -> Result<(), ValidatorError> {
        Ok(())
    }
}
