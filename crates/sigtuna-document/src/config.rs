#![forbid(unsafe_code)]

//! Verification settings, read from TOML.

use serde::{Deserialize, Serialize};
use sigtuna_container::DEFAULT_MAX_ENTRY_SIZE;
use sigtuna_core::Error;
use sigtuna_xades::XadesPolicy;
use std::path::Path;

/// Settings shared by every document service.
///
/// Missing keys take their default, so an empty file is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Trust domain for signer certificate chains.
    pub verify_trust_domain: String,
    /// Trust domain for time-stamp authority certificates.
    pub tsa_trust_domain: String,
    /// Digest used for certificate fingerprints, e.g. `sha512`.
    pub signature_digest_algo: String,
    /// Largest container entry accepted, in bytes.
    pub max_entry_size: u64,
    pub require_signing_time: bool,
    pub require_signed_properties: bool,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            verify_trust_domain: "BE".to_owned(),
            tsa_trust_domain: "BE-TSA".to_owned(),
            signature_digest_algo: "sha512".to_owned(),
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
            require_signing_time: true,
            require_signed_properties: true,
        }
    }
}

impl VerificationConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, Error> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.fingerprint_digest_uri()?;
        if self.max_entry_size == 0 {
            return Err(Error::Config("max_entry_size must be positive".into()));
        }
        if self.verify_trust_domain.trim().is_empty() {
            return Err(Error::Config("verify_trust_domain is empty".into()));
        }
        Ok(())
    }

    /// Algorithm URI for `signature_digest_algo`.
    pub fn fingerprint_digest_uri(&self) -> Result<&'static str, Error> {
        sigtuna_crypto::digest::uri_from_name(&self.signature_digest_algo).map_err(|_| {
            Error::Config(format!(
                "unknown signature_digest_algo {:?}",
                self.signature_digest_algo
            ))
        })
    }

    pub fn xades_policy(&self) -> XadesPolicy {
        XadesPolicy {
            trust_domain: self.verify_trust_domain.clone(),
            timestamp_trust_domain: self.tsa_trust_domain.clone(),
            require_signed_properties: self.require_signed_properties,
            require_signing_time: self.require_signing_time,
        }
    }
}
