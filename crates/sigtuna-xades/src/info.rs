#![forbid(unsafe_code)]

//! The record describing an accepted signature.

use chrono::{DateTime, Utc};
use sigtuna_core::Error;
use sigtuna_keys::SignerCertificate;

/// `xades:SignatureProductionPlace`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureProductionPlace {
    pub city: Option<String>,
    pub state_or_province: Option<String>,
    pub postal_code: Option<String>,
    pub country_name: Option<String>,
}

impl SignatureProductionPlace {
    pub fn is_empty(&self) -> bool {
        self.city.is_none()
            && self.state_or_province.is_none()
            && self.postal_code.is_none()
            && self.country_name.is_none()
    }
}

/// An accepted signature.
#[derive(Debug, Clone)]
pub struct SignatureInfo {
    signer: SignerCertificate,
    chain: Vec<SignerCertificate>,
    signing_time: Option<DateTime<Utc>>,
    claimed_roles: Vec<String>,
    production_place: Option<SignatureProductionPlace>,
    signature_id: Option<String>,
    signature_method: String,
}

impl SignatureInfo {
    pub(crate) fn new(
        signer: SignerCertificate,
        chain: Vec<SignerCertificate>,
        signature_id: Option<String>,
        signature_method: String,
    ) -> Self {
        Self {
            signer,
            chain,
            signing_time: None,
            claimed_roles: Vec::new(),
            production_place: None,
            signature_id,
            signature_method,
        }
    }

    pub(crate) fn with_properties(
        mut self,
        signing_time: Option<DateTime<Utc>>,
        claimed_roles: Vec<String>,
        production_place: Option<SignatureProductionPlace>,
    ) -> Self {
        self.signing_time = signing_time;
        self.claimed_roles = claimed_roles;
        self.production_place = production_place;
        self
    }

    /// The certificate whose key verified the signature.
    pub fn signer(&self) -> &SignerCertificate {
        &self.signer
    }

    /// Leaf first, as found in `ds:KeyInfo`.
    pub fn chain(&self) -> &[SignerCertificate] {
        &self.chain
    }

    /// `xades:SigningTime`, the claimed time of signing.
    pub fn signing_time(&self) -> Option<DateTime<Utc>> {
        self.signing_time
    }

    pub fn claimed_roles(&self) -> &[String] {
        &self.claimed_roles
    }

    pub fn production_place(&self) -> Option<&SignatureProductionPlace> {
        self.production_place.as_ref()
    }

    pub fn signature_id(&self) -> Option<&str> {
        self.signature_id.as_deref()
    }

    pub fn signature_method(&self) -> &str {
        &self.signature_method
    }

    /// Hex digest of the signer certificate.
    pub fn certificate_fingerprint(&self, digest_uri: &str) -> Result<String, Error> {
        let digest = self.signer.digest(digest_uri)?;
        Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
    }
}
