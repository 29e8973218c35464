#![forbid(unsafe_code)]

//! X.509 certificates carried in `ds:X509Data`.

use chrono::{DateTime, Utc};
use der::{Decode, Encode};
use sigtuna_core::Error;
use sigtuna_crypto::VerifyingKey;

/// A parsed certificate together with the DER it was decoded from.
#[derive(Debug, Clone)]
pub struct SignerCertificate {
    der: Vec<u8>,
    cert: x509_cert::Certificate,
}

impl PartialEq for SignerCertificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for SignerCertificate {}

impl SignerCertificate {
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let cert = x509_cert::Certificate::from_der(der)
            .map_err(|e| Error::Certificate(format!("failed to parse X.509 certificate: {e}")))?;
        Ok(Self {
            der: der.to_vec(),
            cert,
        })
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn certificate(&self) -> &x509_cert::Certificate {
        &self.cert
    }

    /// Subject distinguished name in RFC 4514 form.
    pub fn subject(&self) -> String {
        self.cert.tbs_certificate.subject.to_string()
    }

    /// Issuer distinguished name in RFC 4514 form.
    pub fn issuer(&self) -> String {
        self.cert.tbs_certificate.issuer.to_string()
    }

    /// Serial number as the unsigned decimal string used by `X509SerialNumber`.
    pub fn serial_decimal(&self) -> String {
        format_serial_decimal(self.cert.tbs_certificate.serial_number.as_bytes())
    }

    pub fn not_before(&self) -> Result<DateTime<Utc>, Error> {
        to_utc(&self.cert.tbs_certificate.validity.not_before)
    }

    pub fn not_after(&self) -> Result<DateTime<Utc>, Error> {
        to_utc(&self.cert.tbs_certificate.validity.not_after)
    }

    /// Fails with `Error::Certificate` when `at` lies outside the validity window.
    pub fn check_validity_at(&self, at: DateTime<Utc>) -> Result<(), Error> {
        let not_before = self.not_before()?;
        let not_after = self.not_after()?;
        if at < not_before {
            return Err(Error::Certificate(format!(
                "certificate is not yet valid at {at} (notBefore: {not_before})"
            )));
        }
        if at > not_after {
            return Err(Error::Certificate(format!(
                "certificate has expired at {at} (notAfter: {not_after})"
            )));
        }
        Ok(())
    }

    /// Derive the public key from the SubjectPublicKeyInfo.
    pub fn verifying_key(&self) -> Result<VerifyingKey, Error> {
        use spki::DecodePublicKey;

        let spki_der = self
            .cert
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| Error::Key(format!("failed to encode SPKI: {e}")))?;

        if let Ok(pk) = rsa::RsaPublicKey::from_public_key_der(&spki_der) {
            return Ok(VerifyingKey::Rsa(pk));
        }
        if let Ok(vk) = p256::ecdsa::VerifyingKey::from_public_key_der(&spki_der) {
            return Ok(VerifyingKey::EcP256(vk));
        }
        if let Ok(vk) = p384::ecdsa::VerifyingKey::from_public_key_der(&spki_der) {
            return Ok(VerifyingKey::EcP384(vk));
        }
        Err(Error::Key(format!(
            "unsupported public key algorithm {} in certificate {}",
            self.cert.tbs_certificate.subject_public_key_info.algorithm.oid,
            self.subject()
        )))
    }

    /// Digest of the DER encoding, as used by `xades:CertDigest`.
    pub fn digest(&self, digest_uri: &str) -> Result<Vec<u8>, Error> {
        sigtuna_crypto::digest::digest(digest_uri, &self.der)
    }

    /// BasicConstraints cA flag.
    pub fn is_ca(&self) -> bool {
        let bc_oid = der::oid::ObjectIdentifier::new_unwrap("2.5.29.19");
        self.cert
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .filter(|ext| ext.extn_id == bc_oid)
            .find_map(|ext| {
                x509_cert::ext::pkix::BasicConstraints::from_der(ext.extn_value.as_bytes()).ok()
            })
            .is_some_and(|bc| bc.ca)
    }

    pub fn is_self_issued(&self) -> bool {
        self.subject_der() == self.issuer_der()
    }

    /// Whether `issuer`'s subject is this certificate's issuer name.
    pub fn is_issued_by(&self, issuer: &SignerCertificate) -> bool {
        !self.issuer_der().is_empty() && self.issuer_der() == issuer.subject_der()
    }

    pub(crate) fn subject_der(&self) -> Vec<u8> {
        self.cert.tbs_certificate.subject.to_der().unwrap_or_default()
    }

    pub(crate) fn issuer_der(&self) -> Vec<u8> {
        self.cert.tbs_certificate.issuer.to_der().unwrap_or_default()
    }
}

fn to_utc(time: &x509_cert::time::Time) -> Result<DateTime<Utc>, Error> {
    let since_epoch = time.to_date_time().unix_duration();
    let secs = i64::try_from(since_epoch.as_secs())
        .map_err(|_| Error::Certificate("certificate time out of range".into()))?;
    DateTime::from_timestamp(secs, since_epoch.subsec_nanos())
        .ok_or_else(|| Error::Certificate("certificate time out of range".into()))
}

/// Convert a big-endian ASN.1 INTEGER to an unsigned decimal string.
pub fn format_serial_decimal(bytes: &[u8]) -> String {
    // little-endian base-10 digits
    let mut digits: Vec<u8> = vec![0];
    for &byte in bytes {
        let mut carry = u32::from(byte);
        for digit in digits.iter_mut() {
            let val = u32::from(*digit) * 256 + carry;
            *digit = (val % 10) as u8;
            carry = val / 10;
        }
        while carry > 0 {
            digits.push((carry % 10) as u8);
            carry /= 10;
        }
    }
    while digits.len() > 1 && digits.last() == Some(&0) {
        digits.pop();
    }
    digits.iter().rev().map(|d| char::from(b'0' + d)).collect()
}
