#![forbid(unsafe_code)]

//! Signature-method verification (RSA PKCS#1 v1.5, RSA-PSS, ECDSA).

use crate::digest;
use sigtuna_core::{algorithm, Error};

/// Public key material taken from a signer certificate.
#[derive(Debug, Clone)]
pub enum VerifyingKey {
    Rsa(rsa::RsaPublicKey),
    EcP256(p256::ecdsa::VerifyingKey),
    EcP384(p384::ecdsa::VerifyingKey),
}

impl VerifyingKey {
    /// Human-readable key family, for diagnostics.
    pub fn algorithm_name(&self) -> &'static str {
        match self {
            Self::Rsa(_) => "RSA",
            Self::EcP256(_) => "EC P-256",
            Self::EcP384(_) => "EC P-384",
        }
    }
}

/// A `ds:SignatureMethod` able to check a signature value.
pub trait SignatureAlgorithm: Send {
    fn uri(&self) -> &'static str;

    /// `Ok(false)` means the signature does not match; `Err` means the
    /// key or the signature value cannot be used with this method.
    fn verify(&self, key: &VerifyingKey, data: &[u8], signature: &[u8]) -> Result<bool, Error>;
}

/// Create a signature algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn SignatureAlgorithm>, Error> {
    use HashType::*;
    let alg: Box<dyn SignatureAlgorithm> = match uri {
        algorithm::RSA_SHA1 => Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA1, hash: Sha1 }),
        algorithm::RSA_SHA224 => Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA224, hash: Sha224 }),
        algorithm::RSA_SHA256 => Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA256, hash: Sha256 }),
        algorithm::RSA_SHA384 => Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA384, hash: Sha384 }),
        algorithm::RSA_SHA512 => Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA512, hash: Sha512 }),

        algorithm::RSA_PSS_SHA1 => Box::new(RsaPss { uri: algorithm::RSA_PSS_SHA1, hash: Sha1 }),
        algorithm::RSA_PSS_SHA224 => Box::new(RsaPss { uri: algorithm::RSA_PSS_SHA224, hash: Sha224 }),
        algorithm::RSA_PSS_SHA256 => Box::new(RsaPss { uri: algorithm::RSA_PSS_SHA256, hash: Sha256 }),
        algorithm::RSA_PSS_SHA384 => Box::new(RsaPss { uri: algorithm::RSA_PSS_SHA384, hash: Sha384 }),
        algorithm::RSA_PSS_SHA512 => Box::new(RsaPss { uri: algorithm::RSA_PSS_SHA512, hash: Sha512 }),

        algorithm::ECDSA_SHA1 => Box::new(Ecdsa { uri: algorithm::ECDSA_SHA1, hash: Sha1 }),
        algorithm::ECDSA_SHA224 => Box::new(Ecdsa { uri: algorithm::ECDSA_SHA224, hash: Sha224 }),
        algorithm::ECDSA_SHA256 => Box::new(Ecdsa { uri: algorithm::ECDSA_SHA256, hash: Sha256 }),
        algorithm::ECDSA_SHA384 => Box::new(Ecdsa { uri: algorithm::ECDSA_SHA384, hash: Sha384 }),
        algorithm::ECDSA_SHA512 => Box::new(Ecdsa { uri: algorithm::ECDSA_SHA512, hash: Sha512 }),

        _ => return Err(Error::UnsupportedAlgorithm(format!("signature algorithm: {uri}"))),
    };
    Ok(alg)
}

/// All signature-method URIs accepted by [`from_uri`].
pub fn supported() -> &'static [&'static str] {
    &[
        algorithm::RSA_SHA1,
        algorithm::RSA_SHA224,
        algorithm::RSA_SHA256,
        algorithm::RSA_SHA384,
        algorithm::RSA_SHA512,
        algorithm::RSA_PSS_SHA1,
        algorithm::RSA_PSS_SHA224,
        algorithm::RSA_PSS_SHA256,
        algorithm::RSA_PSS_SHA384,
        algorithm::RSA_PSS_SHA512,
        algorithm::ECDSA_SHA1,
        algorithm::ECDSA_SHA224,
        algorithm::ECDSA_SHA256,
        algorithm::ECDSA_SHA384,
        algorithm::ECDSA_SHA512,
    ]
}

#[derive(Debug, Clone, Copy)]
enum HashType {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashType {
    fn digest_uri(self) -> &'static str {
        match self {
            Self::Sha1 => algorithm::SHA1,
            Self::Sha224 => algorithm::SHA224,
            Self::Sha256 => algorithm::SHA256,
            Self::Sha384 => algorithm::SHA384,
            Self::Sha512 => algorithm::SHA512,
        }
    }
}

fn rsa_key(key: &VerifyingKey) -> Result<&rsa::RsaPublicKey, Error> {
    match key {
        VerifyingKey::Rsa(pk) => Ok(pk),
        other => Err(Error::Key(format!(
            "RSA key required, signer certificate carries {}",
            other.algorithm_name()
        ))),
    }
}

// ── RSA PKCS#1 v1.5 ─────────────────────────────────────────────────

struct RsaPkcs1v15 {
    uri: &'static str,
    hash: HashType,
}

impl SignatureAlgorithm for RsaPkcs1v15 {
    fn uri(&self) -> &'static str {
        self.uri
    }

    fn verify(&self, key: &VerifyingKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::Verifier;
        let public_key = rsa_key(key)?;
        let sig = rsa::pkcs1v15::Signature::try_from(sig_bytes)
            .map_err(|e| Error::Crypto(format!("invalid RSA signature: {e}")))?;
        macro_rules! do_verify {
            ($hasher:ty) => {{
                let vk = rsa::pkcs1v15::VerifyingKey::<$hasher>::new(public_key.clone());
                Ok(vk.verify(data, &sig).is_ok())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_verify!(sha1::Sha1),
            HashType::Sha224 => do_verify!(sha2::Sha224),
            HashType::Sha256 => do_verify!(sha2::Sha256),
            HashType::Sha384 => do_verify!(sha2::Sha384),
            HashType::Sha512 => do_verify!(sha2::Sha512),
        }
    }
}

// ── RSA-PSS ──────────────────────────────────────────────────────────

struct RsaPss {
    uri: &'static str,
    hash: HashType,
}

impl SignatureAlgorithm for RsaPss {
    fn uri(&self) -> &'static str {
        self.uri
    }

    fn verify(&self, key: &VerifyingKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::Verifier;
        let public_key = rsa_key(key)?;
        let sig = rsa::pss::Signature::try_from(sig_bytes)
            .map_err(|e| Error::Crypto(format!("invalid RSA-PSS signature: {e}")))?;
        macro_rules! do_verify {
            ($hasher:ty) => {{
                let vk = rsa::pss::VerifyingKey::<$hasher>::new(public_key.clone());
                Ok(vk.verify(data, &sig).is_ok())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_verify!(sha1::Sha1),
            HashType::Sha224 => do_verify!(sha2::Sha224),
            HashType::Sha256 => do_verify!(sha2::Sha256),
            HashType::Sha384 => do_verify!(sha2::Sha384),
            HashType::Sha512 => do_verify!(sha2::Sha512),
        }
    }
}

// ── ECDSA ────────────────────────────────────────────────────────────

/// ECDSA over the curve of the signer key; the hash comes from the
/// method URI and the signature value is the XML-DSig `r || s` encoding.
struct Ecdsa {
    uri: &'static str,
    hash: HashType,
}

/// Convert XML-DSig ECDSA r||s to a typed Signature for P-256.
pub fn xmldsig_to_p256(rs: &[u8]) -> Result<p256::ecdsa::Signature, Error> {
    if rs.len() != 64 {
        return Err(Error::Crypto(format!(
            "P-256 signature must be 64 bytes, got {}",
            rs.len()
        )));
    }
    let r = p256::FieldBytes::from_slice(&rs[..32]);
    let s = p256::FieldBytes::from_slice(&rs[32..]);
    p256::ecdsa::Signature::from_scalars(*r, *s)
        .map_err(|e| Error::Crypto(format!("invalid P-256 signature: {e}")))
}

/// Convert XML-DSig ECDSA r||s to a typed Signature for P-384.
pub fn xmldsig_to_p384(rs: &[u8]) -> Result<p384::ecdsa::Signature, Error> {
    if rs.len() != 96 {
        return Err(Error::Crypto(format!(
            "P-384 signature must be 96 bytes, got {}",
            rs.len()
        )));
    }
    let r = p384::FieldBytes::from_slice(&rs[..48]);
    let s = p384::FieldBytes::from_slice(&rs[48..]);
    p384::ecdsa::Signature::from_scalars(*r, *s)
        .map_err(|e| Error::Crypto(format!("invalid P-384 signature: {e}")))
}

impl SignatureAlgorithm for Ecdsa {
    fn uri(&self) -> &'static str {
        self.uri
    }

    fn verify(&self, key: &VerifyingKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::hazmat::PrehashVerifier;
        let prehash = digest::digest(self.hash.digest_uri(), data)?;
        match key {
            VerifyingKey::EcP256(vk) => {
                let sig = xmldsig_to_p256(sig_bytes)?;
                Ok(vk.verify_prehash(&prehash, &sig).is_ok())
            }
            VerifyingKey::EcP384(vk) => {
                let sig = xmldsig_to_p384(sig_bytes)?;
                Ok(vk.verify_prehash(&prehash, &sig).is_ok())
            }
            VerifyingKey::Rsa(_) => Err(Error::Key(
                "EC key required, signer certificate carries RSA".into(),
            )),
        }
    }
}
