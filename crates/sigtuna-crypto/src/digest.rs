#![forbid(unsafe_code)]

//! Digest (hash) algorithms used by `ds:DigestMethod`.

use digest::Digest;
use sigtuna_core::{algorithm, Error};

/// Incremental hash selected by algorithm URI.
pub trait DigestAlgorithm: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self: Box<Self>) -> Vec<u8>;
    fn uri(&self) -> &'static str;
}

/// Create a digest algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn DigestAlgorithm>, Error> {
    match uri {
        algorithm::SHA1 => Ok(Box::new(Sha1Digest::new())),
        algorithm::SHA224 => Ok(Box::new(Sha224Digest::new())),
        algorithm::SHA256 => Ok(Box::new(Sha256Digest::new())),
        algorithm::SHA384 => Ok(Box::new(Sha384Digest::new())),
        algorithm::SHA512 => Ok(Box::new(Sha512Digest::new())),
        algorithm::SHA3_224 => Ok(Box::new(Sha3_224Digest::new())),
        algorithm::SHA3_256 => Ok(Box::new(Sha3_256Digest::new())),
        algorithm::SHA3_384 => Ok(Box::new(Sha3_384Digest::new())),
        algorithm::SHA3_512 => Ok(Box::new(Sha3_512Digest::new())),
        _ => Err(Error::UnsupportedAlgorithm(format!("digest algorithm: {uri}"))),
    }
}

/// Map a short configuration name (`sha256`, `sha3-512`, ...) to its URI.
pub fn uri_from_name(name: &str) -> Result<&'static str, Error> {
    let uri = match name.to_ascii_lowercase().replace('_', "-").as_str() {
        "sha1" | "sha-1" => algorithm::SHA1,
        "sha224" | "sha-224" => algorithm::SHA224,
        "sha256" | "sha-256" => algorithm::SHA256,
        "sha384" | "sha-384" => algorithm::SHA384,
        "sha512" | "sha-512" => algorithm::SHA512,
        "sha3-224" => algorithm::SHA3_224,
        "sha3-256" => algorithm::SHA3_256,
        "sha3-384" => algorithm::SHA3_384,
        "sha3-512" => algorithm::SHA3_512,
        _ => return Err(Error::UnsupportedAlgorithm(format!("digest algorithm name: {name}"))),
    };
    Ok(uri)
}

/// Compute a digest in one shot.
pub fn digest(uri: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut hasher = from_uri(uri)?;
    hasher.update(data);
    Ok(hasher.finalize())
}

/// All digest URIs accepted by [`from_uri`].
pub fn supported() -> &'static [&'static str] {
    &[
        algorithm::SHA1,
        algorithm::SHA224,
        algorithm::SHA256,
        algorithm::SHA384,
        algorithm::SHA512,
        algorithm::SHA3_224,
        algorithm::SHA3_256,
        algorithm::SHA3_384,
        algorithm::SHA3_512,
    ]
}

macro_rules! impl_digest {
    ($name:ident, $hasher:ty, $uri:expr) => {
        struct $name {
            inner: $hasher,
        }

        impl $name {
            fn new() -> Self {
                Self {
                    inner: <$hasher>::new(),
                }
            }
        }

        impl DigestAlgorithm for $name {
            fn update(&mut self, data: &[u8]) {
                Digest::update(&mut self.inner, data);
            }

            fn finalize(self: Box<Self>) -> Vec<u8> {
                Digest::finalize(self.inner).to_vec()
            }

            fn uri(&self) -> &'static str {
                $uri
            }
        }
    };
}

impl_digest!(Sha1Digest, sha1::Sha1, algorithm::SHA1);
impl_digest!(Sha224Digest, sha2::Sha224, algorithm::SHA224);
impl_digest!(Sha256Digest, sha2::Sha256, algorithm::SHA256);
impl_digest!(Sha384Digest, sha2::Sha384, algorithm::SHA384);
impl_digest!(Sha512Digest, sha2::Sha512, algorithm::SHA512);
impl_digest!(Sha3_224Digest, sha3::Sha3_224, algorithm::SHA3_224);
impl_digest!(Sha3_256Digest, sha3::Sha3_256, algorithm::SHA3_256);
impl_digest!(Sha3_384Digest, sha3::Sha3_384, algorithm::SHA3_384);
impl_digest!(Sha3_512Digest, sha3::Sha3_512, algorithm::SHA3_512);
