#![forbid(unsafe_code)]

/// Errors produced while verifying signed containers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed container: {0}")]
    ContainerFormat(String),

    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("invalid XML structure: {0}")]
    XmlStructure(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("signature verification failed: {0}")]
    SignatureInvalid(String),

    #[error("digest mismatch for reference: {0}")]
    DigestMismatch(String),

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("transform error: {0}")]
    Transform(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("cannot dereference URI: {0}")]
    Dereference(String),

    #[error("invalid URI reference: {0}")]
    InvalidUri(String),

    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("missing required element: {0}")]
    MissingElement(String),

    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("qualifying properties error: {0}")]
    Properties(String),

    /// A signed entry differs from (or is absent in) the supplied original.
    #[error("not the original document: content of {uri:?} differs from the original")]
    ContentTampered { uri: String },

    /// An entry of the supplied original is not covered by the signature.
    #[error("not the original document: missing ds:Reference for entry {entry:?}")]
    ContentRemoved { entry: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error reports that the signed document is not a
    /// faithful superset of the original it was compared against.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, Self::ContentTampered { .. } | Self::ContentRemoved { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
