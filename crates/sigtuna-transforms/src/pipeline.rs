#![forbid(unsafe_code)]

//! Transform pipeline and trait definitions.

use sigtuna_c14n::{C14nMode, DocumentSubset};
use sigtuna_core::{algorithm, Error};

/// Data flowing through the transform pipeline.
#[derive(Debug, Clone)]
pub enum TransformData {
    /// A node set: part of the XML document `xml_text`.
    Xml {
        xml_text: String,
        subset: DocumentSubset,
    },
    /// An octet stream.
    Binary(Vec<u8>),
}

impl TransformData {
    /// The whole of `xml_text`, comments removed, as the node set of a
    /// `URI=""` reference.
    pub fn whole_document(xml_text: impl Into<String>) -> Self {
        TransformData::Xml {
            xml_text: xml_text.into(),
            subset: DocumentSubset::document().without_comments(),
        }
    }

    /// Octets for digesting; a node set is serialized with inclusive
    /// C14N 1.0.
    pub fn into_binary(self) -> Result<Vec<u8>, Error> {
        match self {
            TransformData::Binary(data) => Ok(data),
            TransformData::Xml { xml_text, subset } => {
                let doc = sigtuna_xml::parse(&xml_text)?;
                sigtuna_c14n::canonicalize(&doc, C14nMode::Inclusive, &subset, &[])
            }
        }
    }
}

/// One `ds:Transform`.
pub trait Transform: Send {
    fn uri(&self) -> &str;

    fn execute(&self, input: TransformData) -> Result<TransformData, Error>;
}

/// Transforms executed in sequence.
#[derive(Default)]
pub struct TransformPipeline {
    transforms: Vec<Box<dyn Transform>>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, transform: Box<dyn Transform>) {
        self.transforms.push(transform);
    }

    /// Run every transform and serialize the result for digesting.
    pub fn execute(&self, input: TransformData) -> Result<Vec<u8>, Error> {
        let mut data = input;
        for transform in &self.transforms {
            log::trace!("applying transform {}", transform.uri());
            data = transform.execute(data)?;
        }
        data.into_binary()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

/// Create a transform from its `Algorithm` URI.
///
/// `signature` locates the `ds:Signature` element for the
/// enveloped-signature transform; it is `None` when the data being
/// transformed does not contain the signature.
pub fn from_uri(
    uri: &str,
    inclusive_prefixes: Vec<String>,
    signature: Option<roxmltree::NodeId>,
) -> Result<Box<dyn Transform>, Error> {
    if let Some(mode) = C14nMode::from_uri(uri) {
        return Ok(Box::new(C14nTransform::new(mode, inclusive_prefixes)));
    }
    match uri {
        algorithm::ENVELOPED_SIGNATURE => Ok(Box::new(match signature {
            Some(id) => crate::enveloped::EnvelopedSignatureTransform::new(id),
            None => crate::enveloped::EnvelopedSignatureTransform::without_signature(),
        })),
        algorithm::BASE64 => Ok(Box::new(crate::base64_transform::Base64DecodeTransform)),
        _ => Err(Error::UnsupportedAlgorithm(format!("transform: {uri}"))),
    }
}

/// All transform URIs accepted by [`from_uri`].
pub fn supported() -> &'static [&'static str] {
    &[
        algorithm::C14N,
        algorithm::C14N_WITH_COMMENTS,
        algorithm::C14N11,
        algorithm::C14N11_WITH_COMMENTS,
        algorithm::EXC_C14N,
        algorithm::EXC_C14N_WITH_COMMENTS,
        algorithm::ENVELOPED_SIGNATURE,
        algorithm::BASE64,
    ]
}

// ── C14N Transform ───────────────────────────────────────────────────

pub struct C14nTransform {
    mode: C14nMode,
    inclusive_prefixes: Vec<String>,
}

impl C14nTransform {
    pub fn new(mode: C14nMode, inclusive_prefixes: Vec<String>) -> Self {
        Self {
            mode,
            inclusive_prefixes,
        }
    }
}

impl Transform for C14nTransform {
    fn uri(&self) -> &str {
        self.mode.uri()
    }

    fn execute(&self, input: TransformData) -> Result<TransformData, Error> {
        let bytes = match input {
            TransformData::Xml { xml_text, subset } => {
                let doc = sigtuna_xml::parse(&xml_text)?;
                sigtuna_c14n::canonicalize(&doc, self.mode, &subset, &self.inclusive_prefixes)?
            }
            TransformData::Binary(data) => {
                let text = std::str::from_utf8(&data)
                    .map_err(|e| Error::Transform(format!("invalid UTF-8: {e}")))?;
                sigtuna_c14n::canonicalize_xml(text, self.mode, &self.inclusive_prefixes)?
            }
        };
        Ok(TransformData::Binary(bytes))
    }
}
