#![forbid(unsafe_code)]

//! Enveloped signature transform.
//!
//! Removes the `ds:Signature` element that contains the reference from
//! the node set being digested. Data that holds no enveloping signature
//! passes through unchanged.

use crate::pipeline::{Transform, TransformData};
use sigtuna_core::{algorithm, Error};

pub struct EnvelopedSignatureTransform {
    signature: Option<roxmltree::NodeId>,
}

impl EnvelopedSignatureTransform {
    pub fn new(signature: roxmltree::NodeId) -> Self {
        Self {
            signature: Some(signature),
        }
    }

    /// For data that does not contain the signature, such as the
    /// unsigned original of a document.
    pub fn without_signature() -> Self {
        Self { signature: None }
    }
}

impl Transform for EnvelopedSignatureTransform {
    fn uri(&self) -> &str {
        algorithm::ENVELOPED_SIGNATURE
    }

    fn execute(&self, input: TransformData) -> Result<TransformData, Error> {
        let Some(signature_id) = self.signature else {
            return Ok(input);
        };
        match input {
            TransformData::Xml { xml_text, subset } => {
                let subset = {
                    let doc = sigtuna_xml::parse(&xml_text)?;
                    let signature = doc.get_node(signature_id).ok_or_else(|| {
                        Error::Transform("enveloping signature not found in document".into())
                    })?;
                    subset.excluding(signature)
                };
                Ok(TransformData::Xml { xml_text, subset })
            }
            TransformData::Binary(_) => Err(Error::Transform(
                "enveloped-signature transform requires XML input".into(),
            )),
        }
    }
}
