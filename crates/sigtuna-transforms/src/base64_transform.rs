#![forbid(unsafe_code)]

//! Base64 decode transform.

use crate::pipeline::{Transform, TransformData};
use sigtuna_core::{algorithm, Error};

/// Decodes the text of its input; for a node set that is the string
/// value of the apex element (or of the whole document).
pub struct Base64DecodeTransform;

impl Transform for Base64DecodeTransform {
    fn uri(&self) -> &str {
        algorithm::BASE64
    }

    fn execute(&self, input: TransformData) -> Result<TransformData, Error> {
        use base64::Engine;
        let engine = base64::engine::general_purpose::STANDARD;

        let text = match &input {
            TransformData::Binary(data) => std::str::from_utf8(data)
                .map_err(|e| Error::Transform(format!("base64 input not UTF-8: {e}")))?
                .to_owned(),
            TransformData::Xml { xml_text, subset } => {
                let doc = sigtuna_xml::parse(xml_text)?;
                let top = match subset.apex() {
                    Some(id) => doc.get_node(id).ok_or_else(|| {
                        Error::Transform("base64 input node not found".into())
                    })?,
                    None => doc.root(),
                };
                top.descendants()
                    .filter(|n| n.is_text())
                    .filter_map(|n| n.text())
                    .collect()
            }
        };

        let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let decoded = engine
            .decode(&cleaned)
            .map_err(|e| Error::Base64(format!("decode error: {e}")))?;
        Ok(TransformData::Binary(decoded))
    }
}
