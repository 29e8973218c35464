#![forbid(unsafe_code)]

//! Locating signatures: the manifest entry of a container and the
//! `ds:Signature` elements inside it.

use sigtuna_container::{Container, ManifestPolicy};
use sigtuna_core::{ns, Error};

/// The container entry that holds the XML signatures.
#[derive(Debug, Clone, Copy)]
pub struct ManifestEntry<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
}

impl<'a> ManifestEntry<'a> {
    /// The manifest as UTF-8 text, byte order mark removed.
    pub fn text(&self) -> Result<&'a str, Error> {
        let data = self.data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(self.data);
        std::str::from_utf8(data)
            .map_err(|e| Error::XmlParse(format!("{} is not UTF-8: {e}", self.name)))
    }
}

/// The first entry the policy recognises as a signature manifest.
pub fn find_manifest<'a>(
    container: &'a Container,
    policy: &dyn ManifestPolicy,
) -> Option<ManifestEntry<'a>> {
    container
        .manifest(policy)
        .map(|(name, data)| ManifestEntry { name, data })
}

/// Every `ds:Signature` element of the document, in document order.
pub fn signature_elements<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
) -> Vec<roxmltree::Node<'a, 'input>> {
    sigtuna_xml::find_elements(doc, ns::DSIG, ns::node::SIGNATURE)
}
