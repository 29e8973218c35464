#![forbid(unsafe_code)]

//! Namespace-aware element lookup and ID registration.

use sigtuna_core::Error;
use std::collections::HashMap;

/// ID attribute names registered for same-document references.
const ID_ATTRS: [&str; 3] = ["Id", "ID", "id"];

/// Parse XML text with the workspace parsing options.
pub fn parse(text: &str) -> Result<roxmltree::Document<'_>, Error> {
    roxmltree::Document::parse_with_options(text, crate::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))
}

/// Whether `node` is an element with the given namespace and local name.
pub fn is_element(node: roxmltree::Node<'_, '_>, ns_uri: &str, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local_name
        && node.tag_name().namespace().unwrap_or("") == ns_uri
}

/// Find the first descendant element with the given namespace and local name.
pub fn find_element<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    ns_uri: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    doc.descendants().find(|n| is_element(*n, ns_uri, local_name))
}

/// Find all descendant elements with the given namespace and local name,
/// in document order.
pub fn find_elements<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    ns_uri: &str,
    local_name: &str,
) -> Vec<roxmltree::Node<'a, 'input>> {
    doc.descendants()
        .filter(|n| is_element(*n, ns_uri, local_name))
        .collect()
}

pub fn find_child_element<'a, 'input>(
    parent: roxmltree::Node<'a, 'input>,
    ns_uri: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    parent.children().find(|n| is_element(*n, ns_uri, local_name))
}

pub fn find_child_elements<'a, 'input>(
    parent: roxmltree::Node<'a, 'input>,
    ns_uri: &str,
    local_name: &str,
) -> Vec<roxmltree::Node<'a, 'input>> {
    parent
        .children()
        .filter(|n| is_element(*n, ns_uri, local_name))
        .collect()
}

/// Build the ID → NodeId mapping for a parsed document.
///
/// An ID value carried by two different elements is an error.
pub fn build_id_map(
    doc: &roxmltree::Document<'_>,
) -> Result<HashMap<String, roxmltree::NodeId>, Error> {
    let mut map = HashMap::new();
    for node in doc.descendants().filter(|n| n.is_element()) {
        for attr_name in ID_ATTRS {
            let Some(val) = node.attribute(attr_name) else {
                continue;
            };
            match map.insert(val.to_owned(), node.id()) {
                Some(previous) if previous != node.id() => {
                    return Err(Error::XmlStructure(format!("duplicate ID {val:?}")));
                }
                _ => {}
            }
        }
    }
    Ok(map)
}

/// Decode the base64 text content of an element, ignoring whitespace.
pub fn decode_base64_text(node: roxmltree::Node<'_, '_>) -> Result<Vec<u8>, Error> {
    use base64::Engine;
    let clean: String = node
        .text()
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    base64::engine::general_purpose::STANDARD
        .decode(&clean)
        .map_err(|e| Error::Base64(format!("{}: {e}", node.tag_name().name())))
}
