#![forbid(unsafe_code)]

//! Tree walk shared by inclusive and exclusive canonicalization.
//!
//! The two families differ only in which namespace declarations an
//! element renders:
//! - inclusive: every in-scope namespace not already in force from the
//!   nearest rendered ancestor
//! - exclusive: only the namespaces visibly utilized by the element name,
//!   its attributes, or the `InclusiveNamespaces` PrefixList

use crate::escape;
use crate::render::{Attr, NsDecl};
use crate::{C14nMode, DocumentSubset};
use sigtuna_core::{ns, Error};
use std::collections::{BTreeMap, BTreeSet};

type NsMap = BTreeMap<String, String>;

pub(crate) struct Canonicalizer<'a> {
    mode: C14nMode,
    subset: &'a DocumentSubset,
    inclusive_prefixes: BTreeSet<String>,
    output: Vec<u8>,
}

impl<'a> Canonicalizer<'a> {
    pub(crate) fn new(
        mode: C14nMode,
        subset: &'a DocumentSubset,
        inclusive_prefixes: &[String],
    ) -> Self {
        let inclusive_prefixes = inclusive_prefixes
            .iter()
            .map(|p| if p == "#default" { String::new() } else { p.clone() })
            .collect();
        Self {
            mode,
            subset,
            inclusive_prefixes,
            output: Vec::new(),
        }
    }

    pub(crate) fn run(mut self, doc: &roxmltree::Document<'_>) -> Result<Vec<u8>, Error> {
        match self.subset.apex() {
            None => {
                for child in doc.root().children() {
                    self.process_node(child, &NsMap::new())?;
                }
            }
            Some(id) => {
                let apex = doc.get_node(id).ok_or_else(|| {
                    Error::Canonicalization("apex node is not part of the document".into())
                })?;
                if !apex.is_element() {
                    return Err(Error::Canonicalization(
                        "document subset apex must be an element".into(),
                    ));
                }
                self.process_node(apex, &NsMap::new())?;
            }
        }
        Ok(self.output)
    }

    fn comments_visible(&self) -> bool {
        self.mode.with_comments() && self.subset.keeps_comments()
    }

    fn process_node(&mut self, node: roxmltree::Node<'_, '_>, rendered: &NsMap) -> Result<(), Error> {
        if self.subset.is_excluded(node) {
            return Ok(());
        }
        match node.node_type() {
            roxmltree::NodeType::Root => {
                for child in node.children() {
                    self.process_node(child, rendered)?;
                }
            }
            roxmltree::NodeType::Element => self.process_element(node, rendered)?,
            roxmltree::NodeType::Text => {
                let text = node.text().unwrap_or("");
                self.output
                    .extend_from_slice(escape::escape_text(text).as_bytes());
            }
            roxmltree::NodeType::Comment => {
                if self.comments_visible() {
                    let text = node.text().unwrap_or("").to_owned();
                    self.write_top_level(node, |out| {
                        out.extend_from_slice(b"<!--");
                        out.extend_from_slice(text.as_bytes());
                        out.extend_from_slice(b"-->");
                    });
                }
            }
            roxmltree::NodeType::PI => {
                if let Some(pi) = node.pi() {
                    let target = pi.target.to_owned();
                    let value = pi.value.map(escape::escape_pi);
                    self.write_top_level(node, |out| {
                        out.extend_from_slice(b"<?");
                        out.extend_from_slice(target.as_bytes());
                        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                            out.push(b' ');
                            out.extend_from_slice(value.as_bytes());
                        }
                        out.extend_from_slice(b"?>");
                    });
                }
            }
        }
        Ok(())
    }

    /// Comments and PIs outside the document element are separated from it
    /// by a line feed.
    fn write_top_level(&mut self, node: roxmltree::Node<'_, '_>, write: impl FnOnce(&mut Vec<u8>)) {
        let top_level = node
            .parent()
            .is_some_and(|p| p.node_type() == roxmltree::NodeType::Root);
        if top_level && node.prev_siblings().skip(1).any(|s| s.is_element()) {
            self.output.push(b'\n');
        }
        write(&mut self.output);
        if top_level && node.next_siblings().skip(1).any(|s| s.is_element()) {
            self.output.push(b'\n');
        }
    }

    fn process_element(&mut self, node: roxmltree::Node<'_, '_>, rendered: &NsMap) -> Result<(), Error> {
        let in_scope = in_scope_namespaces(node);
        let ns_decls = if self.mode.is_exclusive() {
            self.exclusive_declarations(node, &in_scope, rendered)
        } else {
            inclusive_declarations(&in_scope, rendered)
        };

        let mut attrs = element_attributes(node);
        if !self.mode.is_exclusive() && self.subset.apex() == Some(node.id()) {
            attrs.extend(inherited_xml_attributes(node, &attrs));
        }
        attrs.sort();

        let name = qualified_name(node);
        self.output.push(b'<');
        self.output.extend_from_slice(name.as_bytes());
        for decl in &ns_decls {
            decl.write_to(&mut self.output);
        }
        for attr in &attrs {
            attr.write_to(&mut self.output);
        }
        self.output.push(b'>');

        let mut child_rendered = rendered.clone();
        for decl in &ns_decls {
            if decl.uri.is_empty() {
                child_rendered.remove(&decl.prefix);
            } else {
                child_rendered.insert(decl.prefix.clone(), decl.uri.clone());
            }
        }
        for child in node.children() {
            self.process_node(child, &child_rendered)?;
        }

        self.output.extend_from_slice(b"</");
        self.output.extend_from_slice(name.as_bytes());
        self.output.push(b'>');
        Ok(())
    }

    fn exclusive_declarations(
        &self,
        node: roxmltree::Node<'_, '_>,
        in_scope: &NsMap,
        rendered: &NsMap,
    ) -> Vec<NsDecl> {
        let mut utilized: BTreeSet<String> = self.inclusive_prefixes.clone();
        utilized.insert(element_prefix(node));
        for attr in node.attributes() {
            if let Some(uri) = attr.namespace() {
                if let Some(prefix) = attribute_prefix(node, uri) {
                    utilized.insert(prefix);
                }
            }
        }

        let mut decls = Vec::new();
        for prefix in utilized.iter().filter(|p| p.as_str() != "xml") {
            match in_scope.get(prefix) {
                Some(uri) if rendered.get(prefix) != Some(uri) => {
                    decls.push(NsDecl::new(prefix, uri));
                }
                None if prefix.is_empty() && rendered.get("").is_some_and(|u| !u.is_empty()) => {
                    decls.push(NsDecl::new("", ""));
                }
                _ => {}
            }
        }
        decls.sort();
        decls
    }
}

fn inclusive_declarations(in_scope: &NsMap, rendered: &NsMap) -> Vec<NsDecl> {
    let mut decls: Vec<NsDecl> = in_scope
        .iter()
        .filter(|(prefix, uri)| prefix.as_str() != "xml" && rendered.get(*prefix) != Some(*uri))
        .map(|(prefix, uri)| NsDecl::new(prefix, uri))
        .collect();
    if !in_scope.contains_key("") && rendered.get("").is_some_and(|u| !u.is_empty()) {
        decls.push(NsDecl::new("", ""));
    }
    decls.sort();
    decls
}

/// All namespaces in scope at `node`, without `xmlns=""` undeclarations.
fn in_scope_namespaces(node: roxmltree::Node<'_, '_>) -> NsMap {
    node.namespaces()
        .filter(|decl| !decl.uri().is_empty())
        .map(|decl| (decl.name().unwrap_or("").to_owned(), decl.uri().to_owned()))
        .collect()
}

fn element_attributes(node: roxmltree::Node<'_, '_>) -> Vec<Attr> {
    node.attributes()
        .map(|attr| {
            let ns_uri = attr.namespace().unwrap_or("");
            let qualified_name = match attr.namespace().and_then(|uri| attribute_prefix(node, uri)) {
                Some(prefix) => format!("{prefix}:{}", attr.name()),
                None => attr.name().to_owned(),
            };
            Attr {
                ns_uri: ns_uri.to_owned(),
                local_name: attr.name().to_owned(),
                qualified_name,
                value: attr.value().to_owned(),
            }
        })
        .collect()
}

/// `xml:*` attributes of ancestors that a document-subset apex inherits
/// (Canonical XML 1.0, section 2.4).
fn inherited_xml_attributes(node: roxmltree::Node<'_, '_>, own: &[Attr]) -> Vec<Attr> {
    let mut inherited: BTreeMap<String, String> = BTreeMap::new();
    for ancestor in node.ancestors().skip(1).filter(|n| n.is_element()) {
        for attr in ancestor.attributes() {
            if attr.namespace() == Some(ns::XML) {
                inherited
                    .entry(attr.name().to_owned())
                    .or_insert_with(|| attr.value().to_owned());
            }
        }
    }
    inherited
        .into_iter()
        .filter(|(name, _)| !own.iter().any(|a| a.ns_uri == ns::XML && a.local_name == *name))
        .map(|(name, value)| Attr {
            ns_uri: ns::XML.to_owned(),
            qualified_name: format!("xml:{name}"),
            local_name: name,
            value,
        })
        .collect()
}

/// The element name exactly as written in the source (`prefix:local` or `local`).
fn qualified_name(node: roxmltree::Node<'_, '_>) -> String {
    let source = &node.document().input_text()[node.range()];
    let raw: String = source
        .trim_start_matches('<')
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '/' && *c != '>')
        .collect();
    if raw.is_empty() {
        node.tag_name().name().to_owned()
    } else {
        raw
    }
}

fn element_prefix(node: roxmltree::Node<'_, '_>) -> String {
    qualified_name(node)
        .split_once(':')
        .map(|(prefix, _)| prefix.to_owned())
        .unwrap_or_default()
}

/// The prefix bound to `uri` for an attribute; attributes never use the
/// default namespace.
fn attribute_prefix(node: roxmltree::Node<'_, '_>, uri: &str) -> Option<String> {
    if uri == ns::XML {
        return Some("xml".to_owned());
    }
    node.namespaces()
        .find(|decl| decl.uri() == uri && decl.name().is_some())
        .and_then(|decl| decl.name())
        .map(str::to_owned)
}
