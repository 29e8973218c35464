#![forbid(unsafe_code)]

//! XML Canonicalization (C14N) for the Sigtuna verification engine.
//!
//! Implements the W3C canonicalization variants used by XML signatures:
//! - Canonical XML 1.0 (with and without comments)
//! - Canonical XML 1.1 (with and without comments, rendered as 1.0)
//! - Exclusive Canonical XML 1.0 (with and without comments)
//!
//! Input is either a whole document or a [`DocumentSubset`]: the subtree
//! under an apex element with some subtrees cut out, which covers
//! same-document references and the enveloped-signature transform.

mod canonicalizer;
pub mod escape;
pub mod render;

use sigtuna_core::{algorithm, Error};

/// The canonicalization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C14nMode {
    /// Canonical XML 1.0
    Inclusive,
    /// Canonical XML 1.0 with comments
    InclusiveWithComments,
    /// Canonical XML 1.1
    Inclusive11,
    /// Canonical XML 1.1 with comments
    Inclusive11WithComments,
    /// Exclusive Canonical XML 1.0
    Exclusive,
    /// Exclusive Canonical XML 1.0 with comments
    ExclusiveWithComments,
}

impl C14nMode {
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Inclusive => algorithm::C14N,
            Self::InclusiveWithComments => algorithm::C14N_WITH_COMMENTS,
            Self::Inclusive11 => algorithm::C14N11,
            Self::Inclusive11WithComments => algorithm::C14N11_WITH_COMMENTS,
            Self::Exclusive => algorithm::EXC_C14N,
            Self::ExclusiveWithComments => algorithm::EXC_C14N_WITH_COMMENTS,
        }
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            algorithm::C14N => Some(Self::Inclusive),
            algorithm::C14N_WITH_COMMENTS => Some(Self::InclusiveWithComments),
            algorithm::C14N11 => Some(Self::Inclusive11),
            algorithm::C14N11_WITH_COMMENTS => Some(Self::Inclusive11WithComments),
            algorithm::EXC_C14N => Some(Self::Exclusive),
            algorithm::EXC_C14N_WITH_COMMENTS => Some(Self::ExclusiveWithComments),
            _ => None,
        }
    }

    pub fn with_comments(&self) -> bool {
        matches!(
            self,
            Self::InclusiveWithComments | Self::Inclusive11WithComments | Self::ExclusiveWithComments
        )
    }

    pub fn is_exclusive(&self) -> bool {
        matches!(self, Self::Exclusive | Self::ExclusiveWithComments)
    }
}

/// The part of a document that is canonicalized.
#[derive(Debug, Clone)]
pub struct DocumentSubset {
    apex: Option<roxmltree::NodeId>,
    excluded: Vec<roxmltree::NodeId>,
    comments: bool,
}

impl DocumentSubset {
    /// The whole document, comments included.
    pub fn document() -> Self {
        Self {
            apex: None,
            excluded: Vec::new(),
            comments: true,
        }
    }

    /// The subtree rooted at `node`, comments included.
    pub fn subtree(node: roxmltree::Node<'_, '_>) -> Self {
        Self {
            apex: Some(node.id()),
            excluded: Vec::new(),
            comments: true,
        }
    }

    /// Drop comment nodes regardless of the canonicalization mode.
    pub fn without_comments(mut self) -> Self {
        self.comments = false;
        self
    }

    /// Remove the subtree rooted at `node`.
    pub fn excluding(mut self, node: roxmltree::Node<'_, '_>) -> Self {
        self.excluded.push(node.id());
        self
    }

    pub fn apex(&self) -> Option<roxmltree::NodeId> {
        self.apex
    }

    pub fn keeps_comments(&self) -> bool {
        self.comments
    }

    pub(crate) fn is_excluded(&self, node: roxmltree::Node<'_, '_>) -> bool {
        self.excluded.contains(&node.id())
    }
}

impl Default for DocumentSubset {
    fn default() -> Self {
        Self::document()
    }
}

/// Canonicalize a subset of a parsed document.
///
/// `inclusive_prefixes` is the exclusive-C14N `InclusiveNamespaces`
/// PrefixList and is ignored by the inclusive modes.
pub fn canonicalize(
    doc: &roxmltree::Document<'_>,
    mode: C14nMode,
    subset: &DocumentSubset,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    canonicalizer::Canonicalizer::new(mode, subset, inclusive_prefixes).run(doc)
}

/// Parse `xml` and canonicalize the whole document.
pub fn canonicalize_xml(
    xml: &str,
    mode: C14nMode,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    let doc = sigtuna_xml::parse(xml)?;
    canonicalize(&doc, mode, &DocumentSubset::document(), inclusive_prefixes)
}
