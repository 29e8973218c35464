#![forbid(unsafe_code)]

//! `ds:Reference` parsing and digest computation.

use sigtuna_core::{ns, Error};
use sigtuna_transforms::{TransformData, TransformPipeline};

/// One `ds:Transform` of a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformSpec {
    pub algorithm: String,
    /// Exclusive C14N `InclusiveNamespaces/@PrefixList`.
    pub inclusive_prefixes: Vec<String>,
}

/// A parsed `ds:Reference`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub id: Option<String>,
    /// The `URI` attribute as written; an absent attribute reads as `""`.
    pub uri: String,
    pub ref_type: Option<String>,
    pub digest_method: String,
    pub digest_value: Vec<u8>,
    pub transforms: Vec<TransformSpec>,
    /// The element a same-document `#id` URI resolved to; set once the
    /// reference has been checked.
    pub target: Option<roxmltree::NodeId>,
}

impl Reference {
    pub fn parse(node: roxmltree::Node<'_, '_>) -> Result<Self, Error> {
        let digest_method = sigtuna_xml::find_child_element(node, ns::DSIG, ns::node::DIGEST_METHOD)
            .ok_or_else(|| Error::MissingElement("DigestMethod".into()))?
            .attribute(ns::attr::ALGORITHM)
            .ok_or_else(|| Error::MissingAttribute("Algorithm on DigestMethod".into()))?
            .to_owned();

        let digest_value_node =
            sigtuna_xml::find_child_element(node, ns::DSIG, ns::node::DIGEST_VALUE)
                .ok_or_else(|| Error::MissingElement("DigestValue".into()))?;
        let digest_value = sigtuna_xml::decode_base64_text(digest_value_node)?;

        let mut transforms = Vec::new();
        if let Some(list) = sigtuna_xml::find_child_element(node, ns::DSIG, ns::node::TRANSFORMS) {
            for transform in sigtuna_xml::find_child_elements(list, ns::DSIG, ns::node::TRANSFORM) {
                let algorithm = transform
                    .attribute(ns::attr::ALGORITHM)
                    .ok_or_else(|| Error::MissingAttribute("Algorithm on Transform".into()))?
                    .to_owned();
                transforms.push(TransformSpec {
                    algorithm,
                    inclusive_prefixes: read_inclusive_prefixes(transform),
                });
            }
        }

        Ok(Self {
            id: node.attribute(ns::attr::ID).map(str::to_owned),
            uri: node.attribute(ns::attr::URI).unwrap_or("").to_owned(),
            ref_type: node.attribute(ns::attr::TYPE).map(str::to_owned),
            digest_method,
            digest_value,
            transforms,
            target: None,
        })
    }

    /// A reference without `Type` names document content; typed references
    /// point at qualifying properties or identity data.
    pub fn is_content(&self) -> bool {
        self.ref_type.is_none()
    }

    pub fn has_transform(&self, algorithm: &str) -> bool {
        self.transforms.iter().any(|t| t.algorithm == algorithm)
    }

    /// Build the transform pipeline. `signature` is the enveloping
    /// `ds:Signature` when the input document contains it.
    pub fn pipeline(&self, signature: Option<roxmltree::NodeId>) -> Result<TransformPipeline, Error> {
        let mut pipeline = TransformPipeline::new();
        for spec in &self.transforms {
            pipeline.push(sigtuna_transforms::pipeline::from_uri(
                &spec.algorithm,
                spec.inclusive_prefixes.clone(),
                signature,
            )?);
        }
        Ok(pipeline)
    }

    /// Apply the transforms to `input` and digest the result.
    pub fn compute_digest(
        &self,
        input: TransformData,
        signature: Option<roxmltree::NodeId>,
    ) -> Result<Vec<u8>, Error> {
        let octets = self.pipeline(signature)?.execute(input)?;
        sigtuna_crypto::digest::digest(&self.digest_method, &octets)
    }

    /// Whether the digest over `input` equals `DigestValue`.
    pub fn digest_matches(
        &self,
        input: TransformData,
        signature: Option<roxmltree::NodeId>,
    ) -> Result<bool, Error> {
        let computed = self.compute_digest(input, signature)?;
        Ok(sigtuna_crypto::constant_time_eq(&computed, &self.digest_value))
    }
}

/// `InclusiveNamespaces/@PrefixList` below a transform or c14n method element.
pub(crate) fn read_inclusive_prefixes(node: roxmltree::Node<'_, '_>) -> Vec<String> {
    sigtuna_xml::find_child_element(node, ns::EXC_C14N, ns::node::INCLUSIVE_NAMESPACES)
        .and_then(|child| child.attribute(ns::attr::PREFIX_LIST))
        .map(|list| list.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}
