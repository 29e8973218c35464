#![forbid(unsafe_code)]

//! Cryptographic validation of one `ds:Signature` element.
//!
//! Processing order (XML-DSig core validation):
//! 1. Read `SignedInfo`: CanonicalizationMethod, SignatureMethod, references
//! 2. For each `Reference`: resolve URI, run transforms, compare digest
//! 3. Select the signer certificate and key from `KeyInfo`
//! 4. Canonicalize `SignedInfo` and verify `SignatureValue`
//!
//! No trust decision is made; the certificate used is returned for the
//! caller to judge.

use crate::context::DsigContext;
use crate::reference::{read_inclusive_prefixes, Reference};
use sigtuna_c14n::{C14nMode, DocumentSubset};
use sigtuna_core::{ns, Error};
use sigtuna_keys::SignerCertificate;
use sigtuna_transforms::uri::{self, UriKind};
use sigtuna_transforms::TransformData;

/// A signature whose references and `SignatureValue` check out.
#[derive(Debug, Clone)]
pub struct ValidatedSignature {
    pub signature_id: Option<String>,
    pub c14n_method: String,
    pub signature_method: String,
    pub references: Vec<Reference>,
    /// The certificate whose key verified `SignatureValue`.
    pub certificate: SignerCertificate,
    /// Leaf first.
    pub chain: Vec<SignerCertificate>,
    pub signature_value: Vec<u8>,
}

impl ValidatedSignature {
    /// References without a `Type`: the document content covered.
    pub fn content_references(&self) -> impl Iterator<Item = &Reference> {
        self.references.iter().filter(|r| r.is_content())
    }

    pub fn references_of_type<'a>(
        &'a self,
        ref_type: &'a str,
    ) -> impl Iterator<Item = &'a Reference> {
        self.references
            .iter()
            .filter(move |r| r.ref_type.as_deref() == Some(ref_type))
    }
}

/// Result of cryptographic validation.
#[derive(Debug)]
pub enum VerifyResult {
    Valid(Box<ValidatedSignature>),
    Invalid { reason: String },
}

impl VerifyResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResult::Valid(_))
    }
}

/// Validate `signature`, a `ds:Signature` element of `doc`.
///
/// `Ok(Invalid)` reports a signature that is well formed but does not
/// verify; `Err` reports one that cannot be processed at all.
pub fn verify_signature(
    ctx: &DsigContext<'_>,
    doc: &roxmltree::Document<'_>,
    signature: roxmltree::Node<'_, '_>,
) -> Result<VerifyResult, Error> {
    if !sigtuna_xml::is_element(signature, ns::DSIG, ns::node::SIGNATURE) {
        return Err(Error::XmlStructure("expected a ds:Signature element".into()));
    }
    let id_map = sigtuna_xml::build_id_map(doc)?;

    let signed_info = sigtuna_xml::find_child_element(signature, ns::DSIG, ns::node::SIGNED_INFO)
        .ok_or_else(|| Error::MissingElement("SignedInfo".into()))?;

    let c14n_method_node =
        sigtuna_xml::find_child_element(signed_info, ns::DSIG, ns::node::CANONICALIZATION_METHOD)
            .ok_or_else(|| Error::MissingElement("CanonicalizationMethod".into()))?;
    let c14n_uri = c14n_method_node
        .attribute(ns::attr::ALGORITHM)
        .ok_or_else(|| Error::MissingAttribute("Algorithm on CanonicalizationMethod".into()))?;
    let c14n_mode = C14nMode::from_uri(c14n_uri)
        .ok_or_else(|| Error::UnsupportedAlgorithm(format!("C14N: {c14n_uri}")))?;
    let inclusive_prefixes = read_inclusive_prefixes(c14n_method_node);

    let sig_method_uri =
        sigtuna_xml::find_child_element(signed_info, ns::DSIG, ns::node::SIGNATURE_METHOD)
            .ok_or_else(|| Error::MissingElement("SignatureMethod".into()))?
            .attribute(ns::attr::ALGORITHM)
            .ok_or_else(|| Error::MissingAttribute("Algorithm on SignatureMethod".into()))?;
    let sig_alg = sigtuna_crypto::sign::from_uri(sig_method_uri)?;

    let reference_nodes =
        sigtuna_xml::find_child_elements(signed_info, ns::DSIG, ns::node::REFERENCE);
    if reference_nodes.is_empty() {
        return Err(Error::MissingElement("Reference".into()));
    }
    let mut references = Vec::with_capacity(reference_nodes.len());
    for node in reference_nodes {
        let mut reference = Reference::parse(node)?;
        if let UriKind::SameDocument(id) = uri::classify(&reference.uri) {
            reference.target = id_map.get(id).copied();
        }
        log::debug!(
            "ds:Reference URI {:?} digest algo {}",
            reference.uri,
            reference.digest_method
        );
        if let Some(reason) = check_reference(ctx, doc, signature, &reference)? {
            return Ok(VerifyResult::Invalid { reason });
        }
        references.push(reference);
    }

    let key_info = sigtuna_xml::find_child_element(signature, ns::DSIG, ns::node::KEY_INFO);
    let selected = ctx.key_selector.select(key_info)?;

    let signed_info_c14n = sigtuna_c14n::canonicalize(
        doc,
        c14n_mode,
        &DocumentSubset::subtree(signed_info),
        &inclusive_prefixes,
    )?;

    let sig_value_node =
        sigtuna_xml::find_child_element(signature, ns::DSIG, ns::node::SIGNATURE_VALUE)
            .ok_or_else(|| Error::MissingElement("SignatureValue".into()))?;
    let signature_value = sigtuna_xml::decode_base64_text(sig_value_node)?;

    if !sig_alg.verify(&selected.key, &signed_info_c14n, &signature_value)? {
        return Ok(VerifyResult::Invalid {
            reason: format!(
                "signature value does not verify with the key of {}",
                selected.certificate.subject()
            ),
        });
    }

    Ok(VerifyResult::Valid(Box::new(ValidatedSignature {
        signature_id: signature.attribute(ns::attr::ID).map(str::to_owned),
        c14n_method: c14n_uri.to_owned(),
        signature_method: sig_alg.uri().to_owned(),
        references,
        certificate: selected.certificate,
        chain: selected.chain,
        signature_value,
    })))
}

/// `Ok(Some(reason))` when the reference cannot be resolved or its digest
/// differs.
fn check_reference(
    ctx: &DsigContext<'_>,
    doc: &roxmltree::Document<'_>,
    signature: roxmltree::Node<'_, '_>,
    reference: &Reference,
) -> Result<Option<String>, Error> {
    let xml_text = doc.input_text();
    let (input, enveloping) = match uri::classify(&reference.uri) {
        UriKind::WholeDocument => (TransformData::whole_document(xml_text), Some(signature.id())),
        UriKind::SameDocument(id) => {
            let Some(node) = reference.target.and_then(|node_id| doc.get_node(node_id)) else {
                return Ok(Some(format!("no element with Id {id:?}")));
            };
            let input = TransformData::Xml {
                xml_text: xml_text.to_owned(),
                subset: DocumentSubset::subtree(node).without_comments(),
            };
            (input, Some(signature.id()))
        }
        UriKind::Relative(_) => {
            let Some(dereferencer) = ctx.dereferencer else {
                return Ok(Some(format!("cannot dereference {:?}", reference.uri)));
            };
            match dereferencer.dereference(&reference.uri) {
                Ok(data) => (TransformData::Binary(data), None),
                Err(e @ (Error::Dereference(_) | Error::InvalidUri(_))) => {
                    return Ok(Some(e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }
        UriKind::Absolute(uri) => {
            return Ok(Some(format!("external reference {uri:?} is not resolved")));
        }
    };

    if reference.digest_matches(input, enveloping)? {
        Ok(None)
    } else {
        Ok(Some(format!("digest mismatch for reference {:?}", reference.uri)))
    }
}
