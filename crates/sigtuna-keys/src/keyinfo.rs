#![forbid(unsafe_code)]

//! `ds:KeyInfo` processing: pick the signer certificate out of
//! `ds:X509Data` and derive the verifying key from it.

use crate::cert::SignerCertificate;
use sigtuna_core::{ns, Error};
use sigtuna_crypto::VerifyingKey;

/// The key a signature is checked against, with the certificates it came from.
#[derive(Debug, Clone)]
pub struct SelectedKey {
    /// The end-entity certificate.
    pub certificate: SignerCertificate,
    /// Leaf first, then each issuer found among the supplied certificates.
    pub chain: Vec<SignerCertificate>,
    pub key: VerifyingKey,
}

/// Chooses the verifying key for one signature.
pub trait KeySelector {
    fn select(&self, key_info: Option<roxmltree::Node<'_, '_>>) -> Result<SelectedKey, Error>;
}

/// Selects the signer certificate embedded in `ds:KeyInfo/ds:X509Data`.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyInfoKeySelector;

impl KeySelector for KeyInfoKeySelector {
    fn select(&self, key_info: Option<roxmltree::Node<'_, '_>>) -> Result<SelectedKey, Error> {
        let key_info = key_info.ok_or_else(|| Error::MissingElement("ds:KeyInfo".into()))?;
        let certs = embedded_certificates(key_info)?;
        if certs.is_empty() {
            return Err(Error::Key("no ds:X509Certificate in ds:KeyInfo".into()));
        }

        let leaf_idx = find_leaf_cert(&certs);
        let chain = order_chain(certs, leaf_idx);
        let certificate = chain[0].clone();
        let key = certificate.verifying_key()?;
        log::debug!(
            "selected signer certificate {} ({} key, chain length {})",
            certificate.subject(),
            key.algorithm_name(),
            chain.len()
        );
        Ok(SelectedKey {
            certificate,
            chain,
            key,
        })
    }
}

/// Every `X509Certificate` under any `X509Data` child, in document order.
pub fn embedded_certificates(
    key_info: roxmltree::Node<'_, '_>,
) -> Result<Vec<SignerCertificate>, Error> {
    let mut certs = Vec::new();
    for x509_data in sigtuna_xml::find_child_elements(key_info, ns::DSIG, ns::node::X509_DATA) {
        for cert_node in
            sigtuna_xml::find_child_elements(x509_data, ns::DSIG, ns::node::X509_CERTIFICATE)
        {
            let der = sigtuna_xml::decode_base64_text(cert_node)?;
            certs.push(SignerCertificate::from_der(&der)?);
        }
    }
    Ok(certs)
}

/// Index of the end-entity certificate.
///
/// A leaf issues none of the other certificates and is preferably not a
/// CA; ties go to the last candidate, which is the leaf in chains written
/// root first.
fn find_leaf_cert(certs: &[SignerCertificate]) -> usize {
    if certs.len() <= 1 {
        return 0;
    }

    let issues_other: Vec<bool> = certs
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            certs
                .iter()
                .enumerate()
                .any(|(j, other)| i != j && other.is_issued_by(candidate))
        })
        .collect();

    let pick = |filter: &dyn Fn(usize) -> bool| -> Option<usize> {
        (0..certs.len()).filter(|&i| filter(i)).last()
    };

    pick(&|i| !certs[i].is_ca() && !issues_other[i])
        .or_else(|| pick(&|i| !issues_other[i]))
        .or_else(|| pick(&|i| !certs[i].is_ca()))
        .unwrap_or(certs.len() - 1)
}

/// Walk issuer links from the leaf; certificates not on that path are dropped.
fn order_chain(mut certs: Vec<SignerCertificate>, leaf_idx: usize) -> Vec<SignerCertificate> {
    let mut chain = vec![certs.swap_remove(leaf_idx)];
    loop {
        let Some(current) = chain.last() else { break };
        if current.is_self_issued() {
            break;
        }
        let Some(pos) = certs.iter().position(|c| current.is_issued_by(c)) else {
            break;
        };
        chain.push(certs.swap_remove(pos));
    }
    if !certs.is_empty() {
        log::debug!("{} certificate(s) in ds:KeyInfo are not on the signer's chain", certs.len());
    }
    chain
}
