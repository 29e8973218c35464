//! Signature fixtures for unit tests.

use base64::Engine;
use der::Encode;
use sigtuna_core::{algorithm, ns};
use sigtuna_keys::SignerCertificate;
use std::str::FromStr;
use std::time::Duration;
use x509_cert::builder::{Builder, CertificateBuilder, Profile};

fn b64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

pub(crate) fn sha256_b64(data: &[u8]) -> String {
    b64(&sigtuna_crypto::digest::digest(algorithm::SHA256, data).unwrap())
}

/// A key pair with a self-signed certificate.
pub(crate) struct Signer {
    key: rsa::RsaPrivateKey,
    pub certificate: SignerCertificate,
}

impl Signer {
    pub(crate) fn new(subject: &str) -> Self {
        let key = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
        let signing_key = rsa::pkcs1v15::SigningKey::<sha2::Sha256>::new(key.clone());
        let spki =
            x509_cert::spki::SubjectPublicKeyInfoOwned::from_key(key.to_public_key()).unwrap();
        let cert = CertificateBuilder::new(
            Profile::Root,
            x509_cert::serial_number::SerialNumber::from(1u32),
            x509_cert::time::Validity::from_now(Duration::from_secs(86_400)).unwrap(),
            x509_cert::name::Name::from_str(subject).unwrap(),
            spki,
            &signing_key,
        )
        .unwrap()
        .build::<rsa::pkcs1v15::Signature>()
        .unwrap();
        let certificate = SignerCertificate::from_der(&cert.to_der().unwrap()).unwrap();
        Self { key, certificate }
    }

    pub(crate) fn key_info(&self) -> String {
        format!(
            "<ds:KeyInfo><ds:X509Data><ds:X509Certificate>{}</ds:X509Certificate></ds:X509Data></ds:KeyInfo>",
            b64(self.certificate.der())
        )
    }

    /// Fill the empty `ds:SignatureValue` of `template`.
    pub(crate) fn sign(&self, template: &str) -> String {
        use signature::{SignatureEncoding, Signer as _};

        let doc = sigtuna_xml::parse(template).unwrap();
        let signed_info = sigtuna_xml::find_element(&doc, ns::DSIG, ns::node::SIGNED_INFO).unwrap();
        let c14n = sigtuna_c14n::canonicalize(
            &doc,
            sigtuna_c14n::C14nMode::Exclusive,
            &sigtuna_c14n::DocumentSubset::subtree(signed_info),
            &[],
        )
        .unwrap();
        let signing_key = rsa::pkcs1v15::SigningKey::<sha2::Sha256>::new(self.key.clone());
        let value = b64(&signing_key.sign(&c14n).to_vec());
        template.replace(
            "<ds:SignatureValue></ds:SignatureValue>",
            &format!("<ds:SignatureValue>{value}</ds:SignatureValue>"),
        )
    }
}

pub(crate) fn reference_xml(
    uri: &str,
    transforms: &[&str],
    digest_b64: &str,
    ref_type: Option<&str>,
) -> String {
    let type_attr = ref_type
        .map(|t| format!(r#" Type="{t}""#))
        .unwrap_or_default();
    let transforms = if transforms.is_empty() {
        String::new()
    } else {
        let list: String = transforms
            .iter()
            .map(|t| format!(r#"<ds:Transform Algorithm="{t}"/>"#))
            .collect();
        format!("<ds:Transforms>{list}</ds:Transforms>")
    };
    format!(
        r#"<ds:Reference URI="{uri}"{type_attr}>{transforms}<ds:DigestMethod Algorithm="{}"/><ds:DigestValue>{digest_b64}</ds:DigestValue></ds:Reference>"#,
        algorithm::SHA256
    )
}

pub(crate) fn binary_reference(uri: &str, data: &[u8]) -> String {
    reference_xml(uri, &[], &sha256_b64(data), None)
}

pub(crate) fn signature_template(id: &str, references: &[String], key_info: &str) -> String {
    format!(
        r#"<ds:Signature xmlns:ds="{dsig}" Id="{id}"><ds:SignedInfo><ds:CanonicalizationMethod Algorithm="{c14n}"/><ds:SignatureMethod Algorithm="{method}"/>{refs}</ds:SignedInfo><ds:SignatureValue></ds:SignatureValue>{key_info}</ds:Signature>"#,
        dsig = ns::DSIG,
        c14n = algorithm::EXC_C14N,
        method = algorithm::RSA_SHA256,
        refs = references.concat(),
    )
}
