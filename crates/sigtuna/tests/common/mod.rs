//! Fixtures shared by the integration tests: keys, self-signed
//! certificates, XAdES signatures and ZIP archives.

#![allow(dead_code)]

use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use der::Encode;
use sigtuna::core::{algorithm, ns};
use sigtuna::document::{service_for_content_type, AnyDocumentService, DocumentContext};
use sigtuna::keys::SignerCertificate;
use std::io::{Cursor, Write};
use std::str::FromStr;
use std::time::Duration;
use x509_cert::builder::{Builder, CertificateBuilder, Profile};
use zip::write::SimpleFileOptions;

pub const MANIFEST_NAME: &str = "META-INF/documentsignatures.xml";

pub fn b64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

pub fn sha256(data: &[u8]) -> Vec<u8> {
    sigtuna::crypto::digest::digest(algorithm::SHA256, data).unwrap()
}

/// An RSA key with a self-signed certificate valid from now for a day.
pub struct Signer {
    key: rsa::RsaPrivateKey,
    pub certificate: SignerCertificate,
}

impl Signer {
    pub fn new(subject: &str) -> Self {
        let key = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
        let signing_key = rsa::pkcs1v15::SigningKey::<sha2::Sha256>::new(key.clone());
        let spki =
            x509_cert::spki::SubjectPublicKeyInfoOwned::from_key(key.to_public_key()).unwrap();
        let cert = CertificateBuilder::new(
            Profile::Root,
            x509_cert::serial_number::SerialNumber::from(7u32),
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

    fn sign_signed_info(&self, template: &str) -> String {
        use signature::{SignatureEncoding, Signer as _};

        let doc = sigtuna::xml::parse(template).unwrap();
        let signed_info = sigtuna::xml::find_element(&doc, ns::DSIG, ns::node::SIGNED_INFO).unwrap();
        let c14n = sigtuna::c14n::canonicalize(
            &doc,
            sigtuna::c14n::C14nMode::Exclusive,
            &sigtuna::c14n::DocumentSubset::subtree(signed_info),
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

    /// A signed XAdES `ds:Signature` with `references` plus a reference
    /// to its own `SignedProperties`.
    pub fn xades_signature(&self, id: &str, references: &[String]) -> String {
        let cert = &self.certificate;
        let props_id = format!("{id}-xades");
        let template = format!(
            r##"<ds:Signature xmlns:ds="{dsig}" Id="{id}"><ds:SignedInfo><ds:CanonicalizationMethod Algorithm="{exc}"/><ds:SignatureMethod Algorithm="{method}"/>{refs}<ds:Reference Type="{props_type}" URI="#{props_id}"><ds:Transforms><ds:Transform Algorithm="{exc}"/></ds:Transforms><ds:DigestMethod Algorithm="{sha256}"/><ds:DigestValue>PROPS_DIGEST</ds:DigestValue></ds:Reference></ds:SignedInfo><ds:SignatureValue></ds:SignatureValue><ds:KeyInfo><ds:X509Data><ds:X509Certificate>{cert_b64}</ds:X509Certificate></ds:X509Data></ds:KeyInfo><ds:Object><xades:QualifyingProperties xmlns:xades="{xades}" Target="#{id}"><xades:SignedProperties Id="{props_id}"><xades:SignedSignatureProperties><xades:SigningTime>{time}</xades:SigningTime><xades:SigningCertificate><xades:Cert><xades:CertDigest><ds:DigestMethod Algorithm="{sha256}"/><ds:DigestValue>{cert_digest}</ds:DigestValue></xades:CertDigest><xades:IssuerSerial><ds:X509IssuerName>{issuer}</ds:X509IssuerName><ds:X509SerialNumber>{serial}</ds:X509SerialNumber></xades:IssuerSerial></xades:Cert></xades:SigningCertificate><xades:SignerRole><xades:ClaimedRoles><xades:ClaimedRole>Notary</xades:ClaimedRole></xades:ClaimedRoles></xades:SignerRole></xades:SignedSignatureProperties></xades:SignedProperties></xades:QualifyingProperties></ds:Object></ds:Signature>"##,
            dsig = ns::DSIG,
            xades = ns::XADES,
            exc = algorithm::EXC_C14N,
            method = algorithm::RSA_SHA256,
            sha256 = algorithm::SHA256,
            props_type = algorithm::XADES_SIGNED_PROPERTIES,
            refs = references.concat(),
            cert_b64 = b64(cert.der()),
            time = signing_time().format("%Y-%m-%dT%H:%M:%SZ"),
            cert_digest = b64(&sha256(cert.der())),
            issuer = cert.issuer(),
            serial = cert.serial_decimal(),
        );

        let props_digest = {
            let doc = sigtuna::xml::parse(&template).unwrap();
            let props =
                sigtuna::xml::find_element(&doc, ns::XADES, ns::node::SIGNED_PROPERTIES).unwrap();
            let c14n = sigtuna::c14n::canonicalize(
                &doc,
                sigtuna::c14n::C14nMode::Exclusive,
                &sigtuna::c14n::DocumentSubset::subtree(props).without_comments(),
                &[],
            )
            .unwrap();
            b64(&sha256(&c14n))
        };
        self.sign_signed_info(&template.replace("PROPS_DIGEST", &props_digest))
    }
}

/// The current time in whole seconds.
pub fn signing_time() -> DateTime<Utc> {
    Utc.timestamp_opt(Utc::now().timestamp(), 0).unwrap()
}

fn reference(uri: &str, transforms: &str, digest: &[u8]) -> String {
    format!(
        r#"<ds:Reference URI="{uri}">{transforms}<ds:DigestMethod Algorithm="{}"/><ds:DigestValue>{}</ds:DigestValue></ds:Reference>"#,
        algorithm::SHA256,
        b64(digest)
    )
}

/// A detached reference to container entry `name`.
pub fn entry_reference(name: &str, data: &[u8]) -> String {
    reference(&name.replace(' ', "%20"), "", &sha256(data))
}

/// An enveloped whole-document reference; `canonical` is the exclusive
/// canonical form of the document without its signature.
pub fn enveloped_reference(canonical: &[u8]) -> String {
    let transforms = format!(
        r#"<ds:Transforms><ds:Transform Algorithm="{}"/><ds:Transform Algorithm="{}"/></ds:Transforms>"#,
        algorithm::ENVELOPED_SIGNATURE,
        algorithm::EXC_C14N
    );
    reference("", &transforms, &sha256(canonical))
}

/// An ODF signature manifest holding `signatures`.
pub fn manifest(signatures: &[String]) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><document-signatures xmlns="{}">{}</document-signatures>"#,
        ns::ODF_DSIG,
        signatures.concat()
    )
    .into_bytes()
}

pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// `entries` plus a manifest whose single signature references `signed`.
pub fn signed_zip(signer: &Signer, entries: &[(&str, &[u8])], signed: &[&str]) -> Vec<u8> {
    let references: Vec<String> = entries
        .iter()
        .filter(|(name, _)| signed.contains(name))
        .map(|(name, data)| entry_reference(name, data))
        .collect();
    let manifest = manifest(&[signer.xades_signature("sig-1", &references)]);
    let mut all = entries.to_vec();
    all.push((MANIFEST_NAME, manifest.as_slice()));
    zip_bytes(&all)
}

pub fn zip_service() -> AnyDocumentService {
    service_for_content_type(DocumentContext::default(), "application/zip").unwrap()
}

pub fn xml_service() -> AnyDocumentService {
    service_for_content_type(DocumentContext::default(), "text/xml").unwrap()
}
