//! Signed XAdES fixtures for unit tests.

use crate::{SignatureInfo, XadesValidation};
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use der::Encode;
use sigtuna_core::{algorithm, ns, Error};
use sigtuna_dsig::{DsigContext, VerifyResult};
use sigtuna_keys::SignerCertificate;
use std::str::FromStr;
use std::time::Duration;
use x509_cert::builder::{Builder, CertificateBuilder, Profile};

fn b64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

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

    fn sign(&self, template: &str) -> String {
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

/// A signature whose only reference covers its own `SignedProperties`.
pub(crate) struct XadesFixture {
    pub signer: Signer,
    pub signing_time: DateTime<Utc>,
    digest_cert: Option<SignerCertificate>,
    timestamp: Option<Vec<u8>>,
    typed_reference: bool,
}

impl XadesFixture {
    pub(crate) fn new(subject: &str) -> Self {
        let signer = Signer::new(subject);
        let now = Utc::now();
        Self {
            signer,
            signing_time: Utc.timestamp_opt(now.timestamp(), 0).unwrap(),
            digest_cert: None,
            timestamp: None,
            typed_reference: true,
        }
    }

    pub(crate) fn with_signing_time(mut self, time: DateTime<Utc>) -> Self {
        self.signing_time = Utc.timestamp_opt(time.timestamp(), 0).unwrap();
        self
    }

    pub(crate) fn with_cert_digest_of(mut self, cert: &SignerCertificate) -> Self {
        self.digest_cert = Some(cert.clone());
        self
    }

    pub(crate) fn with_timestamp(mut self, token: &[u8]) -> Self {
        self.timestamp = Some(token.to_vec());
        self
    }

    /// Drop the `Type` of the reference so the properties count as unsigned.
    pub(crate) fn without_properties_reference(mut self) -> Self {
        self.typed_reference = false;
        self
    }

    fn qualifying_properties(&self) -> String {
        let cert = &self.signer.certificate;
        let digest_cert = self.digest_cert.as_ref().unwrap_or(cert);
        let cert_digest = b64(&digest_cert.digest(algorithm::SHA256).unwrap());
        let unsigned = match &self.timestamp {
            Some(token) => format!(
                r#"<xades:UnsignedProperties><xades:UnsignedSignatureProperties><xades:SignatureTimeStamp><ds:CanonicalizationMethod Algorithm="{}"/><xades:EncapsulatedTimeStamp>{}</xades:EncapsulatedTimeStamp></xades:SignatureTimeStamp></xades:UnsignedSignatureProperties></xades:UnsignedProperties>"#,
                algorithm::C14N,
                b64(token)
            ),
            None => String::new(),
        };
        format!(
            r##"<ds:Object><xades:QualifyingProperties xmlns:xades="{xades}" Target="#xmldsig-1"><xades:SignedProperties Id="xmldsig-1-xades"><xades:SignedSignatureProperties><xades:SigningTime>{time}</xades:SigningTime><xades:SigningCertificate><xades:Cert><xades:CertDigest><ds:DigestMethod Algorithm="{sha256}"/><ds:DigestValue>{cert_digest}</ds:DigestValue></xades:CertDigest><xades:IssuerSerial><ds:X509IssuerName>{issuer}</ds:X509IssuerName><ds:X509SerialNumber>{serial}</ds:X509SerialNumber></xades:IssuerSerial></xades:Cert></xades:SigningCertificate><xades:SignatureProductionPlace><xades:City>Leuven</xades:City><xades:CountryName>BE</xades:CountryName></xades:SignatureProductionPlace><xades:SignerRole><xades:ClaimedRoles><xades:ClaimedRole>Director</xades:ClaimedRole></xades:ClaimedRoles></xades:SignerRole></xades:SignedSignatureProperties></xades:SignedProperties>{unsigned}</xades:QualifyingProperties></ds:Object>"##,
            xades = ns::XADES,
            time = self.signing_time.format("%Y-%m-%dT%H:%M:%SZ"),
            sha256 = algorithm::SHA256,
            issuer = cert.issuer(),
            serial = cert.serial_decimal(),
        )
    }

    pub(crate) fn signed_xml(&self) -> String {
        let type_attr = if self.typed_reference {
            format!(r#" Type="{}""#, algorithm::XADES_SIGNED_PROPERTIES)
        } else {
            String::new()
        };
        let template = format!(
            r##"<ds:Signature xmlns:ds="{dsig}" Id="xmldsig-1"><ds:SignedInfo><ds:CanonicalizationMethod Algorithm="{exc}"/><ds:SignatureMethod Algorithm="{method}"/><ds:Reference URI="#xmldsig-1-xades"{type_attr}><ds:Transforms><ds:Transform Algorithm="{exc}"/></ds:Transforms><ds:DigestMethod Algorithm="{sha256}"/><ds:DigestValue>PROPS_DIGEST</ds:DigestValue></ds:Reference></ds:SignedInfo><ds:SignatureValue></ds:SignatureValue><ds:KeyInfo><ds:X509Data><ds:X509Certificate>{cert}</ds:X509Certificate></ds:X509Data></ds:KeyInfo>{props}</ds:Signature>"##,
            dsig = ns::DSIG,
            exc = algorithm::EXC_C14N,
            method = algorithm::RSA_SHA256,
            sha256 = algorithm::SHA256,
            cert = b64(self.signer.certificate.der()),
            props = self.qualifying_properties(),
        );

        let props_digest = {
            let doc = sigtuna_xml::parse(&template).unwrap();
            let signed_props =
                sigtuna_xml::find_element(&doc, ns::XADES, ns::node::SIGNED_PROPERTIES).unwrap();
            let c14n = sigtuna_c14n::canonicalize(
                &doc,
                sigtuna_c14n::C14nMode::Exclusive,
                &sigtuna_c14n::DocumentSubset::subtree(signed_props).without_comments(),
                &[],
            )
            .unwrap();
            b64(&sigtuna_crypto::digest::digest(algorithm::SHA256, &c14n).unwrap())
        };
        self.signer.sign(&template.replace("PROPS_DIGEST", &props_digest))
    }

    pub(crate) fn validate(&self, validation: &XadesValidation) -> Result<SignatureInfo, Error> {
        validate_xml(&self.signed_xml(), validation)
    }
}

/// Verify the first signature of `xml` cryptographically, then run
/// `validation`.
pub(crate) fn validate_xml(
    xml: &str,
    validation: &XadesValidation,
) -> Result<SignatureInfo, Error> {
    let doc = sigtuna_xml::parse(xml).unwrap();
    let signature = sigtuna_dsig::extract::signature_elements(&doc)[0];
    let VerifyResult::Valid(validated) =
        sigtuna_dsig::verify_signature(&DsigContext::new(), &doc, signature).unwrap()
    else {
        panic!("fixture signature must verify");
    };
    validation.validate(&doc, signature, &validated)
}
