//! Certificate fixtures for unit tests.

use crate::SignerCertificate;
use der::Encode;
use std::str::FromStr;
use std::time::Duration;
use x509_cert::builder::{Builder, CertificateBuilder, Profile};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::time::Validity;

const ONE_YEAR: Duration = Duration::from_secs(365 * 24 * 3600);

pub(crate) fn rsa_key() -> rsa::RsaPrivateKey {
    rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap()
}

fn build(
    profile: Profile,
    subject: &str,
    serial: u32,
    subject_key: &rsa::RsaPrivateKey,
    issuer_key: &rsa::RsaPrivateKey,
) -> SignerCertificate {
    let signer = rsa::pkcs1v15::SigningKey::<sha2::Sha256>::new(issuer_key.clone());
    let spki = SubjectPublicKeyInfoOwned::from_key(subject_key.to_public_key()).unwrap();
    let builder = CertificateBuilder::new(
        profile,
        SerialNumber::from(serial),
        Validity::from_now(ONE_YEAR).unwrap(),
        Name::from_str(subject).unwrap(),
        spki,
        &signer,
    )
    .unwrap();
    let cert = builder.build::<rsa::pkcs1v15::Signature>().unwrap();
    SignerCertificate::from_der(&cert.to_der().unwrap()).unwrap()
}

/// A self-signed root certificate and its key.
pub(crate) fn self_signed(subject: &str, serial: u32) -> (rsa::RsaPrivateKey, SignerCertificate) {
    let key = rsa_key();
    let cert = build(Profile::Root, subject, serial, &key, &key);
    (key, cert)
}

/// A leaf certificate issued by `issuer`.
pub(crate) fn issued_by(
    subject: &str,
    serial: u32,
    issuer: &SignerCertificate,
    issuer_key: &rsa::RsaPrivateKey,
) -> (rsa::RsaPrivateKey, SignerCertificate) {
    let key = rsa_key();
    let profile = Profile::Leaf {
        issuer: issuer.certificate().tbs_certificate.subject.clone(),
        enable_key_agreement: false,
        enable_key_encipherment: false,
    };
    let cert = build(profile, subject, serial, &key, issuer_key);
    (key, cert)
}
