#![forbid(unsafe_code)]

//! XAdES validation of a cryptographically valid signature.

use crate::info::SignatureInfo;
use crate::properties::{CertReference, QualifyingProperties};
use crate::validator::{
    AcceptAllRevocation, AcceptAllTimestamps, AcceptAllTrust, RevocationValidator,
    TimestampValidator, TrustValidator,
};
use chrono::{DateTime, Utc};
use sigtuna_c14n::{C14nMode, DocumentSubset};
use sigtuna_core::{algorithm, ns, Error};
use sigtuna_dsig::ValidatedSignature;
use sigtuna_keys::SignerCertificate;
use std::sync::Arc;

/// `Type` of a reference to `xades:SignedProperties` as written by
/// XAdES 1.3.2 producers that version the URI.
const SIGNED_PROPERTIES_V132: &str = "http://uri.etsi.org/01903/v1.3.2#SignedProperties";

/// What the qualifying properties of an accepted signature must provide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XadesPolicy {
    /// Trust domain handed to the [`TrustValidator`].
    pub trust_domain: String,
    /// Trust domain handed to the [`TimestampValidator`].
    pub timestamp_trust_domain: String,
    /// Require signed `QualifyingProperties` with a `SigningCertificate`.
    pub require_signed_properties: bool,
    pub require_signing_time: bool,
}

impl Default for XadesPolicy {
    fn default() -> Self {
        Self {
            trust_domain: "BE".to_owned(),
            timestamp_trust_domain: "BE-TSA".to_owned(),
            require_signed_properties: true,
            require_signing_time: true,
        }
    }
}

/// Checks qualifying properties and consults the external validators.
#[derive(Clone)]
pub struct XadesValidation {
    trust: Arc<dyn TrustValidator>,
    timestamps: Arc<dyn TimestampValidator>,
    revocation: Arc<dyn RevocationValidator>,
    policy: XadesPolicy,
}

impl std::fmt::Debug for XadesValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XadesValidation")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl XadesValidation {
    pub fn new(
        trust: Arc<dyn TrustValidator>,
        timestamps: Arc<dyn TimestampValidator>,
        revocation: Arc<dyn RevocationValidator>,
        policy: XadesPolicy,
    ) -> Self {
        Self {
            trust,
            timestamps,
            revocation,
            policy,
        }
    }

    /// Validators that approve everything.
    pub fn accept_all(policy: XadesPolicy) -> Self {
        Self::new(
            Arc::new(AcceptAllTrust),
            Arc::new(AcceptAllTimestamps),
            Arc::new(AcceptAllRevocation),
            policy,
        )
    }

    pub fn policy(&self) -> &XadesPolicy {
        &self.policy
    }

    /// Validate the properties of `signature`, which `validated` describes.
    ///
    /// Any failure is an `Err`; the caller rejects the signature.
    pub fn validate(
        &self,
        doc: &roxmltree::Document<'_>,
        signature: roxmltree::Node<'_, '_>,
        validated: &ValidatedSignature,
    ) -> Result<SignatureInfo, Error> {
        let signer = &validated.certificate;
        let props = self.signed_properties(signature, validated)?;

        let info = SignatureInfo::new(
            signer.clone(),
            validated.chain.clone(),
            validated.signature_id.clone(),
            validated.signature_method.clone(),
        );
        let Some(props) = props else {
            self.delegate(validated, Utc::now())?;
            return Ok(info);
        };

        match props.signing_time {
            Some(time) => signer
                .check_validity_at(time)
                .map_err(|e| Error::Properties(format!("signing time {time}: {e}")))?,
            None if self.policy.require_signing_time => {
                return Err(Error::Properties("no SigningTime".into()));
            }
            None => {}
        }

        if props.signing_certificates.is_empty() {
            if self.policy.require_signed_properties {
                return Err(Error::Properties("no SigningCertificate".into()));
            }
        } else if !props
            .signing_certificates
            .iter()
            .any(|reference| cert_reference_matches(reference, signer))
        {
            return Err(Error::Properties(format!(
                "SigningCertificate does not identify {}",
                signer.subject()
            )));
        }

        let at = props.signing_time.unwrap_or_else(Utc::now);
        self.delegate(validated, at)?;
        self.check_timestamps(doc, signature, &props)?;

        Ok(info.with_properties(
            props.signing_time,
            props.claimed_roles,
            props.production_place,
        ))
    }

    /// The qualifying properties, if present and covered by the signature.
    ///
    /// Covered means a `SignedProperties` reference resolved to the very
    /// element the properties were read from.
    fn signed_properties(
        &self,
        signature: roxmltree::Node<'_, '_>,
        validated: &ValidatedSignature,
    ) -> Result<Option<QualifyingProperties>, Error> {
        let found = QualifyingProperties::find(signature)?;
        let signed = found.filter(|props| {
            let covered = props.signed_properties_node.is_some_and(|node| {
                validated
                    .references_of_type(algorithm::XADES_SIGNED_PROPERTIES)
                    .chain(validated.references_of_type(SIGNED_PROPERTIES_V132))
                    .any(|r| r.target == Some(node))
            });
            if !covered {
                log::debug!(
                    "SignedProperties {:?} is not the element a reference covers",
                    props.signed_properties_id
                );
            }
            covered
        });
        if signed.is_none() && self.policy.require_signed_properties {
            return Err(Error::Properties(
                "no signed QualifyingProperties targeting the signature".into(),
            ));
        }
        Ok(signed)
    }

    fn delegate(&self, validated: &ValidatedSignature, at: DateTime<Utc>) -> Result<(), Error> {
        self.trust
            .validate(&validated.chain, &self.policy.trust_domain, at)
            .map_err(|e| Error::Properties(format!("trust validation: {e}")))?;
        self.revocation
            .check(&validated.certificate, validated.chain.get(1), at)
            .map_err(|e| Error::Properties(format!("revocation check: {e}")))?;
        Ok(())
    }

    /// Each `SignatureTimeStamp` token must stamp the canonical
    /// `ds:SignatureValue` element.
    fn check_timestamps(
        &self,
        doc: &roxmltree::Document<'_>,
        signature: roxmltree::Node<'_, '_>,
        props: &QualifyingProperties,
    ) -> Result<(), Error> {
        if props.signature_timestamps.is_empty() {
            return Ok(());
        }
        let sig_value =
            sigtuna_xml::find_child_element(signature, ns::DSIG, ns::node::SIGNATURE_VALUE)
                .ok_or_else(|| Error::MissingElement("SignatureValue".into()))?;
        let subset = DocumentSubset::subtree(sig_value);
        for stamp in &props.signature_timestamps {
            let mode = C14nMode::from_uri(&stamp.c14n_method).ok_or_else(|| {
                Error::UnsupportedAlgorithm(format!("time-stamp C14N: {}", stamp.c14n_method))
            })?;
            let data = sigtuna_c14n::canonicalize(doc, mode, &subset, &[])?;
            for token in &stamp.tokens {
                self.timestamps
                    .validate(
                        token,
                        &data,
                        props.signing_time,
                        &self.policy.timestamp_trust_domain,
                    )
                    .map_err(|e| Error::Properties(format!("signature time-stamp: {e}")))?;
            }
        }
        Ok(())
    }
}

fn cert_reference_matches(reference: &CertReference, cert: &SignerCertificate) -> bool {
    let digest_matches = match cert.digest(&reference.digest_method) {
        Ok(digest) => sigtuna_crypto::constant_time_eq(&digest, &reference.digest_value),
        Err(e) => {
            log::debug!("cannot compute CertDigest: {e}");
            false
        }
    };
    if !digest_matches {
        return false;
    }
    if let Some(serial) = &reference.serial_number {
        if serial.trim_start_matches('0') != cert.serial_decimal().trim_start_matches('0') {
            log::debug!("IssuerSerial serial {serial} differs from {}", cert.serial_decimal());
            return false;
        }
    }
    if let Some(issuer) = &reference.issuer_name {
        if normalize_dn(issuer) != normalize_dn(&cert.issuer()) {
            log::debug!("IssuerSerial issuer {issuer:?} differs from {:?}", cert.issuer());
            return false;
        }
    }
    true
}

/// Case-insensitive DN comparison key, ignoring spaces around `,` `+` `=`.
fn normalize_dn(dn: &str) -> String {
    dn.split(',')
        .map(|rdn| {
            rdn.split('+')
                .map(|atv| {
                    atv.split('=')
                        .map(|part| part.trim().to_lowercase())
                        .collect::<Vec<_>>()
                        .join("=")
                })
                .collect::<Vec<_>>()
                .join("+")
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, XadesFixture};
    use crate::validator::ValidatorError;
    use chrono::Duration;
    use std::sync::Mutex;

    struct RejectTrust;

    impl TrustValidator for RejectTrust {
        fn validate(
            &self,
            _chain: &[SignerCertificate],
            trust_domain: &str,
            _at: DateTime<Utc>,
        ) -> Result<(), ValidatorError> {
            Err(ValidatorError::Rejected(format!("not trusted in {trust_domain}")))
        }
    }

    struct UnavailableRevocation;

    impl RevocationValidator for UnavailableRevocation {
        fn check(
            &self,
            _certificate: &SignerCertificate,
            _issuer: Option<&SignerCertificate>,
            _at: DateTime<Utc>,
        ) -> Result<(), ValidatorError> {
            Err(ValidatorError::Unavailable("OCSP responder down".into()))
        }
    }

    struct StampCall {
        token: Vec<u8>,
        signed_data: Vec<u8>,
        claimed_time: Option<DateTime<Utc>>,
        trust_domain: String,
    }

    #[derive(Default)]
    struct RecordingTimestamps(Mutex<Vec<StampCall>>);

    impl TimestampValidator for RecordingTimestamps {
        fn validate(
            &self,
            token: &[u8],
            signed_data: &[u8],
            claimed_time: Option<DateTime<Utc>>,
            trust_domain: &str,
        ) -> Result<(), ValidatorError> {
            self.0.lock().unwrap().push(StampCall {
                token: token.to_vec(),
                signed_data: signed_data.to_vec(),
                claimed_time,
                trust_domain: trust_domain.to_owned(),
            });
            Ok(())
        }
    }

    /// Rejects a token whose claimed signing time precedes `earliest`.
    struct StampedAfter(DateTime<Utc>);

    impl TimestampValidator for StampedAfter {
        fn validate(
            &self,
            _token: &[u8],
            _signed_data: &[u8],
            claimed_time: Option<DateTime<Utc>>,
            _trust_domain: &str,
        ) -> Result<(), ValidatorError> {
            match claimed_time {
                Some(time) if time >= self.0 => Ok(()),
                other => Err(ValidatorError::Rejected(format!(
                    "claimed time {other:?} is before the stamp"
                ))),
            }
        }
    }

    fn with(
        trust: Arc<dyn TrustValidator>,
        timestamps: Arc<dyn TimestampValidator>,
        revocation: Arc<dyn RevocationValidator>,
    ) -> XadesValidation {
        XadesValidation::new(trust, timestamps, revocation, XadesPolicy::default())
    }

    #[test]
    fn test_accepts_complete_properties() {
        let fixture = XadesFixture::new("CN=Alice,C=BE");
        let info = fixture
            .validate(&XadesValidation::accept_all(XadesPolicy::default()))
            .unwrap();
        assert_eq!(info.signer(), &fixture.signer.certificate);
        assert_eq!(info.signing_time(), Some(fixture.signing_time));
        assert_eq!(info.claimed_roles(), ["Director"]);
        assert_eq!(
            info.production_place().and_then(|p| p.city.as_deref()),
            Some("Leuven")
        );
        assert_eq!(info.signature_id(), Some("xmldsig-1"));
    }

    #[test]
    fn test_trust_rejection_rejects_signature() {
        let fixture = XadesFixture::new("CN=Alice");
        let validation = with(
            Arc::new(RejectTrust),
            Arc::new(AcceptAllTimestamps),
            Arc::new(AcceptAllRevocation),
        );
        let err = fixture.validate(&validation).unwrap_err();
        assert!(err.to_string().contains("not trusted in BE"), "{err}");
    }

    #[test]
    fn test_unavailable_revocation_rejects_signature() {
        let fixture = XadesFixture::new("CN=Alice");
        let validation = with(
            Arc::new(AcceptAllTrust),
            Arc::new(AcceptAllTimestamps),
            Arc::new(UnavailableRevocation),
        );
        assert!(matches!(fixture.validate(&validation), Err(Error::Properties(_))));
    }

    #[test]
    fn test_timestamp_over_signature_value() {
        let fixture = XadesFixture::new("CN=Alice").with_timestamp(b"tsp-token");
        let recorder = Arc::new(RecordingTimestamps::default());
        let validation = with(
            Arc::new(AcceptAllTrust),
            recorder.clone(),
            Arc::new(AcceptAllRevocation),
        );
        fixture.validate(&validation).unwrap();

        let calls = recorder.0.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].token, b"tsp-token");
        let data = String::from_utf8(calls[0].signed_data.clone()).unwrap();
        assert!(data.starts_with("<ds:SignatureValue"), "{data}");
        assert_eq!(calls[0].claimed_time, Some(fixture.signing_time));
        assert_eq!(calls[0].trust_domain, "BE-TSA");
    }

    #[test]
    fn test_timestamp_rejecting_claimed_time_rejects_signature() {
        let fixture = XadesFixture::new("CN=Alice").with_timestamp(b"tsp-token");
        let stamped_later = with(
            Arc::new(AcceptAllTrust),
            Arc::new(StampedAfter(fixture.signing_time + Duration::hours(1))),
            Arc::new(AcceptAllRevocation),
        );
        let err = fixture.validate(&stamped_later).unwrap_err();
        assert!(err.to_string().contains("signature time-stamp"), "{err}");

        let stamped_earlier = with(
            Arc::new(AcceptAllTrust),
            Arc::new(StampedAfter(fixture.signing_time - Duration::hours(1))),
            Arc::new(AcceptAllRevocation),
        );
        assert!(fixture.validate(&stamped_earlier).is_ok());
    }

    #[test]
    fn test_uncovered_properties_copy_is_not_read() {
        let fixture = XadesFixture::new("CN=Alice");
        let xml = fixture.signed_xml();
        let start = xml.find("<ds:Object>").unwrap();
        let end = xml.find("</ds:Object>").unwrap() + "</ds:Object>".len();
        let copy = xml[start..end]
            .replace("xmldsig-1-xades", "xmldsig-1-copy")
            .replace("Director", "Forged");
        let wrapped = format!("{}{copy}{}", &xml[..start], &xml[start..]);

        let strict = XadesValidation::accept_all(XadesPolicy::default());
        let err = testing::validate_xml(&wrapped, &strict).unwrap_err();
        assert!(matches!(err, Error::Properties(_)), "{err}");

        let relaxed = XadesPolicy {
            require_signed_properties: false,
            require_signing_time: false,
            ..XadesPolicy::default()
        };
        let info = testing::validate_xml(&wrapped, &XadesValidation::accept_all(relaxed)).unwrap();
        assert!(info.claimed_roles().is_empty());
    }

    #[test]
    fn test_signing_time_outside_validity() {
        let fixture =
            XadesFixture::new("CN=Alice").with_signing_time(Utc::now() - Duration::days(30));
        let err = fixture
            .validate(&XadesValidation::accept_all(XadesPolicy::default()))
            .unwrap_err();
        assert!(matches!(err, Error::Properties(_)));
    }

    #[test]
    fn test_signing_certificate_of_someone_else() {
        let other = testing::Signer::new("CN=Mallory");
        let fixture = XadesFixture::new("CN=Alice").with_cert_digest_of(&other.certificate);
        assert!(fixture
            .validate(&XadesValidation::accept_all(XadesPolicy::default()))
            .is_err());
    }

    #[test]
    fn test_unsigned_properties_rejected() {
        let fixture = XadesFixture::new("CN=Alice").without_properties_reference();
        assert!(fixture
            .validate(&XadesValidation::accept_all(XadesPolicy::default()))
            .is_err());

        let relaxed = XadesPolicy {
            require_signed_properties: false,
            require_signing_time: false,
            ..XadesPolicy::default()
        };
        let info = fixture.validate(&XadesValidation::accept_all(relaxed)).unwrap();
        assert_eq!(info.signing_time(), None);
        assert!(info.claimed_roles().is_empty());
    }

    #[test]
    fn test_normalize_dn() {
        assert_eq!(normalize_dn("CN = Root CA, O=Fedict"), normalize_dn("cn=root ca,o=fedict"));
        assert_ne!(normalize_dn("CN=A"), normalize_dn("CN=B"));
    }
}
