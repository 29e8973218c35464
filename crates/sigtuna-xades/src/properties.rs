#![forbid(unsafe_code)]

//! Reading `xades:QualifyingProperties`.

use crate::info::SignatureProductionPlace;
use chrono::{DateTime, NaiveDateTime, Utc};
use sigtuna_core::{algorithm, ns, Error};

/// `xades:Cert`: a reference to a signing certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertReference {
    pub digest_method: String,
    pub digest_value: Vec<u8>,
    pub issuer_name: Option<String>,
    pub serial_number: Option<String>,
}

/// `xades:SignatureTimeStamp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureTimestamp {
    /// Canonicalization applied to `ds:SignatureValue` before stamping.
    pub c14n_method: String,
    /// Decoded `EncapsulatedTimeStamp` tokens.
    pub tokens: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualifyingProperties {
    pub target: String,
    pub signed_properties_id: Option<String>,
    /// The `xades:SignedProperties` element the values were read from.
    pub signed_properties_node: Option<roxmltree::NodeId>,
    pub signing_time: Option<DateTime<Utc>>,
    pub signing_certificates: Vec<CertReference>,
    pub claimed_roles: Vec<String>,
    pub production_place: Option<SignatureProductionPlace>,
    pub signature_timestamps: Vec<SignatureTimestamp>,
}

/// XAdES elements may use the 1.3.2 or the 1.4.1 namespace.
fn is_xades(node: roxmltree::Node<'_, '_>, local_name: &str) -> bool {
    sigtuna_xml::is_element(node, ns::XADES, local_name)
        || sigtuna_xml::is_element(node, ns::XADES141, local_name)
}

fn xades_child<'a, 'input>(
    parent: roxmltree::Node<'a, 'input>,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    parent.children().find(|n| is_xades(*n, local_name))
}

fn xades_children<'a, 'input>(
    parent: roxmltree::Node<'a, 'input>,
    local_name: &'a str,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> + 'a {
    parent.children().filter(move |n| is_xades(*n, local_name))
}

fn trimmed_text(node: roxmltree::Node<'_, '_>) -> Option<String> {
    let text: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

impl QualifyingProperties {
    /// The `QualifyingProperties` whose `Target` is `#<signature Id>`.
    ///
    /// `ds:Object` children of the signature are searched first, then the
    /// rest of the document.
    pub fn find(signature: roxmltree::Node<'_, '_>) -> Result<Option<Self>, Error> {
        let Some(id) = signature.attribute(ns::attr::ID) else {
            return Ok(None);
        };
        let target = format!("#{id}");
        let is_ours = |n: &roxmltree::Node<'_, '_>| {
            is_xades(*n, ns::node::QUALIFYING_PROPERTIES)
                && n.attribute(ns::attr::TARGET) == Some(target.as_str())
        };

        let in_objects = sigtuna_xml::find_child_elements(signature, ns::DSIG, ns::node::OBJECT)
            .into_iter()
            .flat_map(|object| object.children())
            .find(|n| is_ours(n));
        let found = in_objects.or_else(|| signature.document().descendants().find(|n| is_ours(n)));
        found.map(Self::parse).transpose()
    }

    pub fn parse(node: roxmltree::Node<'_, '_>) -> Result<Self, Error> {
        let mut props = Self {
            target: node.attribute(ns::attr::TARGET).unwrap_or("").to_owned(),
            ..Self::default()
        };

        if let Some(signed) = xades_child(node, ns::node::SIGNED_PROPERTIES) {
            props.signed_properties_id = signed.attribute(ns::attr::ID).map(str::to_owned);
            props.signed_properties_node = Some(signed.id());
            if let Some(ssp) = xades_child(signed, ns::node::SIGNED_SIGNATURE_PROPERTIES) {
                props.read_signed_signature_properties(ssp)?;
            }
        }

        if let Some(usp) = xades_child(node, ns::node::UNSIGNED_PROPERTIES)
            .and_then(|unsigned| xades_child(unsigned, ns::node::UNSIGNED_SIGNATURE_PROPERTIES))
        {
            for stamp in xades_children(usp, ns::node::SIGNATURE_TIME_STAMP) {
                props.signature_timestamps.push(read_timestamp(stamp)?);
            }
        }
        Ok(props)
    }

    fn read_signed_signature_properties(
        &mut self,
        ssp: roxmltree::Node<'_, '_>,
    ) -> Result<(), Error> {
        if let Some(time) = xades_child(ssp, ns::node::SIGNING_TIME) {
            let text = trimmed_text(time)
                .ok_or_else(|| Error::Properties("empty SigningTime".into()))?;
            self.signing_time = Some(parse_xsd_datetime(&text)?);
        }

        if let Some(signing_cert) = xades_child(ssp, ns::node::SIGNING_CERTIFICATE) {
            for cert in xades_children(signing_cert, ns::node::CERT) {
                self.signing_certificates.push(read_cert_reference(cert)?);
            }
        }

        if let Some(roles) = xades_child(ssp, ns::node::SIGNER_ROLE)
            .and_then(|role| xades_child(role, ns::node::CLAIMED_ROLES))
        {
            self.claimed_roles = xades_children(roles, ns::node::CLAIMED_ROLE)
                .filter_map(trimmed_text)
                .collect();
        }

        if let Some(place) = xades_child(ssp, ns::node::SIGNATURE_PRODUCTION_PLACE) {
            let field = |name: &str| xades_child(place, name).and_then(trimmed_text);
            let place = SignatureProductionPlace {
                city: field(ns::node::CITY),
                state_or_province: field(ns::node::STATE_OR_PROVINCE),
                postal_code: field(ns::node::POSTAL_CODE),
                country_name: field(ns::node::COUNTRY_NAME),
            };
            self.production_place = (!place.is_empty()).then_some(place);
        }
        Ok(())
    }
}

fn read_cert_reference(cert: roxmltree::Node<'_, '_>) -> Result<CertReference, Error> {
    let cert_digest = xades_child(cert, ns::node::CERT_DIGEST)
        .ok_or_else(|| Error::Properties("Cert without CertDigest".into()))?;
    let digest_method =
        sigtuna_xml::find_child_element(cert_digest, ns::DSIG, ns::node::DIGEST_METHOD)
            .and_then(|n| n.attribute(ns::attr::ALGORITHM))
            .ok_or_else(|| Error::Properties("CertDigest without DigestMethod".into()))?
            .to_owned();
    let digest_value =
        sigtuna_xml::find_child_element(cert_digest, ns::DSIG, ns::node::DIGEST_VALUE)
            .ok_or_else(|| Error::Properties("CertDigest without DigestValue".into()))
            .and_then(sigtuna_xml::decode_base64_text)?;

    let issuer_serial = xades_child(cert, ns::node::ISSUER_SERIAL);
    let ds_text = |name: &str| {
        issuer_serial
            .and_then(|serial| sigtuna_xml::find_child_element(serial, ns::DSIG, name))
            .and_then(trimmed_text)
    };
    Ok(CertReference {
        digest_method,
        digest_value,
        issuer_name: ds_text(ns::node::X509_ISSUER_NAME),
        serial_number: ds_text(ns::node::X509_SERIAL_NUMBER),
    })
}

fn read_timestamp(stamp: roxmltree::Node<'_, '_>) -> Result<SignatureTimestamp, Error> {
    let c14n_method =
        sigtuna_xml::find_child_element(stamp, ns::DSIG, ns::node::CANONICALIZATION_METHOD)
            .and_then(|n| n.attribute(ns::attr::ALGORITHM))
            .unwrap_or(algorithm::C14N)
            .to_owned();
    let tokens = xades_children(stamp, ns::node::ENCAPSULATED_TIME_STAMP)
        .map(sigtuna_xml::decode_base64_text)
        .collect::<Result<Vec<_>, _>>()?;
    if tokens.is_empty() {
        return Err(Error::Properties("SignatureTimeStamp without EncapsulatedTimeStamp".into()));
    }
    Ok(SignatureTimestamp { c14n_method, tokens })
}

/// Parse an `xsd:dateTime`; a value without time zone is taken as UTC.
pub fn parse_xsd_datetime(text: &str) -> Result<DateTime<Utc>, Error> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::Properties(format!("invalid xsd:dateTime {text:?}: {e}")))
}
