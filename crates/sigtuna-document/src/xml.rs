#![forbid(unsafe_code)]

//! Plain XML documents carrying enveloped signatures.

use crate::service::{
    html_page, DocumentContext, DocumentService, DocumentVisualization, RejectionStage,
    VerificationReport,
};
use sigtuna_c14n::{C14nMode, DocumentSubset};
use sigtuna_core::{algorithm, ns, Error};
use sigtuna_dsig::{extract, verify_signature, DsigContext, Reference, VerifyResult};
use sigtuna_transforms::TransformData;

/// Verifies `ds:Signature` elements enveloped in an XML document.
///
/// An accepted signature has a `URI=""` reference with the
/// enveloped-signature transform, so it covers the entire document.
#[derive(Debug, Default)]
pub struct XmlDocumentService {
    context: Option<DocumentContext>,
}

fn document_text(document: &[u8]) -> Result<&str, Error> {
    let data = document.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(document);
    std::str::from_utf8(data).map_err(|e| Error::ContainerFormat(format!("not UTF-8: {e}")))
}

fn parse_document(text: &str) -> Result<roxmltree::Document<'_>, Error> {
    sigtuna_xml::parse(text).map_err(|e| Error::ContainerFormat(e.to_string()))
}

/// The reference that covers the whole document, if any.
fn whole_document_reference(references: &[Reference]) -> Option<&Reference> {
    references.iter().find(|r| {
        r.is_content() && r.uri.is_empty() && r.has_transform(algorithm::ENVELOPED_SIGNATURE)
    })
}

impl XmlDocumentService {
    pub fn new() -> Self {
        Self::default()
    }

    fn context(&self) -> Result<&DocumentContext, Error> {
        self.context
            .as_ref()
            .ok_or_else(|| Error::Config("XML document service used before init".into()))
    }
}

impl DocumentService for XmlDocumentService {
    fn init(&mut self, context: DocumentContext, _content_type: &str) -> Result<(), Error> {
        context.config().validate()?;
        self.context = Some(context);
        Ok(())
    }

    fn check_incoming_document(&self, document: &[u8]) -> Result<(), Error> {
        parse_document(document_text(document)?).map(|_| ())
    }

    fn verify_signatures_report(
        &self,
        document: &[u8],
        original: Option<&[u8]>,
    ) -> Result<VerificationReport, Error> {
        let ctx = self.context()?;
        let doc = parse_document(document_text(document)?)?;
        let original_text = original.map(document_text).transpose()?;
        if let Some(text) = original_text {
            parse_document(text)?;
        }

        let mut report = VerificationReport::default();
        let dsig = DsigContext::new();
        let xades = ctx.xades_validation();

        for (index, signature) in extract::signature_elements(&doc).into_iter().enumerate() {
            let id = signature.attribute(ns::attr::ID);

            let validated = match verify_signature(&dsig, &doc, signature) {
                Ok(VerifyResult::Valid(validated)) => validated,
                Ok(VerifyResult::Invalid { reason }) => {
                    report.reject(index, id, RejectionStage::Crypto, reason);
                    continue;
                }
                Err(e) => {
                    report.reject(index, id, RejectionStage::Crypto, e.to_string());
                    continue;
                }
            };

            let Some(reference) = whole_document_reference(&validated.references) else {
                report.reject(
                    index,
                    id,
                    RejectionStage::Completeness,
                    "no enveloped reference to the whole document",
                );
                continue;
            };
            if let Some(text) = original_text {
                let matches = reference
                    .digest_matches(TransformData::whole_document(text), None)
                    .unwrap_or_else(|e| {
                        log::debug!("cannot digest the original document: {e}");
                        false
                    });
                if !matches {
                    log::warn!("signed document differs from the original");
                    return Err(Error::ContentTampered { uri: String::new() });
                }
            }

            match xades.validate(&doc, signature, &validated) {
                Ok(info) => report.signatures.push(info),
                Err(e) => report.reject(index, id, RejectionStage::Properties, e.to_string()),
            }
        }
        Ok(report)
    }

    /// The document in canonical form, signatures left out.
    fn visualize_document(
        &self,
        document: &[u8],
        language: &str,
    ) -> Result<DocumentVisualization, Error> {
        let doc = parse_document(document_text(document)?)?;
        let subset = extract::signature_elements(&doc)
            .into_iter()
            .fold(DocumentSubset::document().without_comments(), |subset, sig| {
                subset.excluding(sig)
            });
        let canonical = sigtuna_c14n::canonicalize(&doc, C14nMode::Inclusive, &subset, &[])?;
        let body = format!(
            "<pre>{}</pre>",
            sigtuna_c14n::escape::escape_text(&String::from_utf8_lossy(&canonical))
        );
        Ok(html_page("XML document", language, &body))
    }
}
