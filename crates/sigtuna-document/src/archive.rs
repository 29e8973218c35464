#![forbid(unsafe_code)]

//! Signed ZIP packages and OpenDocument files.

use crate::completeness;
use crate::service::{
    html_page, DocumentContext, DocumentService, DocumentVisualization, RejectionStage,
    VerificationReport,
};
use sigtuna_c14n::escape::escape_text;
use sigtuna_container::{Container, ContainerDereferencer, OdfManifestPolicy};
use sigtuna_core::{ns, Error};
use sigtuna_dsig::{extract, verify_signature, DsigContext, VerifyResult};

/// Verifies the detached signatures in `META-INF/*signatures*.xml`.
///
/// A signature is accepted when it verifies, when its content references
/// name every entry of the package except the manifest, and when its
/// qualifying properties pass [`sigtuna_xades::XadesValidation`].
#[derive(Debug, Default)]
pub struct ZipDocumentService {
    context: Option<DocumentContext>,
    content_type: String,
    policy: OdfManifestPolicy,
}

impl ZipDocumentService {
    pub fn new() -> Self {
        Self::default()
    }

    fn context(&self) -> Result<&DocumentContext, Error> {
        self.context
            .as_ref()
            .ok_or_else(|| Error::Config("ZIP document service used before init".into()))
    }

    fn max_entry_size(&self) -> u64 {
        self.context
            .as_ref()
            .map(|ctx| ctx.config().max_entry_size)
            .unwrap_or(sigtuna_container::DEFAULT_MAX_ENTRY_SIZE)
    }
}

impl DocumentService for ZipDocumentService {
    fn init(&mut self, context: DocumentContext, content_type: &str) -> Result<(), Error> {
        context.config().validate()?;
        self.context = Some(context);
        self.content_type = content_type.to_owned();
        Ok(())
    }

    fn check_incoming_document(&self, document: &[u8]) -> Result<(), Error> {
        Container::from_zip(document, self.max_entry_size()).map(|_| ())
    }

    fn verify_signatures_report(
        &self,
        document: &[u8],
        original: Option<&[u8]>,
    ) -> Result<VerificationReport, Error> {
        let ctx = self.context()?;
        let max_entry_size = ctx.config().max_entry_size;
        let container = Container::from_zip(document, max_entry_size)?;
        let original = original
            .map(|bytes| Container::from_zip(bytes, max_entry_size))
            .transpose()?;

        let mut report = VerificationReport::default();
        let Some(manifest) = extract::find_manifest(&container, &self.policy) else {
            log::debug!("no signature manifest in {} document", self.content_type);
            return Ok(report);
        };
        log::debug!("signature manifest {}", manifest.name);

        let text = match manifest.text() {
            Ok(text) => text,
            Err(e) => {
                report.reject(0, None, RejectionStage::Extraction, e.to_string());
                return Ok(report);
            }
        };
        let doc = match sigtuna_xml::parse(text) {
            Ok(doc) => doc,
            Err(e) => {
                report.reject(0, None, RejectionStage::Extraction, e.to_string());
                return Ok(report);
            }
        };

        let dereferencer = ContainerDereferencer::new(&container);
        let dsig = DsigContext::new().with_dereferencer(&dereferencer);
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

            match completeness::unsigned_entries(&container, &self.policy, &validated.references) {
                Ok(unsigned) if unsigned.is_empty() => {}
                Ok(unsigned) => {
                    report.reject(
                        index,
                        id,
                        RejectionStage::Completeness,
                        format!("entries not covered by the signature: {}", unsigned.join(", ")),
                    );
                    continue;
                }
                Err(e) => {
                    report.reject(index, id, RejectionStage::Completeness, e.to_string());
                    continue;
                }
            }
            if let Some(original) = &original {
                completeness::check_original(original, &self.policy, &validated.references)?;
            }

            match xades.validate(&doc, signature, &validated) {
                Ok(info) => {
                    log::debug!("accepted signature by {}", info.signer().subject());
                    report.signatures.push(info);
                }
                Err(e) => report.reject(index, id, RejectionStage::Properties, e.to_string()),
            }
        }
        Ok(report)
    }

    fn visualize_document(
        &self,
        document: &[u8],
        language: &str,
    ) -> Result<DocumentVisualization, Error> {
        let container = Container::from_zip(document, self.max_entry_size())?;
        let body: String = container
            .content_names(&self.policy)
            .map(|name| format!("<p>{}</p>", escape_text(name)))
            .collect();
        Ok(html_page("ZIP package", language, &body))
    }
}
