#![forbid(unsafe_code)]

//! The document-type service contract and format selection.

use crate::archive::ZipDocumentService;
use crate::config::VerificationConfig;
use crate::xml::XmlDocumentService;
use sigtuna_core::Error;
use sigtuna_xades::{
    AcceptAllRevocation, AcceptAllTimestamps, AcceptAllTrust, RevocationValidator, SignatureInfo,
    TimestampValidator, TrustValidator, XadesValidation,
};
use std::fmt;
use std::sync::Arc;

/// Collaborators and settings handed to a service by [`DocumentService::init`].
#[derive(Clone)]
pub struct DocumentContext {
    trust: Arc<dyn TrustValidator>,
    timestamps: Arc<dyn TimestampValidator>,
    revocation: Arc<dyn RevocationValidator>,
    config: VerificationConfig,
}

impl fmt::Debug for DocumentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DocumentContext {
    pub fn new(
        trust: Arc<dyn TrustValidator>,
        timestamps: Arc<dyn TimestampValidator>,
        revocation: Arc<dyn RevocationValidator>,
        config: VerificationConfig,
    ) -> Self {
        Self {
            trust,
            timestamps,
            revocation,
            config,
        }
    }

    /// A context whose validators approve every certificate and token.
    pub fn accept_all(config: VerificationConfig) -> Self {
        Self::new(
            Arc::new(AcceptAllTrust),
            Arc::new(AcceptAllTimestamps),
            Arc::new(AcceptAllRevocation),
            config,
        )
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    pub fn xades_validation(&self) -> XadesValidation {
        XadesValidation::new(
            Arc::clone(&self.trust),
            Arc::clone(&self.timestamps),
            Arc::clone(&self.revocation),
            self.config.xades_policy(),
        )
    }
}

impl Default for DocumentContext {
    fn default() -> Self {
        Self::accept_all(VerificationConfig::default())
    }
}

/// A rendering of a document for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentVisualization {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// How far a rejected signature got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionStage {
    /// The manifest could not be read.
    Extraction,
    Crypto,
    Completeness,
    Properties,
}

impl fmt::Display for RejectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RejectionStage::Extraction => "extraction",
            RejectionStage::Crypto => "cryptographic validation",
            RejectionStage::Completeness => "completeness",
            RejectionStage::Properties => "qualifying properties",
        };
        f.write_str(name)
    }
}

/// Why one signature was left out of the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Position of the signature in the manifest, in document order.
    pub signature_index: usize,
    pub signature_id: Option<String>,
    pub stage: RejectionStage,
    pub reason: String,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "signature #{}", self.signature_index)?;
        if let Some(id) = &self.signature_id {
            write!(f, " ({id})")?;
        }
        write!(f, " rejected at {}: {}", self.stage, self.reason)
    }
}

/// Accepted signatures plus the reasons the others were rejected.
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub signatures: Vec<SignatureInfo>,
    pub rejections: Vec<Rejection>,
}

impl VerificationReport {
    pub(crate) fn reject(
        &mut self,
        signature_index: usize,
        signature_id: Option<&str>,
        stage: RejectionStage,
        reason: impl Into<String>,
    ) {
        let rejection = Rejection {
            signature_index,
            signature_id: signature_id.map(str::to_owned),
            stage,
            reason: reason.into(),
        };
        log::warn!("{rejection}");
        self.rejections.push(rejection);
    }
}

/// One container format.
///
/// `verify_signatures` never reports a rejected signature as an error:
/// rejected signatures are left out of the result. Errors are reserved
/// for input that is not an instance of the format and for a signed
/// document that is not a faithful superset of the supplied original.
pub trait DocumentService: Send + Sync {
    /// Store the collaborators. Must be called before verifying.
    fn init(&mut self, context: DocumentContext, content_type: &str) -> Result<(), Error>;

    /// Fail with [`Error::ContainerFormat`] unless `document` is well formed.
    fn check_incoming_document(&self, document: &[u8]) -> Result<(), Error>;

    /// The accepted signatures of `document`, in document order.
    fn verify_signatures(
        &self,
        document: &[u8],
        original: Option<&[u8]>,
    ) -> Result<Vec<SignatureInfo>, Error> {
        Ok(self.verify_signatures_report(document, original)?.signatures)
    }

    fn verify_signatures_report(
        &self,
        document: &[u8],
        original: Option<&[u8]>,
    ) -> Result<VerificationReport, Error>;

    fn visualize_document(
        &self,
        document: &[u8],
        language: &str,
    ) -> Result<DocumentVisualization, Error>;
}

/// The formats a service exists for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Zip,
    Odf,
    Xml,
}

impl DocumentFormat {
    /// Select a format from a MIME type; parameters are ignored.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "application/zip" | "application/x-zip" | "application/x-zip-compressed" => {
                Some(Self::Zip)
            }
            m if m.starts_with("application/vnd.oasis.opendocument.") => Some(Self::Odf),
            "text/xml" | "application/xml" => Some(Self::Xml),
            m if m.ends_with("+xml") => Some(Self::Xml),
            _ => None,
        }
    }
}

/// A service for any supported format.
#[derive(Debug)]
pub enum AnyDocumentService {
    Zip(ZipDocumentService),
    Xml(XmlDocumentService),
}

impl AnyDocumentService {
    pub fn for_format(format: DocumentFormat) -> Self {
        match format {
            DocumentFormat::Zip | DocumentFormat::Odf => Self::Zip(ZipDocumentService::new()),
            DocumentFormat::Xml => Self::Xml(XmlDocumentService::new()),
        }
    }

    fn inner(&self) -> &dyn DocumentService {
        match self {
            Self::Zip(service) => service,
            Self::Xml(service) => service,
        }
    }
}

impl DocumentService for AnyDocumentService {
    fn init(&mut self, context: DocumentContext, content_type: &str) -> Result<(), Error> {
        match self {
            Self::Zip(service) => service.init(context, content_type),
            Self::Xml(service) => service.init(context, content_type),
        }
    }

    fn check_incoming_document(&self, document: &[u8]) -> Result<(), Error> {
        self.inner().check_incoming_document(document)
    }

    fn verify_signatures_report(
        &self,
        document: &[u8],
        original: Option<&[u8]>,
    ) -> Result<VerificationReport, Error> {
        self.inner().verify_signatures_report(document, original)
    }

    fn visualize_document(
        &self,
        document: &[u8],
        language: &str,
    ) -> Result<DocumentVisualization, Error> {
        self.inner().visualize_document(document, language)
    }
}

/// An initialised service for documents of `content_type`.
pub fn service_for_content_type(
    context: DocumentContext,
    content_type: &str,
) -> Result<AnyDocumentService, Error> {
    let format = DocumentFormat::from_content_type(content_type).ok_or_else(|| {
        Error::ContainerFormat(format!("unsupported content type {content_type:?}"))
    })?;
    let mut service = AnyDocumentService::for_format(format);
    service.init(context, content_type)?;
    Ok(service)
}

/// Minimal HTML page with a heading and one paragraph per line of `body`.
pub(crate) fn html_page(title: &str, language: &str, body: &str) -> DocumentVisualization {
    use sigtuna_c14n::escape::{escape_attr, escape_text};

    let mut html = String::new();
    html.push_str("<html");
    if !language.is_empty() {
        html.push_str(&format!(" lang=\"{}\"", escape_attr(language)));
    }
    html.push_str("><head><title>");
    html.push_str(&escape_text(title));
    html.push_str("</title></head><body><h1>");
    html.push_str(&escape_text(title));
    html.push_str("</h1>");
    html.push_str(body);
    html.push_str("</body></html>");
    DocumentVisualization {
        mime_type: "text/html".to_owned(),
        data: html.into_bytes(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_content_type() {
        assert_eq!(
            DocumentFormat::from_content_type("application/zip"),
            Some(DocumentFormat::Zip)
        );
        assert_eq!(
            DocumentFormat::from_content_type("application/vnd.oasis.opendocument.text"),
            Some(DocumentFormat::Odf)
        );
        assert_eq!(
            DocumentFormat::from_content_type("Text/XML; charset=UTF-8"),
            Some(DocumentFormat::Xml)
        );
        assert_eq!(
            DocumentFormat::from_content_type("application/atom+xml"),
            Some(DocumentFormat::Xml)
        );
        assert_eq!(DocumentFormat::from_content_type("application/pdf"), None);
    }

    #[test]
    fn test_service_for_content_type() {
        let spreadsheet = "application/vnd.oasis.opendocument.spreadsheet";
        let service = service_for_content_type(DocumentContext::default(), spreadsheet).unwrap();
        assert!(matches!(service, AnyDocumentService::Zip(_)));

        let service = service_for_content_type(DocumentContext::default(), "text/xml").unwrap();
        assert!(matches!(service, AnyDocumentService::Xml(_)));

        assert!(matches!(
            service_for_content_type(DocumentContext::default(), "image/png"),
            Err(Error::ContainerFormat(_))
        ));
    }

    #[test]
    fn test_rejection_display() {
        let rejection = Rejection {
            signature_index: 1,
            signature_id: Some("sig-2".into()),
            stage: RejectionStage::Completeness,
            reason: "entry \"extra.txt\" is not signed".into(),
        };
        assert_eq!(
            rejection.to_string(),
            "signature #1 (sig-2) rejected at completeness: entry \"extra.txt\" is not signed"
        );
    }

    #[test]
    fn test_report_records_rejection() {
        let mut report = VerificationReport::default();
        report.reject(0, None, RejectionStage::Crypto, "bad digest");
        assert!(report.signatures.is_empty());
        assert_eq!(report.rejections.len(), 1);
        assert_eq!(report.rejections[0].stage, RejectionStage::Crypto);
        assert_eq!(report.rejections[0].signature_id, None);
    }

    #[test]
    fn test_html_page_escapes() {
        let page = html_page("a<b", "nl", "<p>x</p>");
        let html = String::from_utf8(page.data).unwrap();
        assert_eq!(page.mime_type, "text/html");
        assert!(html.starts_with("<html lang=\"nl\"><head><title>a&lt;b</title>"));
        assert!(html.ends_with("<p>x</p></body></html>"));
    }
}
