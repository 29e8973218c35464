#![forbid(unsafe_code)]

//! Document-type services for the Sigtuna verification engine.
//!
//! A [`DocumentService`] knows one container format. It checks that
//! incoming bytes are an instance of the format, verifies every embedded
//! signature and returns the accepted ones as [`SignatureInfo`] records.
//! A signature is accepted only when it verifies cryptographically, covers
//! every entry of the container and carries acceptable qualifying
//! properties.
//!
//! [`SignatureInfo`]: sigtuna_xades::SignatureInfo

pub mod archive;
pub mod completeness;
pub mod config;
pub mod service;
pub mod xml;

pub use archive::ZipDocumentService;
pub use config::VerificationConfig;
pub use service::{
    service_for_content_type, AnyDocumentService, DocumentContext, DocumentFormat,
    DocumentService, DocumentVisualization, Rejection, RejectionStage, VerificationReport,
};
pub use xml::XmlDocumentService;
