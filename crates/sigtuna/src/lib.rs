#![forbid(unsafe_code)]

//! Sigtuna verifies the XML signatures embedded in ZIP packages,
//! OpenDocument files and plain XML documents.
//!
//! ```no_run
//! use sigtuna::document::{service_for_content_type, DocumentContext, DocumentService};
//!
//! sigtuna::init();
//! let bytes = std::fs::read("contract.odt")?;
//! let service = service_for_content_type(
//!     DocumentContext::default(),
//!     "application/vnd.oasis.opendocument.text",
//! )?;
//! for info in service.verify_signatures(&bytes, None)? {
//!     println!("signed by {}", info.signer().subject());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use sigtuna_c14n as c14n;
pub use sigtuna_container as container;
pub use sigtuna_core as core;
pub use sigtuna_crypto as crypto;
pub use sigtuna_document as document;
pub use sigtuna_dsig as dsig;
pub use sigtuna_keys as keys;
pub use sigtuna_transforms as transforms;
pub use sigtuna_xades as xades;
pub use sigtuna_xml as xml;

pub use sigtuna_core::Error;

use std::sync::Once;

static INIT: Once = Once::new();

/// Install the `env_logger` logger, filtered by `RUST_LOG` (default
/// `warn`). Later calls do nothing.
pub fn init() {
    INIT.call_once(|| {
        let env = env_logger::Env::default().default_filter_or("warn");
        // Another logger may already be installed by the host program.
        let _ = env_logger::Builder::from_env(env).try_init();
    });
}
