#![forbid(unsafe_code)]

//! XML helpers for the Sigtuna verification engine.
//!
//! Thin, namespace-aware lookups over `roxmltree` plus the ID map and
//! base64 text decoding used throughout signature processing.

pub mod document;

pub use document::{
    build_id_map, decode_base64_text, find_child_element, find_child_elements, find_element,
    find_elements, is_element, parse,
};

/// Return roxmltree parsing options that allow DTD.
///
/// roxmltree does not expand external entities, so a DTD in a signature
/// manifest cannot pull in outside content.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    }
}
