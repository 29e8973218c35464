#![forbid(unsafe_code)]

//! Per-signature validation context.

use sigtuna_keys::{KeyInfoKeySelector, KeySelector};
use sigtuna_transforms::UriDereferencer;

/// Collaborators used while validating one signature.
#[derive(Clone, Copy)]
pub struct DsigContext<'a> {
    /// Resolves references that point outside the signature document.
    pub dereferencer: Option<&'a dyn UriDereferencer>,
    pub key_selector: &'a dyn KeySelector,
}

impl<'a> DsigContext<'a> {
    /// A context that selects keys from `ds:KeyInfo` and resolves no
    /// external references.
    pub fn new() -> Self {
        Self {
            dereferencer: None,
            key_selector: &KeyInfoKeySelector,
        }
    }

    pub fn with_dereferencer(mut self, dereferencer: &'a dyn UriDereferencer) -> Self {
        self.dereferencer = Some(dereferencer);
        self
    }

    pub fn with_key_selector(mut self, key_selector: &'a dyn KeySelector) -> Self {
        self.key_selector = key_selector;
        self
    }
}

impl Default for DsigContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}
