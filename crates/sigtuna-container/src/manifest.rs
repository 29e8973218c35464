#![forbid(unsafe_code)]

//! Recognising the signature manifest entry of a container.

/// Decides which container entry carries the XML signatures.
pub trait ManifestPolicy: Send + Sync {
    fn is_manifest(&self, entry_name: &str) -> bool;
}

/// ODF and generic ZIP: any entry below `META-INF/` whose name mentions
/// `signatures`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OdfManifestPolicy;

impl ManifestPolicy for OdfManifestPolicy {
    fn is_manifest(&self, entry_name: &str) -> bool {
        entry_name.starts_with("META-INF/") && entry_name.contains("signatures")
    }
}
