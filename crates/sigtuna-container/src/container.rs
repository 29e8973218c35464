#![forbid(unsafe_code)]

//! ZIP entry table.

use crate::manifest::ManifestPolicy;
use indexmap::IndexMap;
use sigtuna_core::Error;
use std::io::{Cursor, Read};

/// Largest entry accepted when reading an archive: 64 MiB.
pub const DEFAULT_MAX_ENTRY_SIZE: u64 = 64 * 1024 * 1024;

/// File entries of a ZIP archive in archive order. Directory entries
/// carry no content and are left out.
#[derive(Debug, Clone, Default)]
pub struct Container {
    entries: IndexMap<String, Vec<u8>>,
}

impl Container {
    /// Read every entry of `bytes`; any unreadable entry, an entry above
    /// `max_entry_size`, or a repeated name is `Error::ContainerFormat`.
    pub fn from_zip(bytes: &[u8], max_entry_size: u64) -> Result<Self, Error> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| Error::ContainerFormat(format!("not a ZIP archive: {e}")))?;

        let mut entries = IndexMap::with_capacity(archive.len());
        for index in 0..archive.len() {
            let file = archive
                .by_index(index)
                .map_err(|e| Error::ContainerFormat(format!("unreadable ZIP entry #{index}: {e}")))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_owned();
            if file.size() > max_entry_size {
                return Err(Error::ContainerFormat(format!(
                    "ZIP entry {name:?} exceeds {max_entry_size} bytes"
                )));
            }

            let mut data = Vec::new();
            file.take(max_entry_size + 1)
                .read_to_end(&mut data)
                .map_err(|e| Error::ContainerFormat(format!("unreadable ZIP entry {name:?}: {e}")))?;
            if data.len() as u64 > max_entry_size {
                return Err(Error::ContainerFormat(format!(
                    "ZIP entry {name:?} exceeds {max_entry_size} bytes"
                )));
            }

            if entries.insert(name.clone(), data).is_some() {
                return Err(Error::ContainerFormat(format!("duplicate ZIP entry {name:?}")));
            }
        }
        log::debug!("read ZIP container with {} entries", entries.len());
        Ok(Self { entries })
    }

    pub fn entry(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first entry the policy recognises as the signature manifest.
    pub fn manifest<'a>(&'a self, policy: &dyn ManifestPolicy) -> Option<(&'a str, &'a [u8])> {
        self.iter().find(|(name, _)| policy.is_manifest(name))
    }

    /// Every entry that is not a signature manifest.
    pub fn content_names<'a>(
        &'a self,
        policy: &'a dyn ManifestPolicy,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.names().filter(move |name| !policy.is_manifest(name))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::OdfManifestPolicy;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    pub(crate) fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_entries_in_archive_order() {
        let bytes = zip_bytes(&[
            ("mimetype", b"application/vnd.oasis.opendocument.text"),
            ("content.xml", b"<office/>"),
            ("Pictures/", b""),
            ("META-INF/documentsignatures.xml", b"<sigs/>"),
        ]);
        let container = Container::from_zip(&bytes, DEFAULT_MAX_ENTRY_SIZE).unwrap();
        assert_eq!(
            container.names().collect::<Vec<_>>(),
            ["mimetype", "content.xml", "META-INF/documentsignatures.xml"]
        );
        assert_eq!(container.entry("content.xml"), Some(&b"<office/>"[..]));
        assert!(!container.contains("Pictures/"));

        let policy = OdfManifestPolicy;
        let (name, data) = container.manifest(&policy).unwrap();
        assert_eq!(name, "META-INF/documentsignatures.xml");
        assert_eq!(data, b"<sigs/>");
        assert_eq!(
            container.content_names(&policy).collect::<Vec<_>>(),
            ["mimetype", "content.xml"]
        );
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(
            Container::from_zip(b"plain text", DEFAULT_MAX_ENTRY_SIZE),
            Err(Error::ContainerFormat(_))
        ));
    }

    #[test]
    fn test_entry_size_limit() {
        let bytes = zip_bytes(&[("big.bin", &[7u8; 100])]);
        assert!(Container::from_zip(&bytes, 100).is_ok());
        assert!(matches!(
            Container::from_zip(&bytes, 99),
            Err(Error::ContainerFormat(_))
        ));
    }

    #[test]
    fn test_no_manifest() {
        let bytes = zip_bytes(&[("a.txt", b"a")]);
        let container = Container::from_zip(&bytes, DEFAULT_MAX_ENTRY_SIZE).unwrap();
        assert!(container.manifest(&OdfManifestPolicy).is_none());
    }
}
