#![forbid(unsafe_code)]

//! Checking that a signature covers a whole container, and that the
//! signed container extends the original faithfully.

use sigtuna_container::{Container, ContainerDereferencer, ManifestPolicy};
use sigtuna_core::Error;
use sigtuna_dsig::Reference;
use sigtuna_transforms::TransformData;
use std::collections::BTreeSet;

/// Entry names that content references of `references` point at.
pub fn referenced_entries(references: &[Reference]) -> Result<BTreeSet<String>, Error> {
    let mut names = BTreeSet::new();
    for reference in references.iter().filter(|r| r.is_content()) {
        if let Some(name) = ContainerDereferencer::entry_name(&reference.uri)? {
            names.insert(name);
        }
    }
    Ok(names)
}

/// Entries of `container`, other than the manifest, that no content
/// reference covers.
pub fn unsigned_entries<'a>(
    container: &'a Container,
    policy: &'a dyn ManifestPolicy,
    references: &[Reference],
) -> Result<Vec<&'a str>, Error> {
    let signed = referenced_entries(references)?;
    Ok(container
        .content_names(policy)
        .filter(|name| !signed.contains(*name))
        .collect())
}

/// Compare the signed references with `original`.
///
/// Every content reference must digest to the same value over the
/// original entry, and every original entry must be referenced.
pub fn check_original(
    original: &Container,
    policy: &dyn ManifestPolicy,
    references: &[Reference],
) -> Result<(), Error> {
    for reference in references.iter().filter(|r| r.is_content()) {
        let Some(name) = ContainerDereferencer::entry_name(&reference.uri)? else {
            continue;
        };
        let Some(data) = original.entry(&name) else {
            log::warn!("signed entry {name:?} is absent from the original");
            return Err(Error::ContentTampered {
                uri: reference.uri.clone(),
            });
        };
        let matches = reference
            .digest_matches(TransformData::Binary(data.to_vec()), None)
            .unwrap_or_else(|e| {
                log::debug!("cannot digest original entry {name:?}: {e}");
                false
            });
        if !matches {
            log::warn!("signed entry {name:?} differs from the original");
            return Err(Error::ContentTampered {
                uri: reference.uri.clone(),
            });
        }
    }

    let signed = referenced_entries(references)?;
    if let Some(entry) = original.content_names(policy).find(|name| !signed.contains(*name)) {
        log::warn!("original entry {entry:?} is not part of the signed document");
        return Err(Error::ContentRemoved {
            entry: entry.to_owned(),
        });
    }
    Ok(())
}
