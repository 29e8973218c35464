#![forbid(unsafe_code)]

//! Resolving `ds:Reference/@URI` against container entries.

use crate::container::Container;
use sigtuna_core::Error;
use sigtuna_transforms::uri::{self, UriKind};
use sigtuna_transforms::UriDereferencer;

/// Maps a relative, percent-encoded URI to the container entry with
/// exactly that decoded name.
#[derive(Debug, Clone, Copy)]
pub struct ContainerDereferencer<'a> {
    container: &'a Container,
}

impl<'a> ContainerDereferencer<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// The entry name `uri` refers to, if it is a container reference at all.
    pub fn entry_name(uri: &str) -> Result<Option<String>, Error> {
        match uri::classify(uri) {
            UriKind::Relative(relative) => uri::percent_decode(relative).map(Some),
            _ => Ok(None),
        }
    }
}

impl UriDereferencer for ContainerDereferencer<'_> {
    fn dereference(&self, uri: &str) -> Result<Vec<u8>, Error> {
        let name = Self::entry_name(uri)?
            .ok_or_else(|| Error::Dereference(format!("{uri:?} is not a container entry reference")))?;
        match self.container.entry(&name) {
            Some(data) => {
                log::trace!("dereferenced {uri:?} to entry {name:?} ({} bytes)", data.len());
                Ok(data.to_vec())
            }
            None => Err(Error::Dereference(format!("no container entry named {name:?}"))),
        }
    }
}
