#![forbid(unsafe_code)]

//! Signed containers for the Sigtuna verification engine.
//!
//! A [`Container`] is the entry table of a ZIP archive, read once into
//! memory. The entry holding the XML signatures is recognised by a
//! [`ManifestPolicy`]; every other entry is content that a signature must
//! cover.

pub mod container;
pub mod dereference;
pub mod manifest;

pub use container::{Container, DEFAULT_MAX_ENTRY_SIZE};
pub use dereference::ContainerDereferencer;
pub use manifest::{ManifestPolicy, OdfManifestPolicy};
