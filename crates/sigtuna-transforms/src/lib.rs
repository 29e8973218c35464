#![forbid(unsafe_code)]

//! Reference processing for the Sigtuna verification engine.
//!
//! Each `ds:Reference` names its data by URI and lists transforms applied
//! in order before digesting. This crate provides the transforms and the
//! [`UriDereferencer`] seam through which references outside the
//! signature document are resolved.

pub mod base64_transform;
pub mod enveloped;
pub mod pipeline;
pub mod uri;

pub use pipeline::{Transform, TransformData, TransformPipeline};
pub use uri::UriDereferencer;
