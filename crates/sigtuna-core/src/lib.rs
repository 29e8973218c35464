#![forbid(unsafe_code)]

//! Core types for the Sigtuna signed-container verification engine.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, Result};
