//! Core types for the PipeLink media-pipeline client SDK
//!
//! This crate carries the pieces shared by every PipeLink transport:
//! the recursive configuration merge, the catalog of remote pipeline
//! element descriptors, and the common error taxonomy. It has no
//! network or media dependencies of its own.

pub mod config;
pub mod elements;
pub mod error;

pub use error::{Error, Result};
