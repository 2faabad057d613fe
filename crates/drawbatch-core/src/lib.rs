//! drawbatch Core Types and Definitions
//!
//! This crate provides the engine-independent building blocks of the
//! drawbatch export pipeline. It includes:
//!
//! - **Geometry**: Engine-reported bounds and the integer viewport derived
//!   from them ([`geometry`] module)
//! - **Formats**: Output formats and the output kinds they map to
//!   ([`format`] module)
//! - **Output planning**: Deterministic output filenames for every diagram
//!   of a document ([`output`] module)

pub mod format;
pub mod geometry;
pub mod output;

mod error;

pub use error::Error;
