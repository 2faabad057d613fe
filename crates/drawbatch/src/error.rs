//! Error types for drawbatch operations.
//!
//! This module provides the main error type [`DrawBatchError`] which wraps
//! every failure the export pipeline can hit, from reading the input
//! document to writing output files.

use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

use crate::engine::EngineError;

/// The main error type for drawbatch operations.
///
/// # Diagnostic Variants
///
/// The `MalformedDocument` variant carries the parser error together with the
/// document source, so callers can point at the offending position.
#[derive(Debug, Error)]
pub enum DrawBatchError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed document: {err}")]
    MalformedDocument { err: roxmltree::Error, src: String },

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to start rendering engine: {0}")]
    EngineStart(String),

    #[error("Diagram {index} did not finish rendering within {timeout:?}")]
    RenderTimeout { index: usize, timeout: Duration },

    #[error("Rendering engine error: {0}")]
    Engine(String),

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Failed to write {}: {source}", path.display())]
    FileWrite { path: PathBuf, source: io::Error },
}

impl DrawBatchError {
    /// Create a new `MalformedDocument` error with the associated source text.
    pub fn new_malformed_document(err: roxmltree::Error, src: impl Into<String>) -> Self {
        Self::MalformedDocument {
            err,
            src: src.into(),
        }
    }
}

impl From<drawbatch_core::Error> for DrawBatchError {
    fn from(err: drawbatch_core::Error) -> Self {
        match err {
            drawbatch_core::Error::InvalidBounds(msg) => Self::InvalidBounds(msg),
            drawbatch_core::Error::UnsupportedFormat(name) => Self::UnsupportedFormat(name),
        }
    }
}

impl From<EngineError> for DrawBatchError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Launch(msg) | EngineError::Navigation(msg) => Self::EngineStart(msg),
            EngineError::RenderTimeout { index, timeout } => Self::RenderTimeout { index, timeout },
            EngineError::Capture(msg) => Self::Capture(msg),
            EngineError::Script(msg) | EngineError::Connection(msg) | EngineError::Close(msg) => {
                Self::Engine(msg)
            }
        }
    }
}
