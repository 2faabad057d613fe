//! Error type shared by the core modules.

use thiserror::Error;

/// Errors raised by the pure geometry and format layers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}
