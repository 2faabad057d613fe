//! Error adapter for converting DrawBatchError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI. Malformed input
//! documents are rendered with a snippet pointing at the parser position;
//! every other error is rendered as a plain message with a diagnostic code.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use drawbatch::DrawBatchError;

/// Adapter for a malformed input document.
///
/// Wraps the XML parser error and the document source so the report can
/// show where parsing stopped.
pub struct DocumentDiagnostic<'a> {
    err: &'a roxmltree::Error,
    src: &'a str,
}

impl<'a> DocumentDiagnostic<'a> {
    /// Create a new document diagnostic.
    pub fn new(err: &'a roxmltree::Error, src: &'a str) -> Self {
        Self { err, src }
    }

    fn span(&self) -> SourceSpan {
        let pos = self.err.pos();
        let offset = byte_offset(self.src, pos.row as usize, pos.col as usize);
        let len = usize::from(offset < self.src.len());
        SourceSpan::new(offset.into(), len)
    }
}

impl fmt::Debug for DocumentDiagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentDiagnostic")
            .field("err", &self.err)
            .finish()
    }
}

impl fmt::Display for DocumentDiagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Malformed document: {}", self.err)
    }
}

impl std::error::Error for DocumentDiagnostic<'_> {}

impl MietteDiagnostic for DocumentDiagnostic<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("drawbatch::malformed_document"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(
            "the input must be an uncompressed draw.io file (<mxfile> with <diagram> pages)",
        ))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(
            LabeledSpan::new_primary_with_span(Some("parsing stopped here".to_string()), self.span()),
        )))
    }
}

/// Adapter for [`DrawBatchError`] variants without source information.
pub struct ErrorAdapter<'a>(pub &'a DrawBatchError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            DrawBatchError::Io(_) => "drawbatch::io",
            DrawBatchError::MalformedDocument { .. } => "drawbatch::malformed_document",
            DrawBatchError::InvalidOption(_) => "drawbatch::invalid_option",
            DrawBatchError::UnsupportedFormat(_) => "drawbatch::unsupported_format",
            DrawBatchError::EngineStart(_) => "drawbatch::engine_start",
            DrawBatchError::RenderTimeout { .. } => "drawbatch::render_timeout",
            DrawBatchError::Engine(_) => "drawbatch::engine",
            DrawBatchError::InvalidBounds(_) => "drawbatch::invalid_bounds",
            DrawBatchError::Capture(_) => "drawbatch::capture",
            DrawBatchError::FileWrite { .. } => "drawbatch::file_write",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            DrawBatchError::UnsupportedFormat(_) => {
                "supported formats are pdf, svg, gif, png, jpeg (jpg), bmp and ppm"
            }
            DrawBatchError::EngineStart(_) => {
                "check that Chromium is installed and that `engine.export_page` points at export3.html"
            }
            DrawBatchError::RenderTimeout { .. } => {
                "raise `engine.render_timeout_secs` for very large diagrams"
            }
            _ => return None,
        };
        Some(Box::new(help))
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A malformed document with source location information.
    Document(DocumentDiagnostic<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Document(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Document(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Document(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Document(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Document(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Document(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a [`DrawBatchError`] into a reportable error.
pub fn to_reportable(err: &DrawBatchError) -> Reportable<'_> {
    match err {
        DrawBatchError::MalformedDocument { err, src } => {
            Reportable::Document(DocumentDiagnostic::new(err, src))
        }
        _ => Reportable::Error(ErrorAdapter(err)),
    }
}

/// Byte offset of a 1-based row and character column, clamped to `src`.
fn byte_offset(src: &str, row: usize, col: usize) -> usize {
    let line_start: usize = src
        .split_inclusive('\n')
        .take(row.saturating_sub(1))
        .map(str::len)
        .sum();
    let line = src[line_start..].split('\n').next().unwrap_or_default();
    let column = line
        .char_indices()
        .nth(col.saturating_sub(1))
        .map_or(line.len(), |(offset, _)| offset);

    line_start + column
}
