//! The rendering engine seam.
//!
//! The actual diagram rendering happens in an external, opaque engine: the
//! draw.io export page hosted in a browser. [`RenderEngine`] is the narrow
//! set of page operations the pipeline needs, and [`Launcher`] starts an
//! engine with the export page loaded and fonts ready.
//!
//! Implementations:
//! - [`chrome::ChromeLauncher`] drives headless Chromium (feature `chrome`).
//! - [`mock::MockLauncher`] is an in-memory engine for tests.

#[cfg(feature = "chrome")]
pub mod chrome;
pub mod mock;

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use drawbatch_core::{
    format::OutputFormat,
    geometry::{Bounds, FitBounds, Viewport},
};

/// Element id the export page inserts once a render has finished.
pub const COMPLETION_MARKER: &str = "#LoadingComplete";

/// Attribute of the completion marker carrying the content bounds as JSON.
pub const BOUNDS_ATTRIBUTE: &str = "bounds";

/// Failures of a single engine round trip.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to launch engine: {0}")]
    Launch(String),

    #[error("failed to load export page: {0}")]
    Navigation(String),

    #[error("render of diagram {index} did not complete within {timeout:?}")]
    RenderTimeout { index: usize, timeout: Duration },

    #[error("page script failed: {0}")]
    Script(String),

    #[error("lost connection to engine: {0}")]
    Connection(String),

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("failed to close engine: {0}")]
    Close(String),
}

/// Parameters of one `render(...)` call in the export page.
///
/// Serialized as the JSON argument of the call: `{xml, format, scale, w, h, from}`.
#[derive(Debug, Clone, Serialize)]
pub struct RenderRequest<'a> {
    xml: &'a str,
    format: &'static str,
    scale: f64,
    w: f64,
    h: f64,
    from: usize,
}

impl<'a> RenderRequest<'a> {
    /// Builds the request for diagram `index` of `xml`.
    pub fn new(xml: &'a str, format: OutputFormat, scale: f64, fit: FitBounds, index: usize) -> Self {
        Self {
            xml,
            format: format.as_str(),
            scale,
            w: fit.width(),
            h: fit.height(),
            from: index,
        }
    }

    /// Index of the diagram to render.
    pub fn index(&self) -> usize {
        self.from
    }

    pub fn format(&self) -> &str {
        self.format
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Serializes the request as the JSON argument of `render(...)`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Script`] if serialization fails.
    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string(self).map_err(|err| EngineError::Script(err.to_string()))
    }
}

/// Encoding requested from the engine's screenshot capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenshotFormat {
    Png,
    Jpeg { quality: u8 },
}

impl fmt::Display for ScreenshotFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Png => f.write_str("png"),
            Self::Jpeg { quality } => write!(f, "jpeg (quality {quality})"),
        }
    }
}

/// The rendered `<svg>` element as read back from the page.
///
/// `width` and `height` are the element's used size in CSS pixels
/// (`width.baseVal.value`), which the page resolves even when the
/// serialized markup carries no size attributes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderedSvg {
    markup: String,
    width: f64,
    height: f64,
}

impl RenderedSvg {
    pub fn new(markup: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            markup: markup.into(),
            width,
            height,
        }
    }

    /// Serialized markup of the element.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

/// Paper size of a printed page, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

/// Page operations of a running engine.
///
/// Every call is a blocking round trip; the page state is mutated in place
/// and must only be driven by one caller at a time.
pub trait RenderEngine {
    /// Invokes `render(request)` and blocks until the completion marker appears.
    fn render(&mut self, request: &RenderRequest<'_>) -> Result<(), EngineError>;

    /// Raw `bounds` attribute of the completion marker, if present.
    fn completion_bounds(&mut self) -> Result<Option<String>, EngineError>;

    /// Resizes the page to the given viewport.
    fn set_viewport(&mut self, viewport: Viewport) -> Result<(), EngineError>;

    /// Prints the first page as a PDF document.
    fn print_pdf(&mut self, page: PageSize) -> Result<Vec<u8>, EngineError>;

    /// Captures the page region `clip` as an encoded image.
    fn screenshot(&mut self, clip: &Bounds, format: ScreenshotFormat) -> Result<Vec<u8>, EngineError>;

    /// The rendered `<svg>` element and its used size, if present.
    fn rendered_svg(&mut self) -> Result<Option<RenderedSvg>, EngineError>;

    /// Removes the completion marker and the rendered `<svg>` from the page.
    fn clear_frame(&mut self) -> Result<(), EngineError>;

    /// Releases the engine. Called exactly once by the owning session.
    fn close(&mut self) -> Result<(), EngineError>;
}

/// Starts a [`RenderEngine`] ready to accept render calls.
pub trait Launcher {
    type Engine: RenderEngine;

    /// Launches the engine, loads the export page and waits for its fonts.
    fn launch(&self) -> Result<Self::Engine, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_request_json_uses_engine_field_names() {
        let fit = FitBounds::new(800.0, 600.0).unwrap();
        let request = RenderRequest::new("<mxfile/>", OutputFormat::Png, 2.0, fit, 3);

        let json: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();

        assert_eq!(json["xml"], "<mxfile/>");
        assert_eq!(json["format"], "png");
        assert_eq!(json["scale"], 2.0);
        assert_eq!(json["w"], 800.0);
        assert_eq!(json["h"], 600.0);
        assert_eq!(json["from"], 3);
    }

    #[test]
    fn test_render_request_default_fit_is_zero() {
        let request = RenderRequest::new("<mxfile/>", OutputFormat::Pdf, 1.0, FitBounds::default(), 0);

        let json: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();

        assert_eq!(json["w"], 0.0);
        assert_eq!(json["h"], 0.0);
        assert_eq!(request.index(), 0);
    }

    #[test]
    fn test_rendered_svg_reads_page_result() {
        let json = r#"{"markup":"<svg/>","width":120.5,"height":80}"#;

        let svg: RenderedSvg = serde_json::from_str(json).unwrap();

        assert_eq!(svg, RenderedSvg::new("<svg/>", 120.5, 80.0));
    }
}
