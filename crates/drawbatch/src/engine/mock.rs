//! Mock engine implementation for testing.
//!
//! Provides [`MockLauncher`] and [`MockEngine`] so the pipeline can be
//! exercised without a browser. Every engine call is recorded as a
//! [`Call`] in a log shared between the launcher and the engines it starts.

use std::{
    collections::{HashMap, HashSet},
    io::Cursor,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, codecs::jpeg::JpegEncoder};

use drawbatch_core::geometry::{Bounds, Viewport};

use super::{
    EngineError, Launcher, PageSize, RenderEngine, RenderRequest, RenderedSvg, ScreenshotFormat,
};

const DEFAULT_BOUNDS: &str = r#"{"x":0,"y":0,"width":120.4,"height":80}"#;

/// Shaped like `XMLSerializer` output: the root and every HTML `div` carry
/// their namespace, the root has no size attributes.
const DEFAULT_SVG: &str = concat!(
    r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" "#,
    r#"style="left: 0px; top: 0px;" viewBox="0 0 121 80">"#,
    r##"<g><rect x="0" y="0" width="120" height="80" fill="#dae8fc"/>"##,
    r#"<foreignObject width="100" height="20">"#,
    r#"<div xmlns="http://www.w3.org/1999/xhtml" style="display: flex;">Label</div>"#,
    r#"</foreignObject></g></svg>"#,
);

/// A recorded engine call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Launch,
    Render(usize),
    CompletionBounds,
    SetViewport(Viewport),
    PrintPdf,
    Screenshot(ScreenshotFormat),
    RenderedSvg,
    ClearFrame,
    Close,
}

#[derive(Debug, Clone)]
struct Script {
    bounds: String,
    bounds_by_index: HashMap<usize, Option<String>>,
    svg: String,
    stall_at: HashSet<usize>,
    fail_launch: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            bounds: DEFAULT_BOUNDS.to_string(),
            bounds_by_index: HashMap::new(),
            svg: DEFAULT_SVG.to_string(),
            stall_at: HashSet::new(),
            fail_launch: false,
        }
    }
}

/// Launcher for [`MockEngine`]s.
///
/// # Example
///
/// ```
/// use drawbatch::engine::mock::{Call, MockLauncher};
/// use drawbatch::engine::Launcher;
///
/// let launcher = MockLauncher::new().stalling_at(1);
/// let _engine = launcher.launch().unwrap();
/// assert_eq!(launcher.calls(), vec![Call::Launch]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockLauncher {
    script: Script,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl MockLauncher {
    /// Create a launcher whose engines render every diagram successfully.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds JSON reported for every diagram.
    #[must_use]
    pub fn with_bounds(mut self, json: impl Into<String>) -> Self {
        self.script.bounds = json.into();
        self
    }

    /// Bounds JSON reported for one diagram; `None` omits the attribute.
    #[must_use]
    pub fn with_bounds_for(mut self, index: usize, json: Option<&str>) -> Self {
        self.script
            .bounds_by_index
            .insert(index, json.map(str::to_string));
        self
    }

    /// Markup returned for the rendered `<svg>` element.
    ///
    /// The element's reported size is the last viewport set, as for an
    /// `<svg>` filling the page.
    #[must_use]
    pub fn with_svg(mut self, markup: impl Into<String>) -> Self {
        self.script.svg = markup.into();
        self
    }

    /// Renders of diagram `index` never complete.
    #[must_use]
    pub fn stalling_at(mut self, index: usize) -> Self {
        self.script.stall_at.insert(index);
        self
    }

    /// Launching fails.
    #[must_use]
    pub fn failing_launch(mut self) -> Self {
        self.script.fail_launch = true;
        self
    }

    /// All calls recorded so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded calls equal to `call`.
    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    /// Indices passed to render, in order.
    pub fn rendered(&self) -> Vec<usize> {
        self.calls()
            .iter()
            .filter_map(|call| match call {
                Call::Render(index) => Some(*index),
                _ => None,
            })
            .collect()
    }
}

impl Launcher for MockLauncher {
    type Engine = MockEngine;

    fn launch(&self) -> Result<MockEngine, EngineError> {
        record(&self.calls, Call::Launch);
        if self.script.fail_launch {
            return Err(EngineError::Launch("mock launch failure".to_string()));
        }

        Ok(MockEngine {
            script: self.script.clone(),
            calls: Arc::clone(&self.calls),
            frame: None,
            viewport: None,
            closed: false,
        })
    }
}

/// In-memory engine.
///
/// Tracks the rendered frame so that a render issued before the previous
/// frame was cleared fails, as it would corrupt the real page.
#[derive(Debug)]
pub struct MockEngine {
    script: Script,
    calls: Arc<Mutex<Vec<Call>>>,
    frame: Option<usize>,
    viewport: Option<Viewport>,
    closed: bool,
}

impl MockEngine {
    fn ensure_open(&self) -> Result<(), EngineError> {
        if self.closed {
            return Err(EngineError::Script("engine already closed".to_string()));
        }
        Ok(())
    }

    fn current_frame(&self) -> Result<usize, EngineError> {
        self.frame
            .ok_or_else(|| EngineError::Script("no rendered frame".to_string()))
    }
}

impl RenderEngine for MockEngine {
    fn render(&mut self, request: &RenderRequest<'_>) -> Result<(), EngineError> {
        record(&self.calls, Call::Render(request.index()));
        self.ensure_open()?;

        if let Some(stale) = self.frame {
            return Err(EngineError::Script(format!(
                "frame of diagram {stale} was not cleared"
            )));
        }
        if self.script.stall_at.contains(&request.index()) {
            return Err(EngineError::RenderTimeout {
                index: request.index(),
                timeout: Duration::from_secs(30),
            });
        }

        self.frame = Some(request.index());
        Ok(())
    }

    fn completion_bounds(&mut self) -> Result<Option<String>, EngineError> {
        record(&self.calls, Call::CompletionBounds);
        let index = self.current_frame()?;

        Ok(match self.script.bounds_by_index.get(&index) {
            Some(bounds) => bounds.clone(),
            None => Some(self.script.bounds.clone()),
        })
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<(), EngineError> {
        record(&self.calls, Call::SetViewport(viewport));
        self.ensure_open()?;
        self.viewport = Some(viewport);
        Ok(())
    }

    fn print_pdf(&mut self, page: PageSize) -> Result<Vec<u8>, EngineError> {
        record(&self.calls, Call::PrintPdf);
        let index = self.current_frame()?;

        Ok(format!(
            "%PDF-1.4\n% diagram {index} page {}x{}\n%%EOF\n",
            page.width, page.height
        )
        .into_bytes())
    }

    fn screenshot(&mut self, clip: &Bounds, format: ScreenshotFormat) -> Result<Vec<u8>, EngineError> {
        record(&self.calls, Call::Screenshot(format));
        self.current_frame()?;

        let width = clip.width().ceil().max(1.0) as u32;
        let height = clip.height().ceil().max(1.0) as u32;
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([218, 232, 252])));

        let mut out = Cursor::new(Vec::new());
        let result = match format {
            ScreenshotFormat::Png => image.write_to(&mut out, ImageFormat::Png),
            ScreenshotFormat::Jpeg { quality } => {
                image.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))
            }
        };
        result.map_err(|err| EngineError::Capture(err.to_string()))?;

        Ok(out.into_inner())
    }

    fn rendered_svg(&mut self) -> Result<Option<RenderedSvg>, EngineError> {
        record(&self.calls, Call::RenderedSvg);
        self.current_frame()?;

        let viewport = self.viewport.unwrap_or_else(|| Viewport::new(1, 1));
        Ok(Some(RenderedSvg::new(
            self.script.svg.clone(),
            f64::from(viewport.width()),
            f64::from(viewport.height()),
        )))
    }

    fn clear_frame(&mut self) -> Result<(), EngineError> {
        record(&self.calls, Call::ClearFrame);
        self.frame = None;
        Ok(())
    }

    fn close(&mut self) -> Result<(), EngineError> {
        record(&self.calls, Call::Close);
        self.closed = true;
        Ok(())
    }
}

fn record(calls: &Mutex<Vec<Call>>, call: Call) {
    calls
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(call);
}
