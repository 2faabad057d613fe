//! Headless Chromium engine.
//!
//! Hosts the draw.io export page in a headless browser through the blocking
//! `headless_chrome` driver. One browser with a single tab is used for the
//! whole run.

use std::{error::Error as StdError, ffi::OsStr, path::Path, sync::Arc, time::Duration};

use headless_chrome::{
    Browser, LaunchOptions, Tab,
    protocol::cdp::Page::{CaptureScreenshotFormatOption, Viewport as ClipRect},
    types::{Bounds as WindowBounds, PrintToPdfOptions},
    util::Timeout,
};
use log::{debug, info};
use serde_json::Value;

use drawbatch_core::geometry::{Bounds, Viewport};

use super::{
    COMPLETION_MARKER, EngineError, Launcher, PageSize, RenderEngine, RenderRequest, RenderedSvg,
    ScreenshotFormat,
};
use crate::config::EngineConfig;

/// CSS pixels per inch; Chrome's print API takes paper sizes in inches.
const CSS_PIXELS_PER_INCH: f64 = 96.0;

const READ_BOUNDS_SCRIPT: &str = r"(() => {
    const marker = document.querySelector('#LoadingComplete');
    return marker ? marker.getAttribute('bounds') : null;
})()";

const READ_SVG_SCRIPT: &str = r"(() => {
    const svg = document.querySelector('svg');
    if (!svg) {
        return null;
    }
    return JSON.stringify({
        markup: new XMLSerializer().serializeToString(svg),
        width: svg.width.baseVal.value,
        height: svg.height.baseVal.value,
    });
})()";

const CLEAR_FRAME_SCRIPT: &str = r"(() => {
    document.querySelectorAll('#LoadingComplete').forEach(marker => marker.remove());
    const svg = document.querySelector('svg');
    if (svg) {
        svg.remove();
    }
    return true;
})()";

/// Launches headless Chromium with the export page loaded.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    config: EngineConfig,
}

impl ChromeLauncher {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl Launcher for ChromeLauncher {
    type Engine = ChromeEngine;

    fn launch(&self) -> Result<ChromeEngine, EngineError> {
        let export_page = self.config.export_page();
        if !export_page.is_file() {
            return Err(EngineError::Launch(format!(
                "export page not found at {}",
                export_page.display()
            )));
        }
        let url = page_url(&export_page)?;

        let mut args: Vec<&OsStr> = Vec::new();
        if !self.config.web_security() {
            args.push(OsStr::new("--disable-web-security"));
        }

        // The browser is killed when idle longer than this; renders count as activity.
        let idle_timeout = self.config.launch_timeout() + self.config.render_timeout() * 2;

        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(self.config.sandbox())
            .path(self.config.chrome_path().map(Path::to_path_buf))
            .idle_browser_timeout(idle_timeout)
            .args(args)
            .build()
            .map_err(|err| EngineError::Launch(err.to_string()))?;

        info!(
            chrome_path:? = self.config.chrome_path(),
            sandbox = self.config.sandbox();
            "Launching headless browser"
        );
        let browser = Browser::new(options).map_err(|err| EngineError::Launch(err.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|err| EngineError::Launch(err.to_string()))?;

        tab.set_default_timeout(self.config.launch_timeout());
        debug!(url = url; "Loading export page");
        tab.navigate_to(&url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|err| EngineError::Navigation(err.to_string()))?;
        tab.evaluate("document.fonts.ready", true)
            .map_err(|err| EngineError::Navigation(err.to_string()))?;
        debug!("Export page ready");

        tab.set_default_timeout(self.config.render_timeout());

        Ok(ChromeEngine {
            browser: Some(browser),
            tab,
            render_timeout: self.config.render_timeout(),
        })
    }
}

/// A running headless browser with the export page open.
pub struct ChromeEngine {
    browser: Option<Browser>,
    tab: Arc<Tab>,
    render_timeout: Duration,
}

impl ChromeEngine {
    fn evaluate_value(&self, script: &str) -> Result<Option<Value>, EngineError> {
        self.tab
            .evaluate(script, false)
            .map(|object| object.value)
            .map_err(|err| EngineError::Script(err.to_string()))
    }

    fn evaluate_string(&self, script: &str) -> Result<Option<String>, EngineError> {
        match self.evaluate_value(script)? {
            Some(Value::String(value)) => Ok(Some(value)),
            Some(Value::Null) | None => Ok(None),
            Some(other) => Err(EngineError::Script(format!(
                "expected a string result, got {other}"
            ))),
        }
    }
}

impl RenderEngine for ChromeEngine {
    fn render(&mut self, request: &RenderRequest<'_>) -> Result<(), EngineError> {
        let script = format!("render({});", request.to_json()?);
        self.evaluate_value(&script)?;

        self.tab
            .wait_for_element_with_custom_timeout(COMPLETION_MARKER, self.render_timeout)
            .map_err(|err| {
                debug!(index = request.index(), err = err.to_string(); "Completion marker wait failed");
                wait_failure(request.index(), self.render_timeout, err.as_ref())
            })?;

        Ok(())
    }

    fn completion_bounds(&mut self) -> Result<Option<String>, EngineError> {
        self.evaluate_string(READ_BOUNDS_SCRIPT)
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<(), EngineError> {
        self.tab
            .set_bounds(WindowBounds::Normal {
                left: Some(0),
                top: Some(0),
                width: Some(f64::from(viewport.width())),
                height: Some(f64::from(viewport.height())),
            })
            .map(|_| ())
            .map_err(|err| EngineError::Script(err.to_string()))
    }

    fn print_pdf(&mut self, page: PageSize) -> Result<Vec<u8>, EngineError> {
        let options = PrintToPdfOptions {
            paper_width: Some(page.width / CSS_PIXELS_PER_INCH),
            paper_height: Some(page.height / CSS_PIXELS_PER_INCH),
            margin_top: Some(0.0),
            margin_bottom: Some(0.0),
            margin_left: Some(0.0),
            margin_right: Some(0.0),
            print_background: Some(true),
            page_ranges: Some("1".to_string()),
            ..Default::default()
        };

        self.tab
            .print_to_pdf(Some(options))
            .map_err(|err| EngineError::Capture(err.to_string()))
    }

    fn screenshot(&mut self, clip: &Bounds, format: ScreenshotFormat) -> Result<Vec<u8>, EngineError> {
        let (format, quality) = match format {
            ScreenshotFormat::Png => (CaptureScreenshotFormatOption::Png, None),
            ScreenshotFormat::Jpeg { quality } => {
                (CaptureScreenshotFormatOption::Jpeg, Some(u32::from(quality)))
            }
        };
        let clip = ClipRect {
            x: clip.x(),
            y: clip.y(),
            width: clip.width(),
            height: clip.height(),
            scale: 1.0,
        };

        self.tab
            .capture_screenshot(format, quality, Some(clip), true)
            .map_err(|err| EngineError::Capture(err.to_string()))
    }

    fn rendered_svg(&mut self) -> Result<Option<RenderedSvg>, EngineError> {
        self.evaluate_string(READ_SVG_SCRIPT)?
            .map(|json| {
                serde_json::from_str(&json).map_err(|err| EngineError::Capture(format!("unreadable <svg> result: {err}")))
            })
            .transpose()
    }

    fn clear_frame(&mut self) -> Result<(), EngineError> {
        self.evaluate_value(CLEAR_FRAME_SCRIPT).map(|_| ())
    }

    fn close(&mut self) -> Result<(), EngineError> {
        // Dropping the browser terminates the Chromium process.
        if self.browser.take().is_some() {
            info!("Headless browser closed");
        }
        Ok(())
    }
}

/// Only an expired wait is a render timeout; anything else means the
/// browser went away or the page broke.
fn wait_failure(index: usize, timeout: Duration, err: &(dyn StdError + 'static)) -> EngineError {
    if err.downcast_ref::<Timeout>().is_some() {
        EngineError::RenderTimeout { index, timeout }
    } else {
        EngineError::Connection(err.to_string())
    }
}

fn page_url(path: &Path) -> Result<String, EngineError> {
    let absolute = path
        .canonicalize()
        .map_err(|err| EngineError::Launch(format!("{}: {err}", path.display())))?;
    Ok(format!("file://{}", absolute.display()))
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn test_expired_wait_is_render_timeout() {
        let err = wait_failure(4, Duration::from_secs(30), &Timeout);

        assert!(matches!(err, EngineError::RenderTimeout { index: 4, timeout } if timeout == Duration::from_secs(30)));
    }

    #[test]
    fn test_other_wait_failures_are_not_timeouts() {
        let dropped = io::Error::new(io::ErrorKind::ConnectionReset, "websocket closed");

        let err = wait_failure(4, Duration::from_secs(30), &dropped);

        assert!(matches!(err, EngineError::Connection(msg) if msg.contains("websocket closed")));
    }

    #[test]
    fn test_page_url_requires_existing_file() {
        let err = page_url(Path::new("/nonexistent/export3.html")).unwrap_err();
        assert!(matches!(err, EngineError::Launch(_)));
    }
}
