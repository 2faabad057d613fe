//! Configuration types for drawbatch.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from
//! TOML files; every field has a default.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level application configuration.
//! - [`EngineConfig`] - How the headless browser hosting the export page is
//!   launched and how long renders may take.
//!
//! # Example
//!
//! ```
//! # use drawbatch::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(!config.engine().sandbox());
//! ```

use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

/// Location of the draw.io export page, relative to the executable's directory.
pub const DEFAULT_EXPORT_PAGE: &str = "drawio/src/main/webapp/export3.html";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Engine configuration section.
    #[serde(default)]
    engine: EngineConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the given engine settings.
    pub fn new(engine: EngineConfig) -> Self {
        Self { engine }
    }

    /// Returns the engine configuration.
    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }
}

/// Settings for launching the rendering engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Path to `export3.html`. Defaults to [`DEFAULT_EXPORT_PAGE`] next to the executable.
    #[serde(default)]
    export_page: Option<PathBuf>,

    /// Browser binary. Detected automatically when unset.
    #[serde(default)]
    chrome_path: Option<PathBuf>,

    #[serde(default)]
    sandbox: bool,

    /// The export page loads local resources, which web security blocks.
    #[serde(default)]
    web_security: bool,

    #[serde(default = "default_timeout_secs")]
    launch_timeout_secs: u64,

    #[serde(default = "default_timeout_secs")]
    render_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            export_page: None,
            chrome_path: None,
            sandbox: false,
            web_security: false,
            launch_timeout_secs: DEFAULT_TIMEOUT_SECS,
            render_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl EngineConfig {
    /// Sets the export page location.
    #[must_use]
    pub fn with_export_page(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_page = Some(path.into());
        self
    }

    /// Sets the browser binary.
    #[must_use]
    pub fn with_chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    /// Sets how long a single render may take before it is abandoned.
    #[must_use]
    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Resolved path of the export page.
    pub fn export_page(&self) -> PathBuf {
        if let Some(path) = &self.export_page {
            return path.clone();
        }

        env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_EXPORT_PAGE)))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_PAGE))
    }

    pub fn chrome_path(&self) -> Option<&Path> {
        self.chrome_path.as_deref()
    }

    pub fn sandbox(&self) -> bool {
        self.sandbox
    }

    pub fn web_security(&self) -> bool {
        self.web_security
    }

    /// Time allowed for launching the browser and loading the export page.
    pub fn launch_timeout(&self) -> Duration {
        Duration::from_secs(self.launch_timeout_secs)
    }

    /// Time allowed for one diagram's completion marker to appear.
    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }
}
