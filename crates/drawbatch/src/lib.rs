//! drawbatch - batch export of multi-page draw.io documents.
//!
//! Every diagram page of a document is rendered by the draw.io export page
//! running in a headless browser, measured, captured as PDF, SVG or a
//! raster image, and written to its own file.
//!
//! # Examples
//!
//! ```rust,no_run
//! use drawbatch::{Pipeline, RunConfig, config::AppConfig, engine::chrome::ChromeLauncher};
//! use drawbatch::format::OutputFormat;
//!
//! let config = AppConfig::default();
//! let launcher = ChromeLauncher::new(config.engine().clone());
//!
//! let run = RunConfig::new("architecture.drawio", "out.png").with_format(OutputFormat::Png);
//! let summary = Pipeline::new(run, launcher).run().expect("export failed");
//!
//! for path in summary.written() {
//!     println!("wrote {}", path.display());
//! }
//! ```

pub mod config;
pub mod document;
pub mod emit;
pub mod engine;

mod error;
mod pipeline;
mod session;

pub use drawbatch_core::{format, geometry, output};

pub use error::DrawBatchError;
pub use pipeline::{DEFAULT_QUALITY, DEFAULT_SCALE, DiagramOutcome, Pipeline, RunConfig, RunSummary};
pub use session::RenderSession;
