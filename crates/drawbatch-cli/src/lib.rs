//! CLI logic for the drawbatch export tool.
//!
//! Turns parsed [`Args`] and the loaded configuration into a pipeline run.
//! [`run`] drives a real headless browser; [`run_with_launcher`] accepts
//! any [`Launcher`], which is how the CLI is exercised without one.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;
pub use config::load_config;

use log::info;

use drawbatch::{DrawBatchError, Pipeline, RunSummary, engine::Launcher};

/// Run the drawbatch CLI application
///
/// Loads the configuration, launches Chromium on the configured export page
/// and exports the selected diagrams of the input document.
///
/// # Errors
///
/// Returns `DrawBatchError` for:
/// - Configuration loading errors
/// - File I/O errors and malformed input
/// - Engine start, render and capture failures
///
/// Failed output writes do not return an error; they are listed in the
/// returned [`RunSummary`].
#[cfg(feature = "chrome")]
pub fn run(args: &Args) -> Result<RunSummary, DrawBatchError> {
    use std::path::Path;

    use drawbatch::engine::chrome::ChromeLauncher;

    let app_config = load_config(args.config.as_deref().map(Path::new))?;
    let launcher = ChromeLauncher::new(app_config.engine().clone());

    run_with_launcher(args, launcher)
}

/// Run an export with the given engine launcher.
///
/// # Errors
///
/// Same as [`run`], minus configuration loading.
pub fn run_with_launcher<L: Launcher>(args: &Args, launcher: L) -> Result<RunSummary, DrawBatchError> {
    info!(
        input_path = args.input,
        output_path = args.output,
        format:% = args.format;
        "Starting export"
    );

    Pipeline::new(args.run_config(), launcher).run()
}
