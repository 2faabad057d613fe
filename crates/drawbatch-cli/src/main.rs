//! drawbatch CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use drawbatch::DiagramOutcome;
use drawbatch_cli::{
    Args,
    error_adapter::{Reportable, to_reportable},
};

fn main() {
    // Install miette's pretty panic hook early for better panic reports
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting drawbatch");
    debug!(args:?; "Parsed arguments");

    match drawbatch_cli::run(&args) {
        Ok(summary) if summary.has_failures() => {
            for outcome in summary.failures() {
                if let DiagramOutcome::WriteFailed { error, .. } = outcome {
                    report(&to_reportable(error));
                }
            }
            process::exit(1);
        }
        Ok(_) => {}
        Err(err) => {
            report(&to_reportable(&err));
            process::exit(1);
        }
    }

    info!("Completed successfully");
}

fn report(reportable: &Reportable<'_>) {
    let reporter = miette::GraphicalReportHandler::new();
    let mut writer = String::new();
    reporter
        .render_report(&mut writer, reportable)
        .expect("Writing to String buffer is infallible");

    error!("{writer}");
}
