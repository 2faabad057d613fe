//! Command-line argument definitions for the drawbatch CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Values are validated while parsing, so a bad option
//! stops the program before any document is read.

use clap::Parser;

use drawbatch::{DEFAULT_QUALITY, DEFAULT_SCALE, RunConfig, format::OutputFormat, geometry::FitBounds};

/// Command-line arguments for the drawbatch export tool
#[derive(Parser, Debug)]
#[command(name = "drawbatch", author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input draw.io document
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Output file, or an existing directory to export into
    #[arg(help = "Output file or directory")]
    pub output: String,

    /// Format used when the output is a directory; also passed to the renderer
    #[arg(short, long, default_value = "pdf", value_parser = parse_format)]
    pub format: OutputFormat,

    /// Output quality for JPEG images (1..100)
    #[arg(short, long, default_value_t = DEFAULT_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,

    /// Scales the output size for pixel-based formats
    #[arg(short, long, default_value_t = DEFAULT_SCALE, value_parser = parse_scale)]
    pub scale: f64,

    /// Fits the output into WxH, preserving aspect ratio
    #[arg(short, long, value_name = "WxH", value_parser = parse_bounds)]
    pub bounds: Option<FitBounds>,

    /// Exports only the diagram at this index instead of every diagram
    #[arg(short = 'd', long = "diagram-id", visible_alias = "diagramId")]
    pub diagram_id: Option<usize>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Builds the pipeline settings for this invocation.
    pub fn run_config(&self) -> RunConfig {
        RunConfig::new(&self.input, &self.output)
            .with_format(self.format)
            .with_quality(self.quality)
            .with_scale(self.scale)
            .with_fit(self.bounds.unwrap_or_default())
            .with_diagram(self.diagram_id)
    }
}

fn parse_format(value: &str) -> Result<OutputFormat, String> {
    value.parse().map_err(|_| {
        let names: Vec<&str> = OutputFormat::ALL.iter().map(|f| f.as_str()).collect();
        format!("expected one of {}", names.join(", "))
    })
}

fn parse_scale(value: &str) -> Result<f64, String> {
    match value.parse::<f64>() {
        Ok(scale) if scale.is_finite() && scale > 0.0 => Ok(scale),
        _ => Err("invalid scale value given, expected a positive number".to_string()),
    }
}

fn parse_bounds(value: &str) -> Result<FitBounds, String> {
    value.parse::<FitBounds>().map_err(|err| err.to_string())
}
