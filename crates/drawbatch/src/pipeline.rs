//! Pipeline controller.
//!
//! Runs one export: read and inspect the document, resolve the output
//! target, then drive a single [`RenderSession`] through
//! render → measure → emit → cleanup for each selected diagram, strictly in
//! index order.
//!
//! Everything that can be checked without the engine is checked before it
//! is launched. A failed write is recorded and the run moves on to the next
//! diagram; any other failure aborts the remaining diagrams. The engine is
//! released on every path.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, error, info, warn};

use drawbatch_core::{
    format::OutputFormat,
    geometry::{self, FitBounds},
    output::OutputTarget,
};

use crate::{
    DrawBatchError,
    document::{self, DiagramDescriptor},
    emit::{self, FormatEmitter, Frame},
    engine::{Launcher, RenderEngine, RenderRequest},
    session::RenderSession,
};

pub const DEFAULT_QUALITY: u8 = 75;
pub const DEFAULT_SCALE: f64 = 1.0;

/// Immutable settings of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    input: PathBuf,
    output: PathBuf,
    format: OutputFormat,
    quality: u8,
    scale: f64,
    fit: FitBounds,
    diagram: Option<usize>,
}

impl RunConfig {
    /// Creates a run exporting every diagram of `input` to `output` with defaults.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            format: OutputFormat::default(),
            quality: DEFAULT_QUALITY,
            scale: DEFAULT_SCALE,
            fit: FitBounds::default(),
            diagram: None,
        }
    }

    /// Format used for directory outputs and passed to the engine.
    #[must_use]
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Quality of lossy raster outputs, 1 to 100.
    #[must_use]
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    #[must_use]
    pub fn with_fit(mut self, fit: FitBounds) -> Self {
        self.fit = fit;
        self
    }

    /// Restricts the run to one diagram.
    #[must_use]
    pub fn with_diagram(mut self, index: Option<usize>) -> Self {
        self.diagram = index;
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn fit(&self) -> FitBounds {
        self.fit
    }

    pub fn diagram(&self) -> Option<usize> {
        self.diagram
    }

    fn validate(&self) -> Result<(), DrawBatchError> {
        if !(1..=100).contains(&self.quality) {
            return Err(DrawBatchError::InvalidOption(format!(
                "quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(DrawBatchError::InvalidOption(format!(
                "scale must be a positive number, got {}",
                self.scale
            )));
        }
        Ok(())
    }
}

/// What happened to one diagram.
#[derive(Debug)]
pub enum DiagramOutcome {
    Written { index: usize, path: PathBuf },
    WriteFailed { index: usize, error: DrawBatchError },
}

impl DiagramOutcome {
    pub fn index(&self) -> usize {
        match self {
            Self::Written { index, .. } | Self::WriteFailed { index, .. } => *index,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

/// Per-diagram outcomes of a completed run, in index order.
#[derive(Debug, Default)]
pub struct RunSummary {
    outcomes: Vec<DiagramOutcome>,
}

impl RunSummary {
    pub fn outcomes(&self) -> &[DiagramOutcome] {
        &self.outcomes
    }

    /// Paths of the files written.
    pub fn written(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            DiagramOutcome::Written { path, .. } => Some(path.as_path()),
            DiagramOutcome::WriteFailed { .. } => None,
        })
    }

    /// Outcomes whose file could not be written.
    pub fn failures(&self) -> impl Iterator<Item = &DiagramOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_written())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    fn push(&mut self, outcome: DiagramOutcome) {
        self.outcomes.push(outcome);
    }
}

/// State of one loop iteration.
struct DiagramContext<'a> {
    descriptor: &'a DiagramDescriptor,
    path: PathBuf,
    request: RenderRequest<'a>,
}

/// Sequences extraction, rendering and output for one run.
pub struct Pipeline<L: Launcher> {
    config: RunConfig,
    launcher: L,
}

impl<L: Launcher> Pipeline<L> {
    pub fn new(config: RunConfig, launcher: L) -> Self {
        Self { config, launcher }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs the export.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: invalid options, unreadable or
    /// malformed input, unsupported output format, engine start, render
    /// timeout, invalid bounds or capture failure. Write failures are not
    /// fatal; they are reported in the returned [`RunSummary`].
    pub fn run(&self) -> Result<RunSummary, DrawBatchError> {
        self.config.validate()?;
        info!(
            input_path = self.config.input.display().to_string(),
            output_path = self.config.output.display().to_string();
            "Processing document"
        );

        let source = fs::read_to_string(&self.config.input)?;
        let diagrams = document::extract(&source)?;
        let selected = self.select(&diagrams)?;

        let target = OutputTarget::resolve(&self.config.output, &self.config.input, self.config.format);
        let kind = target.format()?.kind();

        if selected.is_empty() {
            warn!(input_path = self.config.input.display().to_string(); "Document contains no diagrams");
            return Ok(RunSummary::default());
        }

        let emitter = emit::emitter_for(kind, self.config.quality);
        let count = selected.len();
        info!(count, emitter = emitter.name(); "Exporting diagrams");

        let mut session = RenderSession::start(&self.launcher)?;
        let mut summary = RunSummary::default();

        for descriptor in selected {
            let context = DiagramContext {
                descriptor,
                path: target.path_for(descriptor.index(), count),
                request: RenderRequest::new(
                    &source,
                    self.config.format,
                    self.config.scale,
                    self.config.fit,
                    descriptor.index(),
                ),
            };
            summary.push(process_diagram(&mut session, &context, emitter.as_ref())?);
        }

        session.close()?;
        log_summary(&summary);

        Ok(summary)
    }

    /// Applies the diagram selection; all diagrams when none is selected.
    fn select<'d>(
        &self,
        diagrams: &'d [DiagramDescriptor],
    ) -> Result<Vec<&'d DiagramDescriptor>, DrawBatchError> {
        match self.config.diagram {
            None => Ok(diagrams.iter().collect()),
            Some(index) => diagrams.get(index).map(|d| vec![d]).ok_or_else(|| {
                DrawBatchError::InvalidOption(format!(
                    "diagram {index} does not exist, document has {} diagram(s)",
                    diagrams.len()
                ))
            }),
        }
    }
}

fn process_diagram<E: RenderEngine>(
    session: &mut RenderSession<E>,
    context: &DiagramContext<'_>,
    emitter: &dyn FormatEmitter,
) -> Result<DiagramOutcome, DrawBatchError> {
    let index = context.descriptor.index();
    info!(index, name:? = context.descriptor.name(); "Rendering diagram");

    session.render_diagram(&context.request)?;

    debug!(index; "Measuring diagram");
    let bounds = session.read_completion_bounds()?;
    let viewport = geometry::compute_viewport(&bounds)?;
    session.prepare_viewport(viewport)?;

    debug!(index, viewport:% = viewport; "Emitting diagram");
    let bytes = session.capture(emitter, &Frame::new(bounds, viewport))?;
    let outcome = write_output(index, &context.path, &bytes);

    debug!(index; "Cleaning up frame");
    session.cleanup_frame()?;

    Ok(outcome)
}

fn write_output(index: usize, path: &Path, bytes: &[u8]) -> DiagramOutcome {
    match fs::write(path, bytes) {
        Ok(()) => {
            info!(index, output_file = path.display().to_string(); "Diagram exported");
            DiagramOutcome::Written {
                index,
                path: path.to_path_buf(),
            }
        }
        Err(source) => {
            error!(index, output_file = path.display().to_string(), err:err = source; "Failed to write output file");
            DiagramOutcome::WriteFailed {
                index,
                error: DrawBatchError::FileWrite {
                    path: path.to_path_buf(),
                    source,
                },
            }
        }
    }
}

fn log_summary(summary: &RunSummary) {
    let written = summary.written().count();
    let failed = summary.failures().count();
    if failed > 0 {
        warn!(written, failed; "Export finished with write failures");
    } else {
        info!(written; "Export finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_config_defaults() {
        let config = RunConfig::new("in.drawio", "out.pdf");

        assert_eq!(config.format(), OutputFormat::Pdf);
        assert_eq!(config.quality(), 75);
        assert_eq!(config.scale(), 1.0);
        assert_eq!(config.fit(), FitBounds::default());
        assert_eq!(config.diagram(), None);
    }

    #[test]
    fn test_run_config_validation() {
        assert!(RunConfig::new("a", "b").validate().is_ok());
        assert!(RunConfig::new("a", "b").with_quality(0).validate().is_err());
        assert!(RunConfig::new("a", "b").with_quality(101).validate().is_err());
        assert!(RunConfig::new("a", "b").with_scale(0.0).validate().is_err());
        assert!(RunConfig::new("a", "b").with_scale(f64::NAN).validate().is_err());
    }
}
