//! Format emitters.
//!
//! One [`FormatEmitter`] per output kind turns the engine's current frame
//! into the bytes of the output file. [`emitter_for`] picks the emitter from
//! the kind resolved from the output extension.

pub mod pdf;
pub mod raster;
pub mod svg;

use drawbatch_core::{
    format::OutputKind,
    geometry::{Bounds, Viewport},
};

use crate::{DrawBatchError, engine::RenderEngine};

/// Geometry of the frame currently rendered in the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    bounds: Bounds,
    viewport: Viewport,
}

impl Frame {
    pub fn new(bounds: Bounds, viewport: Viewport) -> Self {
        Self { bounds, viewport }
    }

    /// Content rectangle reported by the engine.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Integer canvas derived from the bounds.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}

/// Produces the encoded output for a rendered frame.
pub trait FormatEmitter {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Captures the current frame from `engine` and encodes it.
    fn emit(&self, engine: &mut dyn RenderEngine, frame: &Frame) -> Result<Vec<u8>, DrawBatchError>;
}

/// Selects the emitter for an output kind.
///
/// `quality` only affects lossy raster encodings.
pub fn emitter_for(kind: OutputKind, quality: u8) -> Box<dyn FormatEmitter> {
    match kind {
        OutputKind::Pdf => Box::new(pdf::PdfEmitter),
        OutputKind::Svg => Box::new(svg::SvgEmitter),
        OutputKind::Raster(format) => Box::new(raster::RasterEmitter::new(format, quality)),
    }
}

#[cfg(test)]
mod tests {
    use drawbatch_core::format::{OutputFormat, RasterFormat};

    use super::*;

    #[test]
    fn test_emitter_selection() {
        assert_eq!(emitter_for(OutputFormat::Pdf.kind(), 75).name(), "pdf");
        assert_eq!(emitter_for(OutputFormat::Svg.kind(), 75).name(), "svg");
        assert_eq!(
            emitter_for(OutputKind::Raster(RasterFormat::Gif), 75).name(),
            "raster"
        );
    }
}
