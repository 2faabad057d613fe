use log::debug;

use super::{FormatEmitter, Frame};
use crate::{
    DrawBatchError,
    engine::{PageSize, RenderEngine},
};

/// Extra page height added below the content.
///
/// The renderer rounds the content size down in print layout, which would
/// otherwise push the last pixel row onto a second, discarded page.
const PAGE_HEIGHT_PADDING: f64 = 1.0;

/// Prints the frame as a single-page PDF sized to the viewport.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfEmitter;

impl FormatEmitter for PdfEmitter {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn emit(&self, engine: &mut dyn RenderEngine, frame: &Frame) -> Result<Vec<u8>, DrawBatchError> {
        let viewport = frame.viewport();
        let page = PageSize {
            width: f64::from(viewport.width()),
            height: f64::from(viewport.height()) + PAGE_HEIGHT_PADDING,
        };

        debug!(width = page.width, height = page.height; "Printing PDF page");
        Ok(engine.print_pdf(page)?)
    }
}
