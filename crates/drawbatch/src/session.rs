//! Render session.
//!
//! [`RenderSession`] owns one engine for the whole run. The engine is
//! released exactly once: explicitly through [`RenderSession::close`], or
//! when the session is dropped on an early return.

use log::{debug, warn};

use drawbatch_core::geometry::{Bounds, Viewport};

use crate::{
    DrawBatchError,
    emit::{FormatEmitter, Frame},
    engine::{BOUNDS_ATTRIBUTE, Launcher, RenderEngine, RenderRequest},
};

/// A started engine plus its release guard.
pub struct RenderSession<E: RenderEngine> {
    engine: E,
    closed: bool,
}

impl<E: RenderEngine> RenderSession<E> {
    /// Launches an engine and waits until the export page is ready.
    ///
    /// # Errors
    ///
    /// Returns [`DrawBatchError::EngineStart`] if the engine cannot be
    /// launched or the export page cannot be loaded.
    pub fn start<L>(launcher: &L) -> Result<Self, DrawBatchError>
    where
        L: Launcher<Engine = E>,
    {
        debug!("Starting render session");
        let engine = launcher.launch()?;
        Ok(Self {
            engine,
            closed: false,
        })
    }

    /// Renders one diagram and waits for the completion marker.
    ///
    /// # Errors
    ///
    /// Returns [`DrawBatchError::RenderTimeout`] if the marker never
    /// appears. The render is not retried.
    pub fn render_diagram(&mut self, request: &RenderRequest<'_>) -> Result<(), DrawBatchError> {
        debug!(index = request.index(), format = request.format(), scale = request.scale(); "Rendering diagram");
        self.engine.render(request)?;
        Ok(())
    }

    /// Reads the content bounds from the completion marker.
    ///
    /// # Errors
    ///
    /// Returns [`DrawBatchError::InvalidBounds`] if the attribute is missing
    /// or is not a JSON rectangle.
    pub fn read_completion_bounds(&mut self) -> Result<Bounds, DrawBatchError> {
        let raw = self.engine.completion_bounds()?.ok_or_else(|| {
            DrawBatchError::InvalidBounds(format!(
                "completion marker has no '{BOUNDS_ATTRIBUTE}' attribute"
            ))
        })?;

        let bounds: Bounds = serde_json::from_str(&raw)
            .map_err(|err| DrawBatchError::InvalidBounds(format!("'{raw}': {err}")))?;

        debug!(bounds:? = bounds; "Read completion bounds");
        Ok(bounds)
    }

    /// Sizes the page for capture.
    pub fn prepare_viewport(&mut self, viewport: Viewport) -> Result<(), DrawBatchError> {
        self.engine.set_viewport(viewport)?;
        Ok(())
    }

    /// Produces the encoded output of the current frame.
    pub fn capture(
        &mut self,
        emitter: &dyn FormatEmitter,
        frame: &Frame,
    ) -> Result<Vec<u8>, DrawBatchError> {
        emitter.emit(&mut self.engine, frame)
    }

    /// Removes the rendered frame so the next diagram starts from a clean page.
    pub fn cleanup_frame(&mut self) -> Result<(), DrawBatchError> {
        self.engine.clear_frame()?;
        Ok(())
    }

    /// Releases the engine.
    pub fn close(mut self) -> Result<(), DrawBatchError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), DrawBatchError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        debug!("Closing render session");
        self.engine.close()?;
        Ok(())
    }
}

impl<E: RenderEngine> Drop for RenderSession<E> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            warn!(err:err; "Failed to close rendering engine");
        }
    }
}
