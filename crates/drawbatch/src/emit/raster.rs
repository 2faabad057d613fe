use std::io::Cursor;

use image::{
    DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat,
    codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding},
};
use log::debug;

use drawbatch_core::format::RasterFormat;

use super::{FormatEmitter, Frame};
use crate::{
    DrawBatchError,
    engine::{RenderEngine, ScreenshotFormat},
};

/// Captures the frame's bounds as a raster image.
///
/// PNG and JPEG come straight from the engine. The engine cannot encode
/// GIF, BMP or PPM, so those are transcoded from a PNG capture.
#[derive(Debug, Clone, Copy)]
pub struct RasterEmitter {
    format: RasterFormat,
    quality: u8,
}

impl RasterEmitter {
    pub fn new(format: RasterFormat, quality: u8) -> Self {
        Self { format, quality }
    }

    fn screenshot_format(&self) -> ScreenshotFormat {
        if self.format.is_lossy() {
            ScreenshotFormat::Jpeg {
                quality: self.quality,
            }
        } else {
            ScreenshotFormat::Png
        }
    }
}

impl FormatEmitter for RasterEmitter {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn emit(&self, engine: &mut dyn RenderEngine, frame: &Frame) -> Result<Vec<u8>, DrawBatchError> {
        let capture_format = self.screenshot_format();
        debug!(format:% = self.format, capture:% = capture_format; "Capturing screenshot");

        let captured = engine.screenshot(frame.bounds(), capture_format)?;

        match self.format {
            RasterFormat::Png | RasterFormat::Jpeg => Ok(captured),
            target => transcode(&captured, target),
        }
    }
}

/// Re-encodes a PNG capture as `target`.
fn transcode(png: &[u8], target: RasterFormat) -> Result<Vec<u8>, DrawBatchError> {
    let image = image::load_from_memory_with_format(png, ImageFormat::Png)
        .map_err(|err| DrawBatchError::Capture(format!("unreadable screenshot: {err}")))?;

    let mut out = Cursor::new(Vec::new());
    let result = match target {
        RasterFormat::Gif => image.write_to(&mut out, ImageFormat::Gif),
        RasterFormat::Bmp => image.write_to(&mut out, ImageFormat::Bmp),
        RasterFormat::Ppm => write_ppm(&image, &mut out),
        RasterFormat::Png | RasterFormat::Jpeg => return Ok(png.to_vec()),
    };
    result.map_err(|err| DrawBatchError::Capture(format!("failed to encode {target}: {err}")))?;

    Ok(out.into_inner())
}

/// Writes a binary (`P6`) pixmap; PPM has no alpha channel.
fn write_ppm(image: &DynamicImage, out: &mut Cursor<Vec<u8>>) -> image::ImageResult<()> {
    let rgb = image.to_rgb8();
    PnmEncoder::new(out)
        .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary))
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
}

#[cfg(test)]
mod tests {
    use drawbatch_core::{
        format::OutputFormat,
        geometry::{Bounds, FitBounds, Viewport},
    };

    use super::*;
    use crate::engine::{
        Launcher, RenderRequest,
        mock::{Call, MockEngine, MockLauncher},
    };

    fn rendered_engine(launcher: &MockLauncher) -> MockEngine {
        let mut engine = launcher.launch().unwrap();
        let request = RenderRequest::new("<mxfile/>", OutputFormat::Png, 1.0, FitBounds::default(), 0);
        engine.render(&request).unwrap();
        engine
    }

    fn frame() -> Frame {
        Frame::new(Bounds::new(0.0, 0.0, 40.0, 30.0), Viewport::new(40, 30))
    }

    #[test]
    fn test_png_is_captured_directly() {
        let launcher = MockLauncher::new();
        let mut engine = rendered_engine(&launcher);

        let bytes = RasterEmitter::new(RasterFormat::Png, 75)
            .emit(&mut engine, &frame())
            .unwrap();

        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        assert_eq!(launcher.count(&Call::Screenshot(ScreenshotFormat::Png)), 1);
    }

    #[test]
    fn test_jpeg_honours_quality() {
        let launcher = MockLauncher::new();
        let mut engine = rendered_engine(&launcher);

        let bytes = RasterEmitter::new(RasterFormat::Jpeg, 42)
            .emit(&mut engine, &frame())
            .unwrap();

        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        assert_eq!(
            launcher.count(&Call::Screenshot(ScreenshotFormat::Jpeg { quality: 42 })),
            1
        );
    }

    #[test]
    fn test_gif_and_bmp_are_transcoded() {
        for (format, expected) in [
            (RasterFormat::Gif, ImageFormat::Gif),
            (RasterFormat::Bmp, ImageFormat::Bmp),
        ] {
            let launcher = MockLauncher::new();
            let mut engine = rendered_engine(&launcher);

            let bytes = RasterEmitter::new(format, 75)
                .emit(&mut engine, &frame())
                .unwrap();

            assert_eq!(image::guess_format(&bytes).unwrap(), expected);
            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (40, 30));
        }
    }

    #[test]
    fn test_ppm_is_binary_pixmap() {
        let launcher = MockLauncher::new();
        let mut engine = rendered_engine(&launcher);

        let bytes = RasterEmitter::new(RasterFormat::Ppm, 75)
            .emit(&mut engine, &frame())
            .unwrap();

        assert!(bytes.starts_with(b"P6"));
        assert_eq!(launcher.count(&Call::Screenshot(ScreenshotFormat::Png)), 1);
    }
}
