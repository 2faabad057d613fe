//! Output formats.
//!
//! [`OutputFormat`] names every format the tool can write. Each format
//! belongs to one [`OutputKind`], which decides the post-processing path:
//! printed documents, standalone vector markup, or raster captures.

use std::{fmt, str::FromStr};

use crate::Error;

/// A supported output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    #[default]
    Pdf,
    Svg,
    Gif,
    Png,
    Jpeg,
    Bmp,
    Ppm,
}

impl OutputFormat {
    /// All formats, in the order they are listed to users.
    pub const ALL: [OutputFormat; 7] = [
        Self::Pdf,
        Self::Svg,
        Self::Gif,
        Self::Png,
        Self::Jpeg,
        Self::Bmp,
        Self::Ppm,
    ];

    /// Canonical lower-case name, also used as the file extension.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Svg => "svg",
            Self::Gif => "gif",
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Bmp => "bmp",
            Self::Ppm => "ppm",
        }
    }

    /// Returns the [`OutputKind`] this format is produced by.
    pub fn kind(self) -> OutputKind {
        match self {
            Self::Pdf => OutputKind::Pdf,
            Self::Svg => OutputKind::Svg,
            Self::Gif => OutputKind::Raster(RasterFormat::Gif),
            Self::Png => OutputKind::Raster(RasterFormat::Png),
            Self::Jpeg => OutputKind::Raster(RasterFormat::Jpeg),
            Self::Bmp => OutputKind::Raster(RasterFormat::Bmp),
            Self::Ppm => OutputKind::Raster(RasterFormat::Ppm),
        }
    }

    /// Resolves a file extension (case-insensitive, `jpg` accepted) to a format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for unknown extensions.
    pub fn from_extension(extension: &str) -> Result<Self, Error> {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" => Ok(Self::Jpeg),
            other => other.parse(),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnsupportedFormat(s.to_string()))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The post-processing path an output takes after rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Printed, single-page document.
    Pdf,
    /// Standalone vector markup read back from the page.
    Svg,
    /// Clipped screenshot, encoded as the given raster format.
    Raster(RasterFormat),
}

/// Raster encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Gif,
    Png,
    Jpeg,
    Bmp,
    Ppm,
}

impl RasterFormat {
    /// Lossy formats honour the quality setting.
    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

impl fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gif => "gif",
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Bmp => "bmp",
            Self::Ppm => "ppm",
        };
        f.write_str(name)
    }
}
