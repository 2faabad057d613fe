//! Output planning.
//!
//! An [`OutputTarget`] is resolved once per run from the user's output
//! argument. It then yields one path per diagram through
//! [`OutputTarget::path_for`]: when a document holds several diagrams the
//! diagram index is inserted before the extension, so `out.png` becomes
//! `out.0.png`, `out.1.png`, ...

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use log::debug;

use crate::{Error, format::OutputFormat};

/// Fallback base name when the input path has no usable file stem.
const DEFAULT_STEM: &str = "diagram";

/// Resolved base path and extension for every file a run writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    base: PathBuf,
    extension: String,
    from_directory: bool,
}

impl OutputTarget {
    /// Resolves the output target for a run.
    ///
    /// If `output` names an existing directory, files are placed inside it,
    /// named after the input file and given the `declared` format's
    /// extension. Otherwise `output` is a file path whose extension selects
    /// the format.
    pub fn resolve(output: &Path, input: &Path, declared: OutputFormat) -> Self {
        let target = if output.is_dir() {
            Self::in_directory(output, input, declared)
        } else {
            Self::from_file_path(output, declared)
        };

        debug!(
            base = target.base.display().to_string(),
            extension = target.extension,
            from_directory = target.from_directory;
            "Resolved output target"
        );

        target
    }

    /// Builds a target inside `dir`, named after `input` without its extension.
    pub fn in_directory(dir: &Path, input: &Path, declared: OutputFormat) -> Self {
        let stem = input
            .file_stem()
            .map_or_else(|| OsString::from(DEFAULT_STEM), ToOwned::to_owned);

        Self {
            base: dir.join(stem),
            extension: declared.as_str().to_string(),
            from_directory: true,
        }
    }

    /// Builds a target from an output file path.
    ///
    /// The last extension is stripped from the path and lower-cased. A path
    /// without an extension falls back to the `declared` format.
    pub fn from_file_path(output: &Path, declared: OutputFormat) -> Self {
        match output.extension() {
            Some(extension) => Self {
                base: output.with_extension(""),
                extension: extension.to_string_lossy().to_lowercase(),
                from_directory: false,
            },
            None => Self {
                base: output.to_path_buf(),
                extension: declared.as_str().to_string(),
                from_directory: false,
            },
        }
    }

    /// Path without the extension.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Lower-cased extension, without the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Whether the target was derived from an output directory.
    pub fn is_directory(&self) -> bool {
        self.from_directory
    }

    /// The output format selected by the extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the extension names no known format.
    pub fn format(&self) -> Result<OutputFormat, Error> {
        OutputFormat::from_extension(&self.extension)
    }

    /// Final file path for diagram `index` of `count`.
    ///
    /// The index segment is only inserted when `count > 1`, which keeps
    /// single-diagram documents at the exact name the user asked for.
    pub fn path_for(&self, index: usize, count: usize) -> PathBuf {
        let mut name = self.base.clone().into_os_string();
        if count > 1 {
            name.push(format!(".{index}"));
        }
        name.push(".");
        name.push(&self.extension);
        PathBuf::from(name)
    }
}
