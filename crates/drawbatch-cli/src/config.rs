//! Configuration file loading for the CLI.
//!
//! The engine settings come from a TOML file: the one named by `--config`,
//! or the first one found among the standard locations.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use drawbatch::{DrawBatchError, config::AppConfig};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),
}

impl From<ConfigError> for DrawBatchError {
    fn from(err: ConfigError) -> Self {
        DrawBatchError::InvalidOption(err.to_string())
    }
}

/// Location of the per-project configuration, relative to the working directory.
const LOCAL_CONFIG: &str = "drawbatch/config.toml";

/// Loads the configuration for a run.
///
/// An explicit path must exist. Otherwise the first existing file among
/// [`search_paths`] is used, and the defaults when there is none.
///
/// # Errors
///
/// Returns [`DrawBatchError::InvalidOption`] if the explicit file is missing
/// or any chosen file is not valid TOML for [`AppConfig`].
pub fn load_config(explicit_path: Option<&Path>) -> Result<AppConfig, DrawBatchError> {
    if let Some(path) = explicit_path {
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return read_config(path);
    }

    match search_paths().into_iter().find(|path| path.is_file()) {
        Some(path) => {
            info!(path = path.display().to_string(); "Loading configuration");
            read_config(&path)
        }
        None => {
            debug!("No configuration file found, using default configuration");
            Ok(AppConfig::default())
        }
    }
}

/// Candidate configuration files in lookup order: the project-local file,
/// then `config.toml` in the platform configuration directory.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
    match ProjectDirs::from("com", "drawbatch", "drawbatch") {
        Some(dirs) => paths.push(dirs.config_dir().join("config.toml")),
        None => debug!("Could not determine platform-specific config directory"),
    }
    paths
}

fn read_config(path: &Path) -> Result<AppConfig, DrawBatchError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ConfigError::MissingFile(path.to_path_buf()).into());
        }
        Err(err) => return Err(err.into()),
    };

    toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()).into())
}
