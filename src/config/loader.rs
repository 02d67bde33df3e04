//! Settings loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::LoggingSettings;

/// Error type for settings loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Parse settings from TOML text.
pub fn parse_settings(content: &str) -> Result<LoggingSettings, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<LoggingSettings, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_settings(&content)
}
