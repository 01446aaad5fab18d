//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file exists but could not be read.
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A config file named with `--config` does not exist.
    #[error("Config file not found: {path}")]
    NotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// A config file is not valid TOML for the schema.
    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        /// File that failed.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// A merged value failed validation.
    #[error("Invalid config value for {field}: {message}")]
    InvalidValue {
        /// Dotted field name, e.g. `server.url`.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}
