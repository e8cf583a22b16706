//! Error types
//!
//! Failures that can escape the file handler or the configuration loader.
//! Everything else in the request path degrades to a safe default instead.

use thiserror::Error;

/// Errors raised while handling a response body
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler was invoked with a body it does not support.
    /// Callers are expected to check `supports` first.
    #[error("file handler only supports file paths, system files or special files, got {0}")]
    Unsupported(&'static str),

    /// A raw filesystem path could not be inspected
    #[error("failed to read metadata of '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown time zone '{0}'")]
    InvalidTimeZone(String),

    #[error("invalid date format pattern '{0}'")]
    InvalidDateFormat(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}
