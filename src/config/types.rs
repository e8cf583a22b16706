// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::http::date::HttpDateFormat;
use crate::http::mime::MimeSource;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub files: FilesConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory request paths are mapped into
    pub root: String,
    #[serde(default = "default_index_files")]
    pub index_files: Vec<String>,
    pub workers: Option<usize>,
    /// Upper bound on a connection's total lifetime in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `static_responder=debug`
    pub level: String,
    pub access_log: bool,
    /// Log file path (optional, stdout if not set)
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
            log_file: None,
        }
    }
}

/// File handler settings as written in the config file
#[derive(Debug, Deserialize, Clone)]
pub struct FilesConfig {
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default = "default_cache_seconds")]
    pub cache_seconds: u32,
    /// Replacement for the bundled extension table
    #[serde(default)]
    pub mime_types_file: Option<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
            time_zone: default_time_zone(),
            cache_seconds: default_cache_seconds(),
            mime_types_file: None,
        }
    }
}

impl FilesConfig {
    pub fn mime_source(&self) -> MimeSource {
        self.mime_types_file
            .as_ref()
            .map_or(MimeSource::Bundled, |path| MimeSource::File(PathBuf::from(path)))
    }
}

/// Validated file handler configuration, shared read-only by every request
#[derive(Debug, Clone)]
pub struct FileHandlerConfig {
    pub date_format: HttpDateFormat,
    pub cache_seconds: u32,
}

impl FileHandlerConfig {
    pub const fn new(date_format: HttpDateFormat, cache_seconds: u32) -> Self {
        Self {
            date_format,
            cache_seconds,
        }
    }
}

impl Default for FileHandlerConfig {
    fn default() -> Self {
        Self::new(HttpDateFormat::default(), default_cache_seconds())
    }
}

impl TryFrom<&FilesConfig> for FileHandlerConfig {
    type Error = ConfigError;

    fn try_from(files: &FilesConfig) -> Result<Self, Self::Error> {
        Ok(Self::new(
            HttpDateFormat::new(&files.date_format, &files.time_zone)?,
            files.cache_seconds,
        ))
    }
}

fn default_index_files() -> Vec<String> {
    vec!["index.html".to_string(), "index.htm".to_string()]
}

#[allow(clippy::missing_const_for_fn)]
fn default_connection_timeout() -> u64 {
    75
}

fn default_date_format() -> String {
    crate::http::date::DEFAULT_DATE_FORMAT.to_string()
}

fn default_time_zone() -> String {
    crate::http::date::DEFAULT_TIME_ZONE.to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_cache_seconds() -> u32 {
    60
}
