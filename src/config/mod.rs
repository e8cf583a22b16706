// Configuration module entry point
// Loads the server configuration and validates the file handler settings

mod state;
mod types;

use std::net::SocketAddr;

use crate::error::ConfigError;

// Re-export public types
pub use state::AppState;
pub use types::{Config, FileHandlerConfig, FilesConfig, LoggingConfig, ServerConfig};

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("SERVER"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.root", "public")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("files.date_format", crate::http::date::DEFAULT_DATE_FORMAT)?
            .set_default("files.time_zone", crate::http::date::DEFAULT_TIME_ZONE)?
            .set_default("files.cache_seconds", 60)?
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would otherwise only fail once requests arrive
    fn validate(&self) -> Result<(), ConfigError> {
        self.handler_config().map(|_| ())
    }

    pub fn handler_config(&self) -> Result<FileHandlerConfig, ConfigError> {
        FileHandlerConfig::try_from(&self.files)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ConfigError::InvalidAddress(format!("{e}")))
    }
}
