// Application state module
// Holds everything a request needs, built once at startup and shared read-only

use std::sync::Arc;

use tokio::sync::watch;

use super::types::Config;
use crate::handler::{FileTypeHandler, SpecialFile};

/// Application state
pub struct AppState {
    pub config: Config,
    pub handler: FileTypeHandler,
    /// Served for the configured favicon paths
    pub favicon: Arc<dyn SpecialFile>,
    pub access_log: bool,
    /// Flips to true once shutdown is requested
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(
        config: Config,
        handler: FileTypeHandler,
        favicon: Arc<dyn SpecialFile>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let access_log = config.logging.access_log;
        Self {
            config,
            handler,
            favicon,
            access_log,
            shutdown,
        }
    }
}
