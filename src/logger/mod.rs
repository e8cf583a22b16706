//! Logger module
//!
//! Named logging helpers for the server:
//! - Server lifecycle logging
//! - Access logging
//! - Error and warning logging
//!
//! Events go through `tracing`; [`init`] installs the subscriber.

pub mod writer;

use crate::config::Config;
use crate::http::mime::MimeSource;
use hyper::{Method, StatusCode, Uri, Version};
use std::net::SocketAddr;

pub use writer::init;

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!("======================================");
    tracing::info!("Async server started successfully");
    tracing::info!("Listening on: http://{addr}");
    tracing::info!("Serving files from: {}", config.server.root);
    tracing::info!("Log level: {}", config.logging.level);
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    if let Some(ref path) = config.logging.log_file {
        tracing::info!("Log file: {path}");
    }
    tracing::info!(
        "Cache: max-age={}s, dates as '{}' in {}",
        config.files.cache_seconds,
        config.files.date_format,
        config.files.time_zone
    );
    tracing::info!("======================================");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("[ERROR] Failed to serve connection: {err:?}");
}

pub fn log_request(method: &Method, uri: &Uri, version: Version) {
    tracing::info!(target: "access", "[Request] {method} {uri} {version:?}");
}

pub fn log_response(status: StatusCode) {
    tracing::info!(target: "access", "[Response] {status}");
}

pub fn log_mime_types_loaded(count: usize, source: &MimeSource) {
    tracing::info!("[MIME] Loaded {count} extensions from {source} table");
}

pub fn log_shutdown_requested(signal: &str) {
    tracing::info!("[SIGNAL] {signal} received, initiating graceful shutdown");
}

pub fn log_server_stopped() {
    tracing::info!("Server stopped accepting connections");
}

pub fn log_error(message: &str) {
    tracing::error!("[ERROR] {message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("[WARN] {message}");
}
