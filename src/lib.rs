//! Static file responder
//!
//! Serves files over HTTP with `If-Modified-Since` validation, extension
//! based Content-Type detection and configurable freshness headers.
//!
//! The pieces a host server needs are [`handler::FileTypeHandler`], the
//! shared MIME table from [`http::mime::SharedMimeTable`] and the transport
//! writer in [`server::transport`].

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
