//! HTTP protocol layer module
//!
//! Date formatting, conditional request validation, MIME resolution and
//! response builders, decoupled from request dispatch.

pub mod cache;
pub mod connection;
pub mod date;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use connection::is_keep_alive;
pub use date::HttpDateFormat;
pub use mime::{MediaType, MediaTypeResolver, MimeSource, SharedMimeTable};
pub use response::{build_404_response, build_405_response, build_500_response, build_options_response};
