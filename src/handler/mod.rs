//! Request handler module
//!
//! Request dispatch and the file handler it feeds.

pub mod body;
pub mod file_type;
pub mod router;

// Re-export main entry point
pub use body::{EmbeddedFile, FileResource, ResponseBody, SpecialFile, SystemFile};
pub use file_type::{FileTypeHandler, Outcome};
pub use router::handle_request;
