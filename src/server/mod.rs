// Server module entry point
// Listener setup, accept loop, connection serving and response transport

pub mod connection;
pub mod listener;
pub mod signal;
pub mod transport;

// Rust does not allow `loop` as a module name (keyword), so it is exposed as server_loop
#[path = "loop.rs"]
pub mod server_loop;

// Re-export commonly used types
pub use listener::create_reusable_listener;
pub use server_loop::start_server_loop;
pub use transport::{write_outcome, TransportContext};
