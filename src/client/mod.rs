//! Client session management
//!
//! Handles connected callers and their command loop.

pub mod handler;
pub mod registry;

pub use handler::handle_client;
pub use registry::ClientRegistry;
