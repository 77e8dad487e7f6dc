//! Server core functionality
//!
//! The TCP front end through which remote callers reach the broker, and the
//! operator console through which the owning application shares files.

pub mod console;
pub mod core;

pub use self::core::Server;
pub use console::{execute_console_command, run_console};
