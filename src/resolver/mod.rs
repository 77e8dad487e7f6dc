//! Path resolution
//!
//! Turns a decoded (root name, relative suffix) pair into a validated real path.

mod operations;

pub use operations::PathResolver;
