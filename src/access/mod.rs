//! Access grants
//!
//! Per-token, time-scoped permissions. Remote callers reach the broker only
//! through a live grant.

pub mod grants;

pub use grants::{Grant, GrantPermission, GrantTable};
