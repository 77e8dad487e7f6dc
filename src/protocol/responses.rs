//! Reply codes
//!
//! Defines reply codes and formatting.

pub const TRANSFER_STARTING: u16 = 150;
pub const OK: u16 = 200;
pub const FILE_STATUS: u16 = 213;
pub const CONTENT_TYPE: u16 = 215;
pub const READY: u16 = 220;
pub const GOODBYE: u16 = 221;
pub const TRANSFER_COMPLETE: u16 = 226;
pub const DELETE_COUNT: u16 = 250;
pub const TRANSFER_ABORTED: u16 = 426;
pub const UNKNOWN_COMMAND: u16 = 500;
pub const SYNTAX_ERROR: u16 = 501;
pub const TOO_MANY_CLIENTS: u16 = 421;

/// Format a reply line
pub fn format_response(code: u16, message: &str) -> String {
    format!("{} {}\r\n", code, message)
}
