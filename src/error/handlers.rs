//! Error handlers
//!
//! Logs broker errors at the right level and maps them to protocol reply codes.

use crate::error::types::BrokerError;
use log::{error, info, warn};

/// Log a broker error. Escapes and grant violations are security-relevant.
pub fn handle_error(err: &BrokerError) {
    match err {
        BrokerError::AccessDenied(_) => warn!("Security: {}", err),
        BrokerError::Io(_) | BrokerError::Configuration(_) => error!("Broker error: {}", err),
        _ => info!("Request rejected: {}", err),
    }
}

/// Convert error to protocol reply code
pub fn error_to_reply_code(err: &BrokerError) -> u16 {
    match err {
        BrokerError::Configuration(_) => 421,
        BrokerError::MalformedToken(_) => 553,
        BrokerError::NotFound(_) => 550,
        BrokerError::AccessDenied(_) => 530,
        BrokerError::InvalidArgument(_) => 501,
        BrokerError::Io(_) => 451,
        BrokerError::UnsupportedOperation(_) => 502,
    }
}

/// Format an error as a complete reply line.
pub fn error_reply(err: &BrokerError) -> String {
    handle_error(err);
    format!("{} {}\r\n", error_to_reply_code(err), err)
}
