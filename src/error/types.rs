//! Error types
//!
//! Defines the error taxonomy shared by every broker component.

use std::fmt;
use std::io;

/// Errors raised while building roots, decoding tokens, resolving paths or touching files.
#[derive(Debug)]
pub enum BrokerError {
    /// Root directories could not be canonicalized, or the config is unusable.
    Configuration(String),
    /// Token does not parse into exactly two segments, or its encoding is invalid.
    MalformedToken(String),
    /// Root name unknown, or the resolved file does not exist.
    NotFound(String),
    /// Resolved path would escape its named root, or no grant covers the token.
    AccessDenied(String),
    /// Unrecognized open mode or other bad argument.
    InvalidArgument(String),
    /// Underlying filesystem call failed for reasons unrelated to validation.
    Io(io::Error),
    /// Insert, or update when it is not aliased to delete.
    UnsupportedOperation(String),
}

impl fmt::Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokerError::Configuration(s) => write!(f, "Configuration error: {}", s),
            BrokerError::MalformedToken(s) => write!(f, "Malformed token: {}", s),
            BrokerError::NotFound(s) => write!(f, "Not found: {}", s),
            BrokerError::AccessDenied(s) => write!(f, "Access denied: {}", s),
            BrokerError::InvalidArgument(s) => write!(f, "Invalid argument: {}", s),
            BrokerError::Io(e) => write!(f, "I/O error: {}", e),
            BrokerError::UnsupportedOperation(s) => write!(f, "Unsupported operation: {}", s),
        }
    }
}

impl std::error::Error for BrokerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BrokerError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for BrokerError {
    fn from(error: io::Error) -> Self {
        BrokerError::Io(error)
    }
}

impl From<config::ConfigError> for BrokerError {
    fn from(error: config::ConfigError) -> Self {
        BrokerError::Configuration(error.to_string())
    }
}

impl BrokerError {
    /// Classifies an I/O failure on `path`: a missing file becomes `NotFound`.
    pub fn from_io(error: io::Error, path: &std::path::Path) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => BrokerError::NotFound(path.display().to_string()),
            _ => BrokerError::Io(error),
        }
    }
}

pub type BrokerResult<T> = Result<T, BrokerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_from_io_maps_missing_file_to_not_found() {
        let err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let mapped = BrokerError::from_io(err, Path::new("/tmp/x"));
        assert!(matches!(mapped, BrokerError::NotFound(p) if p == "/tmp/x"));
    }

    #[test]
    fn test_from_io_keeps_other_failures() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let mapped = BrokerError::from_io(err, Path::new("/tmp/x"));
        assert!(matches!(mapped, BrokerError::Io(_)));
    }

    #[test]
    fn test_display_prefixes() {
        let err = BrokerError::InvalidArgument("Invalid mode: x".into());
        assert_eq!(err.to_string(), "Invalid argument: Invalid mode: x");
    }
}
