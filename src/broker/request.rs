//! Request types
//!
//! A closed set of operations so dispatch stays exhaustive.

use std::str::FromStr;

use crate::broker::modes::AccessMode;
use crate::error::BrokerError;

/// A metadata column a caller may ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryField {
    DisplayName,
    Size,
    /// Unrecognized column; answered with a null value.
    Other(String),
}

/// Columns returned when the caller names none.
pub static DEFAULT_QUERY_FIELDS: [QueryField; 2] = [QueryField::DisplayName, QueryField::Size];

impl QueryField {
    pub fn as_str(&self) -> &str {
        match self {
            QueryField::DisplayName => "_display_name",
            QueryField::Size => "_size",
            QueryField::Other(name) => name,
        }
    }

    /// Parses a comma-separated projection such as `_display_name,_size`.
    pub fn parse_list(raw: &str) -> Vec<QueryField> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(QueryField::from)
            .collect()
    }
}

impl From<&str> for QueryField {
    fn from(s: &str) -> Self {
        match s {
            "_display_name" | "display_name" => QueryField::DisplayName,
            "_size" | "size" => QueryField::Size,
            other => QueryField::Other(other.to_string()),
        }
    }
}

/// What to do with the file a token names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Query(Option<Vec<QueryField>>),
    TypeLookup,
    Open(AccessMode),
    Delete,
    Update,
    Insert,
}

impl Operation {
    /// Whether the operation can change file content or existence.
    pub fn mutates(&self) -> bool {
        match self {
            Operation::Query(_) | Operation::TypeLookup => false,
            Operation::Open(mode) => mode.is_writable(),
            Operation::Delete | Operation::Update | Operation::Insert => true,
        }
    }
}

/// One inbound request, built per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    pub token: String,
    pub operation: Operation,
}

impl AccessRequest {
    pub fn new(token: impl Into<String>, operation: Operation) -> Self {
        Self {
            token: token.into(),
            operation,
        }
    }

    /// Builds an open request from a raw mode string.
    pub fn open(token: impl Into<String>, mode: &str) -> Result<Self, BrokerError> {
        Ok(Self::new(token, Operation::Open(AccessMode::from_str(mode)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_projection_keeps_order_and_unknowns() {
        let fields = QueryField::parse_list("_size, _display_name,mtime,");
        assert_eq!(
            fields,
            vec![
                QueryField::Size,
                QueryField::DisplayName,
                QueryField::Other("mtime".into())
            ]
        );
    }

    #[test]
    fn test_mutating_operations() {
        assert!(!Operation::Query(None).mutates());
        assert!(!Operation::Open(AccessMode::Read).mutates());
        assert!(Operation::Open(AccessMode::WriteAppend).mutates());
        assert!(Operation::Update.mutates());
    }

    #[test]
    fn test_open_request_rejects_bad_mode() {
        assert!(matches!(
            AccessRequest::open("content://a/files/x", "x"),
            Err(BrokerError::InvalidArgument(_))
        ));
    }
}
