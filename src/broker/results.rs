//! Broker result types
//!
//! Defines result structures returned by broker operations.

use std::fs::File;
use std::path::PathBuf;

use crate::broker::modes::AccessMode;
use crate::broker::request::QueryField;

/// A single metadata value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Text(String),
    Integer(u64),
    Null,
}

/// A requested column and its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryColumn {
    pub field: QueryField,
    pub value: QueryValue,
}

/// One metadata row, columns in the order they were requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<QueryColumn>,
}

impl QueryResult {
    fn value_of(&self, field: &QueryField) -> Option<&QueryValue> {
        self.columns
            .iter()
            .find(|c| &c.field == field)
            .map(|c| &c.value)
    }

    pub fn display_name(&self) -> Option<&str> {
        match self.value_of(&QueryField::DisplayName) {
            Some(QueryValue::Text(name)) => Some(name),
            _ => None,
        }
    }

    pub fn size(&self) -> Option<u64> {
        match self.value_of(&QueryField::Size) {
            Some(QueryValue::Integer(size)) => Some(*size),
            _ => None,
        }
    }
}

/// An open handle plus what it was opened as
#[derive(Debug)]
pub struct OpenedFile {
    pub file: File,
    pub path: PathBuf,
    pub mode: AccessMode,
}

/// Outcome of a dispatched request
#[derive(Debug)]
pub enum BrokerResponse {
    Row(QueryResult),
    ContentType(&'static str),
    Handle(OpenedFile),
    Count(usize),
}
