//! Access broker
//!
//! The façade the outside world talks to: every request names a file by token,
//! never by path.

pub mod core;
pub mod modes;
pub mod request;
pub mod results;

pub use self::core::{AccessBroker, UpdatePolicy};
pub use modes::AccessMode;
pub use request::{AccessRequest, DEFAULT_QUERY_FIELDS, Operation, QueryField};
pub use results::{BrokerResponse, OpenedFile, QueryColumn, QueryResult, QueryValue};
