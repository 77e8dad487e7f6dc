//! RAX File Broker
//!
//! Exposes files under a fixed set of storage roots through opaque tokens,
//! never through raw paths.

pub mod access;
pub mod broker;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod mime;
pub mod protocol;
pub mod resolver;
pub mod roots;
pub mod server;
pub mod storage;

pub use broker::{AccessBroker, AccessMode, AccessRequest, Operation};
pub use codec::{Token, UriCodec};
pub use error::{BrokerError, BrokerResult};
pub use roots::{RootRegistry, StorageRoot};
pub use server::Server;
