//! Token codec
//!
//! Converts real paths under registered roots into opaque tokens and back.

pub mod operations;
pub mod token;

pub use operations::{DecodedToken, UriCodec};
pub use token::{TOKEN_SEGMENT, Token};
