//! Module `token`
//!
//! The caller-visible address `scheme://authority/<root_name>/<encoded_relative_path>`.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::fmt;
use std::str::FromStr;

use crate::error::{BrokerError, BrokerResult};

/// Everything outside the RFC 3986 unreserved set is escaped, `/` included,
/// so a whole relative path becomes one segment.
pub const TOKEN_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Parsed opaque address. Holds the relative path in its encoded form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    scheme: String,
    authority: String,
    root_name: String,
    encoded_path: String,
}

impl Token {
    /// Builds a token, percent-encoding `relative_suffix` as a single segment.
    pub fn new(scheme: &str, authority: &str, root_name: &str, relative_suffix: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
            authority: authority.to_string(),
            root_name: root_name.to_string(),
            encoded_path: utf8_percent_encode(relative_suffix, TOKEN_SEGMENT).to_string(),
        }
    }

    /// Parses the wire form. The path must hold exactly two segments.
    pub fn parse(raw: &str) -> BrokerResult<Self> {
        let (scheme, rest) = raw
            .split_once("://")
            .ok_or_else(|| BrokerError::MalformedToken(format!("Missing scheme: {}", raw)))?;
        if scheme.is_empty() {
            return Err(BrokerError::MalformedToken(format!("Empty scheme: {}", raw)));
        }

        let (authority, path) = rest
            .split_once('/')
            .ok_or_else(|| BrokerError::MalformedToken(format!("Missing path: {}", raw)))?;
        if authority.is_empty() {
            return Err(BrokerError::MalformedToken(format!("Empty authority: {}", raw)));
        }
        if path.contains(['?', '#']) {
            return Err(BrokerError::MalformedToken(format!(
                "Query or fragment not allowed: {}",
                raw
            )));
        }

        let segments: Vec<&str> = path.split('/').collect();
        let [root_name, encoded_path] = segments.as_slice() else {
            return Err(BrokerError::MalformedToken(format!(
                "Expected 2 path segments, found {}: {}",
                segments.len(),
                raw
            )));
        };
        if root_name.is_empty() {
            return Err(BrokerError::MalformedToken(format!("Empty root name: {}", raw)));
        }
        if !is_well_formed_escape(encoded_path) {
            return Err(BrokerError::MalformedToken(format!(
                "Invalid percent-encoding: {}",
                raw
            )));
        }

        Ok(Self {
            scheme: scheme.to_string(),
            authority: authority.to_string(),
            root_name: root_name.to_string(),
            encoded_path: encoded_path.to_string(),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Root name, taken literally.
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn encoded_path(&self) -> &str {
        &self.encoded_path
    }

    /// Decodes the second segment back into the full relative suffix.
    pub fn relative_suffix(&self) -> BrokerResult<String> {
        percent_decode_str(&self.encoded_path)
            .decode_utf8()
            .map(|s| s.into_owned())
            .map_err(|e| {
                BrokerError::MalformedToken(format!("Path is not valid UTF-8 ({}): {}", e, self))
            })
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}/{}/{}",
            self.scheme, self.authority, self.root_name, self.encoded_path
        )
    }
}

impl FromStr for Token {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Token::parse(s)
    }
}

/// Every `%` must introduce two hex digits.
fn is_well_formed_escape(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3);
            if !matches!(hex, Some([a, b]) if a.is_ascii_hexdigit() && b.is_ascii_hexdigit()) {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}
