//! Module `root`
//!
//! Defines a single registered storage root.

use std::path::{Path, PathBuf};

/// App-private persistent directory
pub const FILES_ROOT: &str = "files";
/// App-private cache directory
pub const CACHE_ROOT: &str = "cache";
/// Persistent directory on mounted external storage
pub const EXTERNAL_FILES_ROOT: &str = "external-files";
/// Cache directory on mounted external storage
pub const EXTERNAL_CACHE_ROOT: &str = "external-cache";
/// Catch-all root addressing the whole filesystem by absolute path
pub const CATCH_ALL_ROOT: &str = "root";

/// A named base directory under which addressable files live.
///
/// An empty `canonical_path` marks the catch-all root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoot {
    name: String,
    canonical_path: PathBuf,
}

impl StorageRoot {
    /// Creates a root for an already canonical directory.
    pub fn new(name: impl Into<String>, canonical_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            canonical_path: canonical_path.into(),
        }
    }

    /// Creates the catch-all root.
    pub fn catch_all(name: impl Into<String>) -> Self {
        Self::new(name, PathBuf::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn canonical_path(&self) -> &Path {
        &self.canonical_path
    }

    pub fn is_catch_all(&self) -> bool {
        self.canonical_path.as_os_str().is_empty()
    }
}

/// Names must survive a token round-trip without escaping.
pub(crate) fn is_url_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~'))
}
