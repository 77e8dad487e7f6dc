//! Path resolver implementation

use log::warn;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{BrokerError, BrokerResult};
use crate::roots::RootRegistry;
use crate::storage::canonicalize_lenient;

/// Resolves suffixes against the shared root table. The resolved path need not exist.
#[derive(Debug, Clone)]
pub struct PathResolver {
    registry: Arc<RootRegistry>,
}

impl PathResolver {
    pub fn new(registry: Arc<RootRegistry>) -> Self {
        Self { registry }
    }

    /// Resolves `relative_suffix` under the root named `root_name`.
    ///
    /// For a specific root the canonical result must equal the root path joined with
    /// the suffix; any `..` or symlink that changes the target is an escape. The
    /// catch-all root takes the suffix as an absolute path with no containment check.
    pub fn resolve(&self, root_name: &str, relative_suffix: &str) -> BrokerResult<PathBuf> {
        let root = self
            .registry
            .get(root_name)
            .ok_or_else(|| BrokerError::NotFound(format!("Unknown root '{}'", root_name)))?;

        if relative_suffix.contains('\0') {
            return Err(BrokerError::InvalidArgument(
                "Path contains a NUL byte".into(),
            ));
        }

        if root.is_catch_all() {
            let absolute = Path::new("/").join(relative_suffix);
            return Ok(canonicalize_lenient(&absolute)?);
        }

        let suffix = Path::new(relative_suffix);
        if suffix.has_root() {
            warn!(
                "Rejected absolute suffix '{}' for root '{}'",
                relative_suffix, root_name
            );
            return Err(BrokerError::AccessDenied(format!(
                "Absolute path not allowed under root '{}'",
                root_name
            )));
        }

        let joined = root.canonical_path().join(suffix);
        let canonical = canonicalize_lenient(&joined)?;

        if canonical != joined || !canonical.starts_with(root.canonical_path()) {
            warn!(
                "Rejected escape from root '{}': '{}' resolves to {}",
                root_name,
                relative_suffix,
                canonical.display()
            );
            return Err(BrokerError::AccessDenied(format!(
                "'{}' escapes root '{}'",
                relative_suffix, root_name
            )));
        }

        Ok(canonical)
    }
}
