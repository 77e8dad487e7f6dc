//! Root registry
//!
//! Builds the ordered, immutable table of storage roots once per broker.
//! Specific roots come first and the catch-all comes last, so prefix lookup
//! never lets the catch-all preempt a more specific match.

use log::{debug, info};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{BrokerError, BrokerResult};
use crate::roots::root::{
    CACHE_ROOT, CATCH_ALL_ROOT, EXTERNAL_CACHE_ROOT, EXTERNAL_FILES_ROOT, FILES_ROOT, StorageRoot,
    is_url_safe_name,
};

/// Availability of removable or shared storage, sampled once at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalStorageState {
    Mounted,
    Unmounted,
}

impl ExternalStorageState {
    /// A configured external directory counts as mounted only if it exists right now.
    pub fn probe(dir: Option<&Path>) -> Self {
        match dir {
            Some(dir) if dir.is_dir() => ExternalStorageState::Mounted,
            _ => ExternalStorageState::Unmounted,
        }
    }
}

/// Directories of the host environment the registry is built from.
#[derive(Debug, Clone)]
pub struct RootLayout {
    pub files_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub external_storage_dir: Option<PathBuf>,
}

/// Ordered sequence of storage roots.
#[derive(Debug, Clone)]
pub struct RootRegistry {
    roots: Vec<StorageRoot>,
}

impl RootRegistry {
    /// Builds a registry from explicit roots, checking the table invariants.
    ///
    /// Does not touch the filesystem; paths must already be canonical.
    pub fn new(roots: Vec<StorageRoot>) -> BrokerResult<Self> {
        let mut seen = HashSet::new();

        for (index, root) in roots.iter().enumerate() {
            if !is_url_safe_name(root.name()) {
                return Err(BrokerError::Configuration(format!(
                    "Root name '{}' is not URL-safe",
                    root.name()
                )));
            }
            if !seen.insert(root.name()) {
                return Err(BrokerError::Configuration(format!(
                    "Duplicate root name '{}'",
                    root.name()
                )));
            }

            if root.is_catch_all() {
                if index + 1 != roots.len() {
                    return Err(BrokerError::Configuration(format!(
                        "Catch-all root '{}' must be registered last",
                        root.name()
                    )));
                }
                continue;
            }

            let path = root.canonical_path();
            let lexically_clean = path
                .components()
                .all(|c| !matches!(c, Component::CurDir | Component::ParentDir));
            if !path.is_absolute() || !lexically_clean {
                return Err(BrokerError::Configuration(format!(
                    "Root '{}' path {} is not canonical",
                    root.name(),
                    path.display()
                )));
            }
        }

        Ok(Self { roots })
    }

    /// Enumerates the standard roots for `layout`, creating and canonicalizing each one.
    ///
    /// Order: files, cache, then external-files and external-cache if external storage
    /// is mounted, then the catch-all. Any directory that cannot be resolved is fatal.
    pub fn from_layout(layout: &RootLayout) -> BrokerResult<Self> {
        let mut roots = vec![
            StorageRoot::new(FILES_ROOT, canonical_dir(&layout.files_dir)?),
            StorageRoot::new(CACHE_ROOT, canonical_dir(&layout.cache_dir)?),
        ];

        let external = layout.external_storage_dir.as_deref();
        match (ExternalStorageState::probe(external), external) {
            (ExternalStorageState::Mounted, Some(base)) => {
                roots.push(StorageRoot::new(
                    EXTERNAL_FILES_ROOT,
                    canonical_dir(&base.join("files"))?,
                ));
                roots.push(StorageRoot::new(
                    EXTERNAL_CACHE_ROOT,
                    canonical_dir(&base.join("cache"))?,
                ));
            }
            _ => debug!("External storage not mounted; skipping external roots"),
        }

        roots.push(StorageRoot::catch_all(CATCH_ALL_ROOT));

        let registry = Self::new(roots)?;
        for root in registry.roots() {
            info!(
                "Registered root '{}' -> {}",
                root.name(),
                if root.is_catch_all() {
                    "<filesystem>".to_string()
                } else {
                    root.canonical_path().display().to_string()
                }
            );
        }
        Ok(registry)
    }

    /// Roots in priority order.
    pub fn roots(&self) -> &[StorageRoot] {
        &self.roots
    }

    /// Looks up a root by name.
    pub fn get(&self, name: &str) -> Option<&StorageRoot> {
        self.roots.iter().find(|root| root.name() == name)
    }

    pub fn catch_all(&self) -> Option<&StorageRoot> {
        self.roots.iter().find(|root| root.is_catch_all())
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

fn canonical_dir(dir: &Path) -> BrokerResult<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| {
        BrokerError::Configuration(format!("Cannot create {}: {}", dir.display(), e))
    })?;
    fs::canonicalize(dir).map_err(|e| {
        BrokerError::Configuration(format!("Cannot canonicalize {}: {}", dir.display(), e))
    })
}
