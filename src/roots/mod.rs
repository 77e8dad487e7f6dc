//! Storage roots
//!
//! Discovers, canonicalizes and holds the fixed set of directories the broker exposes.

pub mod registry;
pub mod root;

pub use registry::{ExternalStorageState, RootLayout, RootRegistry};
pub use root::{
    CACHE_ROOT, CATCH_ALL_ROOT, EXTERNAL_CACHE_ROOT, EXTERNAL_FILES_ROOT, FILES_ROOT, StorageRoot,
};
