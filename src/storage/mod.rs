//! File system path handling
//!
//! Canonicalization and root containment checks shared by the codec and resolver.

pub mod validation;

pub use validation::{canonicalize_lenient, relative_suffix, strip_root};
