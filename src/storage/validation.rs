//! Path validation
//!
//! Handles canonicalization and boundary-aware root matching.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Symlinks followed before giving up, matching the kernel's `MAXSYMLINKS`.
const MAX_SYMLINK_HOPS: usize = 40;

/// Resolves `path` to an absolute, symlink-free form with no `.` or `..` components.
///
/// Unlike [`std::fs::canonicalize`] the path does not have to exist: every existing
/// prefix is resolved through the filesystem, and the missing tail is appended
/// lexically. A dangling symlink is followed to its target, so the result names the
/// file a creating open would actually touch. Relative paths are anchored at the
/// current directory.
pub fn canonicalize_lenient(path: &Path) -> io::Result<PathBuf> {
    canonicalize_hops(path, 0)
}

fn canonicalize_hops(path: &Path, hops: usize) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // `resolved` is already symlink-free, so popping matches kernel semantics
                resolved.pop();
            }
            Component::Normal(name) => {
                let candidate = resolved.join(name);
                resolved = match fs::canonicalize(&candidate) {
                    Ok(real) => real,
                    Err(_) => match fs::read_link(&candidate) {
                        Ok(target) => {
                            if hops >= MAX_SYMLINK_HOPS {
                                return Err(io::Error::other(format!(
                                    "Too many levels of symbolic links: {}",
                                    candidate.display()
                                )));
                            }
                            // Relative targets are taken from the link's directory
                            canonicalize_hops(&resolved.join(target), hops + 1)?
                        }
                        Err(_) => candidate,
                    },
                };
            }
        }
    }

    Ok(resolved)
}

/// Returns the part of `path` below `root`, or `None` if `path` is not inside it.
///
/// Matching is per component, so `/data/app/files2` is not under `/data/app/files`.
pub fn strip_root<'a>(path: &'a Path, root: &Path) -> Option<&'a Path> {
    path.strip_prefix(root).ok()
}

/// Joins the components of a relative path with `/`, independent of the host separator.
pub fn relative_suffix(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => parts.push(name.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}
