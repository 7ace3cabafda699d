//! Resolution of client-supplied file names to paths inside the storage root.
//!
//! Clients name files with arbitrary strings. Only the final path segment of that string is kept,
//! so the resolved path is always a direct child of the root no matter how many `../`, absolute
//! prefixes or embedded separators the name contains. Both `/` and `\` are treated as separators.

use super::errors::{Result, StorageError};
use std::path::{Component, Path, PathBuf};

const SEPARATORS: [char; 2] = ['/', '\\'];

/// The single directory all file store operations are confined to.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    path: PathBuf,
}

/// A client-supplied name reduced to its final segment and joined onto the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    /// The final segment, used as both file name and identifier
    pub name: String,
    /// `root/name`
    pub path: PathBuf,
}

impl StorageRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve `raw` to a direct child of the root.
    ///
    /// Fails with [`StorageError::InvalidName`] when nothing usable is left after stripping
    /// directory components.
    pub fn resolve(&self, raw: &str) -> Result<ResolvedName> {
        let name = final_segment(raw).ok_or_else(|| StorageError::InvalidName { name: raw.to_string() })?;

        Ok(ResolvedName {
            name: name.to_string(),
            path: self.path.join(name),
        })
    }
}

/// Returns the last path segment of `raw`, ignoring trailing separators.
///
/// `None` for names that would not address a file directly under the root: empty segments,
/// `.`, `..`, platform path prefixes such as `C:` on Windows, and anything containing a NUL byte.
pub fn final_segment(raw: &str) -> Option<&str> {
    let trimmed = raw.trim_end_matches(SEPARATORS);
    let segment = trimmed.rsplit(SEPARATORS).next().unwrap_or(trimmed);

    match segment {
        "" | "." | ".." => None,
        s if s.contains('\0') => None,
        s if !is_plain_file_name(s) => None,
        s => Some(s),
    }
}

/// Joining anything other than a single normal component can replace or climb out of the root
fn is_plain_file_name(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}
