//! Snapshot of a single child of the watched directory.

use crate::file_category::extension_of;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A path that existed in the watched directory when it was listed.
///
/// Entries are built fresh on every scan and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedEntry {
    /// Absolute path of the entry.
    pub path: PathBuf,
    /// Final path component.
    pub name: String,
    /// Whether the entry is a directory (symlinks are followed).
    pub is_dir: bool,
    /// Lowercased extension with its leading dot, empty if none.
    pub extension: String,
}

impl WatchedEntry {
    /// Stats `path` and builds an entry from it.
    ///
    /// # Errors
    ///
    /// Returns the underlying `io::Error` when the path can no longer be
    /// stat'ed, e.g. because a browser renamed it between listing and now.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no name"))?;

        Ok(Self {
            path: path.to_path_buf(),
            name,
            is_dir: metadata.is_dir(),
            extension: extension_of(path),
        })
    }

    /// Returns true if the name starts with the hidden-file marker.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}
