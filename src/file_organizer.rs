//! Relocation of watched entries into their category directories.
//!
//! This module performs the only writes the organizer makes: creating the
//! destination directory, picking a collision-free name and moving the entry.
//! Every attempt is turned into a [`MoveOutcome`] and reported to the log
//! sink; failures never escape to the caller.
use crate::file_category::Category;
use crate::namer;
use crate::sink::SharedSink;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;
use walkdir::WalkDir;

/// Errors that can occur while organizing the watched directory.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The watched directory is missing or cannot be listed.
    #[error("Invalid watched directory {}: {source}", .path.display())]
    InvalidBasePath { path: PathBuf, source: io::Error },
    /// Failed to create a category directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Failed to move an entry to its destination.
    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// The destination is the entry itself, lies inside it, or is where it already is.
    #[error("Refusing to move {} into {}", .from.display(), .to.display())]
    MoveIntoSelf { from: PathBuf, to: PathBuf },
    /// The source path ends in `..` or is a root.
    #[error("Path has no file name: {}", .path.display())]
    NoFileName { path: PathBuf },
}

impl OrganizeError {
    /// The destination involved in the failure, if any.
    pub fn destination(&self) -> Option<&Path> {
        match self {
            Self::FileMoveFailure { to, .. } | Self::MoveIntoSelf { to, .. } => Some(to),
            Self::DirectoryCreationFailed { path, .. } => Some(path),
            Self::InvalidBasePath { .. } | Self::NoFileName { .. } => None,
        }
    }
}

/// Result type for organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Terminal state of one entry in a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MoveStatus {
    /// The entry now lives at the destination.
    Moved,
    /// Dry run: the entry would have been moved to the destination.
    Planned,
    /// Left alone because it carries a partial-download suffix.
    SkippedPartial,
    /// Left alone because its size was still changing or it vanished.
    SkippedUnstable,
    /// Left alone because its destination is itself.
    SkippedSelf,
    /// The move was attempted and failed.
    Failed,
}

impl fmt::Display for MoveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MoveStatus::Moved => "moved",
            MoveStatus::Planned => "planned",
            MoveStatus::SkippedPartial => "skipped (partial)",
            MoveStatus::SkippedUnstable => "skipped (unstable)",
            MoveStatus::SkippedSelf => "skipped (in place)",
            MoveStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Result of processing one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Where the entry was when the scan found it.
    pub source: PathBuf,
    /// Resolved destination, when one was chosen.
    pub destination: Option<PathBuf>,
    /// Category the entry was classified into, if classification ran.
    pub category: Option<Category>,
    pub status: MoveStatus,
    /// Error detail for [`MoveStatus::Failed`].
    pub error: Option<String>,
}

impl MoveOutcome {
    /// An outcome with no destination or category attached yet.
    pub fn new(source: &Path, status: MoveStatus) -> Self {
        Self {
            source: source.to_path_buf(),
            destination: None,
            category: None,
            status,
            error: None,
        }
    }

    /// Attaches the category the entry was classified into.
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Attaches the destination that was considered.
    pub fn with_destination(mut self, destination: PathBuf) -> Self {
        self.destination = Some(destination);
        self
    }
}

/// Moves entries into destination directories, reporting to a log sink.
pub struct FileOrganizer {
    sink: SharedSink,
    dry_run: bool,
}

impl FileOrganizer {
    /// Creates a mover that reports to `sink`.
    pub fn new(sink: SharedSink) -> Self {
        Self {
            sink,
            dry_run: false,
        }
    }

    /// When set, destinations are resolved and reported but nothing moves.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Moves `source` into `dest_dir` under a collision-free name.
    ///
    /// Never panics or returns an error; failures come back as
    /// [`MoveStatus::Failed`] and are logged at error level with the
    /// attempted source and destination.
    ///
    /// # Examples
    ///
    /// ```
    /// use downtidy::file_organizer::{FileOrganizer, MoveStatus};
    /// use downtidy::sink::MemorySink;
    /// use std::sync::Arc;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let file = dir.path().join("report.pdf");
    /// std::fs::write(&file, b"%PDF").unwrap();
    ///
    /// let mover = FileOrganizer::new(Arc::new(MemorySink::new()));
    /// let outcome = mover.move_entry(&file, &dir.path().join("Documents"));
    /// assert_eq!(outcome.status, MoveStatus::Moved);
    /// assert_eq!(outcome.destination, Some(dir.path().join("Documents").join("report.pdf")));
    /// ```
    pub fn move_entry(&self, source: &Path, dest_dir: &Path) -> MoveOutcome {
        match self.relocate(source, dest_dir) {
            Ok(target) => {
                let (status, message) = if self.dry_run {
                    (MoveStatus::Planned, "would move")
                } else {
                    (MoveStatus::Moved, "moved")
                };
                self.sink.log(
                    Level::INFO,
                    message,
                    &[
                        ("source", source.display().to_string()),
                        ("destination", target.display().to_string()),
                    ],
                );
                MoveOutcome::new(source, status).with_destination(target)
            }
            Err(e) => {
                let attempted = e.destination().unwrap_or(dest_dir).to_path_buf();
                self.sink.log(
                    Level::ERROR,
                    "move failed",
                    &[
                        ("source", source.display().to_string()),
                        ("destination", attempted.display().to_string()),
                        ("error", e.to_string()),
                    ],
                );
                MoveOutcome {
                    source: source.to_path_buf(),
                    destination: Some(attempted),
                    category: None,
                    status: MoveStatus::Failed,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn relocate(&self, source: &Path, dest_dir: &Path) -> OrganizeResult<PathBuf> {
        if dest_dir.starts_with(source) || source.parent() == Some(dest_dir) {
            return Err(OrganizeError::MoveIntoSelf {
                from: source.to_path_buf(),
                to: dest_dir.to_path_buf(),
            });
        }

        let file_name = source
            .file_name()
            .ok_or_else(|| OrganizeError::NoFileName {
                path: source.to_path_buf(),
            })?;

        if self.dry_run {
            return Ok(namer::resolve(dest_dir, file_name));
        }

        fs::create_dir_all(dest_dir).map_err(|e| OrganizeError::DirectoryCreationFailed {
            path: dest_dir.to_path_buf(),
            source: e,
        })?;

        let target = namer::resolve(dest_dir, file_name);
        move_path(source, &target).map_err(|e| OrganizeError::FileMoveFailure {
            from: source.to_path_buf(),
            to: target.clone(),
            source: e,
        })?;

        Ok(target)
    }
}

/// Renames `source` to `target`, copying then deleting when they sit on
/// different filesystems.
fn move_path(source: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!(
                source = %source.display(),
                target = %target.display(),
                "rename crosses devices, copying instead"
            );
            copy_then_remove(source, target)
        }
        Err(e) => Err(e),
    }
}

fn copy_then_remove(source: &Path, target: &Path) -> io::Result<()> {
    let is_dir = fs::symlink_metadata(source)?.is_dir();

    let copied = if is_dir {
        copy_dir(source, target)
    } else {
        copy_entry(source, target)
    };

    if let Err(e) = copied {
        // Leave the source intact and drop whatever half-copy exists.
        let _ = if is_dir {
            fs::remove_dir_all(target)
        } else {
            fs::remove_file(target)
        };
        return Err(e);
    }

    if is_dir {
        fs::remove_dir_all(source)
    } else {
        fs::remove_file(source)
    }
}

fn copy_dir(source: &Path, target: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(io::Error::from)?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let dest = target.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)?;
        } else {
            copy_entry(entry.path(), &dest)?;
        }
    }
    Ok(())
}

/// Copies one non-directory entry, recreating symlinks rather than following them.
#[cfg(unix)]
fn copy_entry(source: &Path, target: &Path) -> io::Result<()> {
    if fs::symlink_metadata(source)?.file_type().is_symlink() {
        return std::os::unix::fs::symlink(fs::read_link(source)?, target);
    }
    fs::copy(source, target).map(|_| ())
}

#[cfg(not(unix))]
fn copy_entry(source: &Path, target: &Path) -> io::Result<()> {
    fs::copy(source, target).map(|_| ())
}
