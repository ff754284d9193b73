//! Collision-free destination names.
//!
//! `report.pdf` becomes `report (1).pdf`, then `report (2).pdf`, and so on.
//! The probe is not atomic with the move that follows it; only one organizer
//! may write to a directory at a time.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

/// Returns a path under `target_dir` that does not exist right now.
///
/// `desired_name` is used as-is when free. Otherwise ` (i)` is inserted
/// before the last extension for i = 1, 2, 3, ... until a free name is
/// found. Dangling symlinks count as taken.
///
/// # Examples
///
/// ```
/// use downtidy::namer::resolve;
///
/// let dir = tempfile::tempdir().unwrap();
/// assert_eq!(resolve(dir.path(), "report.pdf"), dir.path().join("report.pdf"));
///
/// std::fs::write(dir.path().join("report.pdf"), b"v1").unwrap();
/// assert_eq!(resolve(dir.path(), "report.pdf"), dir.path().join("report (1).pdf"));
/// ```
pub fn resolve(target_dir: &Path, desired_name: impl AsRef<OsStr>) -> PathBuf {
    let desired_name = desired_name.as_ref();
    let base = target_dir.join(desired_name);
    if !is_taken(&base) {
        return base;
    }

    let (stem, ext) = split_name(desired_name);
    (1u64..)
        .map(|i| target_dir.join(candidate_name(stem, ext, i)))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or(base)
}

fn is_taken(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Splits `name` into stem and extension the way `Path` does: the last dot
/// separates them, a leading dot alone does not.
fn split_name(name: &OsStr) -> (&OsStr, Option<&OsStr>) {
    let path = Path::new(name);
    (path.file_stem().unwrap_or(name), path.extension())
}

fn candidate_name(stem: &OsStr, ext: Option<&OsStr>, i: u64) -> OsString {
    let mut name = stem.to_os_string();
    name.push(format!(" ({})", i));
    if let Some(ext) = ext {
        name.push(".");
        name.push(ext);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_free_name_is_returned_unchanged() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        assert_eq!(
            resolve(temp_dir.path(), "song.mp3"),
            temp_dir.path().join("song.mp3")
        );
    }

    #[test]
    fn test_probe_is_monotonic() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("report.pdf"), b"0").expect("Failed to write test file");
        assert_eq!(resolve(dir, "report.pdf"), dir.join("report (1).pdf"));

        fs::write(dir.join("report (1).pdf"), b"1").expect("Failed to write test file");
        assert_eq!(resolve(dir, "report.pdf"), dir.join("report (2).pdf"));
    }

    #[test]
    fn test_gap_in_sequence_is_reused() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("a.txt"), b"0").expect("Failed to write test file");
        fs::write(dir.join("a (2).txt"), b"2").expect("Failed to write test file");
        assert_eq!(resolve(dir, "a.txt"), dir.join("a (1).txt"));
    }

    #[test]
    fn test_names_without_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::create_dir(dir.join("project")).expect("Failed to create directory");
        fs::write(dir.join(".bashrc"), b"").expect("Failed to write test file");

        assert_eq!(resolve(dir, "project"), dir.join("project (1)"));
        assert_eq!(resolve(dir, ".bashrc"), dir.join(".bashrc (1)"));
    }

    #[test]
    fn test_only_last_extension_is_split() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("backup.tar.gz"), b"").expect("Failed to write test file");
        assert_eq!(resolve(dir, "backup.tar.gz"), dir.join("backup.tar (1).gz"));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_counts_as_taken() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        std::os::unix::fs::symlink(dir.join("nowhere"), dir.join("link.txt"))
            .expect("Failed to create symlink");
        assert_eq!(resolve(dir, "link.txt"), dir.join("link (1).txt"));
    }

    #[test]
    fn test_split_name() {
        let split = |name: &'static str| split_name(OsStr::new(name));
        assert_eq!(split("report.pdf"), (OsStr::new("report"), Some(OsStr::new("pdf"))));
        assert_eq!(split(".hidden"), (OsStr::new(".hidden"), None));
        assert_eq!(split("plain"), (OsStr::new("plain"), None));
        assert_eq!(split("v1.2.zip"), (OsStr::new("v1.2"), Some(OsStr::new("zip"))));
    }
}
