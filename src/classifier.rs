//! Assigns a category to each watched entry.
//!
//! Files are classified by extension alone. Directories are promoted to
//! [`Category::Code`] when anything inside them, at any depth, looks like
//! source code; everything else lands in [`Category::Other`].

use crate::entry::WatchedEntry;
use crate::file_category::{Category, CategoryRuleSet, extension_of};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Combines the rule set with a read-only walk of directory contents.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Arc<CategoryRuleSet>,
    max_depth: Option<usize>,
}

impl Classifier {
    /// Creates a classifier with an unbounded code-detection walk.
    pub fn new(rules: Arc<CategoryRuleSet>) -> Self {
        Self {
            rules,
            max_depth: None,
        }
    }

    /// Caps how deep the code-detection walk descends below the directory.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the category for an entry, never failing.
    ///
    /// # Examples
    ///
    /// ```
    /// use downtidy::classifier::Classifier;
    /// use downtidy::entry::WatchedEntry;
    /// use downtidy::file_category::{Category, CategoryRuleSet};
    /// use std::sync::Arc;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let repo = dir.path().join("repo");
    /// std::fs::create_dir_all(repo.join("src")).unwrap();
    /// std::fs::write(repo.join("src").join("main.rs"), b"fn main() {}").unwrap();
    ///
    /// let classifier = Classifier::new(Arc::new(CategoryRuleSet::default()));
    /// let entry = WatchedEntry::from_path(&repo).unwrap();
    /// assert_eq!(classifier.classify(&entry), Category::Code);
    /// ```
    pub fn classify(&self, entry: &WatchedEntry) -> Category {
        if entry.is_dir {
            if self.code_files(&entry.path).next().is_some() {
                Category::Code
            } else {
                Category::Other
            }
        } else {
            self.rules
                .classify_extension(&entry.extension)
                .unwrap_or(Category::Other)
        }
    }

    /// Classifies a bare file name by its extension.
    ///
    /// ```
    /// use downtidy::classifier::Classifier;
    /// use downtidy::file_category::{Category, CategoryRuleSet};
    /// use std::sync::Arc;
    ///
    /// let classifier = Classifier::new(Arc::new(CategoryRuleSet::default()));
    /// assert_eq!(classifier.classify_file_name("holiday.JPG"), Category::Images);
    /// assert_eq!(classifier.classify_file_name("data.xyz123"), Category::Other);
    /// ```
    pub fn classify_file_name(&self, name: &str) -> Category {
        self.rules
            .classify_extension(&extension_of(Path::new(name)))
            .unwrap_or(Category::Other)
    }

    /// Lazily yields every code file below `dir`.
    ///
    /// Unreadable subdirectories are skipped rather than ending the walk, so a
    /// permission error deep inside a folder only hides that subtree.
    pub fn code_files<'a>(&'a self, dir: &Path) -> impl Iterator<Item = PathBuf> + 'a {
        let mut walker = WalkDir::new(dir).min_depth(1);
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        walker
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(move |e| self.rules.is_code_extension(&extension_of(e.path())))
            .map(|e| e.into_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn classifier() -> Classifier {
        Classifier::new(Arc::new(CategoryRuleSet::default()))
    }

    fn entry(path: &Path) -> WatchedEntry {
        WatchedEntry::from_path(path).expect("entry should build")
    }

    #[test]
    fn test_classify_file_by_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("Movie.MKV");
        fs::write(&path, b"x").expect("Failed to write test file");

        assert_eq!(classifier().classify(&entry(&path)), Category::Videos);
    }

    #[test]
    fn test_unknown_extension_falls_back_to_other() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("blob.xyz123");
        fs::write(&path, b"x").expect("Failed to write test file");

        assert_eq!(classifier().classify(&entry(&path)), Category::Other);
    }

    #[test]
    fn test_directory_with_deep_code_file_is_code() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("repo");
        let deep = root.join("a").join("b").join("c");
        fs::create_dir_all(&deep).expect("Failed to create directories");
        fs::write(deep.join("main.py"), b"print()").expect("Failed to write test file");

        assert_eq!(classifier().classify(&entry(&root)), Category::Code);
    }

    #[test]
    fn test_directory_without_code_is_other() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("photos");
        fs::create_dir_all(root.join("2024")).expect("Failed to create directories");
        fs::write(root.join("2024").join("a.jpg"), b"x").expect("Failed to write test file");

        assert_eq!(classifier().classify(&entry(&root)), Category::Other);
    }

    #[test]
    fn test_max_depth_limits_walk() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("repo");
        let deep = root.join("a").join("b").join("c");
        fs::create_dir_all(&deep).expect("Failed to create directories");
        fs::write(deep.join("lib.rs"), b"fn main() {}").expect("Failed to write test file");

        let shallow = classifier().with_max_depth(Some(2));
        assert_eq!(shallow.classify(&entry(&root)), Category::Other);
        let deep_enough = classifier().with_max_depth(Some(4));
        assert_eq!(deep_enough.classify(&entry(&root)), Category::Code);
    }

    #[test]
    fn test_code_files_is_lazy_and_complete() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("mixed");
        fs::create_dir_all(root.join("src")).expect("Failed to create directories");
        fs::write(root.join("README.md"), b"#").expect("Failed to write test file");
        fs::write(root.join("src").join("app.js"), b"1").expect("Failed to write test file");
        fs::write(root.join("src").join("style.css"), b"1").expect("Failed to write test file");

        let c = classifier();
        let mut found: Vec<_> = c.code_files(&root).collect();
        found.sort();
        assert_eq!(
            found,
            vec![root.join("src").join("app.js"), root.join("src").join("style.css")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subtree_does_not_abort() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("project");
        let locked = root.join("locked");
        let open = root.join("open");
        fs::create_dir_all(&locked).expect("Failed to create directories");
        fs::create_dir_all(&open).expect("Failed to create directories");
        fs::write(locked.join("notes.txt"), b"x").expect("Failed to write test file");
        fs::write(open.join("build.sh"), b"#!/bin/sh").expect("Failed to write test file");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))
            .expect("Failed to lock directory");

        let category = classifier().classify(&entry(&root));

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))
            .expect("Failed to unlock directory");
        assert_eq!(category, Category::Code);
    }
}
