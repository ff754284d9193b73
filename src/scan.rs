//! One pass over the watched directory.
//!
//! [`Scanner::scan_once`] lists the immediate children of the watched
//! directory and drives each one through the same steps:
//!
//! 1. Hidden entries, category directories and user-ignored names are left
//!    alone without producing an outcome.
//! 2. Partial downloads are skipped.
//! 3. Files must hold the same size across the stability wait.
//! 4. Directories whose destination is themselves are skipped.
//! 5. Everything else is classified and handed to the mover.
//!
//! A scan keeps no state between calls, so running it again with no new
//! arrivals moves nothing.

use crate::classifier::Classifier;
use crate::config::IgnoreRules;
use crate::entry::WatchedEntry;
use crate::file_category::CategoryRuleSet;
use crate::file_organizer::{FileOrganizer, MoveOutcome, MoveStatus, OrganizeError, OrganizeResult};
use crate::sink::{SharedSink, TracingSink};
use crate::stability::{Ineligible, StabilityDetector};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

/// Runs a single scan with the standard rules, logging through `tracing`.
///
/// # Errors
///
/// Fails only when the watched directory cannot be listed or the category
/// directories cannot be created.
pub fn scan_once(watched_dir: &Path, stability_wait: Duration) -> OrganizeResult<Vec<MoveOutcome>> {
    ScannerBuilder::new(Arc::new(TracingSink))
        .stability_wait(stability_wait)
        .build()
        .scan_once(watched_dir)
}

/// Configures a [`Scanner`].
pub struct ScannerBuilder {
    sink: SharedSink,
    rules: CategoryRuleSet,
    ignore: IgnoreRules,
    stability_wait: Duration,
    max_code_depth: Option<usize>,
    dry_run: bool,
}

impl ScannerBuilder {
    pub fn new(sink: SharedSink) -> Self {
        Self {
            sink,
            rules: CategoryRuleSet::default(),
            ignore: IgnoreRules::default(),
            stability_wait: crate::stability::DEFAULT_STABILITY_WAIT,
            max_code_depth: None,
            dry_run: false,
        }
    }

    pub fn rules(mut self, rules: CategoryRuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn ignore(mut self, ignore: IgnoreRules) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn stability_wait(mut self, wait: Duration) -> Self {
        self.stability_wait = wait;
        self
    }

    pub fn max_code_depth(mut self, depth: Option<usize>) -> Self {
        self.max_code_depth = depth;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn build(self) -> Scanner {
        let rules = Arc::new(self.rules);
        Scanner {
            detector: StabilityDetector::new(rules.clone(), self.stability_wait),
            classifier: Classifier::new(rules.clone()).with_max_depth(self.max_code_depth),
            mover: FileOrganizer::new(self.sink.clone()).with_dry_run(self.dry_run),
            ignore: self.ignore,
            sink: self.sink,
            rules,
        }
    }
}

/// Scan orchestrator. The only component that decides what gets moved.
pub struct Scanner {
    rules: Arc<CategoryRuleSet>,
    detector: StabilityDetector,
    classifier: Classifier,
    mover: FileOrganizer,
    ignore: IgnoreRules,
    sink: SharedSink,
}

impl Scanner {
    /// Organizes the immediate children of `watched_dir` once.
    ///
    /// Per-entry problems become outcomes; only startup failures are
    /// returned as errors. Entries are visited in name order.
    pub fn scan_once(&self, watched_dir: &Path) -> OrganizeResult<Vec<MoveOutcome>> {
        self.ensure_category_dirs(watched_dir)?;

        let listing = fs::read_dir(watched_dir).map_err(|e| OrganizeError::InvalidBasePath {
            path: watched_dir.to_path_buf(),
            source: e,
        })?;

        let mut paths: Vec<PathBuf> = listing.flatten().map(|entry| entry.path()).collect();
        paths.sort();

        self.sink.log(
            Level::DEBUG,
            "scan started",
            &[
                ("watched_dir", watched_dir.display().to_string()),
                ("entries", paths.len().to_string()),
            ],
        );

        let outcomes = paths
            .iter()
            .filter_map(|path| self.process(watched_dir, path))
            .collect();
        Ok(outcomes)
    }

    /// Creates every category directory, including the catch-all.
    ///
    /// Skipped in dry-run mode so that a dry run leaves the tree untouched.
    pub fn ensure_category_dirs(&self, watched_dir: &Path) -> OrganizeResult<()> {
        if !watched_dir.is_dir() {
            return Err(OrganizeError::InvalidBasePath {
                path: watched_dir.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "watched directory does not exist",
                ),
            });
        }

        if self.mover.is_dry_run() {
            return Ok(());
        }

        for name in self.rules.category_dir_names() {
            let dir = watched_dir.join(name);
            fs::create_dir_all(&dir)
                .map_err(|e| OrganizeError::DirectoryCreationFailed { path: dir, source: e })?;
        }
        Ok(())
    }

    /// Runs one entry through the pipeline. `None` means the entry is not
    /// ours to look at.
    fn process(&self, watched_dir: &Path, path: &Path) -> Option<MoveOutcome> {
        let entry = match WatchedEntry::from_path(path) {
            Ok(entry) => entry,
            Err(e) => {
                self.debug("entry vanished before it could be examined", path, Some(&e));
                return None;
            }
        };

        if entry.is_hidden()
            || self.rules.is_category_dir_name(&entry.name)
            || self.ignore.is_ignored(&entry.name)
        {
            self.debug("left alone", path, None);
            return None;
        }

        match self.detector.check(&entry) {
            Ok(()) => {}
            Err(Ineligible::Partial) => {
                self.debug("skipping partial download", path, None);
                return Some(MoveOutcome::new(path, MoveStatus::SkippedPartial));
            }
            Err(Ineligible::Unstable) => {
                self.debug("skipping unstable file (still writing)", path, None);
                return Some(MoveOutcome::new(path, MoveStatus::SkippedUnstable));
            }
        }

        let category = self.classifier.classify(&entry);
        let dest_dir = watched_dir.join(category.dir_name());

        if entry.is_dir && is_self_target(&entry.path, &dest_dir) {
            self.debug("directory already in place", path, None);
            return Some(
                MoveOutcome::new(path, MoveStatus::SkippedSelf)
                    .with_category(category)
                    .with_destination(dest_dir),
            );
        }

        Some(self.mover.move_entry(&entry.path, &dest_dir).with_category(category))
    }

    fn debug(&self, message: &str, path: &Path, error: Option<&std::io::Error>) {
        let mut fields = vec![("path", path.display().to_string())];
        if let Some(e) = error {
            fields.push(("error", e.to_string()));
        }
        self.sink.log(Level::DEBUG, message, &fields);
    }
}

/// True when moving `source` into `dest_dir` would put it inside itself or
/// leave it where it already is.
fn is_self_target(source: &Path, dest_dir: &Path) -> bool {
    dest_dir.starts_with(source) || source.parent() == Some(dest_dir)
}
