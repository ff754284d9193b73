//! Decides whether an entry is safe to move right now.
//!
//! Two things make an entry unsafe: a partial-download suffix (the browser
//! still owns the file and will rename it when done) and a size that is still
//! changing. The size check is the only place the scan deliberately blocks.

use crate::entry::WatchedEntry;
use crate::file_category::CategoryRuleSet;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default delay between the two size samples.
pub const DEFAULT_STABILITY_WAIT: Duration = Duration::from_secs(1);

/// Why an entry was held back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligible {
    /// Extension is an in-progress download suffix.
    Partial,
    /// Size changed, or the entry could not be sampled.
    Unstable,
}

/// Gate that rejects partial downloads and files still being written.
#[derive(Debug, Clone)]
pub struct StabilityDetector {
    rules: Arc<CategoryRuleSet>,
    wait: Duration,
}

impl StabilityDetector {
    /// Creates a detector that sleeps `wait` between size samples.
    pub fn new(rules: Arc<CategoryRuleSet>, wait: Duration) -> Self {
        Self { rules, wait }
    }

    /// Returns true if the entry may be moved during this scan.
    pub fn is_eligible(&self, entry: &WatchedEntry) -> bool {
        self.check(entry).is_ok()
    }

    /// Like [`StabilityDetector::is_eligible`], reporting the reason on rejection.
    ///
    /// Directories are always eligible unless their name carries a partial
    /// suffix. I/O failures count as unstable so the entry is retried on the
    /// next scan instead of aborting this one.
    pub fn check(&self, entry: &WatchedEntry) -> Result<(), Ineligible> {
        if self.rules.is_partial(&entry.extension) {
            debug!(path = %entry.path.display(), "partial download suffix");
            return Err(Ineligible::Partial);
        }

        if entry.is_dir {
            return Ok(());
        }

        let before = match fs::metadata(&entry.path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                debug!(path = %entry.path.display(), error = %e, "could not sample size");
                return Err(Ineligible::Unstable);
            }
        };

        std::thread::sleep(self.wait);

        // Gone after the wait means the browser finished and renamed it.
        let after = match fs::metadata(&entry.path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                debug!(path = %entry.path.display(), error = %e, "vanished during stability wait");
                return Err(Ineligible::Unstable);
            }
        };

        if before == after {
            Ok(())
        } else {
            debug!(
                path = %entry.path.display(),
                before,
                after,
                "size still changing"
            );
            Err(Ineligible::Unstable)
        }
    }
}
