//! Console summary printed after each scan.
//!
//! Per-entry events already go through the log sink; this module only renders
//! the end-of-scan table so an operator can see at a glance what happened.

use crate::file_organizer::{MoveOutcome, MoveStatus};
use colored::*;
use std::collections::BTreeMap;

/// Counts of outcomes for one scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    /// Moved (or planned) entries per category directory name.
    pub by_category: BTreeMap<String, usize>,
    /// Entries per terminal status.
    pub by_status: BTreeMap<MoveStatus, usize>,
}

impl ScanSummary {
    /// Tallies a scan's outcomes.
    pub fn from_outcomes(outcomes: &[MoveOutcome]) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            *summary.by_status.entry(outcome.status).or_insert(0) += 1;
            if matches!(outcome.status, MoveStatus::Moved | MoveStatus::Planned)
                && let Some(category) = outcome.category
            {
                *summary
                    .by_category
                    .entry(category.dir_name().to_string())
                    .or_insert(0) += 1;
            }
        }
        summary
    }

    /// Number of entries with the given status.
    pub fn count(&self, status: MoveStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Total number of outcomes.
    pub fn total(&self) -> usize {
        self.by_status.values().sum()
    }
}

/// Prints styled CLI output.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints the per-category and per-status table for one scan.
    pub fn summary_table(summary: &ScanSummary) {
        if summary.total() == 0 {
            println!("{}", "Nothing to organize.".cyan());
            return;
        }

        Self::header("SUMMARY");

        let width = summary
            .by_category
            .keys()
            .map(String::len)
            .chain(summary.by_status.keys().map(|s| s.to_string().len()))
            .max()
            .unwrap_or(0)
            .max(8); // At least "Category" width

        if !summary.by_category.is_empty() {
            println!("{:<width$} | {}", "Category".bold(), "Entries".bold(), width = width);
            println!("{}", "-".repeat(width + 10));
            for (category, count) in &summary.by_category {
                println!(
                    "{:<width$} | {}",
                    category,
                    count.to_string().green(),
                    width = width
                );
            }
            println!("{}", "-".repeat(width + 10));
        }

        for (status, count) in &summary.by_status {
            let count = count.to_string();
            let count = match status {
                MoveStatus::Moved | MoveStatus::Planned => count.green(),
                MoveStatus::Failed => count.red().bold(),
                _ => count.yellow(),
            };
            println!("{:<width$} | {}", status.to_string(), count, width = width);
        }
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::Category;
    use std::path::Path;

    #[test]
    fn test_summary_counts() {
        let outcomes = vec![
            MoveOutcome::new(Path::new("/d/a.jpg"), MoveStatus::Moved).with_category(Category::Images),
            MoveOutcome::new(Path::new("/d/b.png"), MoveStatus::Moved).with_category(Category::Images),
            MoveOutcome::new(Path::new("/d/c.part"), MoveStatus::SkippedPartial),
            MoveOutcome::new(Path::new("/d/d.pdf"), MoveStatus::Failed)
                .with_category(Category::Documents),
        ];

        let summary = ScanSummary::from_outcomes(&outcomes);
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.count(MoveStatus::Moved), 2);
        assert_eq!(summary.count(MoveStatus::SkippedUnstable), 0);
        assert_eq!(summary.by_category.get("Images"), Some(&2));
        assert_eq!(summary.by_category.get("Documents"), None);
    }
}
