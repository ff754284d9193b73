//! downtidy - keeps a downloads folder sorted
//!
//! This library watches nothing by itself: it exposes a single "scan once"
//! operation that classifies the immediate children of a directory by file
//! extension (promoting folders that contain source code) and moves finished
//! arrivals into category subdirectories without overwriting anything.
//! Partial downloads and files that are still growing are left for the next
//! scan. The binary wires this to flags, a TOML config file and logging.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod entry;
pub mod file_category;
pub mod file_organizer;
pub mod logging;
pub mod namer;
pub mod output;
pub mod scan;
pub mod sink;
pub mod stability;

pub use classifier::Classifier;
pub use config::{Config, ConfigError, IgnoreRules};
pub use entry::WatchedEntry;
pub use file_category::{Category, CategoryRuleSet};
pub use file_organizer::{FileOrganizer, MoveOutcome, MoveStatus, OrganizeError};
pub use scan::{Scanner, ScannerBuilder, scan_once};
pub use sink::{LogSink, MemorySink, TracingSink};
pub use stability::StabilityDetector;
