//! Command-line interface for downtidy.
//!
//! This module handles everything outside the scan itself:
//! - Flag parsing
//! - Merging flags over the configuration file and built-in defaults
//! - Preparing the watched directory
//! - Running one scan, or repeating it on an interval

use crate::config::{Config, ConfigError, expand_tilde, seconds_to_duration};
use crate::file_organizer::MoveStatus;
use crate::output::{OutputFormatter, ScanSummary};
use crate::scan::{Scanner, ScannerBuilder};
use crate::sink::TracingSink;
use crate::stability::DEFAULT_STABILITY_WAIT;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Sort finished downloads into category folders.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "downtidy", version, about, long_about = None)]
pub struct Cli {
    /// Directory to organize [default: your downloads folder]
    #[arg(long, alias = "downloads", value_name = "PATH")]
    pub watched_dir: Option<PathBuf>,

    /// Perform exactly one scan and exit
    #[arg(long, alias = "run-once")]
    pub once: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Where log events are written
    #[arg(long, aliases = ["logfile", "log-destination"], value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Seconds a file's size must hold still before it is moved [default: 1.0]
    #[arg(long, alias = "stability-wait-seconds", value_name = "SECONDS")]
    pub stable_wait: Option<f64>,

    /// Configuration file to use instead of the usual lookup
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show what would move without touching anything
    #[arg(long)]
    pub dry_run: bool,

    /// Without --once, rescan every SECONDS until interrupted
    #[arg(long, value_name = "SECONDS")]
    pub interval: Option<f64>,
}

/// Errors that stop the organizer before or between scans.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Cannot use watched directory {}: {source}", .path.display())]
    WatchedDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not determine a default {0}; pass it explicitly")]
    NoDefault(&'static str),
    #[error(transparent)]
    Organize(#[from] crate::file_organizer::OrganizeError),
}

/// Fully resolved run settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub watched_dir: PathBuf,
    pub run_once: bool,
    pub verbose: bool,
    pub log_file: PathBuf,
    pub stability_wait: Duration,
    pub dry_run: bool,
    pub interval: Option<Duration>,
    pub max_code_depth: Option<usize>,
}

impl Settings {
    /// Merges flags over the config file over built-in defaults.
    pub fn resolve(cli: &Cli, config: &Config) -> Result<Self, CliError> {
        let org = &config.organizer;

        let watched_dir = match cli.watched_dir.clone().or_else(|| org.watched_dir.clone()) {
            Some(dir) => expand_tilde(&dir),
            None => default_watched_dir().ok_or(CliError::NoDefault("downloads folder"))?,
        };

        let log_file = match cli.log_file.clone().or_else(|| org.log_file.clone()) {
            Some(path) => expand_tilde(&path),
            None => default_log_file().ok_or(CliError::NoDefault("log file location"))?,
        };

        let stability_wait = match cli.stable_wait.or(org.stability_wait_seconds) {
            Some(secs) => seconds_to_duration("stable-wait", secs)?,
            None => DEFAULT_STABILITY_WAIT,
        };

        let interval = cli
            .interval
            .or(org.interval_seconds)
            .map(|secs| seconds_to_duration("interval", secs))
            .transpose()?;

        Ok(Self {
            watched_dir,
            run_once: cli.once,
            verbose: cli.verbose || org.verbose.unwrap_or(false),
            log_file,
            stability_wait,
            dry_run: cli.dry_run || org.dry_run.unwrap_or(false),
            interval,
            max_code_depth: org.max_code_depth,
        })
    }
}

/// The user's downloads folder, or `~/Downloads` when the platform has none.
pub fn default_watched_dir() -> Option<PathBuf> {
    dirs::download_dir().or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
}

/// Per-user log file location.
pub fn default_log_file() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        dirs::home_dir().map(|home| home.join("Library").join("Logs").join("downtidy.log"))
    } else {
        dirs::data_local_dir().map(|dir| dir.join("downtidy").join("downtidy.log"))
    }
}

/// Creates the watched directory if needed and returns its canonical path.
///
/// This is the one failure that is fatal to an invocation.
pub fn prepare_watched_dir(path: &Path) -> Result<PathBuf, CliError> {
    fs::create_dir_all(path)
        .and_then(|_| fs::canonicalize(path))
        .map_err(|e| CliError::WatchedDir {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Builds the scanner described by the settings and configuration.
pub fn build_scanner(settings: &Settings, config: &Config) -> Result<Scanner, CliError> {
    Ok(ScannerBuilder::new(Arc::new(TracingSink))
        .rules(config.rule_set()?)
        .ignore(config.ignore_rules()?)
        .stability_wait(settings.stability_wait)
        .max_code_depth(settings.max_code_depth)
        .dry_run(settings.dry_run)
        .build())
}

/// Runs the organizer with already-initialized logging.
///
/// Returns after one scan unless an interval is set and `--once` is not.
/// Individual entries failing to move never make this return an error.
pub fn run(settings: &Settings, config: &Config) -> Result<(), CliError> {
    let watched_dir = prepare_watched_dir(&settings.watched_dir)?;
    let scanner = build_scanner(settings, config)?;

    info!(
        watched_dir = %watched_dir.display(),
        stability_wait = ?settings.stability_wait,
        dry_run = settings.dry_run,
        "starting organizer"
    );

    run_scan(&scanner, &watched_dir, settings.dry_run)?;

    let interval = match settings.interval {
        Some(interval) if !settings.run_once => interval,
        _ => return Ok(()),
    };

    loop {
        std::thread::sleep(interval);
        rescan(&scanner, &watched_dir, settings.dry_run);
    }
}

/// Repeats a scan in interval mode. A failure here, such as the watched
/// directory disappearing with an unmounted drive, is logged and the next
/// interval tries again. Returns whether the scan ran.
fn rescan(scanner: &Scanner, watched_dir: &Path, dry_run: bool) -> bool {
    match run_scan(scanner, watched_dir, dry_run) {
        Ok(()) => true,
        Err(e) => {
            error!(
                watched_dir = %watched_dir.display(),
                error = %e,
                "scan failed, retrying next interval"
            );
            false
        }
    }
}

fn run_scan(scanner: &Scanner, watched_dir: &Path, dry_run: bool) -> Result<(), CliError> {
    if dry_run {
        OutputFormatter::dry_run_notice("No files will be moved.");
    }

    let outcomes = scanner.scan_once(watched_dir)?;
    let summary = ScanSummary::from_outcomes(&outcomes);
    OutputFormatter::summary_table(&summary);

    let failed = summary.count(MoveStatus::Failed);
    if failed > 0 {
        warn!(failed, "some entries could not be moved and were left in place");
    }
    info!(
        moved = summary.count(MoveStatus::Moved),
        planned = summary.count(MoveStatus::Planned),
        skipped = summary.count(MoveStatus::SkippedPartial)
            + summary.count(MoveStatus::SkippedUnstable)
            + summary.count(MoveStatus::SkippedSelf),
        failed,
        "scan complete"
    );
    Ok(())
}
