//! Tracing subscriber setup for the binary: console plus a log file.

use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Default filter directive for the given verbosity.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Installs the global subscriber writing to stdout and to `log_file`.
///
/// `RUST_LOG` overrides the level picked by `verbose`. The returned guard
/// flushes the file writer when dropped and must be held for the life of
/// the process.
///
/// # Errors
///
/// Fails if the log file's directory cannot be created, the file cannot be
/// opened for appending, or a global subscriber is already installed.
pub fn init_logger(log_file: &Path, verbose: bool) -> io::Result<WorkerGuard> {
    let directory = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(directory)?;

    let file_name = log_file
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "log path has no file name"))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(directory)
        .map_err(io::Error::other)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stdout)
                .with_target(false)
                .with_ansi(true),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_target(false)
                .with_ansi(false),
        )
        .with(filter_layer)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true), "debug");
        assert_eq!(default_directive(false), "info");
    }

    #[test]
    fn test_directory_as_log_file_is_error() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let taken = temp_dir.path().join("downtidy.log");
        fs::create_dir(&taken).expect("Failed to create directory");

        assert!(init_logger(&taken, false).is_err());
        assert!(init_logger(temp_dir.path(), false).is_err());
    }
}
