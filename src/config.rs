//! Organizer configuration loaded from TOML.
//!
//! Every setting has a default, so the file is optional. Command-line flags
//! take precedence over anything read here. Supported settings:
//! - Watched directory, stability wait, log file, verbosity, dry run
//! - Depth limit for the code-detection walk and a polling interval
//! - Extra extensions per category
//! - Entries to leave alone by exact name, extension, glob or regex
//!
//! # Configuration File Format
//!
//! ```toml
//! [organizer]
//! watched_dir = "~/Downloads"
//! stability_wait_seconds = 1.0
//! log_file = "~/.local/share/downtidy/downtidy.log"
//! verbose = false
//! dry_run = false
//! max_code_depth = 8
//! interval_seconds = 30
//!
//! [categories]
//! Code = [".zig", ".nim"]
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! extensions = ["tmp"]
//! patterns = ["keep-*"]
//! regex = ["^IMG_\\d+\\.HEIC$"]
//! ```

use crate::file_category::{Category, CategoryRuleSet};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".downtidy.toml";

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    /// A `[categories]` key that is not a category directory name.
    #[error("Unknown category '{0}'")]
    UnknownCategory(String),
    /// A numeric setting outside its allowed range.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Root of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub organizer: OrganizerSettings,

    /// Extra extensions keyed by category directory name.
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub filters: FilterRules,
}

/// Settings mirrored by command-line flags. Unset fields fall back to
/// built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizerSettings {
    pub watched_dir: Option<PathBuf>,
    pub stability_wait_seconds: Option<f64>,
    pub log_file: Option<PathBuf>,
    pub verbose: Option<bool>,
    pub dry_run: Option<bool>,
    pub max_code_depth: Option<usize>,
    pub interval_seconds: Option<f64>,
}

/// Filter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Rules for leaving entries alone.
    #[serde(default)]
    pub exclude: ExcludeRules,
}

/// Rules for excluding top-level entries from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact names to exclude (e.g., "Thumbs.db", "desktop.ini").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the entry name (e.g., "keep-*").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions to exclude, with or without the leading dot.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the entry name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl Config {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.downtidy.toml` in the current directory
    /// 3. Look for `downtidy/config.toml` in the user's config directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but
    /// cannot be read, or if any file found is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("downtidy").join("config.toml");
            if user_config.exists() {
                return Self::load_from_file(&user_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(wait) = self.organizer.stability_wait_seconds {
            seconds_to_duration("stability_wait_seconds", wait)?;
        }
        if let Some(interval) = self.organizer.interval_seconds {
            seconds_to_duration("interval_seconds", interval)?;
        }
        Ok(())
    }

    /// Builds the category rule set: the standard table plus any extra
    /// extensions. Extras never override an earlier category that already
    /// claims the same extension.
    pub fn rule_set(&self) -> Result<CategoryRuleSet, ConfigError> {
        let mut rules = CategoryRuleSet::default();
        for (name, extensions) in &self.categories {
            let category = Category::from_dir_name(name)
                .ok_or_else(|| ConfigError::UnknownCategory(name.clone()))?;
            for ext in extensions {
                rules.add_extension(category, ext);
            }
        }
        Ok(rules)
    }

    /// Compile the exclude rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn ignore_rules(&self) -> Result<IgnoreRules, ConfigError> {
        IgnoreRules::new(&self.filters.exclude)
    }
}

/// Converts a number of seconds into a [`Duration`].
///
/// Rejects negative, NaN and infinite values, and values too large to
/// represent.
pub fn seconds_to_duration(field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidValue {
        field,
        reason: format!("expected a non-negative number of seconds, got {}", value),
    })
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// Compiled exclude rules.
///
/// Patterns are compiled once so that matching each entry is a handful of
/// lookups rather than a reparse.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    filenames: HashSet<String>,
    extensions: HashSet<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl IgnoreRules {
    fn new(rules: &ExcludeRules) -> Result<Self, ConfigError> {
        let patterns = rules
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let regexes = rules
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            filenames: rules.filenames.iter().cloned().collect(),
            extensions: rules
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            patterns,
            regexes,
        })
    }

    /// Returns true if the entry named `name` must be left alone.
    ///
    /// Checks exact name, then extension, then globs, then regexes.
    pub fn is_ignored(&self, name: &str) -> bool {
        if self.filenames.contains(name) {
            return true;
        }

        if let Some(ext) = Path::new(name).extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.extensions.contains(&ext_lower) {
                return true;
            }
        }

        if self.patterns.iter().any(|pattern| pattern.matches(name)) {
            return true;
        }

        self.regexes.iter().any(|regex| regex.is_match(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ignore(exclude: ExcludeRules) -> IgnoreRules {
        Config {
            filters: FilterRules { exclude },
            ..Default::default()
        }
        .ignore_rules()
        .unwrap()
    }

    #[test]
    fn test_default_config_has_no_settings() {
        let config = Config::default();
        assert!(config.organizer.watched_dir.is_none());
        assert!(config.categories.is_empty());
        assert!(!config.ignore_rules().unwrap().is_ignored("anything.pdf"));
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(
            r#"
            [organizer]
            watched_dir = "/srv/incoming"
            stability_wait_seconds = 2.5
            verbose = true
            max_code_depth = 3

            [categories]
            Code = ["zig"]

            [filters.exclude]
            filenames = ["Thumbs.db"]
            "#,
        )
        .unwrap();

        assert_eq!(
            config.organizer.watched_dir,
            Some(PathBuf::from("/srv/incoming"))
        );
        assert_eq!(config.organizer.stability_wait_seconds, Some(2.5));
        assert_eq!(config.organizer.verbose, Some(true));
        assert_eq!(config.organizer.max_code_depth, Some(3));
        assert_eq!(
            config.rule_set().unwrap().classify_extension(".zig"),
            Some(Category::Code)
        );
        assert!(config.ignore_rules().unwrap().is_ignored("Thumbs.db"));
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let result = Config::from_toml("[organizer\nverbose = true");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_negative_wait_is_rejected() {
        let result = Config::from_toml("[organizer]\nstability_wait_seconds = -1.0");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                field: "stability_wait_seconds",
                ..
            })
        ));
    }

    #[test]
    fn test_unrepresentable_interval_is_rejected() {
        let result = Config::from_toml("[organizer]\ninterval_seconds = 1e20");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                field: "interval_seconds",
                ..
            })
        ));
    }

    #[test]
    fn test_seconds_to_duration() {
        assert_eq!(
            seconds_to_duration("wait", 0.5).unwrap(),
            Duration::from_millis(500)
        );
        assert_eq!(seconds_to_duration("wait", 0.0).unwrap(), Duration::ZERO);
        assert!(seconds_to_duration("wait", f64::NAN).is_err());
        assert!(seconds_to_duration("wait", f64::INFINITY).is_err());
        assert!(seconds_to_duration("wait", 1e20).is_err());
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let config = Config::from_toml("[categories]\nSpreadsheets = [\".ods\"]").unwrap();
        assert!(matches!(
            config.rule_set(),
            Err(ConfigError::UnknownCategory(name)) if name == "Spreadsheets"
        ));
    }

    #[test]
    fn test_extra_extension_does_not_override_earlier_category() {
        let config = Config::from_toml("[categories]\nCode = [\".pdf\"]").unwrap();
        assert_eq!(
            config.rule_set().unwrap().classify_extension(".pdf"),
            Some(Category::Documents)
        );
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let result = Config::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_load_from_explicit_file() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[organizer]\ndry_run = true\n").expect("Failed to write config");

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.organizer.dry_run, Some(true));
    }

    #[test]
    fn test_exclude_exact_filename() {
        let rules = ignore(ExcludeRules {
            filenames: vec!["Thumbs.db".to_string(), "desktop.ini".to_string()],
            ..Default::default()
        });

        assert!(rules.is_ignored("Thumbs.db"));
        assert!(!rules.is_ignored("image.jpg"));
    }

    #[test]
    fn test_exclude_extensions() {
        let rules = ignore(ExcludeRules {
            extensions: vec![".TMP".to_string(), "bak".to_string()],
            ..Default::default()
        });

        assert!(rules.is_ignored("scratch.tmp"));
        assert!(rules.is_ignored("old.BAK"));
        assert!(!rules.is_ignored("notes.txt"));
    }

    #[test]
    fn test_exclude_glob_patterns() {
        let rules = ignore(ExcludeRules {
            patterns: vec!["keep-*".to_string(), "[0-9]*.iso".to_string()],
            ..Default::default()
        });

        assert!(rules.is_ignored("keep-this.pdf"));
        assert!(rules.is_ignored("22.04.iso"));
        assert!(!rules.is_ignored("ubuntu.iso"));
    }

    #[test]
    fn test_exclude_regex() {
        let rules = ignore(ExcludeRules {
            regex: vec![r"^IMG_\d+\.HEIC$".to_string()],
            ..Default::default()
        });

        assert!(rules.is_ignored("IMG_0042.HEIC"));
        assert!(!rules.is_ignored("IMG_0042.jpg"));
    }

    #[test]
    fn test_invalid_regex_returns_error() {
        let config = Config {
            filters: FilterRules {
                exclude: ExcludeRules {
                    regex: vec!["[invalid".to_string()],
                    ..Default::default()
                },
            },
            ..Default::default()
        };

        assert!(matches!(
            config.ignore_rules(),
            Err(ConfigError::InvalidRegexPattern { .. })
        ));
    }

    #[test]
    fn test_invalid_glob_pattern_returns_error() {
        let config = Config {
            filters: FilterRules {
                exclude: ExcludeRules {
                    patterns: vec!["[invalid".to_string()],
                    ..Default::default()
                },
            },
            ..Default::default()
        };

        assert!(config.ignore_rules().is_err());
    }

    #[test]
    fn test_expand_tilde() {
        let plain = Path::new("/var/tmp");
        assert_eq!(expand_tilde(plain), PathBuf::from("/var/tmp"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde(Path::new("~/Downloads")), home.join("Downloads"));
        }
    }
}
