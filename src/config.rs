//! Analyzer configuration.
//!
//! An optional `archscope.yaml` at the repository root tunes ignore rules,
//! dead-code entry points and the history enrichment window.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest accepted `recent_days` (a century).
pub const MAX_RECENT_DAYS: i64 = 36_500;

/// Config file names looked for at the repository root, in order.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["archscope.yaml", ".archscope.yaml"];

/// Ignore patterns used when the config does not list its own.
pub const DEFAULT_IGNORE: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "coverage",
    "vendor",
    "target",
    "__pycache__",
    ".next",
    "out",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyzerConfig {
    /// Ignore patterns (segment names, leading paths or globs)
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
    /// Whether dead-code detection looks at test files (default: false)
    #[serde(default)]
    pub include_tests: bool,
    /// Extra entry-point basenames on top of index/main/app
    #[serde(default)]
    pub entry_points: Vec<String>,
    /// Whether to compute co-changed files (default: true)
    #[serde(default = "default_true")]
    pub cochange: bool,
    /// Minimum co-change correlation (default: 0.3)
    #[serde(default = "default_cochange_threshold")]
    pub cochange_threshold: f64,
    /// Co-changed files kept per file (default: 5)
    #[serde(default = "default_cochange_limit")]
    pub cochange_limit: usize,
    /// Files enriched with history at once (default: 5)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Window for recently modified files, in days (default: 90)
    #[serde(default = "default_recent_days")]
    pub recent_days: i64,
    /// Explicit tsconfig/jsconfig path, relative to the root
    #[serde(default)]
    pub alias_config: Option<PathBuf>,
}

fn default_ignore() -> Vec<String> {
    DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect()
}

fn default_true() -> bool {
    true
}

fn default_cochange_threshold() -> f64 {
    0.3
}

fn default_cochange_limit() -> usize {
    5
}

fn default_batch_size() -> usize {
    5
}

fn default_recent_days() -> i64 {
    90
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            ignore: default_ignore(),
            include_tests: false,
            entry_points: Vec::new(),
            cochange: true,
            cochange_threshold: default_cochange_threshold(),
            cochange_limit: default_cochange_limit(),
            batch_size: default_batch_size(),
            recent_days: default_recent_days(),
            alias_config: None,
        }
    }
}

impl AnalyzerConfig {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AnalyzerConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `explicit` if given, else the first default config under `root`,
    /// else the defaults.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::parse_file(path);
        }
        match find_config(root) {
            Some(path) => Self::parse_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.cochange_threshold) {
            return Err(ConfigError::Invalid(format!(
                "cochange_threshold {} is outside 0..=1",
                self.cochange_threshold
            )));
        }
        if !(0..=MAX_RECENT_DAYS).contains(&self.recent_days) {
            return Err(ConfigError::Invalid(format!(
                "recent_days {} is outside 0..={MAX_RECENT_DAYS}",
                self.recent_days
            )));
        }
        Ok(())
    }
}

/// Locate a default config file under `root`.
pub fn find_config(root: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}
