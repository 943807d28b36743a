//! Logger configuration
//!
//! `LoggerConfig` is what callers write (in code or TOML). `resolve` applies
//! defaults and validates it once, producing the `ResolvedConfig` a logger is
//! built from.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::level::Level;

/// Default retention period in days
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

const OUTPUT_CONSOLE: &str = "console";
const OUTPUT_FILE: &str = "file";

/// Logger configuration as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Minimum severity to emit (default: debug)
    #[serde(default)]
    pub level: Level,

    /// Output type: "console" (default) or "file"
    #[serde(default = "default_output")]
    pub output: String,

    /// Directory for log files (required for file output)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Prefix for log file names (required for file output)
    #[serde(default)]
    pub file_prefix: Option<String>,

    /// Days to keep log files; zero or negative means the default of 7
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

fn default_output() -> String {
    OUTPUT_CONSOLE.to_string()
}

fn default_retention_days() -> i64 {
    DEFAULT_RETENTION_DAYS as i64
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Level::default(),
            output: default_output(),
            log_dir: None,
            file_prefix: None,
            retention_days: default_retention_days(),
        }
    }
}

impl LoggerConfig {
    /// Console output at the default level
    pub fn console() -> Self {
        Self::default()
    }

    /// Daily files named `{prefix}_{YYYY-MM-DD}.log` under `log_dir`
    pub fn file(log_dir: impl Into<PathBuf>, file_prefix: impl Into<String>) -> Self {
        Self {
            output: OUTPUT_FILE.to_string(),
            log_dir: Some(log_dir.into()),
            file_prefix: Some(file_prefix.into()),
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_retention_days(mut self, days: i64) -> Self {
        self.retention_days = days;
        self
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply defaults and validate
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let output = match self.output.trim() {
            "" | OUTPUT_CONSOLE => OutputKind::Console,
            OUTPUT_FILE => {
                let log_dir = self
                    .log_dir
                    .clone()
                    .filter(|d| !d.as_os_str().is_empty())
                    .ok_or(Error::MissingLogDir)?;
                let file_prefix = self
                    .file_prefix
                    .clone()
                    .filter(|p| !p.is_empty())
                    .ok_or(Error::MissingFilePrefix)?;
                OutputKind::File {
                    log_dir,
                    file_prefix,
                }
            }
            other => return Err(Error::InvalidOutput(other.to_string())),
        };

        let retention_days = if self.retention_days <= 0 {
            DEFAULT_RETENTION_DAYS
        } else {
            u32::try_from(self.retention_days).unwrap_or(u32::MAX)
        };

        Ok(ResolvedConfig {
            level: self.level,
            output,
            retention_days,
        })
    }
}

/// Where a logger writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputKind {
    Console,
    File {
        log_dir: PathBuf,
        file_prefix: String,
    },
}

impl OutputKind {
    /// The configuration name of this output
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKind::Console => OUTPUT_CONSOLE,
            OutputKind::File { .. } => OUTPUT_FILE,
        }
    }
}

/// Configuration with defaults applied and validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub level: Level,
    pub output: OutputKind,
    pub retention_days: u32,
}
