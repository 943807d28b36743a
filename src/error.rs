//! Error types for logger construction and maintenance

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the caller of a logger operation
///
/// Everything here is a configuration or maintenance failure. Writing a log
/// entry never returns an error.
#[derive(Debug, Error)]
pub enum Error {
    /// Output type is neither "console" nor "file"
    #[error("invalid output type: {0}. Must be 'console' or 'file'")]
    InvalidOutput(String),

    /// Level name could not be parsed
    #[error("invalid log level: {0}. Must be one of debug, info, warn, error")]
    InvalidLevel(String),

    /// File output without a log directory
    #[error("log directory is required for file output")]
    MissingLogDir,

    /// File output without a file prefix
    #[error("file prefix is required for file output")]
    MissingFilePrefix,

    /// Log directory could not be created
    #[error("failed to create log directory {}", path.display())]
    CreateLogDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Log file could not be opened for appending
    #[error("failed to open log file {}", path.display())]
    OpenLogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Log directory could not be listed during cleanup
    #[error("failed to read log directory {}", path.display())]
    ReadLogDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Background rotation thread could not be started
    #[error("failed to start rotation scheduler")]
    SpawnScheduler(#[source] io::Error),

    /// Config file could not be read
    #[error("failed to read config file {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Config file is not valid TOML for `LoggerConfig`
    #[error("failed to parse logger config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_output_message_names_value() {
        let err = Error::InvalidOutput("syslog".to_string());
        assert_eq!(
            err.to_string(),
            "invalid output type: syslog. Must be 'console' or 'file'"
        );
    }

    #[test]
    fn test_io_errors_keep_source() {
        use std::error::Error as _;

        let err = Error::OpenLogFile {
            path: PathBuf::from("/tmp/app_2024-01-01.log"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("app_2024-01-01.log"));
        assert!(err.source().is_some());
    }
}
