//! daylog - process-embedded logging with daily file rotation
//!
//! Writes single-line entries to the console or to `{prefix}_{YYYY-MM-DD}.log`
//! files, rotates the file at local midnight, and deletes files older than a
//! retention period.

pub mod config;
pub mod error;
pub mod global;
pub mod level;
pub mod logger;
pub mod retention;
pub mod scheduler;
pub mod sink;

#[cfg(test)]
mod test_support;

pub use config::{LoggerConfig, OutputKind, ResolvedConfig, DEFAULT_RETENTION_DAYS};
pub use error::{Error, Result};
pub use global::{global_logger, init_global_logger, reset_global_logger, set_level};
pub use level::Level;
pub use logger::Logger;
pub use retention::{cleanup_old_logs, retention_cutoff, CleanupEvent, CleanupReport};
pub use scheduler::until_next_midnight;
pub use sink::{format_line, log_file_name, log_file_path};
