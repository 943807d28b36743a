//! Process-wide logger
//!
//! The first successful `init_global_logger` call creates the global logger;
//! later calls hand back that same instance and ignore their configuration.
//! `reset_global_logger` closes and clears it so tests can start fresh.
//!
//! ```rust,no_run
//! use daylog::{init_global_logger, LoggerConfig};
//!
//! init_global_logger(&LoggerConfig::file("/var/log/myapp", "myapp")).unwrap();
//! daylog::info!("listening on port {}", 8080);
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::LoggerConfig;
use crate::error::Result;
use crate::level::Level;
use crate::logger::Logger;

static GLOBAL_LOGGER: Mutex<Option<Arc<Logger>>> = Mutex::new(None);

fn registry() -> MutexGuard<'static, Option<Arc<Logger>>> {
    GLOBAL_LOGGER.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Create the global logger, or return the existing one
///
/// When a global logger already exists, `config` is neither validated nor
/// applied. A failed construction leaves the registry empty.
pub fn init_global_logger(config: &LoggerConfig) -> Result<Arc<Logger>> {
    let mut global = registry();
    if let Some(logger) = global.as_ref() {
        tracing::debug!("Global logger already initialized");
        return Ok(Arc::clone(logger));
    }

    let logger = Arc::new(Logger::new(config)?);
    *global = Some(Arc::clone(&logger));
    Ok(logger)
}

/// The global logger, if one has been initialized
pub fn global_logger() -> Option<Arc<Logger>> {
    registry().clone()
}

/// Close and clear the global logger
pub fn reset_global_logger() {
    let logger = registry().take();
    if let Some(logger) = logger {
        logger.close();
    }
}

/// Log through the global logger; no-op when none is initialized
#[track_caller]
pub fn log(level: Level, message: impl fmt::Display) {
    if let Some(logger) = global_logger() {
        logger.log(level, message);
    }
}

#[track_caller]
pub fn debug(message: impl fmt::Display) {
    log(Level::Debug, message);
}

#[track_caller]
pub fn info(message: impl fmt::Display) {
    log(Level::Info, message);
}

#[track_caller]
pub fn warn(message: impl fmt::Display) {
    log(Level::Warn, message);
}

#[track_caller]
pub fn error(message: impl fmt::Display) {
    log(Level::Error, message);
}

/// Change the global logger's level; no-op when none is initialized
pub fn set_level(level: Level) {
    if let Some(logger) = global_logger() {
        logger.set_level(level);
    }
}

/// Log a formatted message at debug level through the global logger
#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => {
        $crate::global::debug(::std::format_args!($($arg)+))
    };
}

/// Log a formatted message at info level through the global logger
#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {
        $crate::global::info(::std::format_args!($($arg)+))
    };
}

/// Log a formatted message at warn level through the global logger
#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {
        $crate::global::warn(::std::format_args!($($arg)+))
    };
}

/// Log a formatted message at error level through the global logger
#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => {
        $crate::global::error(::std::format_args!($($arg)+))
    };
}

/// Serializes tests that touch the process-wide registry
#[cfg(test)]
pub(crate) static TEST_LOCK: Mutex<()> = Mutex::new(());
