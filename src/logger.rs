//! Per-instance logger
//!
//! A `Logger` serializes every write, level change, rotation and close through
//! one mutex. File-backed loggers also own a background thread that rotates
//! the file and prunes expired files at each local midnight.

use std::fmt;
use std::io::Write;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Local;
use tracing::debug;

use crate::config::{LoggerConfig, OutputKind, ResolvedConfig};
use crate::error::Result;
use crate::level::Level;
use crate::retention::{cleanup_old_logs, retention_cutoff, CleanupEvent};
use crate::scheduler::{until_next_midnight, RotationScheduler};
use crate::sink::{Sink, SinkState};

/// State shared between a `Logger` and its rotation thread
struct Core {
    state: Mutex<SinkState>,
    output: OutputKind,
    retention_days: u32,
}

impl Core {
    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn rotate(&self) -> Result<()> {
        match &self.output {
            OutputKind::File {
                log_dir,
                file_prefix,
            } => self
                .lock()
                .rotate(log_dir, file_prefix, Local::now().date_naive()),
            OutputKind::Console => Ok(()),
        }
    }

    /// Scan, delete and report expired files under one hold of the lock
    fn cleanup(&self) -> Result<usize> {
        let OutputKind::File {
            log_dir,
            file_prefix,
        } = &self.output
        else {
            return Ok(0);
        };

        let mut state = self.lock();
        if state.closed {
            return Ok(0);
        }

        let cutoff = retention_cutoff(Local::now(), self.retention_days);
        let report = cleanup_old_logs(log_dir, file_prefix, cutoff)?;

        for event in &report.events {
            match event {
                CleanupEvent::Deleted(path) => state.report(
                    Level::Info,
                    format_args!("Deleted old log file: {}", path.display()),
                ),
                CleanupEvent::Warning(warning) => state.report(Level::Warn, warning),
            }
        }

        Ok(report.deleted_count())
    }

    fn rotate_and_cleanup(&self) {
        if let Err(e) = self.rotate() {
            self.lock()
                .report(Level::Error, format_args!("Error rotating log file: {}", e));
        }
        if let Err(e) = self.cleanup() {
            self.lock().report(
                Level::Error,
                format_args!("Error cleaning up old logs: {}", e),
            );
        }
    }
}

/// A logger writing to the console, a daily file, or an arbitrary writer
pub struct Logger {
    core: Arc<Core>,
    scheduler: Mutex<Option<RotationScheduler>>,
}

impl Logger {
    /// Build a logger from `config`
    ///
    /// File loggers create the log directory if needed, open today's file,
    /// remove expired files, and start the midnight rotation thread.
    pub fn new(config: &LoggerConfig) -> Result<Self> {
        Self::from_resolved(config.resolve()?)
    }

    /// Build a logger from an already validated configuration
    pub fn from_resolved(config: ResolvedConfig) -> Result<Self> {
        Self::start(config, || until_next_midnight(Local::now()))
    }

    /// Build a logger whose rotation cycle runs every `interval`
    #[cfg(test)]
    fn with_cycle_interval(config: ResolvedConfig, interval: Duration) -> Result<Self> {
        Self::start(config, move || interval)
    }

    fn start<D>(config: ResolvedConfig, next_delay: D) -> Result<Self>
    where
        D: FnMut() -> Duration + Send + 'static,
    {
        let sink = match &config.output {
            OutputKind::Console => Sink::console(),
            OutputKind::File {
                log_dir,
                file_prefix,
            } => Sink::open_file(log_dir, file_prefix, Local::now().date_naive())?,
        };

        let core = Arc::new(Core {
            state: Mutex::new(SinkState::new(config.level, sink)),
            output: config.output,
            retention_days: config.retention_days,
        });

        if !matches!(core.output, OutputKind::File { .. }) {
            return Ok(Self::with_core(core, None));
        }

        core.cleanup()?;

        let cycle_core = Arc::clone(&core);
        let scheduler =
            RotationScheduler::spawn_with(next_delay, move || cycle_core.rotate_and_cleanup())?;
        debug!(output = core.output.as_str(), "Logger started");

        Ok(Self::with_core(core, Some(scheduler)))
    }

    /// Build a logger that writes every entry to `writer`
    ///
    /// Behaves like a console logger: no rotation and no retention.
    pub fn with_writer(level: Level, writer: impl Write + Send + 'static) -> Self {
        let core = Arc::new(Core {
            state: Mutex::new(SinkState::new(level, Sink::Writer(Box::new(writer)))),
            output: OutputKind::Console,
            retention_days: 0,
        });
        Self::with_core(core, None)
    }

    fn with_core(core: Arc<Core>, scheduler: Option<RotationScheduler>) -> Self {
        Self {
            core,
            scheduler: Mutex::new(scheduler),
        }
    }

    /// Emit `message` at `level` if it passes the current threshold
    #[track_caller]
    pub fn log(&self, level: Level, message: impl fmt::Display) {
        let location = Location::caller();
        let mut state = self.core.lock();
        if state.level.allows(level) {
            state.write_entry(location, level, message);
        }
    }

    #[track_caller]
    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Level::Debug, message);
    }

    #[track_caller]
    pub fn info(&self, message: impl fmt::Display) {
        self.log(Level::Info, message);
    }

    #[track_caller]
    pub fn warn(&self, message: impl fmt::Display) {
        self.log(Level::Warn, message);
    }

    #[track_caller]
    pub fn error(&self, message: impl fmt::Display) {
        self.log(Level::Error, message);
    }

    /// Change the minimum level for all subsequent calls
    pub fn set_level(&self, level: Level) {
        self.core.lock().level = level;
    }

    pub fn level(&self) -> Level {
        self.core.lock().level
    }

    pub fn output(&self) -> &OutputKind {
        &self.core.output
    }

    pub fn retention_days(&self) -> u32 {
        self.core.retention_days
    }

    /// Path of the file currently being written, if any
    pub fn current_log_path(&self) -> Option<PathBuf> {
        self.core
            .lock()
            .sink
            .as_ref()
            .and_then(Sink::path)
            .map(PathBuf::from)
    }

    pub fn is_closed(&self) -> bool {
        self.core.lock().closed
    }

    /// Reopen the file for today's date
    ///
    /// On the same day this reopens the same file in append mode. Does
    /// nothing for console loggers or after `close`.
    pub fn rotate(&self) -> Result<()> {
        self.core.rotate()
    }

    /// Delete this logger's files older than the retention cutoff
    ///
    /// Returns the number of files deleted. Only a failure to list the log
    /// directory is an error.
    pub fn cleanup(&self) -> Result<usize> {
        self.core.cleanup()
    }

    /// Run one rotation cycle, logging instead of returning failures
    pub fn rotate_and_cleanup(&self) {
        self.core.rotate_and_cleanup();
    }

    /// Stop the rotation thread and release the sink; safe to call repeatedly
    ///
    /// Logging after close is silently dropped.
    pub fn close(&self) {
        let scheduler = self
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut scheduler) = scheduler {
            scheduler.shutdown();
        }

        let mut state = self.core.lock();
        if !state.closed {
            debug!(output = self.core.output.as_str(), "Logger closed");
        }
        state.close();
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("output", &self.core.output)
            .field("retention_days", &self.core.retention_days)
            .finish_non_exhaustive()
    }
}
