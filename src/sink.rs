//! Output destinations and line formatting
//!
//! A logger owns exactly one `Sink`, kept inside `SinkState` behind the
//! instance lock. Rotation swaps the file sink for one bound to today's date.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::panic::Location;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};

use crate::error::{Error, Result};
use crate::level::Level;

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.6f";

/// Name of the log file for `prefix` on `date`
pub fn log_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}_{}.log", prefix, date.format("%Y-%m-%d"))
}

/// Path of the log file for `prefix` on `date` under `log_dir`
pub fn log_file_path(log_dir: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    log_dir.join(log_file_name(prefix, date))
}

/// Format one log entry, including the trailing newline
///
/// Format: `2024/07/04 13:05:09.123456 main.rs:42: [INFO] message`. A message
/// that already ends in a newline does not get a second one.
pub fn format_line(
    now: DateTime<Local>,
    location: &Location<'_>,
    level: Level,
    message: impl fmt::Display,
) -> String {
    let message = message.to_string();
    let message = message.strip_suffix('\n').unwrap_or(&message);
    format!(
        "{} {}:{}: [{}] {}\n",
        now.format(TIMESTAMP_FORMAT),
        short_file(location.file()),
        location.line(),
        level.as_str(),
        message
    )
}

fn short_file(file: &str) -> &str {
    Path::new(file)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file)
}

/// The active output destination
pub(crate) enum Sink {
    Console(io::Stdout),
    File { file: File, path: PathBuf },
    Writer(Box<dyn Write + Send>),
}

impl Sink {
    pub(crate) fn console() -> Self {
        Sink::Console(io::stdout())
    }

    /// Create `log_dir` if needed and open the file for `date` for appending
    pub(crate) fn open_file(log_dir: &Path, prefix: &str, date: NaiveDate) -> Result<Self> {
        fs::create_dir_all(log_dir).map_err(|source| Error::CreateLogDir {
            path: log_dir.to_path_buf(),
            source,
        })?;

        let path = log_file_path(log_dir, prefix, date);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| Error::OpenLogFile {
                path: path.clone(),
                source,
            })?;

        Ok(Sink::File { file, path })
    }

    pub(crate) fn path(&self) -> Option<&Path> {
        match self {
            Sink::File { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Append one formatted line in a single write
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        match self {
            Sink::Console(stdout) => {
                let mut out = stdout.lock();
                out.write_all(line.as_bytes())?;
                out.flush()
            }
            Sink::File { file, .. } => file.write_all(line.as_bytes()),
            Sink::Writer(writer) => {
                writer.write_all(line.as_bytes())?;
                writer.flush()
            }
        }
    }

    /// Flush buffered data before the sink is dropped
    fn finish(self) -> io::Result<()> {
        match self {
            Sink::Console(stdout) => stdout.lock().flush(),
            Sink::File { file, .. } => file.sync_all(),
            Sink::Writer(mut writer) => writer.flush(),
        }
    }
}

/// Everything guarded by the instance lock
pub(crate) struct SinkState {
    pub(crate) level: Level,
    pub(crate) sink: Option<Sink>,
    pub(crate) closed: bool,
}

impl SinkState {
    pub(crate) fn new(level: Level, sink: Sink) -> Self {
        Self {
            level,
            sink: Some(sink),
            closed: false,
        }
    }

    /// Write an entry if a sink is available; dropped silently otherwise
    pub(crate) fn write_entry(
        &mut self,
        location: &Location<'_>,
        level: Level,
        message: impl fmt::Display,
    ) {
        if let Some(sink) = self.sink.as_mut() {
            let line = format_line(Local::now(), location, level, message);
            let _ = sink.write_line(&line);
        }
    }

    /// Write an entry about the logger itself, falling back to tracing when
    /// no sink is open
    #[track_caller]
    pub(crate) fn report(&mut self, level: Level, message: impl fmt::Display) {
        if self.sink.is_some() {
            self.write_entry(Location::caller(), level, message);
            return;
        }
        match level {
            Level::Debug => tracing::debug!("{}", message),
            Level::Info => tracing::info!("{}", message),
            Level::Warn => tracing::warn!("{}", message),
            Level::Error => tracing::error!("{}", message),
        }
    }

    /// Swap the file sink for the file belonging to `date`
    ///
    /// Console and writer sinks are left alone. A closed state is never
    /// reopened. If the new file cannot be opened the state is left without a
    /// sink until the next successful rotation.
    pub(crate) fn rotate(&mut self, log_dir: &Path, prefix: &str, date: NaiveDate) -> Result<()> {
        if self.closed || !matches!(self.sink, Some(Sink::File { .. }) | None) {
            return Ok(());
        }

        let mut close_warning = None;
        if let Some(old) = self.sink.take() {
            let old_path = old.path().map(Path::to_path_buf);
            if let Err(e) = old.finish() {
                close_warning = Some(format!(
                    "failed to close log file {}: {}",
                    old_path.unwrap_or_default().display(),
                    e
                ));
            }
        }

        match Sink::open_file(log_dir, prefix, date) {
            Ok(sink) => {
                self.sink = Some(sink);
                if let Some(warning) = close_warning {
                    self.report(Level::Warn, warning);
                }
                Ok(())
            }
            Err(e) => {
                if let Some(warning) = close_warning {
                    tracing::warn!("{}", warning);
                }
                Err(e)
            }
        }
    }

    /// Release the sink and mark the state closed; idempotent
    pub(crate) fn close(&mut self) {
        self.closed = true;
        if let Some(sink) = self.sink.take() {
            let path = sink.path().map(Path::to_path_buf);
            if let Err(e) = sink.finish() {
                tracing::warn!(
                    "failed to close log file {}: {}",
                    path.unwrap_or_default().display(),
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SharedBuf;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    #[test]
    fn test_log_file_name() {
        let date = NaiveDate::from_ymd_opt(2023, 7, 4).unwrap();
        assert_eq!(log_file_name("app", date), "app_2023-07-04.log");
        assert_eq!(
            log_file_path(Path::new("/var/log"), "app", date),
            PathBuf::from("/var/log/app_2023-07-04.log")
        );
    }

    #[test]
    fn test_format_line() {
        let now = Local
            .with_ymd_and_hms(2024, 1, 21, 14, 30, 45)
            .unwrap()
            .checked_add_signed(chrono::Duration::microseconds(123_456))
            .unwrap();
        let location = Location::caller();
        let line = format_line(now, location, Level::Warn, "disk almost full");

        let expected = format!(
            "2024/01/21 14:30:45.123456 sink.rs:{}: [WARN] disk almost full\n",
            location.line()
        );
        assert_eq!(line, expected);
    }

    #[test]
    fn test_format_line_keeps_single_newline() {
        let now = Local::now();
        let location = Location::caller();

        let line = format_line(now, location, Level::Info, "already terminated\n");
        assert!(line.ends_with("[INFO] already terminated\n"));
        assert_eq!(line.lines().count(), 1);

        // Only one trailing newline is trimmed
        let line = format_line(now, location, Level::Info, "two\n\n");
        assert!(line.ends_with("[INFO] two\n\n"));
    }

    #[test]
    fn test_short_file_strips_directories() {
        assert_eq!(short_file("src/nested/module.rs"), "module.rs");
        assert_eq!(short_file("main.rs"), "main.rs");
    }

    #[test]
    fn test_open_file_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("a").join("b");

        let sink = Sink::open_file(&log_dir, "svc", today()).unwrap();
        let expected = log_file_path(&log_dir, "svc", today());
        assert_eq!(sink.path(), Some(expected.as_path()));
        assert!(expected.exists());
    }

    #[test]
    fn test_open_file_fails_when_dir_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"not a dir").unwrap();

        let result = Sink::open_file(&blocker, "svc", today());
        assert!(matches!(result, Err(Error::CreateLogDir { .. })));
    }

    #[test]
    fn test_write_entry_to_writer() {
        let buf = SharedBuf::default();
        let mut state = SinkState::new(Level::Debug, Sink::Writer(Box::new(buf.clone())));

        state.write_entry(Location::caller(), Level::Info, "hello");
        assert!(buf.contents().ends_with("[INFO] hello\n"));
    }

    #[test]
    fn test_rotate_same_day_appends() {
        let temp_dir = TempDir::new().unwrap();
        let sink = Sink::open_file(temp_dir.path(), "rot", today()).unwrap();
        let path = sink.path().unwrap().to_path_buf();
        let mut state = SinkState::new(Level::Debug, sink);

        state.write_entry(Location::caller(), Level::Info, "before");
        state.rotate(temp_dir.path(), "rot", today()).unwrap();
        state.write_entry(Location::caller(), Level::Info, "after");

        assert_eq!(state.sink.as_ref().and_then(Sink::path), Some(path.as_path()));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[INFO] before"));
        assert!(content.contains("[INFO] after"));
    }

    #[test]
    fn test_rotate_to_next_day_switches_file() {
        let temp_dir = TempDir::new().unwrap();
        let day_one = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let day_two = day_one.succ_opt().unwrap();

        let sink = Sink::open_file(temp_dir.path(), "daily", day_one).unwrap();
        let mut state = SinkState::new(Level::Debug, sink);
        state.write_entry(Location::caller(), Level::Info, "first day");

        state.rotate(temp_dir.path(), "daily", day_two).unwrap();
        state.write_entry(Location::caller(), Level::Info, "second day");

        let old_path = log_file_path(temp_dir.path(), "daily", day_one);
        let new_path = log_file_path(temp_dir.path(), "daily", day_two);
        assert_eq!(
            state.sink.as_ref().and_then(Sink::path),
            Some(new_path.as_path())
        );

        let old = std::fs::read_to_string(&old_path).unwrap();
        assert!(old.contains("[INFO] first day"));
        assert!(!old.contains("second day"));

        let new = std::fs::read_to_string(&new_path).unwrap();
        assert!(new.contains("[INFO] second day"));
        assert!(!new.contains("first day"));

        // Exactly the two dated files exist; the old handle was released
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 2);
        state.close();
        assert!(state.sink.is_none());
    }

    #[test]
    fn test_rotate_leaves_writer_sink() {
        let temp_dir = TempDir::new().unwrap();
        let buf = SharedBuf::default();
        let mut state = SinkState::new(Level::Debug, Sink::Writer(Box::new(buf.clone())));

        state.rotate(temp_dir.path(), "rot", today()).unwrap();
        assert!(matches!(state.sink, Some(Sink::Writer(_))));
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_close_is_idempotent_and_blocks_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let sink = Sink::open_file(temp_dir.path(), "closed", today()).unwrap();
        let mut state = SinkState::new(Level::Debug, sink);

        state.close();
        state.close();
        assert!(state.sink.is_none());

        state.rotate(temp_dir.path(), "closed", today()).unwrap();
        assert!(state.sink.is_none());

        // Writes after close are dropped without error
        state.write_entry(Location::caller(), Level::Error, "dropped");
    }
}
