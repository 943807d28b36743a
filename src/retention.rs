//! Log file retention management
//!
//! Handles cleanup of old log files based on age. Only files named
//! `{prefix}_*.log` directly under the log directory are ever considered.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Days, Local, NaiveDate, TimeZone};

use crate::error::{Error, Result};

/// Something that happened during a cleanup pass, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupEvent {
    /// An expired log file was removed
    Deleted(PathBuf),
    /// A single file could not be inspected or removed
    Warning(String),
}

/// Result of a cleanup pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub events: Vec<CleanupEvent>,
}

impl CleanupReport {
    /// Paths that were deleted, oldest first
    pub fn deleted(&self) -> impl Iterator<Item = &Path> {
        self.events.iter().filter_map(|event| match event {
            CleanupEvent::Deleted(path) => Some(path.as_path()),
            CleanupEvent::Warning(_) => None,
        })
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted().count()
    }
}

/// Local midnight at the start of `date`
///
/// When a DST transition skips midnight, the first valid instant of that day
/// is used instead.
pub(crate) fn local_midnight(date: NaiveDate) -> DateTime<Local> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            (1..=3)
                .filter_map(|hour| {
                    Local
                        .from_local_datetime(&(naive + chrono::Duration::hours(hour)))
                        .earliest()
                })
                .next()
        })
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

/// Instant before which matching log files are expired: local midnight of
/// `now`'s date minus `retention_days`
pub fn retention_cutoff(now: DateTime<Local>, retention_days: u32) -> SystemTime {
    now.date_naive()
        .checked_sub_days(Days::new(u64::from(retention_days)))
        .map(|date| SystemTime::from(local_midnight(date)))
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

fn is_candidate(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some_and(|rest| rest.ends_with(".log"))
}

/// Delete `{prefix}_*.log` files under `log_dir` last modified before `cutoff`
///
/// Files are deleted oldest-first. Failure to inspect or delete a single file
/// is recorded as a warning and the pass continues; failure to list the
/// directory is returned as an error.
pub fn cleanup_old_logs(
    log_dir: &Path,
    prefix: &str,
    cutoff: SystemTime,
) -> Result<CleanupReport> {
    let read_dir_error = |source| Error::ReadLogDir {
        path: log_dir.to_path_buf(),
        source,
    };

    let mut report = CleanupReport::default();
    let mut expired: Vec<(SystemTime, PathBuf)> = Vec::new();

    for entry in fs::read_dir(log_dir).map_err(read_dir_error)? {
        let entry = entry.map_err(read_dir_error)?;
        let path = entry.path();

        // Only process this logger's files
        match entry.file_name().to_str() {
            Some(name) if is_candidate(name, prefix) => {}
            _ => continue,
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                report.events.push(CleanupEvent::Warning(format!(
                    "failed to get file info for {}: {}",
                    path.display(),
                    e
                )));
                continue;
            }
        };
        // Symlinks, directories and special files are never removed
        if !metadata.is_file() {
            continue;
        }

        match metadata.modified() {
            Ok(modified) if modified < cutoff => expired.push((modified, path)),
            Ok(_) => {}
            Err(e) => report.events.push(CleanupEvent::Warning(format!(
                "failed to get modification time for {}: {}",
                path.display(),
                e
            ))),
        }
    }

    expired.sort_by_key(|(modified, _)| *modified);

    for (_, path) in expired {
        match fs::remove_file(&path) {
            Ok(()) => report.events.push(CleanupEvent::Deleted(path)),
            Err(e) => report.events.push(CleanupEvent::Warning(format!(
                "failed to delete old log file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    Ok(report)
}
