//! Log file retention management
//!
//! Each level writer decides on its own when a sweep is due; the sweep itself
//! is directory-wide and serialized by a single lock shared by all writers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};

use crate::naming::LOG_EXTENSION;

/// Minimum time between two sweeps triggered by the same writer
pub fn purge_interval() -> chrono::Duration {
    chrono::Duration::hours(24)
}

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Files deleted
    pub removed: usize,
    /// Entries that could not be inspected or deleted
    pub failures: usize,
}

/// Check whether a writer that last purged at `last` should purge at `now`
pub fn purge_due(last: Option<DateTime<Local>>, now: DateTime<Local>) -> bool {
    match last {
        None => true,
        Some(last) => now.signed_duration_since(last) > purge_interval(),
    }
}

/// Process-wide coordinator for directory sweeps
#[derive(Debug, Default)]
pub struct PurgeCoordinator {
    lock: Mutex<()>,
}

impl PurgeCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sweep `dir` while holding the purge lock
    ///
    /// Blocks while another writer is sweeping.
    pub fn sweep<F>(&self, dir: &Path, max_days: u32, on_error: F) -> PurgeReport
    where
        F: FnMut(&Path, io::Error),
    {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        purge_old_logs(dir, max_days, SystemTime::now(), on_error)
    }
}

/// Delete log files under `dir` whose modification time is more than
/// `max_days` days before `now`
///
/// Walks subdirectories without following symlinks. `max_days == 0` keeps
/// everything. Failures are reported through `on_error` and the walk
/// continues.
pub fn purge_old_logs<F>(dir: &Path, max_days: u32, now: SystemTime, mut on_error: F) -> PurgeReport
where
    F: FnMut(&Path, io::Error),
{
    let mut report = PurgeReport::default();
    if max_days == 0 {
        return report;
    }

    let retention = Duration::from_secs(u64::from(max_days) * 24 * 60 * 60);
    let cutoff = now.checked_sub(retention).unwrap_or(SystemTime::UNIX_EPOCH);

    let mut stack: Vec<PathBuf> = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let entries = match fs::read_dir(&current) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound && current == dir => continue,
            Err(e) => {
                report.failures += 1;
                on_error(&current, e);
                continue;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    report.failures += 1;
                    on_error(&current, e);
                    continue;
                }
            };
            let path = entry.path();

            // symlink_metadata so that level symlinks and linked dirs are left alone
            let metadata = match fs::symlink_metadata(&path) {
                Ok(metadata) => metadata,
                // Replaced concurrently (e.g. a level symlink)
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    report.failures += 1;
                    on_error(&path, e);
                    continue;
                }
            };

            if metadata.is_dir() {
                stack.push(path);
                continue;
            }
            if !metadata.is_file() || !has_log_extension(&path) {
                continue;
            }

            let modified = match metadata.modified() {
                Ok(modified) => modified,
                Err(e) => {
                    report.failures += 1;
                    on_error(&path, e);
                    continue;
                }
            };
            if modified >= cutoff {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => report.removed += 1,
                Err(e) => {
                    report.failures += 1;
                    on_error(&path, e);
                }
            }
        }
    }

    report
}

fn has_log_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(LOG_EXTENSION)
}
