//! Log file and symlink naming
//!
//! File: `{dir}/{prefix}.{level}_{YYYYMMDD}.{token}.log`
//! Symlink: `{dir}/{symlink_prefix}.{level}`

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, NaiveDate, TimeZone};

use crate::identity::Identity;
use crate::level::{Level, LEVEL_COUNT};

/// Extension of every log file; purge only touches files with it
pub const LOG_EXTENSION: &str = "log";

/// Substitute `%P`, `%H` and `%U` in a prefix template
pub fn substitute(template: &str, identity: &Identity) -> String {
    template
        .replace("%P", &identity.program)
        .replace("%H", &identity.host)
        .replace("%U", &identity.os_user)
}

/// Resolved names for one log directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Naming {
    dir: PathBuf,
    file_prefix: String,
    symlinks: [PathBuf; LEVEL_COUNT],
}

impl Naming {
    /// Resolve both templates against the process identity
    ///
    /// An empty template contributes nothing; a non-empty one is followed by
    /// a literal `.`.
    pub fn new(
        dir: &Path,
        filename_template: &str,
        symlink_template: &str,
        identity: &Identity,
    ) -> Self {
        let file_prefix = dotted(filename_template, identity);
        let symlink_prefix = dotted(symlink_template, identity);
        let symlinks =
            Level::ALL.map(|level| dir.join(format!("{}{}", symlink_prefix, level.as_str())));

        Self {
            dir: dir.to_path_buf(),
            file_prefix,
            symlinks,
        }
    }

    /// Directory holding the log files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the symlink for a level
    pub fn symlink(&self, level: Level) -> &Path {
        &self.symlinks[level.index()]
    }

    /// Full path of a new log file for a level
    pub fn log_file(&self, level: Level, date: NaiveDate, token: u64) -> PathBuf {
        self.dir.join(format!(
            "{}{}_{}.{}.{}",
            self.file_prefix,
            level.as_str(),
            date.format("%Y%m%d"),
            token,
            LOG_EXTENSION
        ))
    }
}

fn dotted(template: &str, identity: &Identity) -> String {
    if template.is_empty() {
        String::new()
    } else {
        format!("{}.", substitute(template, identity))
    }
}

/// Source of uniqueness tokens for rotated filenames
///
/// Tokens are nanosecond timestamps, bumped when needed so that every token
/// is strictly greater than the previous one.
#[derive(Debug, Default)]
pub struct TokenSource {
    last: AtomicU64,
}

impl TokenSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next token for a rotation happening at `now`
    pub fn next<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> u64 {
        let nanos = now
            .timestamp_nanos_opt()
            .map(|n| n.max(0) as u64)
            .unwrap_or_default();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = nanos.max(prev + 1);
            match self.last.compare_exchange_weak(
                prev,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => prev = actual,
            }
        }
    }
}
