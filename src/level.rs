//! Severity levels
//!
//! The order is the ordinal index used by the log-through cascade, not a
//! ranking of how severe a record is.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of severity levels
pub const LEVEL_COUNT: usize = 9;

/// Severity level of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Update = 4,
    Panic = 5,
    Abort = 6,
    Query = 7,
    Debug = 8,
}

impl Level {
    /// All levels in ordinal order
    pub const ALL: [Level; LEVEL_COUNT] = [
        Level::Trace,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Update,
        Level::Panic,
        Level::Abort,
        Level::Query,
        Level::Debug,
    ];

    /// Ordinal index of this level
    pub fn index(self) -> usize {
        self as usize
    }

    /// Level at the given ordinal index
    pub fn from_index(index: usize) -> Option<Level> {
        Self::ALL.get(index).copied()
    }

    /// Name used in filenames and symlinks
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Update => "update",
            Level::Panic => "panic",
            Level::Abort => "abort",
            Level::Query => "query",
            Level::Debug => "debug",
        }
    }

    /// Single character that opens every record prefix
    pub fn as_char(self) -> u8 {
        b"TIWEUPAQD"[self.index()]
    }

    /// Levels a record at this level is written to when log-through is on,
    /// highest first. Trace is never part of the cascade; the dispatcher
    /// appends it separately when trace output is enabled.
    pub fn cascade(self) -> impl Iterator<Item = Level> {
        (1..=self.index()).rev().filter_map(Level::from_index)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown level name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Level::ALL
            .iter()
            .copied()
            .find(|level| level.as_str() == lower)
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}
