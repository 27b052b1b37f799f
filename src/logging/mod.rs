//! Multi-severity file logger
//!
//! `Logger` is the engine: one shared instance per process, passed around by
//! reference or `Arc`. A call formats the record once into a pooled buffer
//! and fans it out to the level writers according to the log-through policy.

mod buffer;
mod file_writer;
mod prefix;
mod retention;

pub use buffer::{BufferPool, PooledBuffer};
pub use file_writer::{LevelWriter, WriteContext, WriteOutcome};
pub use prefix::{write_prefix, Caller};
pub use retention::{purge_due, purge_interval, purge_old_logs, PurgeCoordinator, PurgeReport};

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Local};

use crate::config::{Config, ConfigStore, Flag, DEFAULT_FILENAME_PREFIX, DEFAULT_SYMLINK_PREFIX};
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::level::{Level, LEVEL_COUNT};
use crate::naming::{Naming, TokenSource};

/// Notice printed instead of writing while the logger is disabled
const DISABLED_NOTICE: &str = "Logger disabled";

/// The logging engine
#[derive(Debug)]
pub struct Logger {
    config: ConfigStore,
    identity: Identity,
    naming: RwLock<Naming>,
    writers: [LevelWriter; LEVEL_COUNT],
    purge: PurgeCoordinator,
    tokens: TokenSource,
    pool: BufferPool,
}

impl Logger {
    /// Set up a logger writing into `dir`
    ///
    /// Creates the directory if needed and applies the default filename and
    /// symlink prefixes. `max_days` of 0 keeps files forever.
    pub fn init(dir: impl AsRef<Path>, max_days: u32, trace: bool) -> Result<Self> {
        let config = Config {
            log_dir: dir.as_ref().to_path_buf(),
            max_days,
            trace,
            ..Config::default()
        };
        Self::from_config(&config)
    }

    /// Set up a logger from a configuration document
    pub fn from_config(config: &Config) -> Result<Self> {
        let identity = Identity::resolve().map_err(Error::Hostname)?;
        Self::with_identity(config, identity)
    }

    /// Set up a logger with an explicit process identity
    pub fn with_identity(config: &Config, identity: Identity) -> Result<Self> {
        let dir = config.expanded_log_dir();
        std::fs::create_dir_all(&dir).map_err(|source| Error::CreateDirectory {
            path: dir.clone(),
            source,
        })?;

        let naming = Naming::new(
            &dir,
            &config.filename_prefix,
            &config.symlink_prefix,
            &identity,
        );

        Ok(Self {
            config: ConfigStore::from_config(config),
            identity,
            naming: RwLock::new(naming),
            writers: Level::ALL.map(LevelWriter::new),
            purge: PurgeCoordinator::new(),
            tokens: TokenSource::new(),
            pool: BufferPool::default(),
        })
    }

    /// Runtime configuration
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Identity used for placeholders and record prefixes
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Directory holding the log files
    pub fn dir(&self) -> PathBuf {
        self.naming().dir().to_path_buf()
    }

    /// Path of the symlink for a level
    pub fn symlink_path(&self, level: Level) -> PathBuf {
        self.naming().symlink(level).to_path_buf()
    }

    /// Path of the file currently open for a level
    pub fn current_file(&self, level: Level) -> Option<PathBuf> {
        self.writers[level.index()].current_path()
    }

    fn naming(&self) -> std::sync::RwLockReadGuard<'_, Naming> {
        self.naming.read().unwrap_or_else(|e| e.into_inner())
    }

    // Runtime setters

    /// Write trace records
    pub fn set_trace(&self, on: bool) {
        self.config.set_flag(Flag::Trace, on);
    }

    /// Write debug records
    pub fn set_debug(&self, on: bool) {
        self.config.set_flag(Flag::Debug, on);
    }

    /// Write records into every lower-ordinal level file too
    ///
    /// On by default. Turning it off saves a write per extra level.
    pub fn set_log_through(&self, on: bool) {
        self.config.set_flag(Flag::LogThrough, on);
    }

    /// Include the caller's function path (macro calls only)
    pub fn set_function_name(&self, on: bool) {
        self.config.set_flag(Flag::FunctionName, on);
    }

    /// Include ` file.rs:line` of the caller
    pub fn set_filename_line_num(&self, on: bool) {
        self.config.set_flag(Flag::FilenameLineNum, on);
    }

    /// Mirror every record to stdout
    pub fn set_console(&self, on: bool) {
        self.config.set_flag(Flag::Console, on);
    }

    pub fn enable(&self) {
        self.config.set_enabled(true);
    }

    /// Stop writing; calls only print a notice until `enable`
    pub fn disable(&self) {
        self.config.set_enabled(false);
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    /// User name shown in every record prefix
    pub fn set_user_name(&self, name: &str) {
        self.config.set_user_name(name);
    }

    /// Change the filename and symlink prefix templates
    ///
    /// Takes effect at the next rotation of each level; open files keep
    /// their names.
    pub fn set_filename_prefix(&self, filename_prefix: &str, symlink_prefix: &str) {
        let mut naming = self.naming.write().unwrap_or_else(|e| e.into_inner());
        let dir = naming.dir().to_path_buf();
        *naming = Naming::new(&dir, filename_prefix, symlink_prefix, &self.identity);
    }

    /// Restore the default `%P.%H.%U` / `%P.%U` prefixes
    pub fn reset_filename_prefix(&self) {
        self.set_filename_prefix(DEFAULT_FILENAME_PREFIX, DEFAULT_SYMLINK_PREFIX);
    }

    /// Days to keep log files (0 = forever)
    pub fn set_max_days(&self, days: u32) {
        self.config.set_max_days(days);
    }

    /// Rotate once a file would reach `bytes` (0 = daily rotation only)
    pub fn set_max_file_size(&self, bytes: u64) {
        self.config.set_max_file_size(bytes);
    }

    /// Same as `set_max_file_size`, in megabytes
    pub fn set_max_file_size_mb(&self, megabytes: u64) {
        self.config
            .set_max_file_size(megabytes.saturating_mul(1024 * 1024));
    }

    /// Close every open file and clear rotation and purge history
    pub fn reset(&self) {
        for writer in &self.writers {
            writer.reset();
        }
    }

    /// Close every open file; the next write reopens as needed
    pub fn close(&self) {
        self.reset();
    }

    // Write path

    #[track_caller]
    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Trace, Some(Caller::here()), args);
    }

    #[track_caller]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, Some(Caller::here()), args);
    }

    #[track_caller]
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, Some(Caller::here()), args);
    }

    #[track_caller]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, Some(Caller::here()), args);
    }

    #[track_caller]
    pub fn update(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Update, Some(Caller::here()), args);
    }

    /// Write a panic record. The record is on disk when this returns; raising
    /// the panic is up to the caller (see `log_panic!`).
    #[track_caller]
    pub fn panic(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Panic, Some(Caller::here()), args);
    }

    /// Write an abort record. The record is on disk when this returns;
    /// exiting is up to the caller (see `log_abort!`).
    #[track_caller]
    pub fn abort(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Abort, Some(Caller::here()), args);
    }

    #[track_caller]
    pub fn query(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Query, Some(Caller::here()), args);
    }

    #[track_caller]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, Some(Caller::here()), args);
    }

    /// Print a line to stdout only, bypassing every log file
    pub fn console(&self, args: fmt::Arguments<'_>) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_fmt(args);
        let _ = stdout.write_all(b"\n");
    }

    /// Format one record and dispatch it
    ///
    /// Trace and debug records are dropped unless enabled. Never fails;
    /// problems end up as diagnostics in the log files or on stderr.
    pub fn log(&self, level: Level, caller: Option<Caller>, args: fmt::Arguments<'_>) {
        match level {
            Level::Trace if !self.config.trace() => return,
            Level::Debug if !self.config.debug() => return,
            _ => {}
        }

        if !self.config.is_enabled() {
            let _ = writeln!(io::stdout().lock(), "{}", DISABLED_NOTICE);
            return;
        }

        let time = Local::now();
        let mut buf = self.pool.acquire();
        write_prefix(
            &mut buf,
            level,
            &time,
            caller.as_ref(),
            &self.config,
            &self.identity.host,
        );
        let _ = buf.write_fmt(args);
        buf.push(b'\n');

        self.dispatch(level, &time, &buf);
    }

    /// Write a fully formatted record to its target writers
    fn dispatch(&self, level: Level, time: &DateTime<Local>, record: &[u8]) {
        let mut outcomes: [Option<WriteOutcome>; LEVEL_COUNT] = Default::default();

        {
            let naming = self.naming();
            let ctx = WriteContext {
                naming: &*naming,
                config: &self.config,
                purge: &self.purge,
                tokens: &self.tokens,
                pool: &self.pool,
                host: &self.identity.host,
            };

            if self.config.log_through() {
                for target in level.cascade() {
                    outcomes[target.index()] =
                        Some(self.writers[target.index()].write(&ctx, time, record));
                }
                if self.config.trace() {
                    outcomes[Level::Trace.index()] =
                        Some(self.writers[Level::Trace.index()].write(&ctx, time, record));
                }
            } else {
                outcomes[level.index()] = Some(self.writers[level.index()].write(&ctx, time, record));
            }
        }

        if self.config.console() {
            let _ = io::stdout().lock().write_all(record);
        }

        // Reported only after every lock is released; subscribers may route back into us
        for (index, outcome) in outcomes.iter().enumerate() {
            if let (Some(level), Some(outcome)) = (Level::from_index(index), outcome) {
                report(level, outcome);
            }
        }
    }
}

fn report(level: Level, outcome: &WriteOutcome) {
    if let Some(path) = &outcome.rotated {
        tracing::debug!(target: "tierlog", severity = %level, path = %path.display(), "Opened new log file");
    }
    if let Some(purged) = &outcome.purged {
        if purged.removed > 0 || purged.failures > 0 {
            tracing::info!(
                target: "tierlog",
                severity = %level,
                removed = purged.removed,
                failures = purged.failures,
                "Purged aged log files"
            );
        }
    }
    if outcome.diagnostics > 0 {
        tracing::warn!(
            target: "tierlog",
            severity = %level,
            count = outcome.diagnostics,
            "Log write fell back to diagnostic output"
        );
    }
}
