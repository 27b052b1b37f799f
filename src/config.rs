//! Configuration management for tierlog
//!
//! `Config` is the on-disk TOML document. `ConfigStore` is the runtime view
//! the write path reads on every call; its flags are atomics so readers never
//! take a lock.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default filename prefix template for log files
pub const DEFAULT_FILENAME_PREFIX: &str = "%P.%H.%U";

/// Default prefix template for the per-level symlinks
pub const DEFAULT_SYMLINK_PREFIX: &str = "%P.%U";

/// Logger configuration document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Directory that receives log files and symlinks (`~` is expanded)
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Filename prefix template; `%P` program, `%H` host, `%U` OS user
    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,

    /// Symlink prefix template, same placeholders as `filename_prefix`
    #[serde(default = "default_symlink_prefix")]
    pub symlink_prefix: String,

    /// Days to keep log files before purging them (0 = keep forever)
    #[serde(default = "default_max_days")]
    pub max_days: u32,

    /// Size in bytes at which a log file is rotated (0 = rotate daily only)
    #[serde(default)]
    pub max_file_size: u64,

    /// Write trace records
    #[serde(default)]
    pub trace: bool,

    /// Write debug records
    #[serde(default)]
    pub debug: bool,

    /// Also write records into every lower-ordinal level file
    #[serde(default = "default_true")]
    pub log_through: bool,

    /// Include ` file.rs:line` of the caller in the prefix
    #[serde(default = "default_true")]
    pub filename_line_num: bool,

    /// Include the caller's function path in the prefix
    #[serde(default)]
    pub function_name: bool,

    /// Mirror every record to stdout
    #[serde(default)]
    pub console: bool,

    /// Master switch; a disabled logger writes nothing
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// User name shown in every record prefix (empty = omitted)
    #[serde(default)]
    pub user_name: String,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./log")
}

fn default_filename_prefix() -> String {
    DEFAULT_FILENAME_PREFIX.to_string()
}

fn default_symlink_prefix() -> String {
    DEFAULT_SYMLINK_PREFIX.to_string()
}

fn default_max_days() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            filename_prefix: default_filename_prefix(),
            symlink_prefix: default_symlink_prefix(),
            max_days: default_max_days(),
            max_file_size: 0,
            trace: false,
            debug: false,
            log_through: true,
            filename_line_num: true,
            function_name: false,
            console: false,
            enabled: true,
            user_name: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, or defaults if absent
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a file, or return defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| Error::ConfigWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Log directory with a leading `~` expanded
    pub fn expanded_log_dir(&self) -> PathBuf {
        expand_dir(&self.log_dir)
    }
}

/// Expand a leading `~` in a directory path
pub fn expand_dir(dir: &Path) -> PathBuf {
    let raw = dir.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}

/// Get the base configuration directory (~/.tierlog)
/// Falls back to ./.tierlog if home directory cannot be determined
pub fn config_dir() -> PathBuf {
    try_config_dir().unwrap_or_else(|| {
        tracing::warn!("Could not determine home directory, using current directory for config");
        PathBuf::from(".tierlog")
    })
}

/// Try to get the base configuration directory, returning None if home dir is unavailable
pub fn try_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".tierlog"))
}

/// Get the path to the config file
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Runtime feature toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Trace,
    LogThrough,
    FunctionName,
    FilenameLineNum,
    Console,
    Debug,
}

impl Flag {
    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// Runtime configuration read by the write path on every call
///
/// Setters are expected to run rarely, mostly during setup. Flags are plain
/// atomics, so a concurrent write observes either the old or the new value.
#[derive(Debug)]
pub struct ConfigStore {
    flags: AtomicU32,
    enabled: AtomicBool,
    max_days: AtomicU32,
    max_file_size: AtomicU64,
    user_name: RwLock<String>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ConfigStore {
    /// Build the runtime store from a config document
    pub fn from_config(config: &Config) -> Self {
        let store = Self {
            flags: AtomicU32::new(0),
            enabled: AtomicBool::new(config.enabled),
            max_days: AtomicU32::new(config.max_days),
            max_file_size: AtomicU64::new(config.max_file_size),
            user_name: RwLock::new(config.user_name.clone()),
        };
        store.set_flag(Flag::Trace, config.trace);
        store.set_flag(Flag::Debug, config.debug);
        store.set_flag(Flag::LogThrough, config.log_through);
        store.set_flag(Flag::FilenameLineNum, config.filename_line_num);
        store.set_flag(Flag::FunctionName, config.function_name);
        store.set_flag(Flag::Console, config.console);
        store
    }

    /// Turn a flag on or off
    pub fn set_flag(&self, flag: Flag, on: bool) {
        if on {
            self.flags.fetch_or(flag.bit(), Ordering::Relaxed);
        } else {
            self.flags.fetch_and(!flag.bit(), Ordering::Relaxed);
        }
    }

    /// Check whether a flag is on
    pub fn is_set(&self, flag: Flag) -> bool {
        self.flags.load(Ordering::Relaxed) & flag.bit() != 0
    }

    pub fn trace(&self) -> bool {
        self.is_set(Flag::Trace)
    }

    pub fn debug(&self) -> bool {
        self.is_set(Flag::Debug)
    }

    pub fn log_through(&self) -> bool {
        self.is_set(Flag::LogThrough)
    }

    pub fn function_name(&self) -> bool {
        self.is_set(Flag::FunctionName)
    }

    pub fn filename_line_num(&self) -> bool {
        self.is_set(Flag::FilenameLineNum)
    }

    pub fn console(&self) -> bool {
        self.is_set(Flag::Console)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, on: bool) {
        self.enabled.store(on, Ordering::Relaxed);
    }

    /// Days to keep log files (0 = unlimited)
    pub fn max_days(&self) -> u32 {
        self.max_days.load(Ordering::Relaxed)
    }

    pub fn set_max_days(&self, days: u32) {
        self.max_days.store(days, Ordering::Relaxed);
    }

    /// Rotation size threshold in bytes (0 = unbounded)
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size.load(Ordering::Relaxed)
    }

    pub fn set_max_file_size(&self, bytes: u64) {
        self.max_file_size.store(bytes, Ordering::Relaxed);
    }

    /// User name shown in record prefixes
    pub fn user_name(&self) -> RwLockReadGuard<'_, String> {
        self.user_name.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_user_name(&self, name: &str) {
        let mut guard = self.user_name.write().unwrap_or_else(|e| e.into_inner());
        *guard = name.to_string();
    }
}
