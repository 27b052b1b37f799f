//! Error types for logger setup and configuration
//!
//! Only the setup surface returns these. The write path never reports an
//! error to its caller; failures there become inline diagnostics.

use std::io;
use std::path::PathBuf;

/// Result type for logger setup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while setting up the logger
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to create log directory
    #[error("Failed to create log directory at {path}: {source}")]
    CreateDirectory {
        /// The path that failed to be created
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Host name could not be resolved
    #[error("Failed to resolve host name: {0}")]
    Hostname(io::Error),

    /// Failed to read a config file
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: io::Error,
    },

    /// Failed to write a config file
    #[error("Failed to write config file {path}: {source}")]
    ConfigWrite {
        path: PathBuf,
        source: io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config could not be serialized
    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}
