//! tierlog - unbuffered multi-severity file logging
//!
//! Records go straight to one file per severity. Files rotate on a new day
//! or when a size threshold is reached, aged files are purged, and a symlink
//! per severity always names the newest file.

pub mod bridge;
pub mod config;
pub mod error;
pub mod identity;
pub mod level;
pub mod logging;
mod macros;
pub mod naming;
pub mod structured;

pub use config::Config;
pub use error::{Error, Result};
pub use level::Level;
pub use logging::{Caller, Logger};
