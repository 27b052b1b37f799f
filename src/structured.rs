//! Structured payloads
//!
//! A payload is serialized to compact JSON and written like any other
//! message at the requested level.

use std::fmt;

use serde::Serialize;

use crate::level::Level;
use crate::logging::{Caller, Logger};

impl Logger {
    /// Write `payload` as one compact JSON record at `level`
    ///
    /// Falls back to the `Debug` rendering when the payload can't be
    /// serialized (e.g. a map with non-string keys).
    #[track_caller]
    pub fn write_structured<T>(&self, level: Level, payload: &T)
    where
        T: Serialize + fmt::Debug + ?Sized,
    {
        let caller = Caller::here();
        match serde_json::to_string(payload) {
            Ok(json) => self.log(level, Some(caller), format_args!("{}", json)),
            Err(_) => self.log(level, Some(caller), format_args!("{:?}", payload)),
        }
    }

    #[track_caller]
    pub fn info_structured<T>(&self, payload: &T)
    where
        T: Serialize + fmt::Debug + ?Sized,
    {
        self.write_structured(Level::Info, payload);
    }

    #[track_caller]
    pub fn error_structured<T>(&self, payload: &T)
    where
        T: Serialize + fmt::Debug + ?Sized,
    {
        self.write_structured(Level::Error, payload);
    }
}
