//! Record prefix formatting
//!
//! `I15:04:05 main.rs:42 app::run host user] message`

use std::panic::Location;

use chrono::{DateTime, Local, Timelike};

use super::buffer::PooledBuffer;
use crate::config::ConfigStore;
use crate::level::Level;

/// Source location of the code that issued a log call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub file: &'static str,
    pub line: u32,
    /// Function path, only known when the call came through a macro
    pub function: Option<&'static str>,
}

impl Caller {
    pub const fn new(file: &'static str, line: u32, function: Option<&'static str>) -> Self {
        Self {
            file,
            line,
            function,
        }
    }

    /// Location of the caller of the enclosing `#[track_caller]` chain
    #[track_caller]
    pub fn here() -> Self {
        let location = Location::caller();
        Self::new(location.file(), location.line(), None)
    }

    /// File name without its directories
    pub fn file_name(&self) -> &'static str {
        self.file.rsplit(['/', '\\']).next().unwrap_or(self.file)
    }
}

/// Write the record prefix into `buf`
///
/// Caller fields are written only when the matching toggle is on and a
/// caller is known.
pub fn write_prefix(
    buf: &mut PooledBuffer<'_>,
    level: Level,
    time: &DateTime<Local>,
    caller: Option<&Caller>,
    config: &ConfigStore,
    host: &str,
) {
    buf.push(level.as_char());
    buf.push_two_digits(time.hour());
    buf.push(b':');
    buf.push_two_digits(time.minute());
    buf.push(b':');
    buf.push_two_digits(time.second());

    if let Some(caller) = caller {
        if config.filename_line_num() {
            buf.push(b' ');
            buf.extend_from_slice(caller.file_name().as_bytes());
            buf.push(b':');
            buf.push_decimal(caller.line);
        }
        if config.function_name() {
            if let Some(function) = caller.function {
                buf.push(b' ');
                buf.extend_from_slice(function.as_bytes());
            }
        }
    }

    if !host.is_empty() {
        buf.push(b' ');
        buf.extend_from_slice(host.as_bytes());
    }

    let user = config.user_name();
    if !user.is_empty() {
        buf.push(b' ');
        buf.extend_from_slice(user.as_bytes());
    }

    buf.extend_from_slice(b"] ");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Flag;
    use crate::logging::buffer::BufferPool;
    use chrono::TimeZone;

    fn time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 18, 9, 5, 7).unwrap()
    }

    fn render(level: Level, caller: Option<&Caller>, config: &ConfigStore, host: &str) -> String {
        let pool = BufferPool::default();
        let mut buf = pool.acquire();
        write_prefix(&mut buf, level, &time(), caller, config, host);
        String::from_utf8(buf.to_vec()).unwrap()
    }

    #[test]
    fn test_prefix_minimal() {
        let config = ConfigStore::default();
        config.set_flag(Flag::FilenameLineNum, false);
        assert_eq!(render(Level::Info, None, &config, ""), "I09:05:07] ");
    }

    #[test]
    fn test_prefix_with_caller_host_and_user() {
        let config = ConfigStore::default();
        config.set_flag(Flag::FunctionName, true);
        config.set_user_name("admin");
        let caller = Caller::new("src/app/run.rs", 42, Some("app::run"));

        assert_eq!(
            render(Level::Error, Some(&caller), &config, "box"),
            "E09:05:07 run.rs:42 app::run box admin] "
        );
    }

    #[test]
    fn test_prefix_function_without_macro_is_omitted() {
        let config = ConfigStore::default();
        config.set_flag(Flag::FunctionName, true);
        let caller = Caller::new("main.rs", 7, None);
        assert_eq!(
            render(Level::Query, Some(&caller), &config, ""),
            "Q09:05:07 main.rs:7] "
        );
    }

    #[test]
    fn test_caller_here_points_at_call_site() {
        let caller = Caller::here();
        assert!(caller.file.ends_with("prefix.rs"));
        assert_eq!(caller.file_name(), "prefix.rs");
        assert_eq!(caller.line, line!() - 3);
    }

    #[test]
    fn test_file_name_windows_separators() {
        let caller = Caller::new("src\\logging\\mod.rs", 1, None);
        assert_eq!(caller.file_name(), "mod.rs");
    }
}
