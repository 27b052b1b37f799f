//! Severity macros
//!
//! Each macro takes the logger first, then `format!`-style arguments, and
//! records the caller's file, line and function path.
//!
//! ```no_run
//! let logger = tierlog::Logger::init("./log", 30, false)?;
//! tierlog::info!(logger, "Failed to find player! uid={} cmd={}", 1234, "getplayer");
//! # Ok::<(), tierlog::Error>(())
//! ```

/// Path of the enclosing function
#[doc(hidden)]
#[macro_export]
macro_rules! __function_path {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        name.strip_suffix("::f").unwrap_or(name)
    }};
}

/// Log at an explicit level
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log(
            $level,
            ::std::option::Option::Some($crate::Caller::new(
                ::std::file!(),
                ::std::line!(),
                ::std::option::Option::Some($crate::__function_path!()),
            )),
            ::std::format_args!($($arg)+),
        )
    };
}

#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Trace, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! update {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Update, $($arg)+)
    };
}

#[macro_export]
macro_rules! query {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Query, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Debug, $($arg)+)
    };
}

/// Write a panic record, then panic with `"panic log"`
#[macro_export]
macro_rules! log_panic {
    ($logger:expr, $($arg:tt)+) => {{
        $crate::log_at!($logger, $crate::Level::Panic, $($arg)+);
        ::std::panic!("panic log")
    }};
}

/// Write an abort record, then exit the process with status -1
#[macro_export]
macro_rules! log_abort {
    ($logger:expr, $($arg:tt)+) => {{
        $crate::log_at!($logger, $crate::Level::Abort, $($arg)+);
        ::std::process::exit(-1)
    }};
}
