//! `tracing` integration
//!
//! `SeverityMakeWriter` plugs into a `tracing_subscriber::fmt` layer so that
//! formatted `tracing` output lands in one of the level files.

use std::cell::Cell;
use std::io::{self, Write};
use std::sync::Arc;

use tracing_subscriber::fmt::MakeWriter;

use crate::level::Level;
use crate::logging::Logger;

thread_local! {
    /// Set while this thread is forwarding output into the logger
    static FORWARDING: Cell<bool> = const { Cell::new(false) };
}

struct ForwardingGuard;

impl Drop for ForwardingGuard {
    fn drop(&mut self) {
        FORWARDING.with(|flag| flag.set(false));
    }
}

/// A writer that forwards each line it receives to the logger at one level
pub struct SeverityWriter {
    logger: Arc<Logger>,
    level: Level,
}

impl Write for SeverityWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // The logger reports its own events through `tracing`; drop those
        // instead of looping back in
        if FORWARDING.with(|flag| flag.replace(true)) {
            return Ok(buf.len());
        }
        let _guard = ForwardingGuard;

        let text = String::from_utf8_lossy(buf);
        for line in text.lines() {
            let line = line.trim_end();
            if !line.is_empty() {
                self.logger.log(self.level, None, format_args!("{}", line));
            }
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writer factory for tracing-subscriber
#[derive(Clone)]
pub struct SeverityMakeWriter {
    logger: Arc<Logger>,
    level: Level,
}

impl<'a> MakeWriter<'a> for SeverityMakeWriter {
    type Writer = SeverityWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SeverityWriter {
            logger: Arc::clone(&self.logger),
            level: self.level,
        }
    }
}

impl Logger {
    /// Writer factory that routes `tracing` output into `level`
    pub fn make_writer(self: &Arc<Self>, level: Level) -> SeverityMakeWriter {
        SeverityMakeWriter {
            logger: Arc::clone(self),
            level,
        }
    }
}
