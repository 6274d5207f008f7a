//! Console sink: where module console traffic lands on the host.
//!
//! The five console imports (`console_debug` … `console_error`) render the
//! value and hand it here. `LogSink` is the production default, routing
//! through the `log` facade; `RecordingSink` captures lines for tests.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use gangplank_interop::Value;

/// Console severity, mirroring the five console imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Debug,
    Log,
    Info,
    Warn,
    Error,
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConsoleLevel::Debug => "debug",
            ConsoleLevel::Log => "log",
            ConsoleLevel::Info => "info",
            ConsoleLevel::Warn => "warn",
            ConsoleLevel::Error => "error",
        };
        write!(f, "{name}")
    }
}

/// Destination for console traffic from the module.
pub trait ConsoleSink {
    fn write(&mut self, level: ConsoleLevel, value: &Value);
}

/// Routes console traffic to the `log` facade. `Log` maps to info.
#[derive(Debug, Default)]
pub struct LogSink;

impl ConsoleSink for LogSink {
    fn write(&mut self, level: ConsoleLevel, value: &Value) {
        match level {
            ConsoleLevel::Debug => log::debug!(target: "guest", "{value}"),
            ConsoleLevel::Log | ConsoleLevel::Info => log::info!(target: "guest", "{value}"),
            ConsoleLevel::Warn => log::warn!(target: "guest", "{value}"),
            ConsoleLevel::Error => log::error!(target: "guest", "{value}"),
        }
    }
}

/// Captures rendered console lines for assertions.
///
/// Clones share the same line buffer, so a test can keep one clone and
/// hand the other to the bridge.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    lines: Rc<RefCell<Vec<(ConsoleLevel, String)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured lines.
    pub fn lines(&self) -> Vec<(ConsoleLevel, String)> {
        self.lines.borrow().clone()
    }
}

impl ConsoleSink for RecordingSink {
    fn write(&mut self, level: ConsoleLevel, value: &Value) {
        self.lines.borrow_mut().push((level, value.to_string()));
    }
}
