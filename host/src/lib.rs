//! `gangplank-host` — the host side of the value interop bridge.
//!
//! This crate runs sessions against sandboxed compute modules. It
//! provides:
//!
//! - `Session` — one module wired to one bridge, with argument lowering
//! - `Bridge` — dispatcher owning handle table, views, exception slot,
//!   and console sink
//! - the standard host import table (strings, JSON, references, console,
//!   iteration, reflection, arrays, failure control)
//! - `SessionConfig` + module validation before first use
//! - `ConsoleSink` implementations: `LogSink` (production) and
//!   `RecordingSink` (tests)
//! - `ScriptedGuest` — a closure-backed module stand-in for tests
//! - `SessionError` — host-side error type wrapping bridge failures
//!
//! This crate depends on `gangplank-interop` for the shared value model,
//! handle table, memory views, and codecs.

pub mod config;
pub mod console;
pub mod dispatch;
pub mod error;
mod imports;
pub mod script;
pub mod session;
pub mod validation;

// Re-export commonly used types at the crate root.
pub use config::SessionConfig;
pub use console::{ConsoleLevel, ConsoleSink, LogSink, RecordingSink};
pub use dispatch::Bridge;
pub use error::SessionError;
pub use script::ScriptedGuest;
pub use session::{Arg, Session};
pub use validation::validate_module;
