//! Bridge error types.

use crate::value::Value;

/// Top-level error type for bridge operations.
///
/// Only boundary-recoverable conditions live here. Contract violations
/// (bad handle, out-of-bounds range, unbalanced borrow pop) panic with a
/// diagnostic naming the violated invariant instead; the bridge trusts
/// handles and pointers it issued itself.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A failure value crossed the boundary: a host callback threw while
    /// servicing the module, or the module raised. Carries the original
    /// value with identity preserved, not a rendering of it.
    #[error("propagated failure: {0}")]
    Propagated(Value),

    /// The module allocator could not satisfy a request. Fatal for the
    /// current call; never retried.
    #[error("module allocator failed for {size} bytes")]
    AllocFailed { size: u32 },
}

impl BridgeError {
    /// A fresh thrown error value with the conventional `Error` name.
    pub fn thrown(message: &str) -> Self {
        Self::Propagated(Value::error("Error", message))
    }

    /// The propagated payload, if this is a propagated failure.
    pub fn propagated(&self) -> Option<&Value> {
        match self {
            Self::Propagated(value) => Some(value),
            Self::AllocFailed { .. } => None,
        }
    }
}
