//! Session error types.

use gangplank_interop::BridgeError;

/// Top-level error type for the host crate.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Module validation failed (missing entries, unprovided imports).
    #[error("validation error: {0}")]
    Validation(String),

    /// Invoke named an entry point the module does not export.
    #[error("unknown entry point `{name}`")]
    UnknownEntry { name: String },

    /// A bridge failure during an invoke: a propagated value or allocator
    /// exhaustion.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl SessionError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// The propagated failure value, when the module call failed with one.
    pub fn propagated(&self) -> Option<&gangplank_interop::Value> {
        match self {
            Self::Bridge(err) => err.propagated(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gangplank_interop::Value;

    #[test]
    fn test_display() {
        let err = SessionError::validation("missing entry `run`");
        assert_eq!(err.to_string(), "validation error: missing entry `run`");

        let err = SessionError::UnknownEntry { name: "步".into() };
        assert!(err.to_string().contains('步'));
    }

    #[test]
    fn test_bridge_errors_pass_through() {
        let err: SessionError = BridgeError::Propagated(Value::str("bad")).into();
        assert_eq!(err.propagated(), Some(&Value::str("bad")));
        assert_eq!(err.to_string(), "propagated failure: bad");
    }
}
