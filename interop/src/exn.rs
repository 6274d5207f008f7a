//! Pending-exception slot (ABI.md §6).
//!
//! The module has no failure channel compatible with the host's, so a host
//! callback that fails while servicing it writes this two-word slot and
//! returns a sentinel through its normal channel. The dispatcher checks the
//! slot immediately after every callback return and consumes it at most
//! once; the slot is reused by the next call, never batched.

/// Discriminant: no pending failure.
pub const EXN_NONE: u32 = 0;
/// Discriminant: the last callback failed; the payload handle is live.
pub const EXN_FAILED: u32 = 1;

/// Out-of-band failure channel: a discriminant word plus a handle word.
#[derive(Debug, Default)]
pub struct ExceptionSlot {
    status: u32,
    payload: u32,
}

impl ExceptionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure. Any previous failure must already be consumed.
    pub fn report(&mut self, handle: u32) {
        assert_eq!(
            self.status, EXN_NONE,
            "pending exception overwritten before consumption"
        );
        self.status = EXN_FAILED;
        self.payload = handle;
    }

    /// Consume the pending failure handle, if any, resetting the slot.
    pub fn take(&mut self) -> Option<u32> {
        if self.status == EXN_FAILED {
            self.status = EXN_NONE;
            Some(self.payload)
        } else {
            None
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == EXN_FAILED
    }
}
