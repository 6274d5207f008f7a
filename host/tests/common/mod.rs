//! Shared test helpers for integration tests.
//!
//! Provides session factories, a recording console, and small module-side
//! staging helpers used across all integration test files.

#![allow(dead_code)]

use gangplank_host::{Bridge, RecordingSink, ScriptedGuest, Session, SessionConfig};
use gangplank_interop::{GuestAbi, MemGuest};

/// Session over a scripted module with default configuration.
pub fn session(guest: ScriptedGuest) -> Session<ScriptedGuest> {
    match Session::new(guest, &SessionConfig::default()) {
        Ok(session) => session,
        Err(err) => panic!("session construction failed: {err}"),
    }
}

/// Session whose console output lands in the returned recorder.
pub fn recording_session(guest: ScriptedGuest) -> (Session<ScriptedGuest>, RecordingSink) {
    let sink = RecordingSink::default();
    let watcher = sink.clone();
    let bridge = Bridge::with_sink(Box::new(sink));
    match Session::with_bridge(guest, &SessionConfig::default(), bridge) {
        Ok(session) => (session, watcher),
        Err(err) => panic!("session construction failed: {err}"),
    }
}

// ── Module-side staging ──

/// Copy a string into module memory; returns the (ptr, len) words.
pub fn stage_str(mem: &mut MemGuest, text: &str) -> (u32, u32) {
    let ptr = mem.alloc(text.len() as u32).expect("staging alloc");
    mem.write_bytes(ptr, text.as_bytes());
    (ptr, text.len() as u32)
}

/// Read a run of little-endian words out of module memory.
pub fn read_words(mem: &MemGuest, ptr: u32, count: u32) -> Vec<u32> {
    let bytes = mem.read_bytes(ptr, count * 4);
    bytes
        .chunks_exact(4)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .collect()
}
