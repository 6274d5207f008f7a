//! Seams between the bridge and the two sides it does not own.
//!
//! `GuestAbi` is the numeric surface every module exposes (ABI.md §2);
//! `GuestModule` adds named entry points on top of it; `HostDispatch` is
//! how a module reaches back into the host mid-invoke. Everything crossing
//! these traits is a `u32` word (handle, pointer, length, bool as 0/1, or
//! variant tag) plus raw byte ranges read through the module's memory.

use crate::error::BridgeError;
use crate::memory::MemoryBuffer;

/// Static facts a module declares about itself, checked at session start.
#[derive(Debug, Clone, Default)]
pub struct ModuleInfo {
    pub name: String,
    /// Entry points the module exports.
    pub entries: Vec<String>,
    /// Host imports the module may call during an invoke.
    pub imports: Vec<String>,
}

/// The numeric ABI of a module: linear memory plus an allocator.
pub trait GuestAbi {
    // ── Memory (ABI.md §2) ──

    /// Handle to the current linear memory.
    ///
    /// Growth replaces the buffer rather than extending it, so a handle
    /// fetched before an allocator call may be stale afterward; callers
    /// re-fetch after any call that can grow memory.
    fn memory(&self) -> MemoryBuffer;

    // ── Allocator (ABI.md §2) ──

    /// Allocate `size` bytes, 8-byte aligned. Never returns a pointer into
    /// the reserved zero page.
    fn alloc(&mut self, size: u32) -> Result<u32, BridgeError>;

    /// Resize an allocation. The returned pointer may differ from `ptr`;
    /// the first `min(old_size, new_size)` bytes are preserved.
    fn realloc(&mut self, ptr: u32, old_size: u32, new_size: u32) -> Result<u32, BridgeError>;

    /// Return an allocation to the module.
    fn free(&mut self, ptr: u32, size: u32);
}

/// How the module reaches back into the host while servicing an invoke.
pub trait HostDispatch {
    /// Call the named host import with raw ABI words.
    ///
    /// The module lends its ABI surface back through `guest` so the import
    /// can read and write its memory. An `Err` is either a propagated host
    /// failure (the far side threw; identity preserved) or allocator
    /// exhaustion, and a well-behaved module returns it from its invoke
    /// unchanged.
    fn call_host(
        &mut self,
        guest: &mut dyn GuestAbi,
        name: &str,
        args: &[u32],
    ) -> Result<u32, BridgeError>;
}

/// A loadable compute module: the numeric ABI plus named entry points.
pub trait GuestModule: GuestAbi {
    /// Declared name, entry points, and required imports.
    fn info(&self) -> ModuleInfo;

    /// Invoke a named entry point with raw ABI words.
    ///
    /// Entries return at most one word; larger results go through memory
    /// (retptr) or through handles. Callbacks into the host go through
    /// `host`.
    fn invoke(
        &mut self,
        entry: &str,
        args: &[u32],
        host: &mut dyn HostDispatch,
    ) -> Result<u32, BridgeError>;
}
