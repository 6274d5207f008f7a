//! In-memory reference implementation of the module ABI.
//!
//! `MemGuest` mirrors the memory behavior of a real module without running
//! one: page-granular growth that swaps in a fresh buffer (so stale views
//! detach exactly as they would on the real boundary), a bump allocator
//! that can extend its most recent block in place, and counters so tests
//! can pin down which allocator paths ran. Deterministic by construction.

use crate::abi::GuestAbi;
use crate::error::BridgeError;
use crate::memory::MemoryBuffer;

/// Linear memory page size in bytes.
pub const PAGE_SIZE: u32 = 65536;

// Zero page start is reserved so a zero pointer stays distinguishable.
const ALLOC_BASE: u32 = 8;

fn align8(size: u32) -> u32 {
    (size + 7) & !7
}

/// Allocation counters, exposed for tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemStats {
    pub alloc_calls: u64,
    pub realloc_calls: u64,
    pub free_calls: u64,
    pub grows: u64,
}

/// A `GuestAbi` backed by a plain paged buffer.
#[derive(Debug)]
pub struct MemGuest {
    mem: MemoryBuffer,
    bump: u32,
    /// Pointer and aligned size of the most recent block, while it is
    /// still the top of the bump region.
    last: Option<(u32, u32)>,
    max_pages: u32,
    stats: MemStats,
}

impl MemGuest {
    /// One initial page, 16-page (1 MiB) limit.
    pub fn new() -> Self {
        Self::with_limit(16)
    }

    pub fn with_limit(max_pages: u32) -> Self {
        Self {
            mem: MemoryBuffer::new(PAGE_SIZE as usize),
            bump: ALLOC_BASE,
            last: None,
            max_pages,
            stats: MemStats::default(),
        }
    }

    pub fn stats(&self) -> MemStats {
        self.stats
    }

    /// Read raw bytes, for staging and inspecting test payloads.
    pub fn read_bytes(&self, ptr: u32, len: u32) -> Vec<u8> {
        let (start, end) = (ptr as usize, (ptr + len) as usize);
        self.mem.with(|m| m[start..end].to_vec())
    }

    /// Write raw bytes, for staging test payloads.
    pub fn write_bytes(&mut self, ptr: u32, data: &[u8]) {
        let (start, end) = (ptr as usize, ptr as usize + data.len());
        self.mem.with_mut(|m| m[start..end].copy_from_slice(data));
    }

    /// Grow memory (replacing the buffer) until `end` fits.
    fn grow_to(&mut self, end: u32, requested: u32) -> Result<(), BridgeError> {
        if end as usize <= self.mem.len() {
            return Ok(());
        }
        let pages = (end as usize).div_ceil(PAGE_SIZE as usize);
        if pages > self.max_pages as usize {
            return Err(BridgeError::AllocFailed { size: requested });
        }
        self.stats.grows += 1;
        self.mem = self.mem.grown(pages * PAGE_SIZE as usize);
        Ok(())
    }

    fn push_block(&mut self, size: u32) -> Result<u32, BridgeError> {
        let aligned = align8(size.max(1));
        let ptr = self.bump;
        self.grow_to(ptr + aligned, size)?;
        self.bump = ptr + aligned;
        self.last = Some((ptr, aligned));
        Ok(ptr)
    }
}

impl Default for MemGuest {
    fn default() -> Self {
        Self::new()
    }
}

impl GuestAbi for MemGuest {
    fn memory(&self) -> MemoryBuffer {
        self.mem.clone()
    }

    fn alloc(&mut self, size: u32) -> Result<u32, BridgeError> {
        self.stats.alloc_calls += 1;
        self.push_block(size)
    }

    fn realloc(&mut self, ptr: u32, old_size: u32, new_size: u32) -> Result<u32, BridgeError> {
        self.stats.realloc_calls += 1;
        let aligned = align8(new_size.max(1));
        if let Some((last_ptr, _)) = self.last {
            if last_ptr == ptr {
                // top block: resize in place
                self.grow_to(ptr + aligned, new_size)?;
                self.bump = ptr + aligned;
                self.last = Some((ptr, aligned));
                return Ok(ptr);
            }
        }
        // interior block: move to the top and copy the live prefix
        let dst = self.push_block(new_size)?;
        let keep = old_size.min(new_size);
        self.mem.with_mut(|m| {
            m.copy_within(ptr as usize..(ptr + keep) as usize, dst as usize);
        });
        Ok(dst)
    }

    fn free(&mut self, ptr: u32, size: u32) {
        self.stats.free_calls += 1;
        // only the top block can be rolled back
        if let Some((last_ptr, last_aligned)) = self.last {
            if last_ptr == ptr && align8(size.max(1)) == last_aligned {
                self.bump = last_ptr;
                self.last = None;
            }
        }
    }
}
