//! Typed views over module memory, cached against buffer identity.
//!
//! A view is valid only while the module's memory has not grown. The cache
//! compares buffer identity on every access and lazily rebuilds stale
//! views, so consumers that re-fetch after allocator calls (ABI.md §2)
//! never read through a detached buffer.
//!
//! Range violations panic: pointers reaching a view were produced by the
//! module's own allocator or by the bridge, so an out-of-bounds range is a
//! broken invariant, not an input error.

use crate::memory::MemoryBuffer;

/// Byte-granular window over one specific buffer.
#[derive(Debug, Clone)]
pub struct ByteView {
    buf: MemoryBuffer,
}

impl ByteView {
    fn new(buf: MemoryBuffer) -> Self {
        Self { buf }
    }

    pub fn same_buffer(&self, mem: &MemoryBuffer) -> bool {
        self.buf.same_buffer(mem)
    }

    pub fn read(&self, ptr: u32, len: u32) -> Vec<u8> {
        let (start, end) = checked_range(&self.buf, ptr, len);
        self.buf.with(|m| m[start..end].to_vec())
    }

    pub fn write(&self, ptr: u32, data: &[u8]) {
        let (start, end) = checked_range(&self.buf, ptr, data.len() as u32);
        self.buf.with_mut(|m| m[start..end].copy_from_slice(data));
    }
}

/// 32-bit little-endian window. Pointers must be 4-aligned.
#[derive(Debug, Clone)]
pub struct WordView {
    buf: MemoryBuffer,
}

impl WordView {
    fn new(buf: MemoryBuffer) -> Self {
        Self { buf }
    }

    pub fn same_buffer(&self, mem: &MemoryBuffer) -> bool {
        self.buf.same_buffer(mem)
    }

    pub fn read_word(&self, ptr: u32) -> u32 {
        debug_assert_eq!(ptr % 4, 0, "unaligned word read at {ptr}");
        let (start, end) = checked_range(&self.buf, ptr, 4);
        self.buf.with(|m| {
            let mut word = [0u8; 4];
            word.copy_from_slice(&m[start..end]);
            u32::from_le_bytes(word)
        })
    }

    pub fn write_word(&self, ptr: u32, value: u32) {
        debug_assert_eq!(ptr % 4, 0, "unaligned word write at {ptr}");
        let (start, end) = checked_range(&self.buf, ptr, 4);
        self.buf
            .with_mut(|m| m[start..end].copy_from_slice(&value.to_le_bytes()));
    }
}

fn checked_range(buf: &MemoryBuffer, ptr: u32, len: u32) -> (usize, usize) {
    let start = ptr as usize;
    let end = start + len as usize;
    let size = buf.len();
    if end > size {
        panic!("memory range {start}..{end} out of bounds (memory is {size} bytes)");
    }
    (start, end)
}

/// Lazily rebuilt view cache, keyed on buffer identity.
#[derive(Debug, Default)]
pub struct ViewCache {
    bytes: Option<ByteView>,
    words: Option<WordView>,
    rebuilds: u64,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many views have been (re)built. Exposed so tests can pin down
    /// exactly when growth invalidated the cache.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn byte_view(&mut self, mem: &MemoryBuffer) -> &ByteView {
        if !matches!(&self.bytes, Some(v) if v.same_buffer(mem)) {
            self.bytes = None;
            self.rebuilds += 1;
        }
        self.bytes.get_or_insert_with(|| ByteView::new(mem.clone()))
    }

    pub fn word_view(&mut self, mem: &MemoryBuffer) -> &WordView {
        if !matches!(&self.words, Some(v) if v.same_buffer(mem)) {
            self.words = None;
            self.rebuilds += 1;
        }
        self.words.get_or_insert_with(|| WordView::new(mem.clone()))
    }
}
