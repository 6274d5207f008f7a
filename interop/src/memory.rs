//! Shared handle to the module's linear memory.

use std::cell::RefCell;
use std::rc::Rc;

/// The module's linear memory buffer.
///
/// Cloning shares the same underlying storage. Growth never happens in
/// place: [`grown`](MemoryBuffer::grown) copies into a fresh buffer, so two
/// `MemoryBuffer`s answer `same_buffer == false` exactly when a growth
/// event separated them. Cached views key on this identity; a view built
/// over the old buffer keeps reading the old (stale) bytes until rebuilt.
#[derive(Debug, Clone)]
pub struct MemoryBuffer {
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl MemoryBuffer {
    /// A zero-filled buffer of `len` bytes.
    pub fn new(len: usize) -> Self {
        Self {
            bytes: Rc::new(RefCell::new(vec![0; len])),
        }
    }

    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Rc::new(RefCell::new(bytes)),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buffer identity: true iff both handles share the same storage.
    pub fn same_buffer(&self, other: &MemoryBuffer) -> bool {
        Rc::ptr_eq(&self.bytes, &other.bytes)
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.bytes.borrow())
    }

    pub(crate) fn with_mut<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        f(&mut self.bytes.borrow_mut())
    }

    /// Copy into a fresh, larger buffer. The original stays intact (and
    /// stale) for any view still holding it.
    pub fn grown(&self, new_len: usize) -> MemoryBuffer {
        let cur = self.bytes.borrow();
        debug_assert!(new_len >= cur.len());
        let mut next = vec![0; new_len];
        next[..cur.len()].copy_from_slice(&cur);
        MemoryBuffer::from_vec(next)
    }
}
