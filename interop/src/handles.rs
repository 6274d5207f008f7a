//! Handle table and borrow stack over one shared slot arena.
//!
//! Handle space layout (ABI.md §1):
//!
//! ```text
//!   0..=3    sentinels: undefined, null, true, false (never reclaimed)
//!   4..=35   borrow region, filled downward from 36 (32 call-scoped slots)
//!   36..     heap slots, reused through an embedded free list
//! ```
//!
//! A free heap slot stores the index of the next free slot; the chain is
//! terminated by an index equal to the arena length, which means "grow by
//! one". `drop_ref` below the heap base is a no-op, so sentinels and
//! borrowed handles can be released through the same path as heap handles.

use crate::value::Value;

pub const SENTINEL_UNDEFINED: u32 = 0;
pub const SENTINEL_NULL: u32 = 1;
pub const SENTINEL_TRUE: u32 = 2;
pub const SENTINEL_FALSE: u32 = 3;

/// Lowest usable borrow slot; a push that would land below it is fatal.
pub const BORROW_FLOOR: u32 = 4;

/// First heap slot; also the initial borrow stack pointer.
pub const HEAP_BASE: u32 = 36;

#[derive(Debug)]
enum Slot {
    Live(Value),
    Free(u32),
}

/// Arena of host values addressed by integer handle.
#[derive(Debug)]
pub struct HandleTable {
    slots: Vec<Slot>,
    free_head: u32,
    stack_pointer: u32,
}

impl HandleTable {
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(HEAP_BASE as usize);
        slots.push(Slot::Live(Value::Undefined));
        slots.push(Slot::Live(Value::Null));
        slots.push(Slot::Live(Value::Bool(true)));
        slots.push(Slot::Live(Value::Bool(false)));
        // vacant borrow slots hold undefined until pushed over
        while slots.len() < HEAP_BASE as usize {
            slots.push(Slot::Live(Value::Undefined));
        }
        Self {
            slots,
            free_head: HEAP_BASE,
            stack_pointer: HEAP_BASE,
        }
    }

    /// Store a value in a heap slot and return its handle.
    pub fn alloc(&mut self, value: Value) -> u32 {
        if self.free_head == self.slots.len() as u32 {
            self.slots.push(Slot::Free(self.slots.len() as u32 + 1));
        }
        let idx = self.free_head;
        match &self.slots[idx as usize] {
            Slot::Free(next) => self.free_head = *next,
            Slot::Live(_) => panic!("free list head {idx} points at a live slot"),
        }
        self.slots[idx as usize] = Slot::Live(value);
        idx
    }

    /// Non-destructive lookup. The handle must be live.
    pub fn get(&self, handle: u32) -> Value {
        match self.slots.get(handle as usize) {
            Some(Slot::Live(value)) => value.clone(),
            Some(Slot::Free(_)) => panic!("handle {handle} is not live"),
            None => panic!("handle {handle} is out of table bounds"),
        }
    }

    /// Look up and free in one step (ownership transfer).
    pub fn take(&mut self, handle: u32) -> Value {
        let value = self.get(handle);
        self.drop_ref(handle);
        value
    }

    /// Free a heap slot. Sentinels and borrow slots are no-ops.
    pub fn drop_ref(&mut self, handle: u32) {
        if handle < HEAP_BASE {
            return;
        }
        match self.slots.get(handle as usize) {
            Some(Slot::Live(_)) => {}
            _ => panic!("dropping handle {handle} which is not live"),
        }
        self.slots[handle as usize] = Slot::Free(self.free_head);
        self.free_head = handle;
    }

    /// Duplicate the reference behind `handle` under a fresh handle.
    pub fn clone_ref(&mut self, handle: u32) -> u32 {
        let value = self.get(handle);
        self.alloc(value)
    }

    /// Push a call-scoped value onto the borrow stack.
    ///
    /// The returned handle is indistinguishable from a heap handle to
    /// consumers but is only valid until the matching [`pop_borrowed`].
    ///
    /// [`pop_borrowed`]: HandleTable::pop_borrowed
    pub fn push_borrowed(&mut self, value: Value) -> u32 {
        if self.stack_pointer == BORROW_FLOOR {
            panic!("borrow stack exhausted");
        }
        self.stack_pointer -= 1;
        self.slots[self.stack_pointer as usize] = Slot::Live(value);
        self.stack_pointer
    }

    /// Release the most recent borrow. Exactly one pop per push, on every
    /// exit path of the call that pushed.
    pub fn pop_borrowed(&mut self) {
        if self.stack_pointer == HEAP_BASE {
            panic!("borrow stack pop without a matching push");
        }
        self.slots[self.stack_pointer as usize] = Slot::Live(Value::Undefined);
        self.stack_pointer += 1;
    }

    /// Current borrow stack pointer (equals [`HEAP_BASE`] when empty).
    pub fn stack_pointer(&self) -> u32 {
        self.stack_pointer
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    #[cfg(test)]
    fn free_head(&self) -> u32 {
        self.free_head
    }
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        let table = HandleTable::new();
        assert_eq!(table.get(SENTINEL_UNDEFINED), Value::Undefined);
        assert_eq!(table.get(SENTINEL_NULL), Value::Null);
        assert_eq!(table.get(SENTINEL_TRUE), Value::Bool(true));
        assert_eq!(table.get(SENTINEL_FALSE), Value::Bool(false));
    }

    #[test]
    fn test_alloc_get_round_trip() {
        let mut table = HandleTable::new();
        let v = Value::array(vec![Value::Number(1.0)]);
        let h = table.alloc(v.clone());
        assert_eq!(h, HEAP_BASE);
        assert_eq!(table.get(h), v);
        // get is non-destructive
        assert_eq!(table.get(h), v);
    }

    #[test]
    fn test_take_frees_the_slot() {
        let mut table = HandleTable::new();
        let h = table.alloc(Value::str("x"));
        assert_eq!(table.take(h), Value::str("x"));
        // the slot is immediately reusable
        assert_eq!(table.alloc(Value::str("y")), h);
    }

    #[test]
    #[should_panic(expected = "not live")]
    fn test_get_after_take_panics() {
        let mut table = HandleTable::new();
        let h = table.alloc(Value::Null);
        table.take(h);
        table.get(h);
    }

    #[test]
    #[should_panic(expected = "out of table bounds")]
    fn test_get_out_of_bounds_panics() {
        HandleTable::new().get(10_000);
    }

    #[test]
    fn test_grows_one_slot_at_a_time() {
        let mut table = HandleTable::new();
        assert_eq!(table.slot_count(), HEAP_BASE as usize);
        table.alloc(Value::Null);
        assert_eq!(table.slot_count(), HEAP_BASE as usize + 1);
        table.alloc(Value::Null);
        assert_eq!(table.slot_count(), HEAP_BASE as usize + 2);
    }

    #[test]
    fn test_free_list_reuses_in_reverse_free_order() {
        let mut table = HandleTable::new();
        let handles: Vec<u32> = (0..5).map(|i| table.alloc(Value::Number(i as f64))).collect();

        table.drop_ref(handles[1]);
        table.drop_ref(handles[3]);
        assert_eq!(table.free_head(), handles[3]);

        // freed slots come back most-recently-freed first
        assert_eq!(table.alloc(Value::Null), handles[3]);
        assert_eq!(table.alloc(Value::Null), handles[1]);
        // then the table grows again
        assert_eq!(table.alloc(Value::Null), handles[4] + 1);
    }

    #[test]
    fn test_no_handle_issued_twice_while_live() {
        let mut table = HandleTable::new();
        let mut seen = std::collections::BTreeSet::new();
        for i in 0..64 {
            let h = table.alloc(Value::Number(i as f64));
            assert!(seen.insert(h), "handle {h} issued twice");
        }
    }

    #[test]
    fn test_drop_below_heap_base_is_noop() {
        let mut table = HandleTable::new();
        table.drop_ref(SENTINEL_TRUE);
        assert_eq!(table.get(SENTINEL_TRUE), Value::Bool(true));

        let b = table.push_borrowed(Value::str("arg"));
        table.drop_ref(b);
        assert_eq!(table.get(b), Value::str("arg"));
        table.pop_borrowed();
    }

    #[test]
    fn test_clone_ref_preserves_identity() {
        let mut table = HandleTable::new();
        let arr = Value::array(vec![]);
        let h1 = table.alloc(arr.clone());
        let h2 = table.clone_ref(h1);
        assert_ne!(h1, h2);
        // both handles refer to the same array
        assert_eq!(table.get(h1), table.get(h2));
        table.drop_ref(h1);
        assert_eq!(table.get(h2), arr);
    }

    #[test]
    fn test_borrow_push_pop() {
        let mut table = HandleTable::new();
        assert_eq!(table.stack_pointer(), HEAP_BASE);

        let b1 = table.push_borrowed(Value::Number(1.0));
        assert_eq!(b1, HEAP_BASE - 1);
        let b2 = table.push_borrowed(Value::Number(2.0));
        assert_eq!(b2, HEAP_BASE - 2);
        assert_eq!(table.get(b2), Value::Number(2.0));

        table.pop_borrowed();
        table.pop_borrowed();
        assert_eq!(table.stack_pointer(), HEAP_BASE);
        // the vacated slot is scrubbed
        assert_eq!(table.get(b1), Value::Undefined);
    }

    #[test]
    fn test_borrow_region_does_not_touch_heap() {
        let mut table = HandleTable::new();
        let h = table.alloc(Value::str("heap"));
        for i in 0..32 {
            table.push_borrowed(Value::Number(i as f64));
        }
        assert_eq!(table.stack_pointer(), BORROW_FLOOR);
        assert_eq!(table.get(h), Value::str("heap"));
        for _ in 0..32 {
            table.pop_borrowed();
        }
        assert_eq!(table.get(h), Value::str("heap"));
    }

    #[test]
    #[should_panic(expected = "borrow stack exhausted")]
    fn test_borrow_exhaustion_is_fatal() {
        let mut table = HandleTable::new();
        for i in 0..33 {
            table.push_borrowed(Value::Number(i as f64));
        }
    }

    #[test]
    #[should_panic(expected = "pop without a matching push")]
    fn test_unbalanced_pop_panics() {
        HandleTable::new().pop_borrowed();
    }

    #[test]
    fn test_reuse_scenario() {
        // allocate true, "abc", and an empty array; free the string; the
        // next allocation must reuse the string's index
        let mut table = HandleTable::new();
        let h_true = table.alloc(Value::Bool(true));
        let h_str = table.alloc(Value::str("abc"));
        let h_arr = table.alloc(Value::array(vec![]));

        table.drop_ref(h_str);
        let h_new = table.alloc(Value::Number(7.0));
        assert_eq!(h_new, h_str);

        assert_eq!(table.get(h_true), Value::Bool(true));
        assert_eq!(table.get(h_arr).get_prop("length").unwrap(), Value::Number(0.0));
    }
}
