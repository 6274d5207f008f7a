//! Array marshaler: ordered host sequences as contiguous handle runs
//! (ABI.md §4).

use crate::abi::GuestAbi;
use crate::error::BridgeError;
use crate::handles::HandleTable;
use crate::value::Value;
use crate::views::ViewCache;

/// Bytes per handle in a marshaled run.
pub const HANDLE_WIDTH: u32 = 4;

/// Write `values` into module memory as a run of fresh handles.
///
/// Each element is allocated its own handle, preserving the host-side
/// identity of the elements; the container itself does not cross. The
/// module owns the returned run and the handles in it, and must free or
/// consume each one.
pub fn marshal_values(
    handles: &mut HandleTable,
    views: &mut ViewCache,
    guest: &mut dyn GuestAbi,
    values: &[Value],
) -> Result<(u32, u32), BridgeError> {
    let count = values.len() as u32;
    let ptr = guest.alloc(count * HANDLE_WIDTH)?;
    // fetch the view only after the allocation that may grow memory
    let words = views.word_view(&guest.memory());
    for (i, value) in values.iter().enumerate() {
        let handle = handles.alloc(value.clone());
        words.write_word(ptr + i as u32 * HANDLE_WIDTH, handle);
    }
    Ok((ptr, count))
}

/// Read a marshaled run back, consuming each handle (ownership returns to
/// the host). Order is preserved end-to-end.
pub fn unmarshal_values(
    handles: &mut HandleTable,
    views: &mut ViewCache,
    guest: &dyn GuestAbi,
    ptr: u32,
    count: u32,
) -> Vec<Value> {
    let words = views.word_view(&guest.memory());
    let run: Vec<u32> = (0..count)
        .map(|i| words.read_word(ptr + i * HANDLE_WIDTH))
        .collect();
    run.into_iter().map(|h| handles.take(h)).collect()
}
