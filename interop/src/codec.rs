//! String codec: UTF-8 text across linear memory (ABI.md §3).
//!
//! Encoding is two-phase. The ASCII prefix is copied byte-for-byte into an
//! allocation sized in UTF-16 units; for the common all-ASCII case that
//! single pass is the whole job. Any remainder forces one reallocation to
//! the worst case of 3 bytes per remaining UTF-16 unit, and the remainder's
//! UTF-8 bytes are written into the tail. The true written length is
//! recorded separately; it may be less than the capacity allocated, and the
//! excess is never trimmed.

use crate::abi::GuestAbi;
use crate::error::BridgeError;
use crate::views::ViewCache;

/// Location and true byte length of an encoded string in module memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrSpan {
    pub ptr: u32,
    pub len: u32,
}

/// Encode `text` into fresh module-owned memory.
pub fn encode_str(
    views: &mut ViewCache,
    guest: &mut dyn GuestAbi,
    text: &str,
) -> Result<StrSpan, BridgeError> {
    let bytes = text.as_bytes();
    let ascii = bytes.iter().take_while(|b| b.is_ascii()).count() as u32;

    if ascii == bytes.len() as u32 {
        let ptr = guest.alloc(ascii)?;
        views.byte_view(&guest.memory()).write(ptr, bytes);
        return Ok(StrSpan { ptr, len: ascii });
    }

    let rest = &text[ascii as usize..];
    let units = ascii + rest.encode_utf16().count() as u32;
    let ptr = guest.alloc(units)?;
    views
        .byte_view(&guest.memory())
        .write(ptr, &bytes[..ascii as usize]);

    let capacity = ascii + (units - ascii) * 3;
    let ptr = guest.realloc(ptr, units, capacity)?;
    // realloc may have moved the block or grown memory; the view above is
    // dead either way
    views
        .byte_view(&guest.memory())
        .write(ptr + ascii, rest.as_bytes());

    Ok(StrSpan {
        ptr,
        len: ascii + rest.len() as u32,
    })
}

/// Decode `len` bytes at `ptr` from module memory into a host string.
/// Invalid UTF-8 is replaced, not rejected.
pub fn decode_str(views: &mut ViewCache, guest: &dyn GuestAbi, ptr: u32, len: u32) -> String {
    let bytes = views.byte_view(&guest.memory()).read(ptr, len);
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem_guest::MemGuest;

    fn round_trip(text: &str) -> (StrSpan, String, MemGuest) {
        let mut guest = MemGuest::new();
        let mut views = ViewCache::new();
        let span = encode_str(&mut views, &mut guest, text).unwrap();
        let back = decode_str(&mut views, &guest, span.ptr, span.len);
        (span, back, guest)
    }

    #[test]
    fn test_ascii_round_trip_skips_realloc() {
        let (span, back, guest) = round_trip("entry_label_07");
        assert_eq!(back, "entry_label_07");
        assert_eq!(span.len, 14);
        assert_eq!(guest.stats().realloc_calls, 0);
        assert_eq!(guest.stats().alloc_calls, 1);
    }

    #[test]
    fn test_empty_string() {
        let (span, back, guest) = round_trip("");
        assert_eq!(back, "");
        assert_eq!(span.len, 0);
        assert_eq!(guest.stats().realloc_calls, 0);
    }

    #[test]
    fn test_multibyte_round_trip_reallocs_once() {
        let (span, back, guest) = round_trip("läbel");
        assert_eq!(back, "läbel");
        // 'ä' is two UTF-8 bytes
        assert_eq!(span.len, 6);
        assert_eq!(guest.stats().realloc_calls, 1);
    }

    #[test]
    fn test_astral_round_trip() {
        // surrogate pairs: 2 UTF-16 units, 4 UTF-8 bytes, under the
        // 3-bytes-per-unit worst case
        let (span, back, _) = round_trip("ok\u{1F600}!");
        assert_eq!(back, "ok\u{1F600}!");
        assert_eq!(span.len, 7);
    }

    #[test]
    fn test_written_length_below_capacity() {
        let mut guest = MemGuest::new();
        let mut views = ViewCache::new();
        // one ASCII byte + one 2-byte character: capacity is 1 + 3, length 3
        let span = encode_str(&mut views, &mut guest, "aé").unwrap();
        assert_eq!(span.len, 3);
        let next = guest.alloc(1).unwrap();
        assert!(next >= span.ptr + 4, "worst-case tail was not reserved");
    }

    #[test]
    fn test_worst_case_realloc_grows_memory_mid_encode() {
        // the prefix is written through a view over the original buffer;
        // the worst-case realloc then grows memory, so the tail write must
        // go through a rebuilt view
        let mut guest = MemGuest::with_limit(8);
        let mut views = ViewCache::new();
        let text = "é".repeat(30_000);
        let span = encode_str(&mut views, &mut guest, &text).unwrap();
        assert_eq!(guest.stats().realloc_calls, 1);
        assert!(guest.stats().grows >= 1);
        assert_eq!(span.len, 60_000);
        assert_eq!(decode_str(&mut views, &guest, span.ptr, span.len), text);
    }

    #[test]
    fn test_alloc_failure_propagates() {
        let mut guest = MemGuest::with_limit(1);
        let mut views = ViewCache::new();
        let text = "y".repeat(2 * 65536);
        assert!(matches!(
            encode_str(&mut views, &mut guest, &text),
            Err(BridgeError::AllocFailed { .. })
        ));
    }

    #[test]
    fn test_decode_replaces_invalid_utf8() {
        let mut guest = MemGuest::new();
        let mut views = ViewCache::new();
        let ptr = guest.alloc(3).unwrap();
        guest.write_bytes(ptr, &[b'a', 0xFF, b'b']);
        assert_eq!(decode_str(&mut views, &guest, ptr, 3), "a\u{FFFD}b");
    }
}
