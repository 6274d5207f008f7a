//! `gangplank-interop` — cross-boundary value interop bridge core.
//!
//! The mechanism that lets a host runtime and a sandboxed compute module
//! (sharing no object model, no garbage collector, no pointer space)
//! exchange opaque values, strings, numeric buffers, and exceptions. The
//! boundary itself carries nothing but `u32` words and raw byte ranges;
//! everything richer goes through:
//!
//! - `HandleTable` — integer handles over host values, reused via an
//!   embedded free list, with a LIFO borrow region for call-scoped values
//! - `codec` / `array` — strings and ordered sequences across linear memory
//! - `ExceptionSlot` — out-of-band failure channel for host callbacks
//! - `ViewCache` — typed memory views invalidated exactly on growth
//! - `GuestAbi` / `GuestModule` / `HostDispatch` — the seams to the two
//!   sides the bridge does not own
//! - `MemGuest` — deterministic in-memory module ABI for tests
//!
//! The numeric contract (layout constants, allocator rules, encodings) is
//! written down in ABI.md at the workspace root.

pub mod abi;
pub mod array;
pub mod codec;
pub mod error;
pub mod exn;
pub mod handles;
pub mod json;
pub mod mem_guest;
pub mod memory;
pub mod value;
pub mod views;

// Re-export commonly used types at the crate root.
pub use abi::{GuestAbi, GuestModule, HostDispatch, ModuleInfo};
pub use codec::StrSpan;
pub use error::BridgeError;
pub use exn::ExceptionSlot;
pub use handles::HandleTable;
pub use mem_guest::MemGuest;
pub use memory::MemoryBuffer;
pub use value::Value;
pub use views::ViewCache;
