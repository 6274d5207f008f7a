//! The bridge dispatcher: one owned context for a whole session.
//!
//! `Bridge` holds everything the import table touches (handle table,
//! view cache, pending-exception slot, console sink) and implements
//! [`HostDispatch`] so a module can call back mid-invoke. After every
//! import returns, the dispatcher converts a written exception slot into
//! `BridgeError::Propagated` on the spot; the slot never survives past the
//! call that wrote it (ABI.md §6).

use std::collections::BTreeMap;

use gangplank_interop::codec::{self, StrSpan};
use gangplank_interop::{
    BridgeError, ExceptionSlot, GuestAbi, HandleTable, HostDispatch, Value, ViewCache,
};

use crate::console::{ConsoleSink, LogSink};
use crate::imports;

/// Everything an import body may touch while servicing one callback.
pub struct ImportCx<'a> {
    pub handles: &'a mut HandleTable,
    pub views: &'a mut ViewCache,
    pub guest: &'a mut dyn GuestAbi,
    pub sink: &'a mut dyn ConsoleSink,
    slot: &'a mut ExceptionSlot,
}

impl ImportCx<'_> {
    /// Record a host-side failure in the pending-exception slot and hand
    /// back the sentinel word the failing import must return.
    pub fn fail(&mut self, error: Value) -> u32 {
        let handle = self.handles.alloc(error);
        self.slot.report(handle);
        0
    }

    /// Decode a guest string at (ptr, len).
    pub fn decode(&mut self, ptr: u32, len: u32) -> String {
        codec::decode_str(self.views, self.guest, ptr, len)
    }

    /// Encode a host string into guest memory.
    pub fn encode(&mut self, text: &str) -> Result<StrSpan, BridgeError> {
        codec::encode_str(self.views, self.guest, text)
    }
}

/// An import body. All state arrives through the context; the words are
/// the raw arguments the module passed.
pub type ImportFn = fn(&mut ImportCx<'_>, &[u32]) -> Result<u32, BridgeError>;

#[derive(Clone, Copy)]
struct HostImport {
    arity: usize,
    body: ImportFn,
}

/// Dispatcher plus the session-scoped bridge state it guards.
pub struct Bridge {
    pub(crate) handles: HandleTable,
    pub(crate) views: ViewCache,
    slot: ExceptionSlot,
    sink: Box<dyn ConsoleSink>,
    imports: BTreeMap<&'static str, HostImport>,
}

impl Bridge {
    /// A bridge with the standard import table and the `log`-backed sink.
    pub fn new() -> Self {
        Self::with_sink(Box::new(LogSink))
    }

    pub fn with_sink(sink: Box<dyn ConsoleSink>) -> Self {
        let mut bridge = Self {
            handles: HandleTable::new(),
            views: ViewCache::new(),
            slot: ExceptionSlot::new(),
            sink,
            imports: BTreeMap::new(),
        };
        imports::install(&mut bridge);
        bridge
    }

    pub fn register(&mut self, name: &'static str, arity: usize, body: ImportFn) {
        self.imports.insert(name, HostImport { arity, body });
    }

    /// Names of all provided imports, sorted.
    pub fn provides(&self) -> Vec<&'static str> {
        self.imports.keys().copied().collect()
    }

    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    pub fn handles_mut(&mut self) -> &mut HandleTable {
        &mut self.handles
    }

    pub fn views_mut(&mut self) -> &mut ViewCache {
        &mut self.views
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl HostDispatch for Bridge {
    fn call_host(
        &mut self,
        guest: &mut dyn GuestAbi,
        name: &str,
        args: &[u32],
    ) -> Result<u32, BridgeError> {
        let HostImport { arity, body } = match self.imports.get(name) {
            Some(import) => *import,
            None => panic!("unknown host import `{name}`"),
        };
        if args.len() != arity {
            panic!("host import `{name}` takes {arity} words, got {}", args.len());
        }

        let mut cx = ImportCx {
            handles: &mut self.handles,
            views: &mut self.views,
            guest,
            sink: self.sink.as_mut(),
            slot: &mut self.slot,
        };
        let ret = body(&mut cx, args)?;

        // the slot is checked here and nowhere else, immediately after the
        // body that could have written it
        if let Some(handle) = self.slot.take() {
            let error = self.handles.take(handle);
            return Err(BridgeError::Propagated(error));
        }
        Ok(ret)
    }
}
