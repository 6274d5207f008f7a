//! A scripted stand-in for a compiled module.
//!
//! `ScriptedGuest` couples a real `MemGuest` with entry points written as
//! host closures. An entry receives the module memory, its raw argument
//! words, and the dispatcher, so it can run genuine callback traffic
//! (allocate, write, call imports, consume handles) without a compiled
//! artifact. Integration tests drive sessions through it.

use std::collections::BTreeMap;
use std::rc::Rc;

use gangplank_interop::{
    BridgeError, GuestAbi, GuestModule, HostDispatch, MemGuest, MemoryBuffer, ModuleInfo,
};

type EntryFn = dyn Fn(&mut MemGuest, &[u32], &mut dyn HostDispatch) -> Result<u32, BridgeError>;

pub struct ScriptedGuest {
    mem: MemGuest,
    name: String,
    entries: BTreeMap<String, Rc<EntryFn>>,
    imports: Vec<String>,
}

impl ScriptedGuest {
    pub fn new(name: &str) -> Self {
        Self {
            mem: MemGuest::new(),
            name: name.to_string(),
            entries: BTreeMap::new(),
            imports: Vec::new(),
        }
    }

    /// Add an entry point.
    pub fn entry(
        mut self,
        name: &str,
        body: impl Fn(&mut MemGuest, &[u32], &mut dyn HostDispatch) -> Result<u32, BridgeError>
            + 'static,
    ) -> Self {
        self.entries.insert(name.to_string(), Rc::new(body));
        self
    }

    /// Declare the imports this module uses; validation checks them.
    pub fn uses<S: Into<String>>(mut self, imports: impl IntoIterator<Item = S>) -> Self {
        self.imports = imports.into_iter().map(Into::into).collect();
        self
    }

    pub fn mem(&self) -> &MemGuest {
        &self.mem
    }
}

impl GuestAbi for ScriptedGuest {
    fn memory(&self) -> MemoryBuffer {
        self.mem.memory()
    }

    fn alloc(&mut self, size: u32) -> Result<u32, BridgeError> {
        self.mem.alloc(size)
    }

    fn realloc(&mut self, ptr: u32, old_size: u32, new_size: u32) -> Result<u32, BridgeError> {
        self.mem.realloc(ptr, old_size, new_size)
    }

    fn free(&mut self, ptr: u32, size: u32) {
        self.mem.free(ptr, size)
    }
}

impl GuestModule for ScriptedGuest {
    fn info(&self) -> ModuleInfo {
        ModuleInfo {
            name: self.name.clone(),
            entries: self.entries.keys().cloned().collect(),
            imports: self.imports.clone(),
        }
    }

    fn invoke(
        &mut self,
        entry: &str,
        args: &[u32],
        host: &mut dyn HostDispatch,
    ) -> Result<u32, BridgeError> {
        // clone the entry out so the body may borrow the module memory
        let body = match self.entries.get(entry) {
            Some(body) => Rc::clone(body),
            None => panic!("scripted module has no entry `{entry}`"),
        };
        body(&mut self.mem, args, host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Bridge;
    use gangplank_interop::Value;

    #[test]
    fn test_entry_runs_against_module_memory() {
        let mut guest = ScriptedGuest::new("probe").entry("fill", |mem, args, _host| {
            let ptr = mem.alloc(args[0])?;
            mem.write_bytes(ptr, &vec![0xAB; args[0] as usize]);
            Ok(ptr)
        });

        let mut bridge = Bridge::new();
        let ptr = guest.invoke("fill", &[3], &mut bridge).unwrap();
        assert_eq!(guest.mem().read_bytes(ptr, 3), vec![0xAB; 3]);
    }

    #[test]
    fn test_entry_calls_back_through_dispatcher() {
        let mut guest = ScriptedGuest::new("probe")
            .entry("make_string", |mem, _args, host| {
                let ptr = mem.alloc(2)?;
                mem.write_bytes(ptr, b"hi");
                host.call_host(mem, "string_new", &[ptr, 2])
            })
            .uses(["string_new"]);

        let mut bridge = Bridge::new();
        let handle = guest.invoke("make_string", &[], &mut bridge).unwrap();
        assert_eq!(bridge.handles().get(handle), Value::str("hi"));
    }

    #[test]
    fn test_info_reflects_registry() {
        let guest = ScriptedGuest::new("probe")
            .entry("a", |_, _, _| Ok(0))
            .entry("b", |_, _, _| Ok(0))
            .uses(["drop_ref"]);
        let info = guest.info();
        assert_eq!(info.name, "probe");
        assert_eq!(info.entries, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(info.imports, vec!["drop_ref".to_string()]);
    }

    #[test]
    #[should_panic(expected = "no entry `missing`")]
    fn test_unknown_entry_is_fatal() {
        let mut guest = ScriptedGuest::new("probe");
        let mut bridge = Bridge::new();
        let _ = guest.invoke("missing", &[], &mut bridge);
    }
}
