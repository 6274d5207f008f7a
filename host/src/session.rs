//! Session: one module instance wired to one bridge.
//!
//! `Session` owns the module and the dispatcher state for its whole life,
//! so every invoke sees the same handle table, view cache, and console
//! sink. Arguments are lowered host-side into the words the module entry
//! expects; results come back as a word, a boolean, or a value taken off
//! the table.

use std::fmt;

use gangplank_interop::{array, codec, BridgeError, GuestModule, ModuleInfo, Value};

use crate::config::SessionConfig;
use crate::dispatch::Bridge;
use crate::error::SessionError;
use crate::validation::validate_module;

/// One argument to a module entry point, before lowering.
pub enum Arg<'a> {
    /// Transfer ownership of a value; lowers to one fresh handle.
    Value(Value),
    /// Lend a value for the duration of the call; lowers to a borrow-stack
    /// handle that is reclaimed when the call returns, on success and on
    /// failure alike.
    Borrowed(&'a Value),
    /// Copy a string into module memory; lowers to a (ptr, len) pair.
    Str(&'a str),
    /// Marshal a sequence as a handle run; lowers to a (ptr, count) pair.
    Values(&'a [Value]),
    /// A raw word: integer, boolean as 0/1, variant tag.
    Word(u32),
}

pub struct Session<M: GuestModule> {
    module: M,
    bridge: Bridge,
    info: ModuleInfo,
}

impl<M: GuestModule> fmt::Debug for Session<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl<M: GuestModule> Session<M> {
    /// Validate and wire up a module with the default sink.
    pub fn new(module: M, config: &SessionConfig) -> Result<Self, SessionError> {
        Self::with_bridge(module, config, Bridge::new())
    }

    /// As [`Session::new`] with a caller-supplied bridge (custom console
    /// sink or extra registered imports).
    pub fn with_bridge(
        module: M,
        config: &SessionConfig,
        bridge: Bridge,
    ) -> Result<Self, SessionError> {
        let info = module.info();
        validate_module(&info, config, &bridge.provides())?;
        Ok(Self {
            module,
            bridge,
            info,
        })
    }

    pub fn info(&self) -> &ModuleInfo {
        &self.info
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut Bridge {
        &mut self.bridge
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    /// Invoke an entry point, returning its raw result word.
    ///
    /// Each `Arg::Borrowed` pushes one borrow-stack slot; every push is
    /// popped before this returns, whatever the outcome. Values lowered
    /// before a mid-lowering failure stay transferred, as they would had
    /// the entry consumed them.
    pub fn invoke(&mut self, entry: &str, args: &[Arg<'_>]) -> Result<u32, SessionError> {
        if !self.info.entries.iter().any(|e| e == entry) {
            return Err(SessionError::UnknownEntry {
                name: entry.to_string(),
            });
        }

        let mut words = Vec::with_capacity(args.len() * 2);
        let mut borrowed = 0usize;
        let mut lowering: Result<(), BridgeError> = Ok(());

        for arg in args {
            match arg {
                Arg::Value(value) => words.push(self.bridge.handles.alloc(value.clone())),
                Arg::Borrowed(value) => {
                    words.push(self.bridge.handles.push_borrowed((*value).clone()));
                    borrowed += 1;
                }
                Arg::Str(text) => {
                    match codec::encode_str(&mut self.bridge.views, &mut self.module, text) {
                        Ok(span) => {
                            words.push(span.ptr);
                            words.push(span.len);
                        }
                        Err(err) => {
                            lowering = Err(err);
                            break;
                        }
                    }
                }
                Arg::Values(values) => {
                    match array::marshal_values(
                        &mut self.bridge.handles,
                        &mut self.bridge.views,
                        &mut self.module,
                        values,
                    ) {
                        Ok((ptr, count)) => {
                            words.push(ptr);
                            words.push(count);
                        }
                        Err(err) => {
                            lowering = Err(err);
                            break;
                        }
                    }
                }
                Arg::Word(word) => words.push(*word),
            }
        }

        let result = match lowering {
            Ok(()) => self.module.invoke(entry, &words, &mut self.bridge),
            Err(err) => Err(err),
        };

        for _ in 0..borrowed {
            self.bridge.handles.pop_borrowed();
        }

        Ok(result?)
    }

    /// Invoke an entry point whose result word is a handle; take the value
    /// off the table (ownership returns to the host).
    pub fn invoke_value(&mut self, entry: &str, args: &[Arg<'_>]) -> Result<Value, SessionError> {
        let handle = self.invoke(entry, args)?;
        Ok(self.bridge.handles.take(handle))
    }

    /// Invoke an entry point whose result word is a boolean.
    pub fn invoke_bool(&mut self, entry: &str, args: &[Arg<'_>]) -> Result<bool, SessionError> {
        Ok(self.invoke(entry, args)? != 0)
    }
}
