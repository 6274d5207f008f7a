//! The standard host import table.
//!
//! Every name a module may declare in `ModuleInfo::imports` is defined
//! here. Each body:
//! 1. Reads its argument words (handles, pointers, lengths)
//! 2. Resolves handles against the session table
//! 3. Performs the operation on host values
//! 4. Returns one word (a fresh handle, a boolean, a length, or 0)
//!
//! Handle arguments are borrowed unless a body says otherwise; only
//! `drop_ref` and `rethrow` consume theirs. Fallible bodies (`reflect_get`,
//! `call_next`, `call0`, `apply`) report failures through the
//! pending-exception slot and return a sentinel word; the dispatcher turns
//! the slot into a propagated failure right after the body returns.
//! `throw` and `rethrow` fail the call directly. Everything else treats a
//! bad argument as a module contract violation and panics.
//!
//! See ABI.md §5 for the table.

use gangplank_interop::value::ITERATOR_KEY;
use gangplank_interop::{json, BridgeError, Value};

use crate::console::ConsoleLevel;
use crate::dispatch::{Bridge, ImportCx};

/// Register the whole table. Arities are in words.
pub(crate) fn install(bridge: &mut Bridge) {
    bridge.register("string_new", 2, string_new);
    bridge.register("string_get", 2, string_get);
    bridge.register("json_parse", 2, json_parse);
    bridge.register("json_serialize", 2, json_serialize);
    bridge.register("clone_ref", 1, clone_ref);
    bridge.register("drop_ref", 1, drop_ref);
    bridge.register("is_function", 1, is_function);
    bridge.register("is_object", 1, is_object);
    bridge.register("console_debug", 1, console_debug);
    bridge.register("console_info", 1, console_info);
    bridge.register("console_log", 1, console_log);
    bridge.register("console_warn", 1, console_warn);
    bridge.register("console_error", 1, console_error);
    bridge.register("iter_symbol", 0, iter_symbol);
    bridge.register("prop_next", 1, prop_next);
    bridge.register("call_next", 1, call_next);
    bridge.register("prop_done", 1, prop_done);
    bridge.register("prop_value", 1, prop_value);
    bridge.register("prop_name", 1, prop_name);
    bridge.register("reflect_get", 2, reflect_get);
    bridge.register("call0", 2, call0);
    bridge.register("apply", 3, apply);
    bridge.register("array_new", 0, array_new);
    bridge.register("array_unshift", 2, array_unshift);
    bridge.register("throw", 2, throw);
    bridge.register("rethrow", 1, rethrow);
}

/// Unguarded property read. A nullish base here is a module contract
/// violation, not a reportable failure.
fn must_get(target: &Value, key: &str) -> Value {
    match target.get_prop(key) {
        Ok(value) => value,
        Err(_) => panic!("property `{key}` read from {target}"),
    }
}

// ── Strings (§5.1) ──

fn string_new(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    let text = cx.decode(args[0], args[1]);
    Ok(cx.handles.alloc(Value::str(&text)))
}

fn string_get(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    let Value::Str(text) = cx.handles.get(args[0]) else {
        return Ok(0);
    };
    let span = cx.encode(&text)?;
    let mem = cx.guest.memory();
    cx.views.word_view(&mem).write_word(args[1], span.len);
    Ok(span.ptr)
}

// ── JSON (§5.2) ──

fn json_parse(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    let text = cx.decode(args[0], args[1]);
    let value = match json::parse(&text) {
        Ok(value) => value,
        Err(err) => panic!("malformed JSON from module: {err}"),
    };
    Ok(cx.handles.alloc(value))
}

fn json_serialize(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    let text = json::serialize(&cx.handles.get(args[1]));
    let span = cx.encode(&text)?;
    let mem = cx.guest.memory();
    let words = cx.views.word_view(&mem);
    words.write_word(args[0], span.ptr);
    words.write_word(args[0] + 4, span.len);
    Ok(0)
}

// ── References (§5.3) ──

fn clone_ref(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    Ok(cx.handles.clone_ref(args[0]))
}

fn drop_ref(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    cx.handles.drop_ref(args[0]);
    Ok(0)
}

fn is_function(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    Ok(cx.handles.get(args[0]).is_function() as u32)
}

fn is_object(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    Ok(cx.handles.get(args[0]).is_object() as u32)
}

// ── Console (§5.4) ──

fn route(cx: &mut ImportCx<'_>, level: ConsoleLevel, handle: u32) {
    let value = cx.handles.get(handle);
    cx.sink.write(level, &value);
}

fn console_debug(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    route(cx, ConsoleLevel::Debug, args[0]);
    Ok(0)
}

fn console_info(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    route(cx, ConsoleLevel::Info, args[0]);
    Ok(0)
}

fn console_log(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    route(cx, ConsoleLevel::Log, args[0]);
    Ok(0)
}

fn console_warn(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    route(cx, ConsoleLevel::Warn, args[0]);
    Ok(0)
}

fn console_error(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    route(cx, ConsoleLevel::Error, args[0]);
    Ok(0)
}

// ── Iteration (§5.5) ──

fn iter_symbol(cx: &mut ImportCx<'_>, _args: &[u32]) -> Result<u32, BridgeError> {
    Ok(cx.handles.alloc(Value::str(ITERATOR_KEY)))
}

fn prop_next(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    let value = must_get(&cx.handles.get(args[0]), "next");
    Ok(cx.handles.alloc(value))
}

fn call_next(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    let target = cx.handles.get(args[0]);
    let stepped = target.get_prop("next").and_then(|f| f.call(&target, &[]));
    match stepped {
        Ok(value) => Ok(cx.handles.alloc(value)),
        Err(error) => Ok(cx.fail(error)),
    }
}

fn prop_done(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    Ok(must_get(&cx.handles.get(args[0]), "done").truthy() as u32)
}

fn prop_value(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    let value = must_get(&cx.handles.get(args[0]), "value");
    Ok(cx.handles.alloc(value))
}

fn prop_name(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    let value = must_get(&cx.handles.get(args[0]), "name");
    Ok(cx.handles.alloc(value))
}

// ── Reflection & calls (§5.6) ──

fn reflect_get(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    let target = cx.handles.get(args[0]);
    let key = cx.handles.get(args[1]);
    match target.get_by(&key) {
        Ok(value) => Ok(cx.handles.alloc(value)),
        Err(error) => Ok(cx.fail(error)),
    }
}

fn call0(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    let target = cx.handles.get(args[0]);
    let this = cx.handles.get(args[1]);
    match target.call(&this, &[]) {
        Ok(value) => Ok(cx.handles.alloc(value)),
        Err(error) => Ok(cx.fail(error)),
    }
}

fn apply(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    let target = cx.handles.get(args[0]);
    let this = cx.handles.get(args[1]);
    // snapshot the list so the callee may mutate the source array
    let list = match cx.handles.get(args[2]) {
        Value::Array(items) => items.borrow().clone(),
        other => {
            let error = Value::type_error(&format!("{other} is not an argument list"));
            return Ok(cx.fail(error));
        }
    };
    match target.call(&this, &list) {
        Ok(value) => Ok(cx.handles.alloc(value)),
        Err(error) => Ok(cx.fail(error)),
    }
}

// ── Arrays (§5.7) ──

fn array_new(cx: &mut ImportCx<'_>, _args: &[u32]) -> Result<u32, BridgeError> {
    Ok(cx.handles.alloc(Value::array(vec![])))
}

fn array_unshift(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    let element = cx.handles.get(args[1]);
    Ok(cx.handles.get(args[0]).unshift(element))
}

// ── Failure control (§5.8) ──

fn throw(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    let message = cx.decode(args[0], args[1]);
    Err(BridgeError::thrown(&message))
}

fn rethrow(cx: &mut ImportCx<'_>, args: &[u32]) -> Result<u32, BridgeError> {
    Err(BridgeError::Propagated(cx.handles.take(args[0])))
}
