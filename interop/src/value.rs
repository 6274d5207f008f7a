//! Host-side value model.
//!
//! `Value` is the polymorphic value space the bridge refers to by handle:
//! the `undefined`/`null`/boolean sentinels, numbers, strings, arrays,
//! objects with string keys, and native callables. Compound values share
//! structure through `Rc`, so cloning a `Value` duplicates the reference,
//! not the contents; `clone_ref` on the handle table relies on this.
//!
//! Equality is reference-style: scalars compare by value (`Number` follows
//! IEEE, so NaN is unequal to itself), strings by content, and compound
//! values by pointer identity. Two arrays with equal contents are unequal
//! unless they are the same array.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Well-known property key an array answers with its iterator factory.
pub const ITERATOR_KEY: &str = "@@iterator";

/// A host-side callable.
///
/// Invoking one may throw: the `Err` arm carries the thrown value, which
/// travels back across the boundary through the pending-exception slot.
#[derive(Clone)]
pub struct NativeFn {
    name: Rc<str>,
    body: Rc<dyn Fn(&Value, &[Value]) -> Result<Value, Value>>,
}

impl NativeFn {
    pub fn new(
        name: &str,
        body: impl Fn(&Value, &[Value]) -> Result<Value, Value> + 'static,
    ) -> Self {
        Self {
            name: Rc::from(name),
            body: Rc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call with an explicit `this` binding.
    pub fn invoke(&self, this: &Value, args: &[Value]) -> Result<Value, Value> {
        (self.body)(this, args)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFn({})", self.name)
    }
}

/// The polymorphic host value handed across the boundary by handle.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<BTreeMap<String, Value>>>),
    Func(NativeFn),
}

impl Value {
    pub fn str(text: &str) -> Self {
        Value::Str(Rc::from(text))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Value::Object(Rc::new(RefCell::new(entries.into_iter().collect())))
    }

    pub fn func(
        name: &str,
        body: impl Fn(&Value, &[Value]) -> Result<Value, Value> + 'static,
    ) -> Self {
        Value::Func(NativeFn::new(name, body))
    }

    /// An error value: an object carrying `name` and `message` keys.
    pub fn error(name: &str, message: &str) -> Self {
        Value::object([
            ("name".to_string(), Value::str(name)),
            ("message".to_string(), Value::str(message)),
        ])
    }

    pub fn type_error(message: &str) -> Self {
        Value::error("TypeError", message)
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Value::Func(_))
    }

    /// Object-or-array, and not null.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_))
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Func(_) => true,
        }
    }

    /// Property get by string key.
    ///
    /// A get on `Undefined` or `Null` throws (the `Err` value). Missing
    /// keys on valid bases yield `Undefined`, never an error. Arrays
    /// answer `length`, numeric indices, and [`ITERATOR_KEY`]; strings
    /// answer `length` (in UTF-16 units); functions answer `name`.
    pub fn get_prop(&self, key: &str) -> Result<Value, Value> {
        match self {
            Value::Undefined | Value::Null => Err(Value::type_error(&format!(
                "cannot read property `{key}` of {self}"
            ))),
            Value::Object(map) => Ok(map.borrow().get(key).cloned().unwrap_or_default()),
            Value::Array(items) => match key {
                "length" => Ok(Value::Number(items.borrow().len() as f64)),
                ITERATOR_KEY => Ok(iter_factory(items.clone())),
                _ => match key.parse::<usize>() {
                    Ok(i) => Ok(items.borrow().get(i).cloned().unwrap_or_default()),
                    Err(_) => Ok(Value::Undefined),
                },
            },
            Value::Str(s) => match key {
                "length" => Ok(Value::Number(s.encode_utf16().count() as f64)),
                _ => Ok(Value::Undefined),
            },
            Value::Func(func) => match key {
                "name" => Ok(Value::Str(func.name.clone())),
                _ => Ok(Value::Undefined),
            },
            Value::Bool(_) | Value::Number(_) => Ok(Value::Undefined),
        }
    }

    /// Property get with the key given as a value (coerced to a string key).
    pub fn get_by(&self, key: &Value) -> Result<Value, Value> {
        self.get_prop(&key.to_string())
    }

    /// Invoke as a callable. Non-callables throw.
    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value, Value> {
        match self {
            Value::Func(func) => func.invoke(this, args),
            _ => Err(Value::type_error(&format!("{self} is not a function"))),
        }
    }

    /// Prepend an element; returns the new length. Panics off an array.
    pub fn unshift(&self, element: Value) -> u32 {
        match self {
            Value::Array(items) => {
                let mut items = items.borrow_mut();
                items.insert(0, element);
                items.len() as u32
            }
            other => panic!("unshift on non-array value {other}"),
        }
    }
}

/// Callable that produces a fresh iterator over `items` each invocation.
fn iter_factory(items: Rc<RefCell<Vec<Value>>>) -> Value {
    Value::func("values", move |_this, _args| Ok(array_iter(items.clone())))
}

/// An iterator object: `{ next }` stepping over the live array.
fn array_iter(items: Rc<RefCell<Vec<Value>>>) -> Value {
    let pos = Rc::new(Cell::new(0usize));
    let next = Value::func("next", move |_this, _args| {
        let i = pos.get();
        let items = items.borrow();
        if i < items.len() {
            pos.set(i + 1);
            Ok(iter_step(false, items[i].clone()))
        } else {
            Ok(iter_step(true, Value::Undefined))
        }
    });
    Value::object([("next".to_string(), next)])
}

fn iter_step(done: bool, value: Value) -> Value {
    Value::object([
        ("done".to_string(), Value::Bool(done)),
        ("value".to_string(), value),
    ])
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Func(a), Value::Func(b)) => Rc::ptr_eq(&a.body, &b.body),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    /// Conventional string coercion, used by the console sink and in
    /// diagnostics.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    write!(f, "{}Infinity", if *n < 0.0 { "-" } else { "" })
                } else if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
            Value::Array(items) => {
                // join semantics: undefined/null elements render empty
                let items = items.borrow();
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    match item {
                        Value::Undefined | Value::Null => {}
                        other => write!(f, "{other}")?,
                    }
                }
                Ok(())
            }
            Value::Object(_) => write!(f, "[object Object]"),
            Value::Func(func) => write!(f, "function {}() {{ [native code] }}", func.name),
        }
    }
}
