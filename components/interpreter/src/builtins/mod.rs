//! Built-in objects installed into every realm.
//!
//! Each submodule fills in one family of intrinsics: the prototype objects
//! themselves are allocated by the realm, this module attaches their
//! methods and binds the constructors as globals.

mod array;
mod error;
mod iterator;
mod object;
mod primitive;
mod promise;
mod proxy;

use core_types::{ObjectId, PropertyKey, Value};
use object_model::{PropertyFlags, SlotValue};

use crate::error::Eval;
use crate::function::{CallArgs, NativeFn};
use crate::interpreter::Interpreter;

/// Attributes of built-in methods: writable, configurable, not enumerable.
pub(crate) const METHOD: PropertyFlags = PropertyFlags::WRITABLE.union(PropertyFlags::CONFIGURABLE);

/// Populate the intrinsics and global bindings of a fresh interpreter.
pub(crate) fn install(interp: &mut Interpreter) {
    object::install(interp);
    array::install(interp);
    iterator::install(interp);
    promise::install(interp);
    error::install(interp);
    primitive::install(interp);
    proxy::install(interp);

    interp.set_global("undefined", Value::Undefined);
    interp.set_global("NaN", Value::Double(f64::NAN));
    interp.set_global("Infinity", Value::Double(f64::INFINITY));
    tracing::debug!(objects = interp.realm.heap.len(), "builtins installed");
}

/// Define a data property directly on a freshly built intrinsic.
pub(crate) fn define_value(
    interp: &mut Interpreter,
    target: ObjectId,
    key: impl Into<PropertyKey>,
    value: Value,
    flags: PropertyFlags,
) {
    interp.realm.heap[target].define_own(&interp.realm.shapes, key.into(), SlotValue::Data(value), flags);
}

/// Attach a native method to `target`.
pub(crate) fn define_method(
    interp: &mut Interpreter,
    target: ObjectId,
    key: impl Into<PropertyKey>,
    name: &str,
    length: u32,
    call: NativeFn,
) -> ObjectId {
    let function = interp.create_native_function(name, length, call);
    define_value(interp, target, key, Value::Object(function), METHOD);
    function
}

/// Create a constructor bound to the global `name`, linked both ways with
/// its prototype object.
pub(crate) fn define_constructor(
    interp: &mut Interpreter,
    name: &str,
    length: u32,
    call: NativeFn,
    construct: Option<NativeFn>,
    prototype: ObjectId,
    data: Value,
) -> ObjectId {
    let constructor = interp.create_native(name, length, call, construct, data);
    define_value(
        interp,
        constructor,
        "prototype",
        Value::Object(prototype),
        PropertyFlags::empty(),
    );
    define_value(interp, prototype, "constructor", Value::Object(constructor), METHOD);
    interp.set_global(name, Value::Object(constructor));
    constructor
}

/// `this` as an object, or a `TypeError` naming the method.
pub(crate) fn this_object(interp: &mut Interpreter, args: &CallArgs<'_>, method: &str) -> Eval<ObjectId> {
    match args.this.as_object() {
        Some(id) => Ok(id),
        None => {
            let message = format!("{} called on non-object {}", method, interp.describe(&args.this));
            Err(interp.type_error(message))
        }
    }
}

/// Shared by the `[Symbol.iterator]` and `[Symbol.asyncIterator]` methods
/// of iterator prototypes.
pub(crate) fn return_this(_interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    Ok(args.this.clone())
}
