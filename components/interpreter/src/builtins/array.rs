//! `Array`, `Array.prototype` and array iterators.

use core_types::{JsError, ObjectId, PropertyKey, Symbol, Value};
use object_model::{Elements, ObjectClass};

use super::{define_constructor, define_method, define_value, METHOD};
use crate::error::Eval;
use crate::function::CallArgs;
use crate::interpreter::Interpreter;

/// Longest string `join` will build, in UTF-16 units.
const MAX_STRING_LENGTH: f64 = ((1u32 << 29) - 24) as f64;

/// State of an `Array.prototype[Symbol.iterator]()` iterator.
#[derive(Debug)]
struct ArrayIterator {
    array: Value,
    index: u32,
    done: bool,
}

pub(super) fn install(interp: &mut Interpreter) {
    let proto = interp.realm.intrinsics.array_prototype;
    define_method(interp, proto, "push", "push", 1, array_push);
    define_method(interp, proto, "pop", "pop", 0, array_pop);
    define_method(interp, proto, "join", "join", 1, array_join);
    define_method(interp, proto, "toString", "toString", 0, array_to_string);
    let values = define_method(interp, proto, "values", "values", 0, array_values);
    define_value(interp, proto, Symbol::iterator(), Value::Object(values), METHOD);

    let ctor = define_constructor(
        interp,
        "Array",
        1,
        array_constructor,
        Some(array_constructor),
        proto,
        Value::Undefined,
    );
    define_method(interp, ctor, "isArray", "isArray", 1, array_is_array);

    let iterator_proto = interp.realm.intrinsics.array_iterator_prototype;
    define_method(interp, iterator_proto, "next", "next", 0, array_iterator_next);
}

fn array_length(interp: &Interpreter, id: ObjectId) -> u32 {
    interp.realm.heap[id].elements().map_or(0, Elements::len)
}

fn invalid_length(interp: &mut Interpreter) -> crate::error::Abrupt {
    interp.throw_error(JsError::range_error("Invalid array length"))
}

fn require_array(interp: &mut Interpreter, args: &CallArgs<'_>, method: &str) -> Eval<ObjectId> {
    match args.this.as_object() {
        Some(id) if interp.realm.heap[id].elements().is_some() => Ok(id),
        _ => {
            let message = format!("Array.prototype.{} called on non-array {}", method, interp.describe(&args.this));
            Err(interp.type_error(message))
        }
    }
}

/// Array(...items) / Array(length)
fn array_constructor(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    match args.args {
        [length] if length.as_number().is_some() => {
            let n = length.as_number().unwrap_or_default();
            if n < 0.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
                return Err(invalid_length(interp));
            }
            let proto = interp.realm.intrinsics.array_prototype;
            let elements = Elements::with_length(n as u32);
            Ok(Value::Object(interp.create_object_with_proto(Some(proto), ObjectClass::Array(elements))))
        }
        items => Ok(Value::Object(interp.create_array(items.to_vec()))),
    }
}

/// Array.isArray(value)
fn array_is_array(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let is_array = args
        .arg(0)
        .as_object()
        .and_then(|id| interp.realm.heap.get(id))
        .map_or(false, |object| matches!(object.class(), ObjectClass::Array(_)));
    Ok(Value::Boolean(is_array))
}

/// Array.prototype.push(...items)
fn array_push(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let id = require_array(interp, args, "push")?;
    if !interp.realm.heap[id].is_extensible() {
        return Err(interp.type_error("Cannot add property, object is not extensible"));
    }
    let dense_limit = interp.config().dense_element_limit;
    let mut length = array_length(interp, id);
    for item in args.args {
        let pushed = interp.realm.heap[id]
            .elements_mut()
            .and_then(|elements| elements.push(item.clone(), dense_limit));
        match pushed {
            Some(new_length) => length = new_length,
            None => return Err(invalid_length(interp)),
        }
    }
    Ok(Value::number(f64::from(length)))
}

/// Array.prototype.pop()
fn array_pop(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let id = require_array(interp, args, "pop")?;
    if !interp.realm.heap[id].is_extensible() {
        return Err(interp.type_error("Cannot delete property of a frozen array"));
    }
    let length = array_length(interp, id);
    if length == 0 {
        return Ok(Value::Undefined);
    }
    let last = interp.get_property(&args.this, &PropertyKey::from_index(length - 1))?;
    if let Some(elements) = interp.realm.heap[id].elements_mut() {
        elements.set_len(length - 1);
    }
    Ok(last)
}

fn join(interp: &mut Interpreter, this: &Value, separator: &str) -> Eval<Value> {
    let length = this.as_object().map_or(0, |id| array_length(interp, id));
    if f64::from(length) > MAX_STRING_LENGTH {
        return Err(interp.throw_error(JsError::range_error("Invalid string length")));
    }
    let mut out = String::new();
    for index in 0..length {
        if index > 0 {
            out.push_str(separator);
        }
        // Holes read through the prototype chain.
        let element = interp.get_property(this, &PropertyKey::from_index(index))?;
        if !element.is_nullish() {
            out.push_str(&interp.to_js_string(&element)?);
        }
    }
    Ok(Value::string(&out))
}

/// Array.prototype.join(separator)
fn array_join(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    require_array(interp, args, "join")?;
    let separator = match args.arg(0) {
        Value::Undefined => ",".into(),
        other => interp.to_js_string(&other)?,
    };
    join(interp, &args.this, &separator)
}

/// Array.prototype.toString()
fn array_to_string(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    require_array(interp, args, "toString")?;
    join(interp, &args.this, ",")
}

/// Array.prototype.values() / Array.prototype[Symbol.iterator]()
fn array_values(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    if args.this.is_nullish() {
        return Err(interp.type_error("Array.prototype.values called on null or undefined"));
    }
    let proto = interp.realm.intrinsics.array_iterator_prototype;
    let iterator = ArrayIterator {
        array: args.this.clone(),
        index: 0,
        done: false,
    };
    Ok(Value::Object(interp.create_object_with_proto(
        Some(proto),
        ObjectClass::Internal(Box::new(iterator)),
    )))
}

/// %ArrayIteratorPrototype%.next()
///
/// Reads `length` on every step, so elements pushed during iteration are
/// visited.
fn array_iterator_next(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let state = args
        .this
        .as_object()
        .and_then(|id| interp.realm.heap.get(id))
        .and_then(|object| object.internal::<ArrayIterator>())
        .map(|iterator| (iterator.array.clone(), iterator.index, iterator.done));
    let Some((array, index, done)) = state else {
        let message = format!("next method called on incompatible receiver {}", interp.describe(&args.this));
        return Err(interp.type_error(message));
    };
    if done {
        return Ok(interp.create_iter_result(Value::Undefined, true));
    }
    let length = interp.get_property(&array, &PropertyKey::from("length"))?;
    let length = interp.to_number(&length)?;
    let this = args.this.as_object();
    let iterator = this
        .and_then(|id| interp.realm.heap.get_mut(id))
        .and_then(|object| object.internal_mut::<ArrayIterator>());
    if f64::from(index) >= length {
        if let Some(iterator) = iterator {
            iterator.done = true;
        }
        return Ok(interp.create_iter_result(Value::Undefined, true));
    }
    if let Some(iterator) = iterator {
        iterator.index += 1;
    }
    let value = interp.get_element(&array, &Value::number(f64::from(index)))?;
    Ok(interp.create_iter_result(value, false))
}
