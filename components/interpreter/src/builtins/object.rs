//! `Object`, `Object.prototype` and `Function.prototype`.

use core_types::{ObjectId, PropertyKey, Value};
use object_model::{ObjectClass, PropertyFlags, SlotValue};

use super::{define_constructor, define_method, this_object};
use crate::error::Eval;
use crate::function::CallArgs;
use crate::interpreter::Interpreter;
use crate::realm::ErrorData;

pub(super) fn install(interp: &mut Interpreter) {
    let proto = interp.realm.intrinsics.object_prototype;
    define_method(interp, proto, "toString", "toString", 0, object_to_string);
    define_method(interp, proto, "hasOwnProperty", "hasOwnProperty", 1, object_has_own_property);
    define_method(interp, proto, "valueOf", "valueOf", 0, object_value_of);

    let ctor = define_constructor(
        interp,
        "Object",
        1,
        object_constructor,
        Some(object_constructor),
        proto,
        Value::Undefined,
    );
    define_method(interp, ctor, "getPrototypeOf", "getPrototypeOf", 1, object_get_prototype_of);
    define_method(interp, ctor, "setPrototypeOf", "setPrototypeOf", 2, object_set_prototype_of);
    define_method(interp, ctor, "defineProperty", "defineProperty", 3, object_define_property);
    define_method(interp, ctor, "keys", "keys", 1, object_keys);
    define_method(interp, ctor, "freeze", "freeze", 1, object_freeze);
    define_method(interp, ctor, "isFrozen", "isFrozen", 1, object_is_frozen);
    define_method(interp, ctor, "create", "create", 2, object_create);

    let function_proto = interp.realm.intrinsics.function_prototype;
    define_method(interp, function_proto, "call", "call", 1, function_call);
}

/// Object(value)
fn object_constructor(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    match args.arg(0) {
        value @ Value::Object(_) => Ok(value),
        _ => Ok(Value::Object(interp.create_object())),
    }
}

/// Object.prototype.toString()
fn object_to_string(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let tag = match &args.this {
        Value::Undefined => "Undefined",
        Value::Null => "Null",
        Value::Boolean(_) => "Boolean",
        Value::Smi(_) | Value::Double(_) => "Number",
        Value::String(_) => "String",
        Value::Symbol(_) => "Symbol",
        Value::Object(id) => match interp.realm.heap.get(*id) {
            Some(object) => match object.class() {
                ObjectClass::Array(_) => "Array",
                ObjectClass::Function(_) => "Function",
                ObjectClass::Internal(_) if object.internal::<ErrorData>().is_some() => "Error",
                _ => "Object",
            },
            None => "Object",
        },
    };
    Ok(Value::string(&format!("[object {}]", tag)))
}

/// Object.prototype.hasOwnProperty(prop)
fn object_has_own_property(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let key = interp.to_property_key(&args.arg(0))?;
    let id = this_object(interp, args, "Object.prototype.hasOwnProperty")?;
    Ok(Value::Boolean(interp.has_own_property(id, &key)))
}

/// Object.prototype.valueOf()
fn object_value_of(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    if args.this.is_nullish() {
        return Err(interp.type_error("Cannot convert undefined or null to object"));
    }
    Ok(args.this.clone())
}

/// Object.getPrototypeOf(obj)
fn object_get_prototype_of(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let target = args.arg(0);
    let proto = match &target {
        Value::Object(id) => interp.realm.heap.get(*id).and_then(|object| object.prototype()),
        Value::Undefined | Value::Null => {
            return Err(interp.type_error("Cannot convert undefined or null to object"));
        }
        primitive => interp.realm.primitive_prototype(primitive),
    };
    Ok(proto.map_or(Value::Null, Value::Object))
}

fn prototype_argument(interp: &mut Interpreter, value: &Value) -> Eval<Option<ObjectId>> {
    match value {
        Value::Object(id) => Ok(Some(*id)),
        Value::Null => Ok(None),
        other => {
            let message = format!("Object prototype may only be an Object or null: {}", interp.describe(other));
            Err(interp.type_error(message))
        }
    }
}

/// Object.setPrototypeOf(obj, proto)
fn object_set_prototype_of(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let target = args.arg(0);
    let proto = prototype_argument(interp, &args.arg(1))?;
    let Some(id) = target.as_object() else {
        return Ok(target);
    };
    let mut cursor = proto;
    while let Some(ancestor) = cursor {
        if ancestor == id {
            return Err(interp.type_error("Cyclic __proto__ value"));
        }
        cursor = interp.realm.heap.get(ancestor).and_then(|object| object.prototype());
    }
    let current = interp.realm.heap[id].prototype();
    if current != proto {
        if !interp.realm.heap[id].is_extensible() {
            let message = format!("{} is not extensible", interp.describe(&target));
            return Err(interp.type_error(message));
        }
        if let Some(proto) = proto {
            interp.realm.heap.mark_prototype(proto);
        }
        interp.realm.heap[id].set_prototype(&interp.realm.shapes, proto);
        tracing::trace!(object = id.0, "prototype replaced");
    }
    Ok(target)
}

/// Read one descriptor field, `None` when the descriptor lacks it.
fn descriptor_field(interp: &mut Interpreter, descriptor: &Value, name: &str) -> Eval<Option<Value>> {
    let key = PropertyKey::from(name);
    if interp.has_property(descriptor, &key)? {
        interp.get_property(descriptor, &key).map(Some)
    } else {
        Ok(None)
    }
}

fn accessor_function(interp: &mut Interpreter, value: Option<Value>, which: &str) -> Eval<Option<Option<ObjectId>>> {
    match value {
        None => Ok(None),
        Some(Value::Undefined) => Ok(Some(None)),
        Some(value) if interp.is_callable(&value) => Ok(Some(value.as_object())),
        Some(value) => {
            let message = format!("{} must be a function: {}", which, interp.describe(&value));
            Err(interp.type_error(message))
        }
    }
}

/// Object.defineProperty(obj, prop, descriptor)
///
/// Fields missing from the descriptor keep the current attribute of an
/// existing property and default to false/undefined for a new one.
fn object_define_property(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let target = args.arg(0);
    let Some(id) = target.as_object() else {
        return Err(interp.type_error("Object.defineProperty called on non-object"));
    };
    let key = interp.to_property_key(&args.arg(1))?;
    let descriptor = args.arg(2);
    if descriptor.as_object().is_none() {
        let message = format!("Property description must be an object: {}", interp.describe(&descriptor));
        return Err(interp.type_error(message));
    }

    let value = descriptor_field(interp, &descriptor, "value")?;
    let writable = descriptor_field(interp, &descriptor, "writable")?.map(|v| v.is_truthy());
    let enumerable = descriptor_field(interp, &descriptor, "enumerable")?.map(|v| v.is_truthy());
    let configurable = descriptor_field(interp, &descriptor, "configurable")?.map(|v| v.is_truthy());
    let getter = descriptor_field(interp, &descriptor, "get")?;
    let getter = accessor_function(interp, getter, "Getter")?;
    let setter = descriptor_field(interp, &descriptor, "set")?;
    let setter = accessor_function(interp, setter, "Setter")?;

    let is_accessor = getter.is_some() || setter.is_some();
    if is_accessor && (value.is_some() || writable.is_some()) {
        return Err(interp.type_error(
            "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute",
        ));
    }

    let current = interp
        .realm
        .heap
        .get(id)
        .and_then(|object| object.own_property(&key))
        .map(|(flags, slot)| (flags, slot.clone()));
    if let Some((flags, _)) = &current {
        if !flags.contains(PropertyFlags::CONFIGURABLE) && configurable == Some(true) {
            let message = format!("Cannot redefine property: {}", key);
            return Err(interp.type_error(message));
        }
    }
    let (old_flags, old_slot) = current.unwrap_or((PropertyFlags::empty(), SlotValue::Data(Value::Undefined)));

    let mut flags = PropertyFlags::empty();
    flags.set(
        PropertyFlags::ENUMERABLE,
        enumerable.unwrap_or(old_flags.contains(PropertyFlags::ENUMERABLE)),
    );
    flags.set(
        PropertyFlags::CONFIGURABLE,
        configurable.unwrap_or(old_flags.contains(PropertyFlags::CONFIGURABLE)),
    );
    let slot = if is_accessor {
        flags |= PropertyFlags::ACCESSOR;
        let (old_get, old_set) = match old_slot {
            SlotValue::Accessor { getter, setter } => (getter, setter),
            SlotValue::Data(_) => (None, None),
        };
        SlotValue::Accessor {
            getter: getter.unwrap_or(old_get),
            setter: setter.unwrap_or(old_set),
        }
    } else {
        flags.set(
            PropertyFlags::WRITABLE,
            writable.unwrap_or(old_flags.contains(PropertyFlags::WRITABLE)),
        );
        let old_value = match old_slot {
            SlotValue::Data(value) => value,
            SlotValue::Accessor { .. } => Value::Undefined,
        };
        SlotValue::Data(value.unwrap_or(old_value))
    };
    interp.define_property(id, key, slot, flags)?;
    Ok(target)
}

/// Object.keys(obj)
fn object_keys(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let target = args.arg(0);
    let keys = match &target {
        Value::Undefined | Value::Null => {
            return Err(interp.type_error("Cannot convert undefined or null to object"));
        }
        Value::Object(id) => match interp.realm.heap.get(*id) {
            Some(object) => object
                .own_keys()
                .into_iter()
                .filter(|key| match key {
                    PropertyKey::Symbol(_) => false,
                    PropertyKey::String(_) => object
                        .own_property(key)
                        .map_or(true, |(flags, _)| flags.contains(PropertyFlags::ENUMERABLE)),
                })
                .map(|key| Value::string(&key.to_string()))
                .collect(),
            None => Vec::new(),
        },
        _ => Vec::new(),
    };
    Ok(Value::Object(interp.create_array(keys)))
}

/// Object.freeze(obj)
fn object_freeze(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let target = args.arg(0);
    let Some(id) = target.as_object() else {
        return Ok(target);
    };
    let shapes = std::sync::Arc::clone(&interp.realm.shapes);
    let object = &mut interp.realm.heap[id];
    for key in object.own_keys() {
        let Some((flags, slot)) = object.own_property(&key).map(|(f, s)| (f, s.clone())) else {
            continue;
        };
        let frozen = if flags.contains(PropertyFlags::ACCESSOR) {
            flags - PropertyFlags::CONFIGURABLE
        } else {
            flags - PropertyFlags::CONFIGURABLE - PropertyFlags::WRITABLE
        };
        object.define_own(&shapes, key, slot, frozen);
    }
    object.prevent_extensions();
    tracing::trace!(object = id.0, "object frozen");
    Ok(target)
}

/// Object.isFrozen(obj)
fn object_is_frozen(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let Some(object) = args.arg(0).as_object().and_then(|id| interp.realm.heap.get(id)) else {
        return Ok(Value::Boolean(true));
    };
    if object.is_extensible() || object.elements().map_or(false, |e| e.count() > 0) {
        return Ok(Value::Boolean(false));
    }
    let frozen = object.own_keys().iter().all(|key| {
        object.own_property(key).map_or(true, |(flags, _)| {
            !flags.contains(PropertyFlags::CONFIGURABLE)
                && (flags.contains(PropertyFlags::ACCESSOR) || !flags.contains(PropertyFlags::WRITABLE))
        })
    });
    Ok(Value::Boolean(frozen))
}

/// Object.create(proto)
fn object_create(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let proto = prototype_argument(interp, &args.arg(0))?;
    Ok(Value::Object(interp.create_object_with_proto(proto, ObjectClass::Ordinary)))
}

/// Function.prototype.call(thisArg, ...args)
fn function_call(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let rest = args.args.get(1..).unwrap_or(&[]);
    interp.call(&args.this, args.arg(0), rest)
}
