//! `Proxy` and `Proxy.revocable`.
//!
//! Traps are looked up on the handler when an operation reaches the proxy;
//! see the property access paths for which traps are honored.

use core_types::{ObjectId, PropertyKey, Value};
use object_model::{ObjectClass, PropertyFlags, ProxyData, SlotValue};

use super::define_method;
use crate::error::Eval;
use crate::function::CallArgs;
use crate::interpreter::Interpreter;

pub(super) fn install(interp: &mut Interpreter) {
    let ctor = interp.create_native("Proxy", 2, proxy_call, Some(proxy_construct), Value::Undefined);
    define_method(interp, ctor, "revocable", "revocable", 2, proxy_revocable);
    interp.set_global("Proxy", Value::Object(ctor));
}

fn proxy_call(interp: &mut Interpreter, _args: &CallArgs<'_>) -> Eval<Value> {
    Err(interp.type_error("Constructor Proxy requires 'new'"))
}

fn create_proxy(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<ObjectId> {
    let (Some(target), Some(handler)) = (args.arg(0).as_object(), args.arg(1).as_object()) else {
        return Err(interp.type_error("Cannot create proxy with a non-object as target or handler"));
    };
    let proxy = interp.create_object_with_proto(
        None,
        ObjectClass::Proxy(ProxyData {
            target,
            handler,
            revoked: false,
        }),
    );
    tracing::trace!(proxy = proxy.0, target = target.0, "proxy created");
    Ok(proxy)
}

/// new Proxy(target, handler)
fn proxy_construct(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    create_proxy(interp, args).map(Value::Object)
}

/// Proxy.revocable(target, handler)
fn proxy_revocable(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let proxy = create_proxy(interp, args)?;
    let revoke = interp.create_native("", 0, proxy_revoke, None, Value::Object(proxy));
    let result = interp.create_object();
    let shapes = &interp.realm.shapes;
    let object = &mut interp.realm.heap[result];
    object.add_property(
        shapes,
        PropertyKey::from("proxy"),
        SlotValue::Data(Value::Object(proxy)),
        PropertyFlags::DEFAULT_DATA,
    );
    object.add_property(
        shapes,
        PropertyKey::from("revoke"),
        SlotValue::Data(Value::Object(revoke)),
        PropertyFlags::DEFAULT_DATA,
    );
    Ok(Value::Object(result))
}

/// The `revoke` function of a revocable proxy. Repeated calls are no-ops.
fn proxy_revoke(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let proxy = args.data.as_object();
    if let Some(ObjectClass::Proxy(data)) = proxy
        .and_then(|id| interp.realm.heap.get_mut(id))
        .map(|object| object.class_mut())
    {
        data.revoked = true;
    }
    Ok(Value::Undefined)
}
