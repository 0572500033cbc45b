//! `Promise`, its statics and `Promise.prototype`.

use async_runtime::Handler;
use core_types::{ObjectId, PropertyKey, Value};

use super::{define_constructor, define_method};
use crate::error::{Abrupt, Eval};
use crate::function::CallArgs;
use crate::interpreter::Interpreter;

pub(super) fn install(interp: &mut Interpreter) {
    let proto = interp.realm.intrinsics.promise_prototype;
    define_method(interp, proto, "then", "then", 2, promise_then);
    define_method(interp, proto, "catch", "catch", 1, promise_catch);
    define_method(interp, proto, "finally", "finally", 1, promise_finally);

    let ctor = define_constructor(
        interp,
        "Promise",
        1,
        promise_call,
        Some(promise_construct),
        proto,
        Value::Undefined,
    );
    define_method(interp, ctor, "resolve", "resolve", 1, promise_static_resolve);
    define_method(interp, ctor, "reject", "reject", 1, promise_static_reject);
}

fn this_promise(interp: &mut Interpreter, args: &CallArgs<'_>, method: &str) -> Eval<ObjectId> {
    match args.this.as_object() {
        Some(id) if interp.is_promise(&args.this) => Ok(id),
        _ => {
            let message = format!(
                "Method Promise.prototype.{} called on incompatible receiver {}",
                method,
                interp.describe(&args.this)
            );
            Err(interp.type_error(message))
        }
    }
}

fn promise_call(interp: &mut Interpreter, _args: &CallArgs<'_>) -> Eval<Value> {
    Err(interp.type_error("Promise constructor cannot be invoked without 'new'"))
}

/// new Promise(executor)
fn promise_construct(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let executor = args.arg(0);
    if !interp.is_callable(&executor) {
        let message = format!("Promise resolver {} is not a function", interp.describe(&executor));
        return Err(interp.type_error(message));
    }
    let promise = interp.new_promise();
    let (resolve, reject) = interp.create_resolving_functions(promise);
    match interp.call(&executor, Value::Undefined, &[resolve, reject.clone()]) {
        Ok(_) => {}
        Err(Abrupt::Throw(error)) => {
            interp.call(&reject, Value::Undefined, &[error])?;
        }
        Err(other) => return Err(other),
    }
    Ok(Value::Object(promise))
}

/// Promise.resolve(value)
fn promise_static_resolve(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    interp.promise_resolve(args.arg(0)).map(Value::Object)
}

/// Promise.reject(reason)
fn promise_static_reject(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let promise = interp.new_promise();
    interp.reject_promise(promise, args.arg(0));
    Ok(Value::Object(promise))
}

/// Promise.prototype.then(onFulfilled, onRejected)
fn promise_then(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let promise = this_promise(interp, args, "then")?;
    interp
        .promise_then(promise, args.arg(0), args.arg(1))
        .map(Value::Object)
}

/// Promise.prototype.catch(onRejected)
fn promise_catch(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let then = interp.get_property(&args.this, &PropertyKey::from("then"))?;
    interp.call(&then, args.this.clone(), &[Value::Undefined, args.arg(0)])
}

/// Promise.prototype.finally(onFinally)
///
/// A non-callable argument behaves like `then(onFinally, onFinally)`.
fn promise_finally(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let promise = this_promise(interp, args, "finally")?;
    let on_finally = args.arg(0);
    if !interp.is_callable(&on_finally) {
        return interp
            .promise_then(promise, on_finally.clone(), on_finally)
            .map(Value::Object);
    }
    let derived = interp.new_promise();
    interp.perform_then(
        promise,
        Handler::Finally(on_finally.clone()),
        Handler::Finally(on_finally),
        Some(derived),
    )?;
    Ok(Value::Object(derived))
}
