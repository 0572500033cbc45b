//! Error constructors and `Error.prototype`.

use core_types::{ErrorKind, PropertyKey, Value};

use super::{define_constructor, define_method, define_value, this_object, METHOD};
use crate::error::Eval;
use crate::function::CallArgs;
use crate::interpreter::Interpreter;

pub(super) fn install(interp: &mut Interpreter) {
    let kinds: Vec<_> = interp.realm.intrinsics.error_kinds().collect();
    for (kind, proto) in kinds {
        define_constructor(
            interp,
            kind.name(),
            1,
            error_constructor,
            Some(error_constructor),
            proto,
            Value::string(kind.name()),
        );
        define_value(interp, proto, "name", Value::string(kind.name()), METHOD);
        if kind == ErrorKind::Error {
            define_value(interp, proto, "message", Value::string(""), METHOD);
            define_method(interp, proto, "toString", "toString", 0, error_to_string);
        }
    }
}

/// Error(message), TypeError(message), ...
///
/// Calling and constructing behave the same.
fn error_constructor(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let kind = interp
        .realm
        .intrinsics
        .error_kinds()
        .map(|(kind, _)| kind)
        .find(|kind| matches!(args.data, Value::String(name) if &**name == kind.name()))
        .unwrap_or(ErrorKind::Error);
    let message = match args.arg(0) {
        Value::Undefined => String::new(),
        other => interp.to_js_string(&other)?.to_string(),
    };
    Ok(Value::Object(interp.create_error(kind, &message)))
}

/// Error.prototype.toString()
fn error_to_string(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let id = this_object(interp, args, "Error.prototype.toString")?;
    let this = Value::Object(id);
    let name = match interp.get_property(&this, &PropertyKey::from("name"))? {
        Value::Undefined => "Error".into(),
        other => interp.to_js_string(&other)?,
    };
    let message = match interp.get_property(&this, &PropertyKey::from("message"))? {
        Value::Undefined => "".into(),
        other => interp.to_js_string(&other)?,
    };
    let text = match (name.is_empty(), message.is_empty()) {
        (true, _) => message.to_string(),
        (false, true) => name.to_string(),
        (false, false) => format!("{}: {}", name, message),
    };
    Ok(Value::string(&text))
}
