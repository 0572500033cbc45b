//! `String`, `Number`, `Boolean` and `Symbol`.
//!
//! Primitive wrapper objects are not supported: the constructors convert
//! when called and refuse `new`. The prototypes hold the methods primitive
//! receivers reach through property access.

use core_types::{Symbol, Value};

use super::{define_constructor, define_method, define_value};
use crate::error::Eval;
use crate::function::CallArgs;
use crate::interpreter::Interpreter;
use object_model::PropertyFlags;

pub(super) fn install(interp: &mut Interpreter) {
    let intrinsics = &interp.realm.intrinsics;
    let (string_proto, number_proto, boolean_proto, symbol_proto) = (
        intrinsics.string_prototype,
        intrinsics.number_prototype,
        intrinsics.boolean_prototype,
        intrinsics.symbol_prototype,
    );

    define_constructor(interp, "String", 1, string_function, None, string_proto, Value::Undefined);
    define_method(interp, string_proto, "toString", "toString", 0, string_value_of);
    define_method(interp, string_proto, "valueOf", "valueOf", 0, string_value_of);

    define_constructor(interp, "Number", 1, number_function, None, number_proto, Value::Undefined);
    define_method(interp, number_proto, "toString", "toString", 0, number_to_string);
    define_method(interp, number_proto, "valueOf", "valueOf", 0, number_value_of);

    define_constructor(interp, "Boolean", 1, boolean_function, None, boolean_proto, Value::Undefined);
    define_method(interp, boolean_proto, "toString", "toString", 0, boolean_to_string);
    define_method(interp, boolean_proto, "valueOf", "valueOf", 0, boolean_value_of);

    let symbol = define_constructor(interp, "Symbol", 0, symbol_function, None, symbol_proto, Value::Undefined);
    define_value(interp, symbol, "iterator", Value::Symbol(Symbol::iterator()), PropertyFlags::empty());
    define_value(
        interp,
        symbol,
        "asyncIterator",
        Value::Symbol(Symbol::async_iterator()),
        PropertyFlags::empty(),
    );
    define_method(interp, symbol_proto, "toString", "toString", 0, symbol_to_string);
    define_method(interp, symbol_proto, "valueOf", "valueOf", 0, symbol_value_of);
}

fn incompatible(interp: &mut Interpreter, method: &str, expected: &str) -> crate::error::Abrupt {
    interp.type_error(format!("{} requires that 'this' be a {}", method, expected))
}

/// String(value)
fn string_function(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    match args.args.first() {
        None => Ok(Value::string("")),
        Some(Value::Symbol(symbol)) => Ok(Value::string(&symbol_descriptive_string(symbol))),
        Some(value) => interp.to_js_string(value).map(Value::String),
    }
}

/// String.prototype.toString() / String.prototype.valueOf()
fn string_value_of(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    match &args.this {
        Value::String(_) => Ok(args.this.clone()),
        _ => Err(incompatible(interp, "String.prototype.valueOf", "String")),
    }
}

/// Number(value)
fn number_function(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    match args.args.first() {
        None => Ok(Value::Smi(0)),
        Some(value) => interp.to_number(value).map(Value::number),
    }
}

fn this_number(interp: &mut Interpreter, args: &CallArgs<'_>, method: &str) -> Eval<Value> {
    match &args.this {
        Value::Smi(_) | Value::Double(_) => Ok(args.this.clone()),
        _ => Err(incompatible(interp, method, "Number")),
    }
}

/// Number.prototype.toString()
fn number_to_string(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let value = this_number(interp, args, "Number.prototype.toString")?;
    Ok(Value::string(&value.to_string()))
}

/// Number.prototype.valueOf()
fn number_value_of(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    this_number(interp, args, "Number.prototype.valueOf")
}

/// Boolean(value)
fn boolean_function(_interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    Ok(Value::Boolean(args.arg(0).is_truthy()))
}

/// Boolean.prototype.toString()
fn boolean_to_string(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    match args.this {
        Value::Boolean(b) => Ok(Value::string(if b { "true" } else { "false" })),
        _ => Err(incompatible(interp, "Boolean.prototype.toString", "Boolean")),
    }
}

/// Boolean.prototype.valueOf()
fn boolean_value_of(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    match args.this {
        Value::Boolean(_) => Ok(args.this.clone()),
        _ => Err(incompatible(interp, "Boolean.prototype.valueOf", "Boolean")),
    }
}

/// Symbol(description)
fn symbol_function(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    let description = match args.arg(0) {
        Value::Undefined => None,
        other => Some(interp.to_js_string(&other)?),
    };
    Ok(Value::Symbol(Symbol::new(description.as_deref())))
}

fn symbol_descriptive_string(symbol: &Symbol) -> String {
    format!("Symbol({})", symbol.description().unwrap_or(""))
}

/// Symbol.prototype.toString()
fn symbol_to_string(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    match &args.this {
        Value::Symbol(symbol) => Ok(Value::string(&symbol_descriptive_string(symbol))),
        _ => Err(incompatible(interp, "Symbol.prototype.toString", "Symbol")),
    }
}

/// Symbol.prototype.valueOf()
fn symbol_value_of(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    match &args.this {
        Value::Symbol(_) => Ok(args.this.clone()),
        _ => Err(incompatible(interp, "Symbol.prototype.valueOf", "Symbol")),
    }
}
