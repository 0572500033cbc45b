//! Iterator, generator and async generator prototypes.

use async_runtime::CompletionKind;
use core_types::{Symbol, Value};

use super::{define_method, define_value, return_this, METHOD};
use crate::error::{Completion, Eval};
use crate::function::CallArgs;
use crate::interpreter::Interpreter;

pub(super) fn install(interp: &mut Interpreter) {
    let intrinsics = &interp.realm.intrinsics;
    let (iterator_proto, generator_proto, async_generator_proto) = (
        intrinsics.iterator_prototype,
        intrinsics.generator_prototype,
        intrinsics.async_generator_prototype,
    );

    let iterator = interp.create_native_function("[Symbol.iterator]", 0, return_this);
    define_value(interp, iterator_proto, Symbol::iterator(), Value::Object(iterator), METHOD);

    define_method(interp, generator_proto, "next", "next", 1, generator_next);
    define_method(interp, generator_proto, "return", "return", 1, generator_return);
    define_method(interp, generator_proto, "throw", "throw", 1, generator_throw);

    define_method(interp, async_generator_proto, "next", "next", 1, async_generator_next);
    define_method(interp, async_generator_proto, "return", "return", 1, async_generator_return);
    define_method(interp, async_generator_proto, "throw", "throw", 1, async_generator_throw);
    let async_iterator = interp.create_native_function("[Symbol.asyncIterator]", 0, return_this);
    define_value(
        interp,
        async_generator_proto,
        Symbol::async_iterator(),
        Value::Object(async_iterator),
        METHOD,
    );
}

/// Generator.prototype.next(value)
fn generator_next(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    interp.generator_resume(&args.this, Completion::Normal(args.arg(0)), "next")
}

/// Generator.prototype.return(value)
fn generator_return(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    interp.generator_resume(&args.this, Completion::Return(args.arg(0)), "return")
}

/// Generator.prototype.throw(exception)
fn generator_throw(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    interp.generator_resume(&args.this, Completion::Throw(args.arg(0)), "throw")
}

/// AsyncGenerator.prototype.next(value)
fn async_generator_next(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    interp.async_generator_enqueue(&args.this, CompletionKind::Next, args.arg(0))
}

/// AsyncGenerator.prototype.return(value)
fn async_generator_return(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    interp.async_generator_enqueue(&args.this, CompletionKind::Return, args.arg(0))
}

/// AsyncGenerator.prototype.throw(exception)
fn async_generator_throw(interp: &mut Interpreter, args: &CallArgs<'_>) -> Eval<Value> {
    interp.async_generator_enqueue(&args.this, CompletionKind::Throw, args.arg(0))
}
