//! Resumable Function Integration Tests
//!
//! Tests generators and async functions driven from the host:
//! - The classic send-value scenario
//! - Idempotent completion with a side-effect counter
//! - Scope lifetime across suspension
//! - Cancellation abandoning a running generator
//! - Resuming at the call-depth limit

use std::rc::Rc;

use core_types::Value;
use interpreter::builder::*;
use interpreter::node::UpdateOp;
use interpreter::{
    CallArgs, EngineError, Eval, FunctionBuilder, FunctionCode, GeneratorState, Interpreter, Stmt,
};

fn script(body: Vec<Stmt>) -> Rc<FunctionCode> {
    FunctionBuilder::script().finish(body).expect("script builds")
}

/// Call `method` on `receiver` and unpack the iterator result.
fn step(interp: &mut Interpreter, receiver: &Value, method: &str, args: &[Value]) -> (Value, bool) {
    let function = interp
        .get_property(receiver, &method.into())
        .expect("method lookup");
    let result = interp.call(&function, receiver.clone(), args).expect("method call");
    interp.iter_result(&result).expect("iterator result")
}

/// Declare `code` globally and return `code()`.
fn start(interp: &mut Interpreter, code: Rc<FunctionCode>, prelude: Vec<Stmt>) -> Value {
    let name = code.name.to_string();
    let mut body = prelude;
    body.push(function_decl(code));
    body.push(expr_stmt(call(ident(&name), vec![])));
    interp.run(&script(body)).unwrap()
}

// ============================================================================
// Generators
// ============================================================================

#[test]
fn test_send_value_scenario() {
    let mut interp = Interpreter::new();
    let g = FunctionBuilder::generator("g")
        .finish(vec![
            let_("x", Some(yield_(Some(int(1))))),
            expr_stmt(yield_(Some(add(ident("x"), int(1))))),
        ])
        .unwrap();
    let it = start(&mut interp, g, vec![]);

    assert_eq!(step(&mut interp, &it, "next", &[]), (Value::Smi(1), false));
    assert_eq!(step(&mut interp, &it, "next", &[Value::Smi(10)]), (Value::Smi(11), false));
    assert_eq!(step(&mut interp, &it, "next", &[]), (Value::Undefined, true));
    assert_eq!(interp.generator_state(&it), Some(GeneratorState::Completed));
}

#[test]
fn test_completed_generator_has_no_side_effects() {
    let mut interp = Interpreter::new();
    let g = FunctionBuilder::generator("g")
        .finish(vec![
            expr_stmt(update(UpdateOp::Increment, false, "counter")),
            expr_stmt(yield_(None)),
            expr_stmt(update(UpdateOp::Increment, false, "counter")),
        ])
        .unwrap();
    let it = start(&mut interp, g, vec![var("counter", Some(int(0)))]);

    while !step(&mut interp, &it, "next", &[]).1 {}
    assert_eq!(interp.global("counter"), Some(Value::Smi(2)));

    for _ in 0..5 {
        assert_eq!(step(&mut interp, &it, "next", &[]), (Value::Undefined, true));
    }
    assert_eq!(step(&mut interp, &it, "return", &[Value::Smi(3)]), (Value::Smi(3), true));
    assert_eq!(interp.global("counter"), Some(Value::Smi(2)));
}

#[test]
fn test_return_before_start_skips_body() {
    let mut interp = Interpreter::new();
    let g = FunctionBuilder::generator("g")
        .finish(vec![expr_stmt(update(UpdateOp::Increment, false, "counter"))])
        .unwrap();
    let it = start(&mut interp, g, vec![var("counter", Some(int(0)))]);
    assert_eq!(interp.generator_state(&it), Some(GeneratorState::SuspendedStart));

    assert_eq!(step(&mut interp, &it, "return", &[Value::Smi(1)]), (Value::Smi(1), true));
    assert_eq!(step(&mut interp, &it, "next", &[]), (Value::Undefined, true));
    assert_eq!(interp.global("counter"), Some(Value::Smi(0)));
}

#[test]
fn test_uncaught_injected_throw_completes_generator() {
    let mut interp = Interpreter::new();
    let g = FunctionBuilder::generator("g")
        .finish(vec![expr_stmt(yield_(Some(int(1)))), expr_stmt(yield_(Some(int(2))))])
        .unwrap();
    let it = start(&mut interp, g, vec![]);
    step(&mut interp, &it, "next", &[]);

    let throw = interp.get_property(&it, &"throw".into()).unwrap();
    let error = interp.call(&throw, it.clone(), &[Value::string("stop")]);
    assert!(error.is_err());
    assert_eq!(interp.generator_state(&it), Some(GeneratorState::Completed));
    assert_eq!(step(&mut interp, &it, "next", &[]), (Value::Undefined, true));
}

#[test]
fn test_suspension_inside_nested_expressions() {
    let mut interp = Interpreter::new();
    // yield [1 + (yield "a"), (yield "b")]
    let g = FunctionBuilder::generator("g")
        .finish(vec![expr_stmt(yield_(Some(array(vec![
            add(int(1), yield_(Some(string("a")))),
            yield_(Some(string("b"))),
        ]))))])
        .unwrap();
    let it = start(&mut interp, g, vec![]);
    assert_eq!(step(&mut interp, &it, "next", &[]), (Value::string("a"), false));
    assert_eq!(step(&mut interp, &it, "next", &[Value::Smi(2)]), (Value::string("b"), false));
    let (pair, done) = step(&mut interp, &it, "next", &[Value::Smi(9)]);
    assert!(!done);
    let join = interp.get_property(&pair, &"join".into()).unwrap();
    let joined = interp.call(&join, pair.clone(), &[]).unwrap();
    assert_eq!(joined, Value::string("3,9"));
}

// ============================================================================
// Scope lifetime
// ============================================================================

#[test]
fn test_block_scopes_released_on_normal_exit() {
    let mut interp = Interpreter::new();
    let baseline = interp.snapshot().live_scopes;
    interp
        .run(&script(vec![
            block(vec![let_("a", Some(int(1))), block(vec![const_("b", int(2))])]),
            try_(vec![let_("c", Some(int(3)))], None, Some(vec![let_("d", Some(int(4)))])),
        ]))
        .unwrap();
    assert_eq!(interp.snapshot().live_scopes, baseline);
}

#[test]
fn test_block_scopes_released_on_throw() {
    let mut interp = Interpreter::new();
    let baseline = interp.snapshot().live_scopes;
    let error = interp.run(&script(vec![block(vec![
        let_("a", Some(int(1))),
        throw(string("out")),
    ])]));
    assert!(error.is_err());
    assert_eq!(interp.snapshot().live_scopes, baseline);
}

#[test]
fn test_block_scope_retained_across_suspension() {
    let mut interp = Interpreter::new();
    let g = FunctionBuilder::generator("g")
        .finish(vec![block(vec![
            let_("inner", Some(string("kept"))),
            expr_stmt(yield_(Some(int(0)))),
            return_(Some(ident("inner"))),
        ])])
        .unwrap();
    let it = start(&mut interp, g, vec![]);
    let created = interp.snapshot().live_scopes;

    step(&mut interp, &it, "next", &[]);
    let suspended = interp.snapshot().live_scopes;
    assert!(suspended > created);

    assert_eq!(step(&mut interp, &it, "next", &[]), (Value::string("kept"), true));
    assert!(interp.snapshot().live_scopes < suspended);
}

// ============================================================================
// Cancellation
// ============================================================================

fn cancel_now(interp: &mut Interpreter, _: &CallArgs<'_>) -> Eval<Value> {
    interp.cancellation_token().cancel();
    Ok(Value::Undefined)
}

#[test]
fn test_cancellation_abandons_running_generator() {
    let mut interp = Interpreter::new();
    let cancel = interp.create_native_function("cancelNow", 0, cancel_now);
    interp.set_global("cancelNow", Value::Object(cancel));
    let g = FunctionBuilder::generator("g")
        .finish(vec![
            expr_stmt(yield_(Some(int(1)))),
            try_(
                vec![
                    expr_stmt(call(ident("cancelNow"), vec![])),
                    while_(boolean(true), empty()),
                ],
                Some((None, vec![expr_stmt(yield_(Some(string("caught"))))])),
                Some(vec![expr_stmt(yield_(Some(string("finally"))))]),
            ),
        ])
        .unwrap();
    let it = start(&mut interp, g, vec![]);
    step(&mut interp, &it, "next", &[]);

    let next = interp.get_property(&it, &"next".into()).unwrap();
    interp.set_global("it", it.clone());
    let error = interp
        .run(&script(vec![expr_stmt(call(member(ident("it"), "next"), vec![]))]))
        .unwrap_err();
    assert_eq!(error, EngineError::Cancelled);
    assert_eq!(interp.generator_state(&it), Some(GeneratorState::Abandoned));
    assert_eq!(interp.snapshot().call_depth, 0);

    interp.cancellation_token().reset();
    let result = interp.call(&next, it.clone(), &[]).unwrap();
    assert_eq!(interp.iter_result(&result).unwrap(), (Value::Undefined, true));
}

#[test]
fn test_call_depth_limit_is_catchable() {
    let config = interpreter::EngineConfig {
        max_call_depth: 32,
        ..Default::default()
    };
    let mut interp = Interpreter::with_config(config).unwrap();
    let recurse = FunctionBuilder::new("recurse")
        .finish(vec![return_(Some(call(ident("recurse"), vec![])))])
        .unwrap();
    let result = interp
        .run(&script(vec![
            function_decl(recurse),
            try_(
                vec![expr_stmt(call(ident("recurse"), vec![]))],
                Some((Some("e"), vec![expr_stmt(member(ident("e"), "message"))])),
                None,
            ),
        ]))
        .unwrap();
    assert_eq!(result, Value::string("Maximum call stack size exceeded"));
    assert_eq!(interp.snapshot().call_depth, 0);
}

#[test]
fn test_resume_at_depth_limit_leaves_generator_suspended() {
    let config = interpreter::EngineConfig {
        max_call_depth: 16,
        ..Default::default()
    };
    let mut interp = Interpreter::with_config(config).unwrap();
    let g = FunctionBuilder::generator("g")
        .finish(vec![expr_stmt(yield_(Some(int(1)))), expr_stmt(yield_(Some(int(2))))])
        .unwrap();
    // Recurse until calls fail, then resume the generator from the deepest
    // frame that still can.
    let dive = FunctionBuilder::new("dive")
        .finish(vec![try_(
            vec![return_(Some(call(ident("dive"), vec![])))],
            Some((
                None,
                vec![return_(Some(member(call(member(ident("it"), "next"), vec![]), "value")))],
            )),
            None,
        )])
        .unwrap();
    let result = interp
        .run(&script(vec![
            function_decl(g),
            var("it", Some(call(ident("g"), vec![]))),
            function_decl(dive),
            expr_stmt(call(ident("dive"), vec![])),
        ]))
        .unwrap();
    assert_eq!(result, Value::Smi(1));

    let it = interp.global("it").unwrap();
    assert_eq!(interp.generator_state(&it), Some(GeneratorState::SuspendedYield));
    assert_eq!(step(&mut interp, &it, "next", &[]), (Value::Smi(2), false));
    assert_eq!(interp.snapshot().call_depth, 0);
}
