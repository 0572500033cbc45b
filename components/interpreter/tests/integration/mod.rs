//! Integration tests for the interpreter
//!
//! Scenarios that cross generators, async functions, promise jobs and
//! scopes. Each script logs into a global `out` array which is joined after
//! the job queue drains.

use std::rc::Rc;

use async_runtime::PromiseState;
use core_types::Value;
use interpreter::builder::*;
use interpreter::node::{BinaryOp, DeclKind, UpdateOp};
use interpreter::{Expr, FunctionBuilder, FunctionCode, GeneratorState, Interpreter, Stmt};
use tracing_subscriber::filter::EnvFilter;

/// Route engine events to the test output when `RUST_LOG` is set.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn script(body: Vec<Stmt>) -> Rc<FunctionCode> {
    FunctionBuilder::script().finish(body).expect("script builds")
}

fn log(value: Expr) -> Stmt {
    expr_stmt(call(member(ident("out"), "push"), vec![value]))
}

/// Run `body` after declaring `out`, drain the job queue and return the log.
fn run_logged(interp: &mut Interpreter, body: Vec<Stmt>) -> String {
    init_tracing();
    let mut full = vec![var("out", Some(array(vec![])))];
    full.extend(body);
    interp.run(&script(full)).expect("script runs");
    interp.drain_all().expect("jobs drain");
    let joined = interp
        .run(&script(vec![expr_stmt(call(member(ident("out"), "join"), vec![string(",")]))]))
        .expect("log joins");
    joined.to_string()
}

fn callback(param: &str, body: Vec<Stmt>) -> Expr {
    function(FunctionBuilder::arrow(false).param(param).finish(body).unwrap())
}

// ============================================================================
// Generators
// ============================================================================

#[test]
fn test_generator_send_values() {
    let mut interp = Interpreter::new();
    let g = FunctionBuilder::generator("g")
        .finish(vec![
            let_("x", Some(yield_(Some(int(1))))),
            expr_stmt(yield_(Some(add(ident("x"), int(1))))),
        ])
        .unwrap();
    let out = run_logged(
        &mut interp,
        vec![
            function_decl(g),
            const_("it", call(ident("g"), vec![])),
            const_("a", call(member(ident("it"), "next"), vec![])),
            const_("b", call(member(ident("it"), "next"), vec![int(10)])),
            const_("c", call(member(ident("it"), "next"), vec![])),
            log(member(ident("a"), "value")),
            log(member(ident("a"), "done")),
            log(member(ident("b"), "value")),
            log(member(ident("b"), "done")),
            log(member(ident("c"), "value")),
            log(member(ident("c"), "done")),
        ],
    );
    assert_eq!(out, "1,false,11,false,,true");
}

#[test]
fn test_generator_completion_is_idempotent() {
    let mut interp = Interpreter::new();
    let g = FunctionBuilder::generator("g")
        .finish(vec![
            expr_stmt(update(UpdateOp::Increment, false, "effects")),
            expr_stmt(yield_(Some(int(1)))),
            expr_stmt(update(UpdateOp::Increment, false, "effects")),
        ])
        .unwrap();
    interp
        .run(&script(vec![
            var("effects", Some(int(0))),
            function_decl(g),
            var("it", Some(call(ident("g"), vec![]))),
        ]))
        .unwrap();
    let it = interp.global("it").unwrap();
    let step = script(vec![expr_stmt(member(call(member(ident("it"), "next"), vec![]), "done"))]);
    assert_eq!(interp.run(&step).unwrap(), Value::Boolean(false));
    assert_eq!(interp.run(&step).unwrap(), Value::Boolean(true));
    assert_eq!(interp.generator_state(&it), Some(GeneratorState::Completed));
    for _ in 0..3 {
        assert_eq!(interp.run(&step).unwrap(), Value::Boolean(true));
    }
    assert_eq!(interp.global("effects"), Some(Value::Smi(2)));
}

#[test]
fn test_throw_injected_at_yield_is_catchable() {
    let mut interp = Interpreter::new();
    let g = FunctionBuilder::generator("g")
        .finish(vec![try_(
            vec![expr_stmt(yield_(Some(int(1))))],
            Some((Some("e"), vec![expr_stmt(yield_(Some(add(string("caught "), ident("e")))))])),
            None,
        )])
        .unwrap();
    let out = run_logged(
        &mut interp,
        vec![
            function_decl(g),
            const_("it", call(ident("g"), vec![])),
            expr_stmt(call(member(ident("it"), "next"), vec![])),
            log(member(call(member(ident("it"), "throw"), vec![string("boom")]), "value")),
            log(member(call(member(ident("it"), "next"), vec![]), "done")),
        ],
    );
    assert_eq!(out, "caught boom,true");
}

#[test]
fn test_yield_star_delegates_and_returns() {
    let mut interp = Interpreter::new();
    let inner = FunctionBuilder::generator("inner")
        .finish(vec![
            expr_stmt(yield_(Some(int(1)))),
            expr_stmt(yield_(Some(int(2)))),
            return_(Some(string("inner done"))),
        ])
        .unwrap();
    let outer = FunctionBuilder::generator("outer")
        .finish(vec![
            const_("r", yield_star(call(ident("inner"), vec![]))),
            expr_stmt(yield_(Some(ident("r")))),
        ])
        .unwrap();
    let out = run_logged(
        &mut interp,
        vec![
            function_decl(inner),
            function_decl(outer),
            for_of(DeclKind::Const, "v", call(ident("outer"), vec![]), log(ident("v"))),
        ],
    );
    assert_eq!(out, "1,2,inner done");
}

#[test]
fn test_yield_star_over_array() {
    let mut interp = Interpreter::new();
    let g = FunctionBuilder::generator("g")
        .finish(vec![expr_stmt(yield_star(array(vec![int(7), int(8)])))])
        .unwrap();
    let out = run_logged(
        &mut interp,
        vec![
            function_decl(g),
            for_of(DeclKind::Const, "v", call(ident("g"), vec![]), log(ident("v"))),
        ],
    );
    assert_eq!(out, "7,8");
}

#[test]
fn test_generator_loop_state_survives_suspension() {
    let mut interp = Interpreter::new();
    let g = FunctionBuilder::generator("range")
        .param("n")
        .finish(vec![for_(
            Some(let_("i", Some(int(0)))),
            Some(lt(ident("i"), ident("n"))),
            Some(update(UpdateOp::Increment, false, "i")),
            block(vec![
                let_("sq", Some(binary(BinaryOp::Mul, ident("i"), ident("i")))),
                expr_stmt(yield_(Some(ident("sq")))),
            ]),
        )])
        .unwrap();
    let out = run_logged(
        &mut interp,
        vec![
            function_decl(g),
            for_of(DeclKind::Const, "v", call(ident("range"), vec![int(4)]), log(ident("v"))),
        ],
    );
    assert_eq!(out, "0,1,4,9");
}

#[test]
fn test_running_generator_cannot_reenter() {
    let mut interp = Interpreter::new();
    let g = FunctionBuilder::generator("g")
        .finish(vec![expr_stmt(call(member(ident("it"), "next"), vec![]))])
        .unwrap();
    let error = interp
        .run(&script(vec![
            function_decl(g),
            var("it", Some(call(ident("g"), vec![]))),
            expr_stmt(call(member(ident("it"), "next"), vec![])),
        ]))
        .unwrap_err();
    assert_eq!(error.to_string(), "Uncaught TypeError: Generator is already running");
}

// ============================================================================
// Async functions and promise jobs
// ============================================================================

#[test]
fn test_job_ordering() {
    let mut interp = Interpreter::new();
    let f = FunctionBuilder::async_function("f")
        .finish(vec![
            log(string("f start")),
            expr_stmt(await_(undefined())),
            log(string("f resumed")),
        ])
        .unwrap();
    let out = run_logged(
        &mut interp,
        vec![
            function_decl(f),
            expr_stmt(call(
                member(call(member(ident("Promise"), "resolve"), vec![]), "then"),
                vec![callback("_", vec![log(string("then"))])],
            )),
            expr_stmt(call(ident("f"), vec![])),
            log(string("sync")),
        ],
    );
    assert_eq!(out, "f start,sync,then,f resumed");
}

#[test]
fn test_await_rejection_is_catchable() {
    let mut interp = Interpreter::new();
    let f = FunctionBuilder::async_function("f")
        .finish(vec![try_(
            vec![expr_stmt(await_(call(member(ident("Promise"), "reject"), vec![string("nope")])))],
            Some((Some("e"), vec![return_(Some(add(string("handled "), ident("e"))))])),
            None,
        )])
        .unwrap();
    let promise = interp
        .run(&script(vec![function_decl(f), expr_stmt(call(ident("f"), vec![]))]))
        .unwrap();
    interp.drain_all().unwrap();
    assert_eq!(
        interp.promise_state(&promise),
        Some((PromiseState::Fulfilled, Value::string("handled nope")))
    );
    assert!(interp.unhandled_rejections().is_empty());
}

#[test]
fn test_async_functions_compose() {
    let mut interp = Interpreter::new();
    let inner = FunctionBuilder::async_function("inner")
        .param("x")
        .finish(vec![return_(Some(binary(BinaryOp::Mul, await_(ident("x")), int(2))))])
        .unwrap();
    let outer = FunctionBuilder::async_function("outer")
        .finish(vec![
            let_("a", Some(await_(call(ident("inner"), vec![int(5)])))),
            let_("b", Some(await_(call(ident("inner"), vec![ident("a")])))),
            return_(Some(ident("b"))),
        ])
        .unwrap();
    let promise = interp
        .run(&script(vec![
            function_decl(inner),
            function_decl(outer),
            expr_stmt(call(ident("outer"), vec![])),
        ]))
        .unwrap();
    interp.drain_all().unwrap();
    assert_eq!(
        interp.promise_state(&promise),
        Some((PromiseState::Fulfilled, Value::Smi(20)))
    );
}

#[test]
fn test_thenable_adoption() {
    let then = FunctionBuilder::new("then")
        .param("resolve")
        .finish(vec![expr_stmt(call(ident("resolve"), vec![int(99)]))])
        .unwrap();
    let mut interp = Interpreter::new();
    let out = run_logged(
        &mut interp,
        vec![
            const_("thenable", object(vec![prop("then", function(then))])),
            expr_stmt(call(
                member(call(member(ident("Promise"), "resolve"), vec![ident("thenable")]), "then"),
                vec![callback("v", vec![log(ident("v"))])],
            )),
        ],
    );
    assert_eq!(out, "99");
}

#[test]
fn test_promise_settles_once() {
    let executor = FunctionBuilder::arrow(false)
        .param("resolve")
        .param("reject")
        .finish(vec![
            expr_stmt(call(ident("resolve"), vec![int(1)])),
            expr_stmt(call(ident("resolve"), vec![int(2)])),
            expr_stmt(call(ident("reject"), vec![int(3)])),
        ])
        .unwrap();
    let mut interp = Interpreter::new();
    let out = run_logged(
        &mut interp,
        vec![
            const_("p", new_(ident("Promise"), vec![function(executor)])),
            expr_stmt(call(
                member(ident("p"), "then"),
                vec![
                    callback("v", vec![log(add(string("fulfilled "), ident("v")))]),
                    callback("e", vec![log(add(string("rejected "), ident("e")))]),
                ],
            )),
        ],
    );
    assert_eq!(out, "fulfilled 1");
}

// ============================================================================
// Async generators
// ============================================================================

#[test]
fn test_async_generator_awaits_between_yields() {
    let mut interp = Interpreter::new();
    let g = FunctionBuilder::async_generator("ticks")
        .finish(vec![
            let_("a", Some(await_(call(member(ident("Promise"), "resolve"), vec![int(1)])))),
            expr_stmt(yield_(Some(ident("a")))),
            expr_stmt(yield_(Some(add(await_(int(1)), ident("a"))))),
        ])
        .unwrap();
    let record = |name: &str| callback("r", vec![log(add(string(name), member(ident("r"), "value")))]);
    let out = run_logged(
        &mut interp,
        vec![
            function_decl(g),
            const_("it", call(ident("ticks"), vec![])),
            expr_stmt(call(member(call(member(ident("it"), "next"), vec![]), "then"), vec![record("first ")])),
            expr_stmt(call(member(call(member(ident("it"), "next"), vec![]), "then"), vec![record("second ")])),
            expr_stmt(call(member(call(member(ident("it"), "next"), vec![]), "then"), vec![record("third ")])),
        ],
    );
    assert_eq!(out, "first 1,second 2,third undefined");
}

#[test]
fn test_async_generator_return_runs_finally() {
    let mut interp = Interpreter::new();
    let g = FunctionBuilder::async_generator("g")
        .finish(vec![try_(
            vec![expr_stmt(yield_(Some(int(1)))), expr_stmt(yield_(Some(int(2))))],
            None,
            Some(vec![log(string("cleanup"))]),
        )])
        .unwrap();
    let out = run_logged(
        &mut interp,
        vec![
            function_decl(g),
            const_("it", call(ident("g"), vec![])),
            expr_stmt(call(member(ident("it"), "next"), vec![])),
            expr_stmt(call(
                member(call(member(ident("it"), "return"), vec![string("early")]), "then"),
                vec![callback("r", vec![log(member(ident("r"), "value")), log(member(ident("r"), "done"))])],
            )),
        ],
    );
    assert_eq!(out, "cleanup,early,true");
}

// ============================================================================
// Scopes across suspension
// ============================================================================

#[test]
fn test_block_scope_retained_while_suspended() {
    let mut interp = Interpreter::new();
    let g = FunctionBuilder::generator("g")
        .finish(vec![block(vec![
            let_("kept", Some(string("alive"))),
            expr_stmt(yield_(None)),
            expr_stmt(yield_(Some(ident("kept")))),
        ])])
        .unwrap();
    interp
        .run(&script(vec![function_decl(g), var("it", Some(call(ident("g"), vec![])))]))
        .unwrap();
    let step = script(vec![expr_stmt(member(call(member(ident("it"), "next"), vec![]), "value"))]);
    interp.run(&step).unwrap();
    let suspended = interp.snapshot().live_scopes;
    assert_eq!(interp.run(&step).unwrap(), Value::string("alive"));
    interp.run(&step).unwrap();
    assert!(interp.snapshot().live_scopes < suspended);
}

#[test]
fn test_block_scopes_released_after_loops() {
    let mut interp = Interpreter::new();
    let baseline = interp.snapshot().live_scopes;
    interp
        .run(&script(vec![for_(
            Some(let_("i", Some(int(0)))),
            Some(lt(ident("i"), int(10))),
            Some(update(UpdateOp::Increment, false, "i")),
            block(vec![let_("tmp", Some(ident("i")))]),
        )]))
        .unwrap();
    assert_eq!(interp.snapshot().live_scopes, baseline);
}
