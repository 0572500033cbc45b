//! Contract tests for interpreter API
//!
//! These tests pin the host-facing surface: configuration, error reporting,
//! introspection, cancellation and the job loop.

use std::cell::RefCell;
use std::rc::Rc;

use async_runtime::{PromiseState, RejectionOperation, RejectionTracker};
use core_types::{ErrorKind, ObjectId, Value};
use interpreter::builder::*;
use interpreter::{
    CancellationToken, ConfigError, EngineConfig, EngineError, FunctionBuilder, Interpreter, Stmt,
};

fn script(body: Vec<Stmt>) -> Rc<interpreter::FunctionCode> {
    FunctionBuilder::script().finish(body).expect("script builds")
}

/// Test EngineConfig defaults
#[test]
fn test_config_defaults_contract() {
    let config = EngineConfig::default();
    assert_eq!(config.property_cache_limit, 5);
    assert_eq!(config.max_call_depth, 512);
    assert!(!config.strict);
    assert!(config.track_rejections);
    assert!(config.validate().is_ok());
}

/// Test EngineConfig::from_json() fills defaults and validates
#[test]
fn test_config_from_json_contract() {
    let config = EngineConfig::from_json(r#"{ "strict": true, "max_call_depth": 64 }"#).unwrap();
    assert!(config.strict);
    assert_eq!(config.max_call_depth, 64);
    assert_eq!(config.property_cache_limit, 5);

    let error = EngineConfig::from_json(r#"{ "property_cache_limit": 0 }"#).unwrap_err();
    assert!(matches!(error, ConfigError::OutOfRange { field: "property_cache_limit", .. }));

    let error = EngineConfig::from_json(r#"{ "unknown": 1 }"#).unwrap_err();
    assert!(matches!(error, ConfigError::Parse(_)));
}

/// Test EngineConfig round-trips through serde
#[test]
fn test_config_serializes_contract() {
    let config = EngineConfig {
        property_cache_limit: 8,
        ..EngineConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
}

/// Test environment overrides are parsed and validated
#[test]
fn test_config_overrides_contract() {
    let config = EngineConfig::default()
        .with_overrides(|name| (name == "ENGINE_PROPERTY_CACHE_LIMIT").then(|| "2".to_string()))
        .unwrap();
    assert_eq!(config.property_cache_limit, 2);

    let error = EngineConfig::default()
        .with_overrides(|name| (name == "ENGINE_MAX_CALL_DEPTH").then(|| "deep".to_string()))
        .unwrap_err();
    assert_eq!(error.to_string(), "invalid value \"deep\" for ENGINE_MAX_CALL_DEPTH");
}

/// Test Interpreter::with_config() rejects invalid configuration
#[test]
fn test_with_config_contract() {
    let config = EngineConfig {
        max_call_depth: 0,
        ..EngineConfig::default()
    };
    let error = Interpreter::with_config(config).unwrap_err();
    assert!(matches!(error, EngineError::Config(_)));
}

/// Test Interpreter::run() returns the completion value
#[test]
fn test_run_contract() {
    let mut interp = Interpreter::new();
    let code = script(vec![var("x", Some(int(1))), expr_stmt(add(ident("x"), int(1)))]);
    assert_eq!(interp.run(&code).unwrap(), Value::Smi(2));

    let empty = script(vec![]);
    assert_eq!(interp.run(&empty).unwrap(), Value::Undefined);
}

/// Test Interpreter::run() refuses resumable code
#[test]
fn test_run_rejects_generator_code_contract() {
    let mut interp = Interpreter::new();
    let code = FunctionBuilder::generator("g").finish(vec![]).unwrap();
    assert!(matches!(interp.run(&code), Err(EngineError::Internal(_))));
}

/// Test globals persist across runs and global lets cannot be redeclared
#[test]
fn test_globals_across_runs_contract() {
    let mut interp = Interpreter::new();
    interp.run(&script(vec![let_("shared", Some(int(1)))])).unwrap();
    let result = interp.run(&script(vec![expr_stmt(ident("shared"))])).unwrap();
    assert_eq!(result, Value::Smi(1));

    let error = interp
        .run(&script(vec![let_("shared", Some(int(2)))]))
        .unwrap_err();
    assert_eq!(error.kind(), Some(ErrorKind::SyntaxError));
}

/// Test set_global()/global() expose host bindings
#[test]
fn test_host_globals_contract() {
    let mut interp = Interpreter::new();
    interp.set_global("answer", Value::Smi(41));
    let result = interp
        .run(&script(vec![expr_stmt(add(ident("answer"), int(1)))]))
        .unwrap();
    assert_eq!(result, Value::Smi(42));
    assert_eq!(interp.global("nothing"), None);
}

/// Test native functions registered by the host are callable from script
#[test]
fn test_native_function_contract() {
    fn double(_: &mut Interpreter, args: &interpreter::CallArgs<'_>) -> interpreter::Eval<Value> {
        Ok(Value::number(args.arg(0).as_number().unwrap_or(0.0) * 2.0))
    }
    let mut interp = Interpreter::new();
    let f = interp.create_native_function("double", 1, double);
    interp.set_global("double", Value::Object(f));
    let result = interp
        .run(&script(vec![expr_stmt(call(ident("double"), vec![int(21)]))]))
        .unwrap();
    assert_eq!(result, Value::Smi(42));

    let result = interp.call(&Value::Object(f), Value::Undefined, &[Value::Smi(4)]).unwrap();
    assert_eq!(result, Value::Smi(8));
}

/// Test snapshot() reports queue and heap counters
#[test]
fn test_snapshot_contract() {
    let mut interp = Interpreter::new();
    let before = interp.snapshot();
    assert_eq!(before.call_depth, 0);
    assert_eq!(before.pending_jobs, 0);

    interp
        .run(&script(vec![expr_stmt(call(
            member(call(member(ident("Promise"), "resolve"), vec![int(1)]), "then"),
            vec![ident("String")],
        ))]))
        .unwrap();
    let after = interp.snapshot();
    assert_eq!(after.pending_jobs, 1);
    assert!(after.heap_objects > before.heap_objects);

    let json = serde_json::to_value(after).unwrap();
    assert_eq!(json["pending_jobs"], 1);
}

/// Test drain_one_job() runs exactly one job
#[test]
fn test_drain_one_job_contract() {
    let mut interp = Interpreter::new();
    assert!(!interp.drain_one_job().unwrap());
    interp
        .run(&script(vec![expr_stmt(call(
            member(call(member(ident("Promise"), "resolve"), vec![int(1)]), "then"),
            vec![ident("String")],
        ))]))
        .unwrap();
    assert!(interp.drain_one_job().unwrap());
    assert!(!interp.drain_one_job().unwrap());
}

/// Test cancellation surfaces as EngineError::Cancelled and cannot be caught
#[test]
fn test_cancellation_contract() {
    let mut interp = Interpreter::new();
    let token: CancellationToken = interp.cancellation_token();
    token.cancel();
    let code = script(vec![try_(
        vec![while_(boolean(true), empty())],
        Some((None, vec![expr_stmt(int(1))])),
        None,
    )]);
    assert_eq!(interp.run(&code).unwrap_err(), EngineError::Cancelled);

    token.reset();
    let result = interp.run(&script(vec![expr_stmt(int(5))])).unwrap();
    assert_eq!(result, Value::Smi(5));
}

#[derive(Clone, Default)]
struct SharedTracker(Rc<RefCell<Vec<(ObjectId, RejectionOperation)>>>);

impl RejectionTracker for SharedTracker {
    fn track(&mut self, promise: ObjectId, operation: RejectionOperation, _reason: &Value) {
        self.0.borrow_mut().push((promise, operation));
    }
}

/// Test the rejection tracker sees reject then handle
#[test]
fn test_rejection_tracker_contract() {
    let mut interp = Interpreter::new();
    let tracker = SharedTracker::default();
    interp.set_rejection_tracker(Box::new(tracker.clone()));

    let promise = interp
        .run(&script(vec![
            const_("p", call(member(ident("Promise"), "reject"), vec![int(1)])),
            expr_stmt(ident("p")),
        ]))
        .unwrap();
    let id = promise.as_object().unwrap();
    assert_eq!(*tracker.0.borrow(), vec![(id, RejectionOperation::Reject)]);

    interp
        .run(&script(vec![expr_stmt(call(member(ident("p"), "catch"), vec![ident("String")]))]))
        .unwrap();
    assert_eq!(
        *tracker.0.borrow(),
        vec![(id, RejectionOperation::Reject), (id, RejectionOperation::Handle)]
    );
}

/// Test the default tracker reports unhandled rejections
#[test]
fn test_unhandled_rejections_contract() {
    let mut interp = Interpreter::new();
    let promise = interp
        .run(&script(vec![expr_stmt(call(member(ident("Promise"), "reject"), vec![int(1)]))]))
        .unwrap();
    assert_eq!(interp.unhandled_rejections(), vec![promise.as_object().unwrap()]);

    let config = EngineConfig {
        track_rejections: false,
        ..EngineConfig::default()
    };
    let mut quiet = Interpreter::with_config(config).unwrap();
    quiet
        .run(&script(vec![expr_stmt(call(member(ident("Promise"), "reject"), vec![int(1)]))]))
        .unwrap();
    assert!(quiet.unhandled_rejections().is_empty());
}

/// Test promise_state() reports settlement
#[test]
fn test_promise_state_contract() {
    let mut interp = Interpreter::new();
    let promise = interp
        .run(&script(vec![expr_stmt(call(member(ident("Promise"), "resolve"), vec![int(3)]))]))
        .unwrap();
    assert_eq!(interp.promise_state(&promise), Some((PromiseState::Fulfilled, Value::Smi(3))));
    assert_eq!(interp.promise_state(&Value::Smi(3)), None);
}

/// Test EngineError display formats
#[test]
fn test_engine_error_display_contract() {
    let mut interp = Interpreter::new();
    let error = interp
        .run(&script(vec![throw(new_(ident("TypeError"), vec![string("bad input")]))]))
        .unwrap_err();
    assert_eq!(error.to_string(), "Uncaught TypeError: bad input");
    assert_eq!(EngineError::Cancelled.to_string(), "execution cancelled");
}
