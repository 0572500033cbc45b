//! Unit tests for interpreter components

use core_types::{ErrorKind, Value};
use interpreter::builder::*;
use interpreter::node::{BinaryOp, DeclKind, LogicalOp, UnaryOp, UpdateOp};
use interpreter::{EngineConfig, EngineError, FunctionBuilder, Interpreter, Stmt};

fn run(body: Vec<Stmt>) -> Result<Value, EngineError> {
    let mut interp = Interpreter::new();
    run_in(&mut interp, body)
}

fn run_in(interp: &mut Interpreter, body: Vec<Stmt>) -> Result<Value, EngineError> {
    let script = FunctionBuilder::script().finish(body).expect("script builds");
    interp.run(&script)
}

fn eval(expr: interpreter::Expr) -> Value {
    run(vec![expr_stmt(expr)]).expect("expression evaluates")
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_smi_arithmetic_stays_integral() {
    assert_eq!(eval(add(int(40), int(2))), Value::Smi(42));
    assert!(matches!(eval(sub(int(1), int(3))), Value::Smi(-2)));
}

#[test]
fn test_smi_overflow_widens_to_double() {
    let result = eval(add(int(i32::MAX), int(1)));
    assert_eq!(result, Value::Double(i32::MAX as f64 + 1.0));
    let result = eval(binary(BinaryOp::Mul, int(1 << 20), int(1 << 20)));
    assert_eq!(result, Value::Double((1u64 << 40) as f64));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval(add(string("a"), int(1))), Value::string("a1"));
    assert_eq!(eval(add(int(1), add(int(2), string("3")))), Value::string("123"));
}

#[test]
fn test_division_produces_double() {
    assert_eq!(eval(binary(BinaryOp::Div, int(7), int(2))), Value::Double(3.5));
    let result = eval(binary(BinaryOp::Div, int(1), int(0)));
    assert_eq!(result, Value::Double(f64::INFINITY));
}

#[test]
fn test_loose_and_strict_equality() {
    assert_eq!(eval(binary(BinaryOp::Eq, int(1), string("1"))), Value::Boolean(true));
    assert_eq!(eval(strict_eq(int(1), string("1"))), Value::Boolean(false));
    assert_eq!(eval(binary(BinaryOp::Eq, null(), undefined())), Value::Boolean(true));
    assert_eq!(eval(strict_eq(number(1.0), int(1))), Value::Boolean(true));
}

#[test]
fn test_logical_short_circuit() {
    let result = run(vec![
        var("hit", Some(boolean(false))),
        expr_stmt(logical(LogicalOp::And, boolean(false), assign("hit", boolean(true)))),
        expr_stmt(logical(LogicalOp::Coalesce, null(), string("fallback"))),
    ])
    .unwrap();
    assert_eq!(result, Value::string("fallback"));
}

#[test]
fn test_typeof_values() {
    assert_eq!(eval(type_of(int(1))), Value::string("number"));
    assert_eq!(eval(type_of(null())), Value::string("object"));
    assert_eq!(eval(type_of(ident("neverDeclared"))), Value::string("undefined"));
    assert_eq!(eval(type_of(ident("Object"))), Value::string("function"));
}

#[test]
fn test_unary_operators() {
    assert_eq!(eval(unary(UnaryOp::Neg, int(5))), Value::Smi(-5));
    assert_eq!(eval(not(string(""))), Value::Boolean(true));
    assert_eq!(eval(unary(UnaryOp::BitNot, int(0))), Value::Smi(-1));
    assert_eq!(eval(unary(UnaryOp::Void, int(3))), Value::Undefined);
}

#[test]
fn test_update_prefix_and_postfix() {
    let result = run(vec![
        let_("i", Some(int(1))),
        let_("a", Some(update(UpdateOp::Increment, false, "i"))),
        let_("b", Some(update(UpdateOp::Increment, true, "i"))),
        expr_stmt(call(member(array(vec![ident("a"), ident("b"), ident("i")]), "join"), vec![])),
    ])
    .unwrap();
    assert_eq!(result, Value::string("1,3,3"));
}

#[test]
fn test_conditional_and_sequence() {
    assert_eq!(eval(conditional(boolean(true), int(1), int(2))), Value::Smi(1));
    assert_eq!(eval(sequence(vec![int(1), int(2), int(3)])), Value::Smi(3));
}

// ============================================================================
// Bindings and scopes
// ============================================================================

#[test]
fn test_block_scoping_shadows() {
    let result = run(vec![
        let_("x", Some(int(1))),
        block(vec![let_("x", Some(int(2)))]),
        expr_stmt(ident("x")),
    ])
    .unwrap();
    assert_eq!(result, Value::Smi(1));
}

#[test]
fn test_const_reassignment_throws() {
    let error = run(vec![const_("c", int(1)), expr_stmt(assign("c", int(2)))]).unwrap_err();
    assert_eq!(error.kind(), Some(ErrorKind::TypeError));
}

#[test]
fn test_temporal_dead_zone() {
    let error = run(vec![expr_stmt(ident("later")), let_("later", Some(int(1)))]).unwrap_err();
    assert_eq!(error.kind(), Some(ErrorKind::ReferenceError));
}

#[test]
fn test_unresolved_read_is_reference_error() {
    let error = run(vec![expr_stmt(ident("missing"))]).unwrap_err();
    assert_eq!(error.to_string(), "Uncaught ReferenceError: missing is not defined");
}

#[test]
fn test_sloppy_assignment_creates_global() {
    let mut interp = Interpreter::new();
    run_in(&mut interp, vec![expr_stmt(assign("implicit", int(3)))]).unwrap();
    assert_eq!(interp.global("implicit"), Some(Value::Smi(3)));
}

#[test]
fn test_strict_assignment_to_undeclared_throws() {
    let mut interp = Interpreter::new();
    let script = FunctionBuilder::script()
        .strict(true)
        .finish(vec![expr_stmt(assign("implicit", int(3)))])
        .unwrap();
    let error = interp.run(&script).unwrap_err();
    assert_eq!(error.kind(), Some(ErrorKind::ReferenceError));
}

#[test]
fn test_closures_capture_scope() {
    let inc = FunctionBuilder::arrow(false)
        .finish(vec![return_(Some(update(UpdateOp::Increment, true, "n")))])
        .unwrap();
    let counter = FunctionBuilder::new("counter")
        .finish(vec![let_("n", Some(int(0))), return_(Some(function(inc)))])
        .unwrap();
    let result = run(vec![
        function_decl(counter),
        const_("c", call(ident("counter"), vec![])),
        expr_stmt(call(ident("c"), vec![])),
        expr_stmt(call(ident("c"), vec![])),
    ])
    .unwrap();
    assert_eq!(result, Value::Smi(2));
}

#[test]
fn test_function_declarations_are_hoisted() {
    let f = FunctionBuilder::new("f").finish(vec![return_(Some(int(9)))]).unwrap();
    let result = run(vec![expr_stmt(call(ident("f"), vec![])), function_decl(f)]).unwrap();
    assert_eq!(result, Value::Smi(9));
}

#[test]
fn test_for_let_copies_binding_per_iteration() {
    let capture = FunctionBuilder::arrow(false).finish(vec![return_(Some(ident("i")))]).unwrap();
    let result = run(vec![
        let_("fns", Some(array(vec![]))),
        for_(
            Some(let_("i", Some(int(0)))),
            Some(lt(ident("i"), int(3))),
            Some(update(UpdateOp::Increment, false, "i")),
            expr_stmt(call(member(ident("fns"), "push"), vec![function(capture)])),
        ),
        expr_stmt(add(
            call(element(ident("fns"), int(0)), vec![]),
            call(element(ident("fns"), int(2)), vec![]),
        )),
    ])
    .unwrap();
    assert_eq!(result, Value::Smi(2));
}

// ============================================================================
// Objects and properties
// ============================================================================

#[test]
fn test_member_and_element_access() {
    let result = run(vec![
        let_("o", Some(object(vec![prop("a", int(1))]))),
        expr_stmt(assign_member(ident("o"), "b", int(2))),
        expr_stmt(assign_element(ident("o"), string("c"), int(3))),
        expr_stmt(add(
            add(member(ident("o"), "a"), element(ident("o"), string("b"))),
            member(ident("o"), "c"),
        )),
    ])
    .unwrap();
    assert_eq!(result, Value::Smi(6));
}

#[test]
fn test_getter_and_setter_literals() {
    let get_code = FunctionBuilder::new("value")
        .finish(vec![return_(Some(binary(BinaryOp::Mul, member(this(), "raw"), int(2))))])
        .unwrap();
    let set_code = FunctionBuilder::new("value")
        .param("v")
        .finish(vec![expr_stmt(assign_member(this(), "raw", ident("v")))])
        .unwrap();
    let result = run(vec![
        let_(
            "o",
            Some(object(vec![prop("raw", int(1)), getter("value", get_code), setter("value", set_code)])),
        ),
        expr_stmt(assign_member(ident("o"), "value", int(21))),
        expr_stmt(member(ident("o"), "value")),
    ])
    .unwrap();
    assert_eq!(result, Value::Smi(42));
}

#[test]
fn test_in_and_delete() {
    let result = run(vec![
        let_("o", Some(object(vec![prop("a", int(1))]))),
        let_("before", Some(in_(string("a"), ident("o")))),
        expr_stmt(delete_member(ident("o"), "a")),
        expr_stmt(logical(LogicalOp::And, ident("before"), not(in_(string("a"), ident("o"))))),
    ])
    .unwrap();
    assert_eq!(result, Value::Boolean(true));
}

#[test]
fn test_inherited_lookup() {
    let result = run(vec![
        let_("base", Some(object(vec![prop("greeting", string("hello"))]))),
        let_("o", Some(call(member(ident("Object"), "create"), vec![ident("base")]))),
        expr_stmt(in_(string("greeting"), ident("o"))),
    ])
    .unwrap();
    assert_eq!(result, Value::Boolean(true));
}

#[test]
fn test_reading_property_of_undefined() {
    let error = run(vec![expr_stmt(member(undefined(), "x"))]).unwrap_err();
    assert_eq!(
        error.to_string(),
        "Uncaught TypeError: Cannot read properties of undefined (reading 'x')"
    );
}

#[test]
fn test_array_length_and_index() {
    let result = run(vec![
        let_("a", Some(array(vec![int(1), int(2)]))),
        expr_stmt(assign_element(ident("a"), int(2), int(3))),
        expr_stmt(add(member(ident("a"), "length"), element(ident("a"), int(2)))),
    ])
    .unwrap();
    assert_eq!(result, Value::Smi(6));
}

#[test]
fn test_in_operator_on_array_hole() {
    let result = run(vec![
        let_("a", Some(array(vec![]))),
        expr_stmt(assign_element(ident("a"), int(5), int(1))),
        expr_stmt(logical(
            LogicalOp::Or,
            in_(int(1), ident("a")),
            not(in_(int(5), ident("a"))),
        )),
    ])
    .unwrap();
    assert_eq!(result, Value::Boolean(false));
}

#[test]
fn test_huge_array_index_and_length_complete_normally() {
    let result = run(vec![
        let_("a", Some(array(vec![]))),
        expr_stmt(assign_element(ident("a"), number(4_000_000_000.0), int(1))),
        let_("b", Some(array(vec![int(7)]))),
        expr_stmt(assign_member(ident("b"), "length", number(4e9))),
        expr_stmt(add(member(ident("a"), "length"), member(ident("b"), "length"))),
    ])
    .unwrap();
    assert_eq!(result, Value::number(8_000_000_001.0));
}

#[test]
fn test_string_length_and_index() {
    assert_eq!(eval(member(string("héllo"), "length")), Value::Smi(5));
    assert_eq!(eval(element(string("abc"), int(1))), Value::string("b"));
}

// ============================================================================
// Calls
// ============================================================================

#[test]
fn test_method_call_binds_this() {
    let method = FunctionBuilder::new("get").finish(vec![return_(Some(member(this(), "v")))]).unwrap();
    let result = run(vec![
        let_("o", Some(object(vec![prop("v", int(7)), prop("get", function(method))]))),
        expr_stmt(call(member(ident("o"), "get"), vec![])),
    ])
    .unwrap();
    assert_eq!(result, Value::Smi(7));
}

#[test]
fn test_constructor_call() {
    let point = FunctionBuilder::new("Point")
        .param("x")
        .finish(vec![expr_stmt(assign_member(this(), "x", ident("x")))])
        .unwrap();
    let result = run(vec![
        function_decl(point),
        const_("p", new_(ident("Point"), vec![int(4)])),
        expr_stmt(binary(BinaryOp::InstanceOf, ident("p"), ident("Point"))),
    ])
    .unwrap();
    assert_eq!(result, Value::Boolean(true));
}

#[test]
fn test_calling_non_function() {
    let error = run(vec![
        let_("o", Some(object(vec![]))),
        expr_stmt(call(member(ident("o"), "missing"), vec![])),
    ])
    .unwrap_err();
    assert_eq!(error.kind(), Some(ErrorKind::TypeError));
    assert!(error.to_string().contains("is not a function"), "{}", error);
}

#[test]
fn test_call_depth_limit() {
    let config = EngineConfig {
        max_call_depth: 40,
        ..EngineConfig::default()
    };
    let mut interp = Interpreter::with_config(config).unwrap();
    let recurse = FunctionBuilder::new("recurse")
        .finish(vec![return_(Some(call(ident("recurse"), vec![])))])
        .unwrap();
    let error = run_in(&mut interp, vec![function_decl(recurse), expr_stmt(call(ident("recurse"), vec![]))])
        .unwrap_err();
    assert_eq!(error.to_string(), "Uncaught RangeError: Maximum call stack size exceeded");
    assert_eq!(interp.snapshot().call_depth, 0);
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_labeled_break_out_of_nested_loops() {
    let result = run(vec![
        let_("count", Some(int(0))),
        labeled(
            "outer",
            while_(
                boolean(true),
                while_(
                    boolean(true),
                    block(vec![
                        expr_stmt(update(UpdateOp::Increment, false, "count")),
                        if_(strict_eq(ident("count"), int(3)), break_(Some("outer")), None),
                    ]),
                ),
            ),
        ),
        expr_stmt(ident("count")),
    ])
    .unwrap();
    assert_eq!(result, Value::Smi(3));
}

#[test]
fn test_for_of_break_closes_iterator() {
    let gen = FunctionBuilder::generator("g")
        .finish(vec![try_(
            vec![expr_stmt(yield_(Some(int(1)))), expr_stmt(yield_(Some(int(2))))],
            None,
            Some(vec![expr_stmt(assign("closed", boolean(true)))]),
        )])
        .unwrap();
    let mut interp = Interpreter::new();
    run_in(
        &mut interp,
        vec![
            var("closed", Some(boolean(false))),
            function_decl(gen),
            for_of(DeclKind::Const, "x", call(ident("g"), vec![]), break_(None)),
        ],
    )
    .unwrap();
    assert_eq!(interp.global("closed"), Some(Value::Boolean(true)));
}

#[test]
fn test_throw_non_error_value() {
    let error = run(vec![throw(int(42))]).unwrap_err();
    assert_eq!(
        error,
        EngineError::Uncaught {
            kind: ErrorKind::Error,
            message: "42".to_string()
        }
    );
}

#[test]
fn test_exception_in_catch_replaces_original() {
    let error = run(vec![try_(
        vec![throw(string("first"))],
        Some((None, vec![throw(string("second"))])),
        None,
    )])
    .unwrap_err();
    assert!(error.to_string().ends_with("second"));
}

#[test]
fn test_finally_runs_on_throw() {
    let mut interp = Interpreter::new();
    let error = run_in(
        &mut interp,
        vec![
            var("cleaned", Some(boolean(false))),
            try_(
                vec![throw(string("x"))],
                None,
                Some(vec![expr_stmt(assign("cleaned", boolean(true)))]),
            ),
        ],
    )
    .unwrap_err();
    assert!(matches!(error, EngineError::Uncaught { .. }));
    assert_eq!(interp.global("cleaned"), Some(Value::Boolean(true)));
}

#[test]
fn test_builder_rejects_misplaced_yield() {
    let error = FunctionBuilder::new("f")
        .finish(vec![expr_stmt(yield_(Some(int(1))))])
        .unwrap_err();
    assert_eq!(error.kind, ErrorKind::SyntaxError);
    let error = FunctionBuilder::script().finish(vec![break_(None)]).unwrap_err();
    assert_eq!(error.message, "Illegal break statement");
}
