//! Shape and Inline Cache Integration Tests
//!
//! Tests the object model and the interpreter's property caches together:
//! - Shape sharing between independently built objects
//! - Cached reads agree with the uncached lookup at every site state
//! - Prototype layout changes invalidate shapes and force cached entries
//!   out of use

use std::rc::Rc;
use std::sync::Arc;

use core_types::{PropertyKey, Value};
use interpreter::builder::*;
use interpreter::{EngineConfig, Expr, FunctionBuilder, FunctionCode, GetCache, Interpreter, Stmt};
use object_model::{ForeignObject, Heap, ObjectClass, PropertyFlags, ShapeTable, SlotValue};

fn script(body: Vec<Stmt>) -> Rc<FunctionCode> {
    FunctionBuilder::script().finish(body).expect("script builds")
}

/// `function read(o) { return o.x; }`, declared globally.
fn install_reader(interp: &mut Interpreter) -> (Rc<FunctionCode>, Value) {
    let code = FunctionBuilder::new("read")
        .param("o")
        .finish(vec![return_(Some(member(ident("o"), "x")))])
        .unwrap();
    interp.run(&script(vec![function_decl(Rc::clone(&code))])).unwrap();
    let function = interp.global("read").unwrap();
    (code, function)
}

fn read_site(code: &FunctionCode) -> &GetCache {
    match &code.body.body[0] {
        Stmt::Return {
            value: Some(Expr::Member { cache, .. }),
            ..
        } => cache,
        _ => panic!("reader body should be a single member read"),
    }
}

/// An object literal whose own keys are `prefix` followed by `x`.
fn object_with(interp: &mut Interpreter, prefix: &[&str], x: i32) -> Value {
    let mut properties: Vec<_> = prefix.iter().map(|key| prop(*key, int(0))).collect();
    properties.push(prop("x", int(x)));
    interp.run(&script(vec![expr_stmt(object(properties))])).unwrap()
}

fn read(interp: &mut Interpreter, function: &Value, receiver: &Value) -> Value {
    interp
        .call(function, Value::Undefined, std::slice::from_ref(receiver))
        .unwrap()
}

fn uncached(interp: &mut Interpreter, receiver: &Value) -> Value {
    interp.get_property(receiver, &PropertyKey::from("x")).unwrap()
}

// ============================================================================
// Shape sharing
// ============================================================================

#[test]
fn test_same_additions_share_shape() {
    let table = ShapeTable::new();
    let mut heap = Heap::new();
    let first = heap.create_object_with_shape(table.root(None), ObjectClass::Ordinary);
    let second = heap.create_object_with_shape(table.root(None), ObjectClass::Ordinary);
    for id in [first, second] {
        for key in ["a", "b", "c"] {
            heap[id].add_property(
                &table,
                PropertyKey::from(key),
                SlotValue::Data(Value::Smi(1)),
                PropertyFlags::default(),
            );
        }
    }
    assert!(Arc::ptr_eq(heap[first].shape(), heap[second].shape()));
    assert_eq!(heap[first].shape().property_count(), 3);
}

#[test]
fn test_addition_order_changes_shape() {
    let table = ShapeTable::new();
    let mut heap = Heap::new();
    let ab = heap.create_object_with_shape(table.root(None), ObjectClass::Ordinary);
    let ba = heap.create_object_with_shape(table.root(None), ObjectClass::Ordinary);
    for (id, keys) in [(ab, ["a", "b"]), (ba, ["b", "a"])] {
        for key in keys {
            heap[id].add_property(
                &table,
                PropertyKey::from(key),
                SlotValue::Data(Value::Null),
                PropertyFlags::default(),
            );
        }
    }
    assert!(!Arc::ptr_eq(heap[ab].shape(), heap[ba].shape()));
}

#[test]
fn test_script_literals_share_shape() {
    let mut interp = Interpreter::new();
    let first = object_with(&mut interp, &["a"], 1);
    let second = object_with(&mut interp, &["a"], 2);
    let heap = interp.heap();
    let first = &heap[first.as_object().unwrap()];
    let second = &heap[second.as_object().unwrap()];
    assert!(Arc::ptr_eq(first.shape(), second.shape()));
}

// ============================================================================
// Cache states
// ============================================================================

#[test]
fn test_monomorphic_site() {
    let mut interp = Interpreter::new();
    let (code, read_fn) = install_reader(&mut interp);
    let receiver = object_with(&mut interp, &[], 7);

    assert_eq!(read(&mut interp, &read_fn, &receiver), Value::Smi(7));
    assert_eq!(read(&mut interp, &read_fn, &receiver), Value::Smi(7));

    let site = read_site(&code);
    assert_eq!(site.kinds(), vec!["OwnData"]);
    let stats = site.stats();
    assert_eq!((stats.hits, stats.misses, stats.megamorphic), (1, 1, 0));
}

#[test]
fn test_polymorphic_site_matches_slow_path() {
    let mut interp = Interpreter::new();
    let (code, read_fn) = install_reader(&mut interp);
    let receivers = vec![
        object_with(&mut interp, &[], 1),
        object_with(&mut interp, &["a"], 2),
        object_with(&mut interp, &["a", "b"], 3),
    ];
    for _ in 0..2 {
        for receiver in &receivers {
            let cached = read(&mut interp, &read_fn, receiver);
            assert_eq!(cached, uncached(&mut interp, receiver));
        }
    }
    let site = read_site(&code);
    assert_eq!(site.len(), 3);
    assert!(!site.is_megamorphic());
    assert_eq!(site.stats().hits, 3);
}

#[test]
fn test_megamorphic_site_matches_slow_path() {
    let mut interp = Interpreter::new();
    let (code, read_fn) = install_reader(&mut interp);
    let prefixes: [&[&str]; 7] = [
        &[],
        &["a"],
        &["b"],
        &["c"],
        &["d"],
        &["e"],
        &["f"],
    ];
    let receivers: Vec<Value> = prefixes
        .iter()
        .enumerate()
        .map(|(i, prefix)| object_with(&mut interp, prefix, i as i32))
        .collect();
    for receiver in &receivers {
        let cached = read(&mut interp, &read_fn, receiver);
        assert_eq!(cached, uncached(&mut interp, receiver));
    }
    let site = read_site(&code);
    assert!(site.is_megamorphic());
    assert_eq!(site.kinds(), vec!["Generic"]);
    assert_eq!(site.stats().megamorphic, 1);

    // The generic entry never grows the chain again
    for receiver in &receivers {
        let cached = read(&mut interp, &read_fn, receiver);
        assert_eq!(cached, uncached(&mut interp, receiver));
    }
    assert_eq!(site.len(), 1);
}

#[test]
fn test_cache_limit_follows_config() {
    let config = EngineConfig {
        property_cache_limit: 2,
        ..EngineConfig::default()
    };
    let mut interp = Interpreter::with_config(config).unwrap();
    let (code, read_fn) = install_reader(&mut interp);
    for (i, prefix) in [&[][..], &["a"][..], &["b"][..]].iter().enumerate() {
        let receiver = object_with(&mut interp, prefix, i as i32);
        assert_eq!(read(&mut interp, &read_fn, &receiver), Value::Smi(i as i32));
    }
    assert!(read_site(&code).is_megamorphic());
}

#[test]
fn test_missing_and_primitive_receivers() {
    let mut interp = Interpreter::new();
    let (code, read_fn) = install_reader(&mut interp);
    let empty = interp.run(&script(vec![expr_stmt(object(vec![]))])).unwrap();
    for receiver in [empty, Value::string("str"), Value::Smi(4)] {
        assert_eq!(read(&mut interp, &read_fn, &receiver), Value::Undefined);
        assert_eq!(read(&mut interp, &read_fn, &receiver), Value::Undefined);
    }
    let site = read_site(&code);
    assert_eq!(site.stats().hits, 3);
    assert_eq!(site.kinds(), vec!["Absent", "Primitive", "Primitive"]);
}

/// Host object exposing a single numeric `count` member.
#[derive(Debug, Default)]
struct Counter {
    count: i32,
}

impl ForeignObject for Counter {
    fn class_name(&self) -> &str {
        "Counter"
    }

    fn read_member(&self, key: &PropertyKey) -> Option<Value> {
        (key.as_str() == Some("x")).then_some(Value::Smi(self.count))
    }

    fn write_member(&mut self, key: &PropertyKey, value: Value) -> bool {
        match (key.as_str(), value) {
            (Some("x"), Value::Smi(count)) => {
                self.count = count;
                true
            }
            _ => false,
        }
    }

    fn has_member(&self, key: &PropertyKey) -> bool {
        key.as_str() == Some("x")
    }

    fn member_keys(&self) -> Vec<PropertyKey> {
        vec![PropertyKey::from("x")]
    }
}

#[test]
fn test_foreign_receiver_delegates_every_access() {
    let mut interp = Interpreter::new();
    let (code, read_fn) = install_reader(&mut interp);
    let shape = interp.shape_table().root(None);
    let host = interp.create_object_with_shape(shape, ObjectClass::Foreign(Box::new(Counter::default())));
    let host = Value::Object(host);
    interp.set_global("host", host.clone());

    assert_eq!(read(&mut interp, &read_fn, &host), Value::Smi(0));
    interp
        .run(&script(vec![expr_stmt(assign_member(ident("host"), "x", int(6)))]))
        .unwrap();
    assert_eq!(read(&mut interp, &read_fn, &host), Value::Smi(6));
    assert_eq!(read_site(&code).kinds(), vec!["Foreign"]);

    let present = interp
        .run(&script(vec![expr_stmt(in_(string("x"), ident("host")))]))
        .unwrap();
    assert_eq!(present, Value::Boolean(true));
}

// ============================================================================
// Invalidation
// ============================================================================

#[test]
fn test_prototype_accessor_redefinition_invalidates_shape() {
    let mut interp = Interpreter::new();
    let (code, read_fn) = install_reader(&mut interp);
    // `proto` and `twin` share a shape; `receiver` inherits from `proto`.
    let receiver = interp
        .run(&script(vec![
            var("proto", Some(object(vec![prop("x", int(1))]))),
            var("twin", Some(object(vec![prop("x", int(7))]))),
            expr_stmt(call(member(ident("Object"), "create"), vec![ident("proto")])),
        ]))
        .unwrap();
    let twin = interp.global("twin").unwrap();
    let twin_id = twin.as_object().unwrap();
    let shared = Arc::clone(interp.heap()[twin_id].shape());
    for _ in 0..2 {
        assert_eq!(read(&mut interp, &read_fn, &receiver), Value::Smi(1));
        assert_eq!(read(&mut interp, &read_fn, &twin), Value::Smi(7));
    }
    let before = read_site(&code).stats();

    let getter = FunctionBuilder::new("get")
        .finish(vec![return_(Some(int(42)))])
        .unwrap();
    interp
        .run(&script(vec![expr_stmt(call(
            member(ident("Object"), "defineProperty"),
            vec![
                ident("proto"),
                string("x"),
                object(vec![prop("get", function(getter)), prop("configurable", boolean(true))]),
            ],
        ))]))
        .unwrap();
    assert!(!shared.is_valid());

    assert_eq!(read(&mut interp, &read_fn, &receiver), Value::Smi(42));
    assert_eq!(read(&mut interp, &read_fn, &twin), Value::Smi(7));
    let after = read_site(&code).stats();
    assert_eq!(after.misses, before.misses + 2);
    assert_eq!(after.hits, before.hits);

    // The twin migrated off the invalid shape and is cached again.
    let migrated = interp.heap()[twin_id].shape();
    assert!(migrated.is_valid());
    assert!(!Arc::ptr_eq(migrated, &shared));
    assert_eq!(read(&mut interp, &read_fn, &twin), Value::Smi(7));
    assert_eq!(read(&mut interp, &read_fn, &receiver), Value::Smi(42));
    assert_eq!(read_site(&code).stats().hits, after.hits + 2);
}

#[test]
fn test_deleting_prototype_property_invalidates_shape() {
    let mut interp = Interpreter::new();
    let receiver = interp
        .run(&script(vec![
            var("base", Some(object(vec![prop("x", int(1)), prop("y", int(2))]))),
            expr_stmt(call(member(ident("Object"), "create"), vec![ident("base")])),
        ]))
        .unwrap();
    let base = interp.global("base").unwrap().as_object().unwrap();
    let old = Arc::clone(interp.heap()[base].shape());
    interp
        .run(&script(vec![expr_stmt(delete_member(ident("base"), "x"))]))
        .unwrap();
    assert!(!old.is_valid());
    assert!(interp.heap()[base].shape().is_valid());
    assert_eq!(uncached(&mut interp, &receiver), Value::Undefined);

    // Ordinary objects never used as prototypes keep their old shapes valid.
    let plain = object_with(&mut interp, &["a"], 3);
    let plain_shape = Arc::clone(interp.heap()[plain.as_object().unwrap()].shape());
    interp.delete_property(&plain, &PropertyKey::from("a")).unwrap();
    assert!(plain_shape.is_valid());
}

#[test]
fn test_prototype_change_is_observed() {
    let mut interp = Interpreter::new();
    let (_, read_fn) = install_reader(&mut interp);
    let receiver = interp
        .run(&script(vec![
            var("base", Some(object(vec![prop("x", int(1))]))),
            var("mid", Some(call(member(ident("Object"), "create"), vec![ident("base")]))),
            expr_stmt(call(member(ident("Object"), "create"), vec![ident("mid")])),
        ]))
        .unwrap();
    assert_eq!(read(&mut interp, &read_fn, &receiver), Value::Smi(1));
    assert_eq!(read(&mut interp, &read_fn, &receiver), Value::Smi(1));

    interp
        .run(&script(vec![expr_stmt(assign_member(ident("mid"), "x", int(2)))]))
        .unwrap();
    assert_eq!(read(&mut interp, &read_fn, &receiver), Value::Smi(2));

    interp
        .run(&script(vec![expr_stmt(delete_member(ident("mid"), "x"))]))
        .unwrap();
    assert_eq!(read(&mut interp, &read_fn, &receiver), Value::Smi(1));
}

#[test]
fn test_set_prototype_is_observed() {
    let mut interp = Interpreter::new();
    let (_, read_fn) = install_reader(&mut interp);
    let receiver = interp
        .run(&script(vec![
            var("first", Some(object(vec![prop("x", string("first"))]))),
            var("second", Some(object(vec![prop("x", string("second"))]))),
            var("o", Some(call(member(ident("Object"), "create"), vec![ident("first")]))),
            expr_stmt(ident("o")),
        ]))
        .unwrap();
    assert_eq!(read(&mut interp, &read_fn, &receiver), Value::string("first"));
    interp
        .run(&script(vec![expr_stmt(call(
            member(ident("Object"), "setPrototypeOf"),
            vec![ident("o"), ident("second")],
        ))]))
        .unwrap();
    assert_eq!(read(&mut interp, &read_fn, &receiver), Value::string("second"));
}

// ============================================================================
// Write ordering
// ============================================================================

#[test]
fn test_compound_element_write_checks_base_first() {
    let mut interp = Interpreter::new();
    let error = interp
        .run(&script(vec![
            var("called", Some(boolean(false))),
            expr_stmt(compound_element(
                interpreter::node::BinaryOp::Add,
                null(),
                int(0),
                assign("called", boolean(true)),
            )),
        ]))
        .unwrap_err();
    assert_eq!(error.kind(), Some(core_types::ErrorKind::TypeError));
    assert_eq!(interp.global("called"), Some(Value::Boolean(false)));
}
