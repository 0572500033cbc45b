//! Contract tests for core_types
//!
//! These tests pin the public surface that the other components rely on.

use core_types::{ErrorKind, JsError, JsString, ObjectId, PropertyKey, Value};

#[test]
fn value_is_cheap_to_clone_and_default_is_undefined() {
    let v = Value::default();
    assert!(matches!(v, Value::Undefined));
    let s: JsString = std::sync::Arc::from("shared");
    let a = Value::String(s.clone());
    let b = a.clone();
    assert_eq!(a, b);
}

#[test]
fn object_id_indexes_heap() {
    assert_eq!(ObjectId(5).index(), 5);
}

#[test]
fn property_keys_are_hashable() {
    let mut set = std::collections::HashSet::new();
    set.insert(PropertyKey::from("a"));
    set.insert(PropertyKey::from("a"));
    set.insert(PropertyKey::from("b"));
    assert_eq!(set.len(), 2);
}

#[test]
fn js_error_is_std_error() {
    fn takes_error(_: &dyn std::error::Error) {}
    let error = JsError::new(ErrorKind::SyntaxError, "unexpected token");
    takes_error(&error);
}
