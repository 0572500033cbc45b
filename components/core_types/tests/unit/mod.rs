//! Unit tests for core_types

use core_types::{ErrorKind, InternalError, JsError, ObjectId, PropertyKey, Symbol, Value};

#[test]
fn test_truthiness_of_every_variant() {
    assert!(!Value::Undefined.is_truthy());
    assert!(!Value::Null.is_truthy());
    assert!(!Value::Boolean(false).is_truthy());
    assert!(Value::Boolean(true).is_truthy());
    assert!(!Value::Smi(0).is_truthy());
    assert!(Value::Smi(-1).is_truthy());
    assert!(!Value::Double(-0.0).is_truthy());
    assert!(Value::Double(0.5).is_truthy());
    assert!(Value::Symbol(Symbol::new(None)).is_truthy());
    assert!(Value::Object(ObjectId(3)).is_truthy());
}

#[test]
fn test_type_of_primitives() {
    assert_eq!(Value::Null.type_of_primitive(), Some("object"));
    assert_eq!(Value::string("s").type_of_primitive(), Some("string"));
    assert_eq!(
        Value::Symbol(Symbol::iterator()).type_of_primitive(),
        Some("symbol")
    );
    assert_eq!(Value::Object(ObjectId(0)).type_of_primitive(), None);
}

#[test]
fn test_structural_eq_mixes_number_representations() {
    assert_eq!(Value::Smi(11), Value::Double(11.0));
    assert_ne!(Value::Smi(11), Value::string("11"));
    assert_eq!(Value::Object(ObjectId(1)), Value::Object(ObjectId(1)));
    assert_ne!(Value::Object(ObjectId(1)), Value::Object(ObjectId(2)));
}

#[test]
fn test_property_key_forms() {
    let by_str = PropertyKey::from("x");
    let by_arc = PropertyKey::from(std::sync::Arc::<str>::from("x"));
    assert_eq!(by_str, by_arc);
    assert_eq!(PropertyKey::from_index(7), PropertyKey::from("7"));
    assert_eq!(PropertyKey::from_index(7).array_index(), Some(7));
    assert_eq!(PropertyKey::from(Symbol::iterator()).as_str(), None);
}

#[test]
fn test_error_constructors() {
    assert_eq!(JsError::type_error("t").kind, ErrorKind::TypeError);
    assert_eq!(JsError::range_error("r").kind, ErrorKind::RangeError);
    assert_eq!(
        JsError::reference_error("x is not defined").to_string(),
        "ReferenceError: x is not defined"
    );
    assert_eq!(InternalError::new("bad tag").0, "bad tag");
}
