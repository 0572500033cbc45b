//! Unit tests for object_model

use std::sync::Arc;

use core_types::{ObjectId, PropertyKey, Value};
use object_model::{Heap, ObjectClass, PropertyFlags, ShapeTable, SlotValue};

fn key(s: &str) -> PropertyKey {
    PropertyKey::from(s)
}

#[test]
fn test_same_addition_sequence_shares_shape() {
    let table = ShapeTable::new();
    let mut heap = Heap::new();
    let a = heap.create_object_with_shape(table.root(None), ObjectClass::Ordinary);
    let b = heap.create_object_with_shape(table.root(None), ObjectClass::Ordinary);
    for id in [a, b] {
        for k in ["x", "y"] {
            heap[id].add_property(&table, key(k), SlotValue::default(), PropertyFlags::default());
        }
    }
    assert!(Arc::ptr_eq(heap[a].shape(), heap[b].shape()));
}

#[test]
fn test_different_order_gives_different_shape() {
    let table = ShapeTable::new();
    let mut heap = Heap::new();
    let a = heap.create_object_with_shape(table.root(None), ObjectClass::Ordinary);
    let b = heap.create_object_with_shape(table.root(None), ObjectClass::Ordinary);
    for k in ["x", "y"] {
        heap[a].add_property(&table, key(k), SlotValue::default(), PropertyFlags::default());
    }
    for k in ["y", "x"] {
        heap[b].add_property(&table, key(k), SlotValue::default(), PropertyFlags::default());
    }
    assert!(!Arc::ptr_eq(heap[a].shape(), heap[b].shape()));
}

#[test]
fn test_prototype_is_part_of_shape() {
    let table = ShapeTable::new();
    let mut heap = Heap::new();
    let proto = heap.create_object_with_shape(table.root(None), ObjectClass::Ordinary);
    let a = heap.create_object_with_shape(table.root(Some(proto)), ObjectClass::Ordinary);
    let b = heap.create_object_with_shape(table.root(None), ObjectClass::Ordinary);
    assert!(!Arc::ptr_eq(heap[a].shape(), heap[b].shape()));

    heap[b].set_prototype(&table, Some(proto));
    assert!(Arc::ptr_eq(heap[a].shape(), heap[b].shape()));
    assert_eq!(heap[b].prototype(), Some(proto));
}

#[test]
fn test_set_prototype_keeps_values() {
    let table = ShapeTable::new();
    let mut heap = Heap::new();
    let obj = heap.create_object_with_shape(table.root(None), ObjectClass::Ordinary);
    heap[obj].add_property(&table, key("v"), SlotValue::Data(Value::Smi(3)), PropertyFlags::default());
    heap[obj].set_prototype(&table, Some(ObjectId(0)));
    assert_eq!(
        heap[obj].own_property(&key("v")).map(|(_, v)| v.clone()),
        Some(SlotValue::Data(Value::Smi(3)))
    );
}

#[test]
fn test_created_shapes_are_counted() {
    let table = ShapeTable::new();
    let root = table.root(None);
    let before = table.shapes_created();
    let _ = table.transition(&root, key("a"), PropertyFlags::default());
    let _ = table.transition(&root, key("a"), PropertyFlags::default());
    assert_eq!(table.shapes_created(), before + 1);
}

#[test]
fn test_array_elements() {
    let table = ShapeTable::new();
    let mut heap = Heap::new();
    let arr = heap.create_object_with_shape(
        table.root(None),
        ObjectClass::Array(vec![Value::Smi(1), Value::Smi(2)].into()),
    );
    assert_eq!(heap[arr].element(1), Some(&Value::Smi(2)));
    assert_eq!(heap[arr].element(2), None);
    if let Some(elements) = heap[arr].elements_mut() {
        elements.push(Value::Smi(3), 16);
        elements.delete(0);
    }
    assert_eq!(heap[arr].element(0), None);
    assert_eq!(heap[arr].own_keys().len(), 2);
}
