//! Object model - shapes and dynamic objects
//!
//! This component provides:
//! - Shapes (hidden classes) with cached transitions
//! - A realm-owned [`ShapeTable`] that creates, replays and invalidates shapes
//! - Dynamic objects with slot storage and exotic classes
//! - Array element storage with holes and a sparse overflow
//! - The object heap arena
//!
//! # Examples
//!
//! ```
//! use object_model::{Heap, ObjectClass, PropertyFlags, ShapeTable, SlotValue};
//! use core_types::{PropertyKey, Value};
//! use std::sync::Arc;
//!
//! let table = ShapeTable::new();
//! let mut heap = Heap::new();
//! let a = heap.create_object_with_shape(table.root(None), ObjectClass::Ordinary);
//! let b = heap.create_object_with_shape(table.root(None), ObjectClass::Ordinary);
//! for id in [a, b] {
//!     heap[id].add_property(&table, PropertyKey::from("x"),
//!         SlotValue::Data(Value::Smi(1)), PropertyFlags::default());
//! }
//! assert!(Arc::ptr_eq(heap[a].shape(), heap[b].shape()));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod elements;
pub mod heap;
pub mod object;
pub mod shape;
pub mod transition;

pub use elements::Elements;
pub use heap::Heap;
pub use object::{ForeignObject, JsObject, ObjectClass, ProxyData, SlotValue};
pub use shape::{Assumption, PropertyEntry, PropertyFlags, Shape};
pub use transition::ShapeTable;
