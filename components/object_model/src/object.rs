//! JavaScript object representation
//!
//! A [`JsObject`] is a shape pointer plus a slot vector. The shape says which
//! key lives in which slot; the slot vector holds the values. Objects also
//! carry a class that selects exotic behavior (arrays, proxies, host
//! objects) and an opaque payload for engine internals such as promise
//! records or generator frames.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use core_types::{ObjectId, PropertyKey, Value};

use crate::elements::Elements;
use crate::shape::{PropertyFlags, Shape};
use crate::transition::ShapeTable;

/// Contents of one property slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    /// Plain value
    Data(Value),
    /// Getter/setter pair; either half may be absent
    Accessor {
        /// Function called on read
        getter: Option<ObjectId>,
        /// Function called on write
        setter: Option<ObjectId>,
    },
}

impl SlotValue {
    /// The data value, or `None` for accessors.
    pub fn as_data(&self) -> Option<&Value> {
        match self {
            SlotValue::Data(v) => Some(v),
            SlotValue::Accessor { .. } => None,
        }
    }
}

impl Default for SlotValue {
    fn default() -> Self {
        SlotValue::Data(Value::Undefined)
    }
}

/// A host object whose members are resolved by the embedder.
///
/// Foreign objects never participate in shape caching: every access runs a
/// class check and delegates here.
pub trait ForeignObject: fmt::Debug {
    /// Name reported by `Object.prototype.toString`-style formatting.
    fn class_name(&self) -> &str;

    /// Read a member, `None` when the member does not exist.
    fn read_member(&self, key: &PropertyKey) -> Option<Value>;

    /// Write a member. Returns false when the host refuses the write.
    fn write_member(&mut self, key: &PropertyKey, value: Value) -> bool;

    /// Whether the member exists.
    fn has_member(&self, key: &PropertyKey) -> bool;

    /// Enumerable member keys.
    fn member_keys(&self) -> Vec<PropertyKey>;
}

/// Target and handler of a proxy object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyData {
    /// Object the proxy forwards to
    pub target: ObjectId,
    /// Object holding the trap functions
    pub handler: ObjectId,
    /// Set by `revoke()`; every operation on a revoked proxy throws
    pub revoked: bool,
}

/// Object class: selects ordinary or exotic behavior.
pub enum ObjectClass {
    /// Ordinary object
    Ordinary,
    /// Array; indexed elements and `length` live outside the shape
    Array(Elements),
    /// Callable object; the payload is owned by the interpreter
    Function(Box<dyn Any>),
    /// Proxy exotic object
    Proxy(ProxyData),
    /// Host object
    Foreign(Box<dyn ForeignObject>),
    /// Ordinary object with an engine-internal payload
    Internal(Box<dyn Any>),
}

impl ObjectClass {
    /// Short name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            ObjectClass::Ordinary => "Object",
            ObjectClass::Array(_) => "Array",
            ObjectClass::Function(_) => "Function",
            ObjectClass::Proxy(_) => "Proxy",
            ObjectClass::Foreign(_) => "Foreign",
            ObjectClass::Internal(_) => "Internal",
        }
    }
}

impl fmt::Debug for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectClass::Array(elements) => write!(f, "Array(len={})", elements.len()),
            ObjectClass::Proxy(data) => write!(f, "{:?}", data),
            ObjectClass::Foreign(host) => write!(f, "Foreign({})", host.class_name()),
            other => f.write_str(other.name()),
        }
    }
}

/// JavaScript object with shape-based property storage
pub struct JsObject {
    shape: Arc<Shape>,
    slots: Vec<SlotValue>,
    class: ObjectClass,
    extensible: bool,
    is_prototype: bool,
}

impl JsObject {
    /// Create an object of `class` laid out by `shape`.
    ///
    /// Slots described by the shape start out as `undefined` data values.
    pub fn new(shape: Arc<Shape>, class: ObjectClass) -> Self {
        let slots = shape
            .entries()
            .iter()
            .map(|entry| {
                if entry.flags.is_accessor() {
                    SlotValue::Accessor {
                        getter: None,
                        setter: None,
                    }
                } else {
                    SlotValue::default()
                }
            })
            .collect();
        Self {
            shape,
            slots,
            class,
            extensible: true,
            is_prototype: false,
        }
    }

    /// Current shape.
    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    /// Prototype, as recorded in the shape.
    pub fn prototype(&self) -> Option<ObjectId> {
        self.shape.prototype()
    }

    /// Object class.
    pub fn class(&self) -> &ObjectClass {
        &self.class
    }

    /// Mutable object class.
    pub fn class_mut(&mut self) -> &mut ObjectClass {
        &mut self.class
    }

    /// Whether new properties may be added.
    pub fn is_extensible(&self) -> bool {
        self.extensible
    }

    /// `[[PreventExtensions]]`
    pub fn prevent_extensions(&mut self) {
        self.extensible = false;
    }

    /// Whether some other object's shape names this object as prototype.
    pub fn is_prototype(&self) -> bool {
        self.is_prototype
    }

    pub(crate) fn mark_prototype(&mut self) {
        self.is_prototype = true;
    }

    /// Slot contents by index. Indices come from this object's shape.
    pub fn slot(&self, index: u32) -> &SlotValue {
        &self.slots[index as usize]
    }

    /// Overwrite a slot in place. The shape does not change.
    pub fn set_slot(&mut self, index: u32, value: SlotValue) {
        self.slots[index as usize] = value;
    }

    /// Own property attributes and contents, looked up through the shape.
    ///
    /// Array elements are not in the shape; see [`JsObject::element`].
    pub fn own_property(&self, key: &PropertyKey) -> Option<(PropertyFlags, &SlotValue)> {
        self.shape
            .lookup(key)
            .map(|entry| (entry.flags, &self.slots[entry.slot as usize]))
    }

    /// Append a property known to be absent, transitioning the shape.
    pub fn add_property(
        &mut self,
        table: &ShapeTable,
        key: PropertyKey,
        value: SlotValue,
        flags: PropertyFlags,
    ) {
        let next = table.transition(&self.shape, key, flags);
        self.apply_transition(next, value);
    }

    /// Move to `next`, a direct child of the current shape, storing `value`
    /// in the slot the child appended.
    pub fn apply_transition(&mut self, next: Arc<Shape>, value: SlotValue) {
        debug_assert_eq!(next.property_count(), self.slots.len() + 1);
        self.slots.push(value);
        self.shape = next;
    }

    /// Define or redefine an own property.
    ///
    /// Existing keys keep their slot; an attribute change moves the object
    /// to the matching shape. Callers have already validated the change
    /// against the old attributes.
    pub fn define_own(
        &mut self,
        table: &ShapeTable,
        key: PropertyKey,
        value: SlotValue,
        flags: PropertyFlags,
    ) {
        match self.shape.lookup(&key).cloned() {
            Some(entry) => {
                if entry.flags != flags {
                    self.shape = table.change_flags(&self.shape, &key, flags);
                }
                self.slots[entry.slot as usize] = value;
            }
            None => self.add_property(table, key, value, flags),
        }
    }

    /// Remove an own property. Returns false when the key is absent.
    pub fn remove_own(&mut self, table: &ShapeTable, key: &PropertyKey) -> bool {
        if self.shape.lookup(key).is_none() {
            return false;
        }
        let next = table.remove(&self.shape, key);
        self.relayout(next);
        true
    }

    /// Change the prototype. Slot indices are kept.
    pub fn set_prototype(&mut self, table: &ShapeTable, prototype: Option<ObjectId>) {
        if self.shape.prototype() != prototype {
            self.shape = table.with_prototype(&self.shape, prototype);
        }
    }

    /// Move off an invalidated shape onto a fresh equivalent one.
    ///
    /// Returns true when the object was migrated.
    pub fn migrate_if_invalid(&mut self, table: &ShapeTable) -> bool {
        if self.shape.is_valid() {
            return false;
        }
        let old = self.shape.id();
        self.shape = table.refresh(&self.shape);
        tracing::trace!(from = old, to = self.shape.id(), "object migrated off invalid shape");
        true
    }

    fn relayout(&mut self, next: Arc<Shape>) {
        let mapping = ShapeTable::slot_mapping(&self.shape, &next);
        let slots = mapping
            .into_iter()
            .map(|old| {
                old.map(|index| std::mem::take(&mut self.slots[index as usize]))
                    .unwrap_or_default()
            })
            .collect();
        self.slots = slots;
        self.shape = next;
    }

    /// Array elements, `None` for non-arrays.
    pub fn elements(&self) -> Option<&Elements> {
        match &self.class {
            ObjectClass::Array(elements) => Some(elements),
            _ => None,
        }
    }

    /// Mutable array elements, `None` for non-arrays.
    pub fn elements_mut(&mut self) -> Option<&mut Elements> {
        match &mut self.class {
            ObjectClass::Array(elements) => Some(elements),
            _ => None,
        }
    }

    /// Array element by index; `None` for holes, out-of-bounds indices and
    /// non-arrays.
    pub fn element(&self, index: u32) -> Option<&Value> {
        self.elements().and_then(|e| e.get(index))
    }

    /// Own keys in property order: integer indices ascending, then strings
    /// in insertion order, then symbols in insertion order.
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        let mut indices: Vec<u32> = self
            .elements()
            .map(|e| e.indices().collect())
            .unwrap_or_default();
        let mut strings = Vec::new();
        let mut symbols = Vec::new();
        for entry in self.shape.entries() {
            match (&entry.key, entry.key.array_index()) {
                (_, Some(index)) => indices.push(index),
                (PropertyKey::String(_), None) => strings.push(entry.key.clone()),
                (PropertyKey::Symbol(_), None) => symbols.push(entry.key.clone()),
            }
        }
        indices.sort_unstable();
        indices.dedup();
        indices
            .into_iter()
            .map(PropertyKey::from_index)
            .chain(strings)
            .chain(symbols)
            .collect()
    }

    /// Engine payload of an internal object, downcast to `T`.
    pub fn internal<T: 'static>(&self) -> Option<&T> {
        match &self.class {
            ObjectClass::Internal(data) => data.downcast_ref(),
            _ => None,
        }
    }

    /// Mutable engine payload of an internal object.
    pub fn internal_mut<T: 'static>(&mut self) -> Option<&mut T> {
        match &mut self.class {
            ObjectClass::Internal(data) => data.downcast_mut(),
            _ => None,
        }
    }

    /// Interpreter payload of a function object, downcast to `T`.
    pub fn function<T: 'static>(&self) -> Option<&T> {
        match &self.class {
            ObjectClass::Function(data) => data.downcast_ref(),
            _ => None,
        }
    }

    /// Whether the object is callable.
    pub fn is_callable(&self) -> bool {
        matches!(self.class, ObjectClass::Function(_))
    }
}

impl fmt::Debug for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsObject")
            .field("shape", &self.shape.id())
            .field("class", &self.class)
            .field("slots", &self.slots)
            .finish()
    }
}
