//! Shapes (hidden classes) for optimizing JavaScript object property access.
//!
//! A shape describes the layout of an object: which keys it has, in which
//! slot each value lives and with which attributes, plus the object's
//! prototype. Objects with the same properties added in the same order from
//! the same root share one `Shape`, so a cache can replace a key lookup by a
//! pointer comparison followed by a direct slot access.
//!
//! Shapes are immutable once published. The only mutable parts are the
//! validity [`Assumption`] and the transition cache, which lives behind a
//! `parking_lot::RwLock` so that several realms may share a
//! [`ShapeTable`](crate::ShapeTable) across threads.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use bitflags::bitflags;
use core_types::{ObjectId, PropertyKey};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

bitflags! {
    /// Property attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u8 {
        /// `[[Writable]]` for data properties.
        const WRITABLE = 1 << 0;
        /// `[[Enumerable]]`
        const ENUMERABLE = 1 << 1;
        /// `[[Configurable]]`
        const CONFIGURABLE = 1 << 2;
        /// The slot holds a getter/setter pair instead of a value.
        const ACCESSOR = 1 << 3;
    }
}

impl PropertyFlags {
    /// Attributes of a property created by ordinary assignment.
    pub const DEFAULT_DATA: PropertyFlags = PropertyFlags::WRITABLE
        .union(PropertyFlags::ENUMERABLE)
        .union(PropertyFlags::CONFIGURABLE);

    /// Whether a value may be written through `[[Set]]`.
    pub fn is_writable(self) -> bool {
        self.contains(PropertyFlags::WRITABLE) && !self.is_accessor()
    }

    /// Whether the slot holds an accessor pair.
    pub fn is_accessor(self) -> bool {
        self.contains(PropertyFlags::ACCESSOR)
    }
}

impl Default for PropertyFlags {
    fn default() -> Self {
        Self::DEFAULT_DATA
    }
}

/// One property of a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEntry {
    /// Property key
    pub key: PropertyKey,
    /// Index in the owning object's slot vector
    pub slot: u32,
    /// Attributes
    pub flags: PropertyFlags,
}

/// A validity flag that code may rely on until it is invalidated.
///
/// Invalidation is permanent: once broken, an assumption never becomes
/// valid again, and everything keyed on it must take the slow path.
pub struct Assumption {
    name: &'static str,
    valid: AtomicBool,
}

impl Assumption {
    /// Create a valid assumption.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            valid: AtomicBool::new(true),
        }
    }

    /// Whether the assumption still holds.
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Break the assumption.
    pub fn invalidate(&self) {
        if self.valid.swap(false, Ordering::AcqRel) {
            tracing::debug!(assumption = self.name, "assumption invalidated");
        }
    }

    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for Assumption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assumption")
            .field("name", &self.name)
            .field("valid", &self.is_valid())
            .finish()
    }
}

/// Key of a cached transition: the property added and its attributes.
pub(crate) type TransitionKey = (PropertyKey, PropertyFlags);

/// Immutable layout descriptor shared by objects of the same layout.
pub struct Shape {
    id: u64,
    parent: Option<Arc<Shape>>,
    prototype: Option<ObjectId>,
    entries: Vec<PropertyEntry>,
    index: FxHashMap<PropertyKey, usize>,
    validity: Assumption,
    /// Child shapes by (key, flags). Weak so unused branches can be freed.
    pub(crate) transitions: RwLock<FxHashMap<TransitionKey, Weak<Shape>>>,
}

impl Shape {
    pub(crate) fn new_root(id: u64, prototype: Option<ObjectId>) -> Self {
        Self {
            id,
            parent: None,
            prototype,
            entries: Vec::new(),
            index: FxHashMap::default(),
            validity: Assumption::new("shape"),
            transitions: RwLock::new(FxHashMap::default()),
        }
    }

    /// Build the child of `parent` that has `key` appended at the next slot.
    pub(crate) fn new_child(
        id: u64,
        parent: &Arc<Shape>,
        key: PropertyKey,
        flags: PropertyFlags,
    ) -> Self {
        let mut entries = parent.entries.clone();
        let mut index = parent.index.clone();
        let slot = entries.len() as u32;
        index.insert(key.clone(), entries.len());
        entries.push(PropertyEntry { key, slot, flags });
        Self {
            id,
            parent: Some(Arc::clone(parent)),
            prototype: parent.prototype,
            entries,
            index,
            validity: Assumption::new("shape"),
            transitions: RwLock::new(FxHashMap::default()),
        }
    }

    /// Unique id, for logs and debugging.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The shape this one was derived from, `None` for a root.
    pub fn parent(&self) -> Option<&Arc<Shape>> {
        self.parent.as_ref()
    }

    /// Prototype of every object with this shape.
    pub fn prototype(&self) -> Option<ObjectId> {
        self.prototype
    }

    /// Look up a property by key.
    pub fn lookup(&self, key: &PropertyKey) -> Option<&PropertyEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Properties in insertion order.
    pub fn entries(&self) -> &[PropertyEntry] {
        &self.entries
    }

    /// Number of properties (and slots) described by this shape.
    pub fn property_count(&self) -> usize {
        self.entries.len()
    }

    /// Whether the shape's validity assumption still holds.
    pub fn is_valid(&self) -> bool {
        self.validity.is_valid()
    }

    /// The shape's validity assumption.
    pub fn validity(&self) -> &Assumption {
        &self.validity
    }

    /// Shape guard: the object's stored shape is exactly `expected` and
    /// `expected` has not been invalidated.
    pub fn check(expected: &Arc<Shape>, actual: &Arc<Shape>) -> bool {
        Arc::ptr_eq(expected, actual) && expected.is_valid()
    }

    /// Number of cached transitions out of this shape.
    pub fn transition_count(&self) -> usize {
        self.transitions.read().len()
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("id", &self.id)
            .field("prototype", &self.prototype)
            .field("keys", &self.entries.iter().map(|e| &e.key).collect::<Vec<_>>())
            .field("valid", &self.is_valid())
            .finish()
    }
}
