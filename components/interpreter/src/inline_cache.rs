//! Inline cache chains for property get, set and `in`.
//!
//! Every cached access site owns one chain. A chain is an append-only arena
//! of entries linked through `next` indices and tried in insertion order;
//! the first entry whose guard matches the receiver answers the access.
//! When no entry matches, the interpreter runs the slow path and then asks
//! the chain to specialize for the receiver it just saw. Once the chain
//! holds `property_cache_limit` entries, the next specialization replaces
//! the whole chain with a single generic entry that never grows again.
//!
//! Guards come in two flavors:
//!
//! - shape guards: exact receiver shape plus the shapes of every prototype
//!   up to (and including) the holder of the property, or up to the end of
//!   the chain for absent properties
//! - class guards: primitive kind, proxy, foreign object, array `length`
//!
//! A guard that refers to an invalidated shape never matches.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use arrayvec::ArrayVec;
use core_types::{ObjectId, PropertyKey, Value};
use object_model::{Heap, JsObject, ObjectClass, PropertyFlags, Shape, ShapeTable, SlotValue};
use serde::Serialize;

/// Prototype shapes one entry can guard. Hits deeper in the prototype chain
/// are not specialized and keep taking the slow path.
pub const MAX_GUARDED_PROTOTYPES: usize = 4;

/// Prototype objects and their expected shapes, receiver side first.
pub(crate) type ChainGuard = ArrayVec<(ObjectId, Arc<Shape>), MAX_GUARDED_PROTOTYPES>;

/// Per-site counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    /// Accesses answered by a specialized entry
    pub hits: u64,
    /// Accesses that took the slow path, including generic ones
    pub misses: u64,
    /// Times the chain degenerated to the generic entry (0 or 1)
    pub megamorphic: u64,
}

/// Primitive receiver classes with a cached prototype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// String values
    String,
    /// Number values
    Number,
    /// Boolean values
    Boolean,
    /// Symbol values
    Symbol,
}

impl PrimitiveKind {
    /// Primitive kind of `value`, `None` for objects and nullish values.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) => Some(PrimitiveKind::String),
            Value::Smi(_) | Value::Double(_) => Some(PrimitiveKind::Number),
            Value::Boolean(_) => Some(PrimitiveKind::Boolean),
            Value::Symbol(_) => Some(PrimitiveKind::Symbol),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Chain storage
// ---------------------------------------------------------------------------

trait CacheEntry {
    fn generic() -> Self;
    fn is_generic(&self) -> bool;
    fn kind(&self) -> &'static str;
}

struct CacheNode<E> {
    entry: E,
    next: Option<u32>,
}

struct CacheChain<E> {
    nodes: Vec<CacheNode<E>>,
    head: Option<u32>,
    tail: Option<u32>,
    stats: CacheStats,
}

impl<E> Default for CacheChain<E> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            head: None,
            tail: None,
            stats: CacheStats::default(),
        }
    }
}

impl<E: CacheEntry> CacheChain<E> {
    fn iter(&self) -> ChainIter<'_, E> {
        ChainIter {
            chain: self,
            cursor: self.head,
        }
    }

    fn is_megamorphic(&self) -> bool {
        self.iter().any(|entry| entry.is_generic())
    }

    /// Probe every entry in order; the first `Some` wins.
    fn probe<A>(&mut self, mut probe: impl FnMut(&E) -> Option<A>, generic: A, miss: A) -> A {
        let found = self.iter().find_map(|entry| {
            if entry.is_generic() {
                Some(None)
            } else {
                probe(entry).map(Some)
            }
        });
        match found {
            Some(Some(action)) => {
                self.stats.hits += 1;
                action
            }
            Some(None) => {
                self.stats.misses += 1;
                generic
            }
            None => {
                self.stats.misses += 1;
                miss
            }
        }
    }

    fn insert(&mut self, entry: E, limit: usize) {
        if self.is_megamorphic() {
            return;
        }
        if self.nodes.len() >= limit {
            tracing::debug!(
                entries = self.nodes.len(),
                kind = entry.kind(),
                "inline cache chain went megamorphic"
            );
            self.nodes.clear();
            self.nodes.push(CacheNode {
                entry: E::generic(),
                next: None,
            });
            self.head = Some(0);
            self.tail = Some(0);
            self.stats.megamorphic += 1;
            return;
        }
        tracing::trace!(kind = entry.kind(), position = self.nodes.len(), "inline cache specialized");
        let index = self.nodes.len() as u32;
        self.nodes.push(CacheNode { entry, next: None });
        match self.tail {
            Some(tail) => self.nodes[tail as usize].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
    }
}

struct ChainIter<'a, E> {
    chain: &'a CacheChain<E>,
    cursor: Option<u32>,
}

impl<'a, E> Iterator for ChainIter<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<&'a E> {
        let node = self.chain.nodes.get(self.cursor? as usize)?;
        self.cursor = node.next;
        Some(&node.entry)
    }
}

macro_rules! cache_site {
    ($(#[$doc:meta])* $name:ident, $entry:ty) => {
        $(#[$doc])*
        #[derive(Default)]
        pub struct $name(RefCell<CacheChain<$entry>>);

        impl $name {
            /// Counters for this site.
            pub fn stats(&self) -> CacheStats {
                self.0.borrow().stats
            }

            /// Number of entries in the chain.
            pub fn len(&self) -> usize {
                self.0.borrow().nodes.len()
            }

            /// Whether the site has never been specialized.
            pub fn is_empty(&self) -> bool {
                self.0.borrow().nodes.is_empty()
            }

            /// Whether the chain was replaced by the generic entry.
            pub fn is_megamorphic(&self) -> bool {
                self.0.borrow().is_megamorphic()
            }

            /// Entry kinds in chain order.
            pub fn kinds(&self) -> Vec<&'static str> {
                self.0.borrow().iter().map(|entry| entry.kind()).collect()
            }

            pub(crate) fn insert(&self, entry: $entry, limit: usize) {
                self.0.borrow_mut().insert(entry, limit);
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("kinds", &self.kinds())
                    .field("stats", &self.stats())
                    .finish()
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

fn receiver_object<'h>(heap: &'h Heap, receiver: &Value) -> Option<&'h JsObject> {
    heap.get(receiver.as_object()?)
}

fn guard_holds(heap: &Heap, guard: &ChainGuard) -> bool {
    guard.iter().all(|(id, shape)| {
        heap.get(*id)
            .map_or(false, |holder| Shape::check(shape, holder.shape()))
    })
}

/// Receiver shape and prototype guards both hold.
fn shape_guard<'h>(
    heap: &'h Heap,
    receiver: &Value,
    shape: &Arc<Shape>,
    guard: &ChainGuard,
) -> Option<&'h JsObject> {
    let object = receiver_object(heap, receiver)?;
    (Shape::check(shape, object.shape()) && guard_holds(heap, guard)).then_some(object)
}

/// The object holding the property: the last guarded prototype, or the
/// receiver itself for own properties.
fn holder<'h>(heap: &'h Heap, receiver: &'h JsObject, guard: &ChainGuard) -> Option<&'h JsObject> {
    match guard.last() {
        Some((id, _)) => heap.get(*id),
        None => Some(receiver),
    }
}

fn class_guard(heap: &Heap, receiver: &Value, class: fn(&ObjectClass) -> bool) -> Option<ObjectId> {
    let id = receiver.as_object()?;
    class(heap.get(id)?.class()).then_some(id)
}

/// Where a property was found while walking a prototype chain.
enum Found {
    Data { slot: u32, writable: bool },
    Accessor { slot: u32 },
    Absent,
}

impl Found {
    fn of(shape: &Shape, key: &PropertyKey) -> Option<Found> {
        shape.lookup(key).map(|entry| {
            if entry.flags.is_accessor() {
                Found::Accessor { slot: entry.slot }
            } else {
                Found::Data {
                    slot: entry.slot,
                    writable: entry.flags.contains(PropertyFlags::WRITABLE),
                }
            }
        })
    }
}

/// Walk the prototype chain from `start`, guarding each visited object.
/// `None` when the chain is too deep or contains exotic objects.
fn walk_prototypes(
    heap: &Heap,
    start: Option<ObjectId>,
    key: &PropertyKey,
) -> Option<(ChainGuard, Found)> {
    let mut guard = ChainGuard::new();
    let mut current = start;
    while let Some(id) = current {
        let object = heap.get(id)?;
        if matches!(
            object.class(),
            ObjectClass::Proxy(_) | ObjectClass::Foreign(_) | ObjectClass::Array(_)
        ) || !object.shape().is_valid()
        {
            return None;
        }
        guard.try_push((id, Arc::clone(object.shape()))).ok()?;
        if let Some(found) = Found::of(object.shape(), key) {
            return Some((guard, found));
        }
        current = object.prototype();
    }
    Some((guard, Found::Absent))
}

/// Keys answered by exotic storage on arrays and strings. Shape-based
/// entries for them are only created for own properties, so a shape shared
/// with an array never caches a wrong answer.
fn is_exotic_key(key: &PropertyKey) -> bool {
    key.array_index().is_some() || key.as_str() == Some("length")
}

/// Common classification of an object receiver.
enum ObjectKind<'h> {
    Proxy,
    Foreign,
    Array,
    Shaped(&'h JsObject),
}

fn classify<'h>(heap: &'h Heap, receiver: &Value) -> Option<ObjectKind<'h>> {
    let object = receiver_object(heap, receiver)?;
    Some(match object.class() {
        ObjectClass::Proxy(_) => ObjectKind::Proxy,
        ObjectClass::Foreign(_) => ObjectKind::Foreign,
        ObjectClass::Array(_) => ObjectKind::Array,
        _ => ObjectKind::Shaped(object),
    })
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// Specialized property read.
pub(crate) enum GetEntry {
    /// Own data property at `slot`
    OwnData { shape: Arc<Shape>, slot: u32 },
    /// Data property on the last guarded prototype
    ProtoData {
        shape: Arc<Shape>,
        guard: ChainGuard,
        slot: u32,
    },
    /// Accessor on the receiver (empty guard) or on the last guarded prototype
    Getter {
        shape: Arc<Shape>,
        guard: ChainGuard,
        slot: u32,
    },
    /// Property missing from the receiver and its whole prototype chain
    Absent { shape: Arc<Shape>, guard: ChainGuard },
    /// `length` of an array
    ArrayLength,
    /// `length` of a string
    StringLength,
    /// Property of a primitive's prototype; `slot` is `None` when absent
    Primitive {
        kind: PrimitiveKind,
        guard: ChainGuard,
        slot: Option<u32>,
    },
    /// Proxy receiver: run the `get` trap
    Proxy,
    /// Host object receiver
    Foreign,
    /// Megamorphic: always the slow path
    Generic,
}

impl CacheEntry for GetEntry {
    fn generic() -> Self {
        GetEntry::Generic
    }

    fn is_generic(&self) -> bool {
        matches!(self, GetEntry::Generic)
    }

    fn kind(&self) -> &'static str {
        match self {
            GetEntry::OwnData { .. } => "OwnData",
            GetEntry::ProtoData { .. } => "ProtoData",
            GetEntry::Getter { .. } => "Getter",
            GetEntry::Absent { .. } => "Absent",
            GetEntry::ArrayLength => "ArrayLength",
            GetEntry::StringLength => "StringLength",
            GetEntry::Primitive { .. } => "Primitive",
            GetEntry::Proxy => "Proxy",
            GetEntry::Foreign => "Foreign",
            GetEntry::Generic => "Generic",
        }
    }
}

/// What a get site should do next.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GetAction {
    /// Cached answer
    Value(Value),
    /// Call this getter with the receiver as `this`
    CallGetter(ObjectId),
    /// Run the proxy's `get` trap
    Proxy(ObjectId),
    /// Ask the host object
    Foreign(ObjectId),
    /// Megamorphic site: slow path, no specialization
    Generic,
    /// No entry matched: slow path, then specialize
    Miss,
}

fn read_accessor(slot: &SlotValue) -> GetAction {
    match slot {
        SlotValue::Accessor {
            getter: Some(getter),
            ..
        } => GetAction::CallGetter(*getter),
        SlotValue::Accessor { getter: None, .. } => GetAction::Value(Value::Undefined),
        SlotValue::Data(value) => GetAction::Value(value.clone()),
    }
}

impl GetEntry {
    fn probe(&self, heap: &Heap, receiver: &Value) -> Option<GetAction> {
        match self {
            GetEntry::OwnData { shape, slot } => {
                let object = shape_guard(heap, receiver, shape, &ChainGuard::new())?;
                object.slot(*slot).as_data().cloned().map(GetAction::Value)
            }
            GetEntry::ProtoData { shape, guard, slot } => {
                let object = shape_guard(heap, receiver, shape, guard)?;
                let holder = holder(heap, object, guard)?;
                holder.slot(*slot).as_data().cloned().map(GetAction::Value)
            }
            GetEntry::Getter { shape, guard, slot } => {
                let object = shape_guard(heap, receiver, shape, guard)?;
                Some(read_accessor(holder(heap, object, guard)?.slot(*slot)))
            }
            GetEntry::Absent { shape, guard } => {
                shape_guard(heap, receiver, shape, guard)?;
                Some(GetAction::Value(Value::Undefined))
            }
            GetEntry::ArrayLength => {
                let object = receiver_object(heap, receiver)?;
                object
                    .elements()
                    .map(|elements| GetAction::Value(Value::number(f64::from(elements.len()))))
            }
            GetEntry::StringLength => match receiver {
                Value::String(s) => Some(GetAction::Value(Value::Smi(
                    s.encode_utf16().count() as i32,
                ))),
                _ => None,
            },
            GetEntry::Primitive { kind, guard, slot } => {
                if PrimitiveKind::of(receiver) != Some(*kind) || !guard_holds(heap, guard) {
                    return None;
                }
                match slot {
                    Some(slot) => {
                        let (holder, _) = guard.last()?;
                        Some(read_accessor(heap.get(*holder)?.slot(*slot)))
                    }
                    None => Some(GetAction::Value(Value::Undefined)),
                }
            }
            GetEntry::Proxy => {
                class_guard(heap, receiver, |c| matches!(c, ObjectClass::Proxy(_))).map(GetAction::Proxy)
            }
            GetEntry::Foreign => {
                class_guard(heap, receiver, |c| matches!(c, ObjectClass::Foreign(_)))
                    .map(GetAction::Foreign)
            }
            GetEntry::Generic => None,
        }
    }

    /// Entry answering `receiver[key]` for the current heap state, `None`
    /// when the access cannot be cached. `primitive_proto` is the intrinsic
    /// prototype for primitive receivers.
    pub(crate) fn specialize(
        heap: &Heap,
        receiver: &Value,
        key: &PropertyKey,
        primitive_proto: Option<ObjectId>,
    ) -> Option<GetEntry> {
        let is_length = key.as_str() == Some("length");
        if let Some(kind) = PrimitiveKind::of(receiver) {
            if kind == PrimitiveKind::String && is_length {
                return Some(GetEntry::StringLength);
            }
            if is_exotic_key(key) {
                return None;
            }
            return match walk_prototypes(heap, primitive_proto, key)? {
                (guard, Found::Data { slot, .. }) => Some(GetEntry::Primitive {
                    kind,
                    guard,
                    slot: Some(slot),
                }),
                (guard, Found::Absent) => Some(GetEntry::Primitive {
                    kind,
                    guard,
                    slot: None,
                }),
                (_, Found::Accessor { .. }) => None,
            };
        }
        let object = match classify(heap, receiver)? {
            ObjectKind::Proxy => return Some(GetEntry::Proxy),
            ObjectKind::Foreign => return Some(GetEntry::Foreign),
            ObjectKind::Array if is_length => return Some(GetEntry::ArrayLength),
            ObjectKind::Array if key.array_index().is_some() => return None,
            ObjectKind::Array => receiver_object(heap, receiver)?,
            ObjectKind::Shaped(object) => object,
        };
        let shape = Arc::clone(object.shape());
        if !shape.is_valid() {
            return None;
        }
        match Found::of(&shape, key) {
            Some(Found::Data { slot, .. }) => return Some(GetEntry::OwnData { shape, slot }),
            Some(Found::Accessor { slot }) => {
                return Some(GetEntry::Getter {
                    shape,
                    guard: ChainGuard::new(),
                    slot,
                })
            }
            _ => {}
        }
        if is_exotic_key(key) {
            return None;
        }
        Some(match walk_prototypes(heap, object.prototype(), key)? {
            (guard, Found::Data { slot, .. }) => GetEntry::ProtoData { shape, guard, slot },
            (guard, Found::Accessor { slot }) => GetEntry::Getter { shape, guard, slot },
            (guard, Found::Absent) => GetEntry::Absent { shape, guard },
        })
    }
}

cache_site!(
    /// Inline cache of a named property read (`o.p`).
    GetCache,
    GetEntry
);

impl GetCache {
    pub(crate) fn probe(&self, heap: &Heap, receiver: &Value) -> GetAction {
        self.0.borrow_mut().probe(
            |entry| entry.probe(heap, receiver),
            GetAction::Generic,
            GetAction::Miss,
        )
    }
}

// ---------------------------------------------------------------------------
// Set
// ---------------------------------------------------------------------------

/// Specialized property write.
pub(crate) enum SetEntry {
    /// Overwrite an own writable data property
    ReplaceData { shape: Arc<Shape>, slot: u32 },
    /// Add a new data property: check the old shape, write, transition
    AddData {
        old: Arc<Shape>,
        new: Arc<Shape>,
        guard: ChainGuard,
    },
    /// Accessor on the receiver or a guarded prototype
    Setter {
        shape: Arc<Shape>,
        guard: ChainGuard,
        slot: u32,
    },
    /// Non-writable data property on the receiver or a guarded prototype
    ReadOnly { shape: Arc<Shape>, guard: ChainGuard },
    /// `length` of an array
    ArrayLength,
    /// Proxy receiver: run the `set` trap
    Proxy,
    /// Host object receiver
    Foreign,
    /// Megamorphic: always the slow path
    Generic,
}

impl CacheEntry for SetEntry {
    fn generic() -> Self {
        SetEntry::Generic
    }

    fn is_generic(&self) -> bool {
        matches!(self, SetEntry::Generic)
    }

    fn kind(&self) -> &'static str {
        match self {
            SetEntry::ReplaceData { .. } => "ReplaceData",
            SetEntry::AddData { .. } => "AddData",
            SetEntry::Setter { .. } => "Setter",
            SetEntry::ReadOnly { .. } => "ReadOnly",
            SetEntry::ArrayLength => "ArrayLength",
            SetEntry::Proxy => "Proxy",
            SetEntry::Foreign => "Foreign",
            SetEntry::Generic => "Generic",
        }
    }
}

/// What a set site should do next.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SetAction {
    /// The cached entry performed the write
    Done,
    /// Call this setter with the receiver as `this`
    CallSetter(ObjectId),
    /// The write fails (silently, or TypeError in strict code)
    ReadOnly,
    /// Array `length` write on this array
    ArrayLength(ObjectId),
    /// Run the proxy's `set` trap
    Proxy(ObjectId),
    /// Ask the host object
    Foreign(ObjectId),
    /// Megamorphic site: slow path, no specialization
    Generic,
    /// No entry matched: specialize, then slow path
    Miss,
}

impl SetEntry {
    fn probe(&self, heap: &mut Heap, receiver: &Value, value: &Value) -> Option<SetAction> {
        match self {
            SetEntry::ReplaceData { shape, slot } => {
                let object = heap.get_mut(receiver.as_object()?)?;
                if !Shape::check(shape, object.shape()) {
                    return None;
                }
                object.set_slot(*slot, SlotValue::Data(value.clone()));
                Some(SetAction::Done)
            }
            SetEntry::AddData { old, new, guard } => {
                if !guard_holds(heap, guard) || !new.is_valid() {
                    return None;
                }
                let object = heap.get_mut(receiver.as_object()?)?;
                if !Shape::check(old, object.shape()) {
                    return None;
                }
                if !object.is_extensible() {
                    return Some(SetAction::ReadOnly);
                }
                object.apply_transition(Arc::clone(new), SlotValue::Data(value.clone()));
                Some(SetAction::Done)
            }
            SetEntry::Setter { shape, guard, slot } => {
                let object = shape_guard(heap, receiver, shape, guard)?;
                match holder(heap, object, guard)?.slot(*slot) {
                    SlotValue::Accessor {
                        setter: Some(setter),
                        ..
                    } => Some(SetAction::CallSetter(*setter)),
                    SlotValue::Accessor { setter: None, .. } => Some(SetAction::ReadOnly),
                    SlotValue::Data(_) => None,
                }
            }
            SetEntry::ReadOnly { shape, guard } => {
                shape_guard(heap, receiver, shape, guard)?;
                Some(SetAction::ReadOnly)
            }
            SetEntry::ArrayLength => {
                let id = receiver.as_object()?;
                heap.get(id)?.elements().map(|_| SetAction::ArrayLength(id))
            }
            SetEntry::Proxy => {
                class_guard(heap, receiver, |c| matches!(c, ObjectClass::Proxy(_))).map(SetAction::Proxy)
            }
            SetEntry::Foreign => {
                class_guard(heap, receiver, |c| matches!(c, ObjectClass::Foreign(_)))
                    .map(SetAction::Foreign)
            }
            SetEntry::Generic => None,
        }
    }

    /// Entry for `receiver[key] = v`, computed before the write so that an
    /// added property is recorded as a transition from the old shape.
    pub(crate) fn specialize(
        heap: &Heap,
        table: &ShapeTable,
        receiver: &Value,
        key: &PropertyKey,
    ) -> Option<SetEntry> {
        let object = match classify(heap, receiver)? {
            ObjectKind::Proxy => return Some(SetEntry::Proxy),
            ObjectKind::Foreign => return Some(SetEntry::Foreign),
            ObjectKind::Array if key.as_str() == Some("length") => {
                return Some(SetEntry::ArrayLength)
            }
            ObjectKind::Array if key.array_index().is_some() => return None,
            ObjectKind::Array => receiver_object(heap, receiver)?,
            ObjectKind::Shaped(object) => object,
        };
        let shape = Arc::clone(object.shape());
        if !shape.is_valid() {
            return None;
        }
        match Found::of(&shape, key) {
            Some(Found::Data { slot, writable: true }) => {
                return Some(SetEntry::ReplaceData { shape, slot })
            }
            Some(Found::Data { writable: false, .. }) => {
                return Some(SetEntry::ReadOnly {
                    shape,
                    guard: ChainGuard::new(),
                })
            }
            Some(Found::Accessor { slot }) => {
                return Some(SetEntry::Setter {
                    shape,
                    guard: ChainGuard::new(),
                    slot,
                })
            }
            _ => {}
        }
        if is_exotic_key(key) {
            return None;
        }
        Some(match walk_prototypes(heap, object.prototype(), key)? {
            (guard, Found::Data { writable: false, .. }) => SetEntry::ReadOnly { shape, guard },
            (guard, Found::Accessor { slot }) => SetEntry::Setter { shape, guard, slot },
            (guard, _) => {
                let new = table.transition(&shape, key.clone(), PropertyFlags::DEFAULT_DATA);
                SetEntry::AddData {
                    old: shape,
                    new,
                    guard,
                }
            }
        })
    }
}

cache_site!(
    /// Inline cache of a named property write (`o.p = v`).
    SetCache,
    SetEntry
);

impl SetCache {
    /// Probe the chain; matching data entries perform the write directly.
    pub(crate) fn probe(&self, heap: &mut Heap, receiver: &Value, value: &Value) -> SetAction {
        self.0.borrow_mut().probe(
            |entry| entry.probe(heap, receiver, value),
            SetAction::Generic,
            SetAction::Miss,
        )
    }
}

// ---------------------------------------------------------------------------
// Has
// ---------------------------------------------------------------------------

/// Specialized `key in object`.
pub(crate) enum HasEntry {
    /// Found on the receiver or a guarded prototype
    Present { shape: Arc<Shape>, guard: ChainGuard },
    /// Missing from the whole chain
    Absent { shape: Arc<Shape>, guard: ChainGuard },
    /// Proxy receiver: run the `has` trap
    Proxy,
    /// Host object receiver
    Foreign,
    /// Megamorphic: always the slow path
    Generic,
}

impl CacheEntry for HasEntry {
    fn generic() -> Self {
        HasEntry::Generic
    }

    fn is_generic(&self) -> bool {
        matches!(self, HasEntry::Generic)
    }

    fn kind(&self) -> &'static str {
        match self {
            HasEntry::Present { .. } => "Present",
            HasEntry::Absent { .. } => "Absent",
            HasEntry::Proxy => "Proxy",
            HasEntry::Foreign => "Foreign",
            HasEntry::Generic => "Generic",
        }
    }
}

/// What an `in` site should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HasAction {
    /// Cached answer
    Answer(bool),
    /// Run the proxy's `has` trap
    Proxy(ObjectId),
    /// Ask the host object
    Foreign(ObjectId),
    /// Megamorphic site
    Generic,
    /// No entry matched
    Miss,
}

impl HasEntry {
    fn probe(&self, heap: &Heap, receiver: &Value) -> Option<HasAction> {
        match self {
            HasEntry::Present { shape, guard } => {
                shape_guard(heap, receiver, shape, guard).map(|_| HasAction::Answer(true))
            }
            HasEntry::Absent { shape, guard } => {
                shape_guard(heap, receiver, shape, guard).map(|_| HasAction::Answer(false))
            }
            HasEntry::Proxy => {
                class_guard(heap, receiver, |c| matches!(c, ObjectClass::Proxy(_))).map(HasAction::Proxy)
            }
            HasEntry::Foreign => {
                class_guard(heap, receiver, |c| matches!(c, ObjectClass::Foreign(_)))
                    .map(HasAction::Foreign)
            }
            HasEntry::Generic => None,
        }
    }

    pub(crate) fn specialize(heap: &Heap, receiver: &Value, key: &PropertyKey) -> Option<HasEntry> {
        let object = match classify(heap, receiver)? {
            ObjectKind::Proxy => return Some(HasEntry::Proxy),
            ObjectKind::Foreign => return Some(HasEntry::Foreign),
            ObjectKind::Array => return None,
            ObjectKind::Shaped(object) => object,
        };
        let shape = Arc::clone(object.shape());
        if !shape.is_valid() {
            return None;
        }
        if shape.lookup(key).is_some() {
            return Some(HasEntry::Present {
                shape,
                guard: ChainGuard::new(),
            });
        }
        if is_exotic_key(key) {
            return None;
        }
        Some(match walk_prototypes(heap, object.prototype(), key)? {
            (guard, Found::Absent) => HasEntry::Absent { shape, guard },
            (guard, _) => HasEntry::Present { shape, guard },
        })
    }
}

cache_site!(
    /// Inline cache of `constant in o`.
    HasCache,
    HasEntry
);

impl HasCache {
    pub(crate) fn probe(&self, heap: &Heap, receiver: &Value) -> HasAction {
        self.0.borrow_mut().probe(
            |entry| entry.probe(heap, receiver),
            HasAction::Generic,
            HasAction::Miss,
        )
    }
}
