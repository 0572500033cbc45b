//! Realm-owned shape transition table.
//!
//! Every shape operation goes through a [`ShapeTable`] that the caller
//! passes explicitly; there is no process-global shape state. The table
//! owns the root shape of each prototype and hands out child shapes through
//! the per-shape transition caches.
//!
//! Concurrency: lookups take read locks only. Creating a transition takes
//! the parent's write lock and re-checks before inserting, so two realms
//! sharing a table through `Arc` never publish two different children for
//! the same `(key, flags)`.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use core_types::{ObjectId, PropertyKey};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::shape::{PropertyEntry, PropertyFlags, Shape};

/// Transition graph and root shapes for one realm (or a group of realms).
#[derive(Debug, Default)]
pub struct ShapeTable {
    roots: RwLock<FxHashMap<Option<ObjectId>, Arc<Shape>>>,
    next_id: AtomicU64,
    created: AtomicUsize,
}

impl ShapeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&self) -> u64 {
        self.created.fetch_add(1, Ordering::Relaxed);
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of shapes created through this table.
    pub fn shapes_created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    /// The empty shape for objects whose prototype is `prototype`.
    pub fn root(&self, prototype: Option<ObjectId>) -> Arc<Shape> {
        if let Some(root) = self.roots.read().get(&prototype) {
            if root.is_valid() {
                return Arc::clone(root);
            }
        }
        let mut roots = self.roots.write();
        if let Some(root) = roots.get(&prototype) {
            if root.is_valid() {
                return Arc::clone(root);
            }
        }
        let root = Arc::new(Shape::new_root(self.fresh_id(), prototype));
        roots.insert(prototype, Arc::clone(&root));
        root
    }

    /// Shape with `key` appended at a fresh slot.
    ///
    /// Reuses the cached child when the same `(key, flags)` transition was
    /// taken from `shape` before, so independently built objects converge
    /// on the same shape.
    pub fn transition(
        &self,
        shape: &Arc<Shape>,
        key: PropertyKey,
        flags: PropertyFlags,
    ) -> Arc<Shape> {
        debug_assert!(shape.lookup(&key).is_none(), "duplicate key {:?}", key);
        let transition_key = (key, flags);
        if let Some(child) = shape
            .transitions
            .read()
            .get(&transition_key)
            .and_then(|weak| weak.upgrade())
        {
            if child.is_valid() {
                return child;
            }
        }

        let mut transitions = shape.transitions.write();
        if let Some(child) = transitions
            .get(&transition_key)
            .and_then(|weak| weak.upgrade())
        {
            if child.is_valid() {
                return child;
            }
        }
        let child = Arc::new(Shape::new_child(
            self.fresh_id(),
            shape,
            transition_key.0.clone(),
            transition_key.1,
        ));
        tracing::trace!(
            from = shape.id(),
            to = child.id(),
            key = %transition_key.0,
            "shape transition created"
        );
        transitions.insert(transition_key, Arc::downgrade(&child));
        child
    }

    /// Replay `entries` on top of the root shape for `prototype`.
    fn replay<'a>(
        &self,
        prototype: Option<ObjectId>,
        entries: impl IntoIterator<Item = (&'a PropertyKey, PropertyFlags)>,
    ) -> Arc<Shape> {
        let mut shape = self.root(prototype);
        for (key, flags) in entries {
            shape = self.transition(&shape, key.clone(), flags);
        }
        shape
    }

    /// Shape without `key`.
    ///
    /// Removal does not fit the append-only transition graph, so the
    /// remaining properties are replayed from the root. Slots after the
    /// removed one shift down by one; callers rebuild their slot vector
    /// with [`ShapeTable::slot_mapping`].
    pub fn remove(&self, shape: &Arc<Shape>, key: &PropertyKey) -> Arc<Shape> {
        self.replay(
            shape.prototype(),
            shape
                .entries()
                .iter()
                .filter(|e| &e.key != key)
                .map(|e| (&e.key, e.flags)),
        )
    }

    /// Shape with the attributes of `key` replaced. Slot indices are kept.
    pub fn change_flags(
        &self,
        shape: &Arc<Shape>,
        key: &PropertyKey,
        flags: PropertyFlags,
    ) -> Arc<Shape> {
        self.replay(
            shape.prototype(),
            shape.entries().iter().map(|e| {
                if &e.key == key {
                    (&e.key, flags)
                } else {
                    (&e.key, e.flags)
                }
            }),
        )
    }

    /// Same layout on top of a different prototype. Slot indices are kept.
    pub fn with_prototype(&self, shape: &Arc<Shape>, prototype: Option<ObjectId>) -> Arc<Shape> {
        self.replay(prototype, shape.entries().iter().map(|e| (&e.key, e.flags)))
    }

    /// A valid shape with the same layout as an invalidated one.
    pub fn refresh(&self, shape: &Arc<Shape>) -> Arc<Shape> {
        self.with_prototype(shape, shape.prototype())
    }

    /// For each slot of `to`, the slot of the same key in `from`.
    pub fn slot_mapping(from: &Shape, to: &Shape) -> Vec<Option<u32>> {
        to.entries()
            .iter()
            .map(|entry: &PropertyEntry| from.lookup(&entry.key).map(|old| old.slot))
            .collect()
    }

    /// Invalidate `shape` and every shape derived from it.
    ///
    /// Invalidated shapes are unlinked from the transition graph, so later
    /// replays build fresh, valid shapes instead of reaching them again.
    pub fn invalidate(&self, shape: &Arc<Shape>) {
        tracing::debug!(shape = shape.id(), "invalidating shape and descendants");
        let mut pending = vec![Arc::clone(shape)];
        while let Some(current) = pending.pop() {
            current.validity().invalidate();
            let children: Vec<Arc<Shape>> = current
                .transitions
                .read()
                .values()
                .filter_map(|weak| weak.upgrade())
                .collect();
            pending.extend(children);
        }
        match shape.parent() {
            Some(parent) => {
                parent
                    .transitions
                    .write()
                    .retain(|_, weak| weak.upgrade().map_or(false, |s| s.is_valid()));
            }
            None => {
                self.roots.write().retain(|_, root| root.is_valid());
            }
        }
    }
}
