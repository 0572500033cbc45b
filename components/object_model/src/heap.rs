//! Realm-owned object arena.
//!
//! Objects are allocated into a vector and addressed by [`ObjectId`]. Ids are
//! never reused and objects live as long as the realm; there is no
//! collector, so an id handed out by a heap stays valid for that heap.

use std::ops::{Index, IndexMut};
use std::sync::Arc;

use core_types::ObjectId;

use crate::object::{JsObject, ObjectClass};
use crate::shape::Shape;

/// Object arena.
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<JsObject>,
}

impl Heap {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an object laid out by `shape`.
    ///
    /// The prototype recorded in `shape` is flagged as a prototype object.
    pub fn create_object_with_shape(&mut self, shape: Arc<Shape>, class: ObjectClass) -> ObjectId {
        if let Some(proto) = shape.prototype() {
            if let Some(holder) = self.objects.get_mut(proto.index()) {
                holder.mark_prototype();
            }
        }
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(JsObject::new(shape, class));
        id
    }

    /// Object by id, `None` for ids from another heap.
    pub fn get(&self, id: ObjectId) -> Option<&JsObject> {
        self.objects.get(id.index())
    }

    /// Mutable object by id.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut JsObject> {
        self.objects.get_mut(id.index())
    }

    /// Number of objects allocated.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether nothing has been allocated yet.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Mark `id` as a prototype holder.
    pub fn mark_prototype(&mut self, id: ObjectId) {
        if let Some(object) = self.objects.get_mut(id.index()) {
            object.mark_prototype();
        }
    }
}

impl Index<ObjectId> for Heap {
    type Output = JsObject;

    fn index(&self, id: ObjectId) -> &JsObject {
        &self.objects[id.index()]
    }
}

impl IndexMut<ObjectId> for Heap {
    fn index_mut(&mut self, id: ObjectId) -> &mut JsObject {
        &mut self.objects[id.index()]
    }
}
