//! Indexed element storage for arrays
//!
//! Elements live in a dense vector of optional slots, where `None` is a
//! hole, backed by an ordered sparse map for indices too far past the dense
//! end. `length` is tracked separately, so `a.length = n` never allocates.
//!
//! Every sparse index is at or above the dense length; growing the dense
//! part pulls the covered sparse entries in.

use std::collections::BTreeMap;

use core_types::Value;

/// Array element storage with holes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Elements {
    dense: Vec<Option<Value>>,
    sparse: BTreeMap<u32, Value>,
    length: u32,
}

impl Elements {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// `length` holes and no elements, as created by `Array(length)`.
    pub fn with_length(length: u32) -> Self {
        Self {
            length,
            ..Self::default()
        }
    }

    /// The array `length`.
    pub fn len(&self) -> u32 {
        self.length
    }

    /// Whether `length` is zero.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Element at `index`; `None` for holes and out-of-bounds indices.
    pub fn get(&self, index: u32) -> Option<&Value> {
        match self.dense.get(index as usize) {
            Some(slot) => slot.as_ref(),
            None => self.sparse.get(&index),
        }
    }

    /// Mutable element at `index`; `None` for holes.
    pub fn get_mut(&mut self, index: u32) -> Option<&mut Value> {
        match self.dense.get_mut(index as usize) {
            Some(slot) => slot.as_mut(),
            None => self.sparse.get_mut(&index),
        }
    }

    /// Whether `index` holds an element (is neither a hole nor out of bounds).
    pub fn has(&self, index: u32) -> bool {
        self.get(index).is_some()
    }

    /// Store `value` at `index`, extending `length` as needed.
    ///
    /// The dense part grows to cover `index` when the write appends or when
    /// `index` is below `dense_limit`; otherwise the value goes to the sparse
    /// map. `index` is an array index, so it is below `u32::MAX`.
    pub fn set(&mut self, index: u32, value: Value, dense_limit: usize) {
        let position = index as usize;
        if position >= self.dense.len() && (position == self.dense.len() || position < dense_limit) {
            self.grow_dense(position + 1);
        }
        match self.dense.get_mut(position) {
            Some(slot) => *slot = Some(value),
            None => {
                self.sparse.insert(index, value);
            }
        }
        self.length = self.length.max(index + 1);
    }

    /// Append at `length`. Returns the new length, or `None` when the array
    /// is already at the maximum length.
    pub fn push(&mut self, value: Value, dense_limit: usize) -> Option<u32> {
        if self.length == u32::MAX {
            return None;
        }
        self.set(self.length, value, dense_limit);
        Some(self.length)
    }

    /// Turn `index` into a hole, returning the removed element.
    pub fn delete(&mut self, index: u32) -> Option<Value> {
        match self.dense.get_mut(index as usize) {
            Some(slot) => slot.take(),
            None => self.sparse.remove(&index),
        }
    }

    /// Set `length`, dropping every element at or past it.
    pub fn set_len(&mut self, length: u32) {
        if length < self.length {
            self.dense.truncate(length as usize);
            self.sparse.retain(|&index, _| index < length);
        }
        self.length = length;
    }

    /// Indices holding elements, ascending.
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.dense
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|_| index as u32))
            .chain(self.sparse.keys().copied())
    }

    /// Number of elements actually stored.
    pub fn count(&self) -> usize {
        self.dense.iter().filter(|slot| slot.is_some()).count() + self.sparse.len()
    }

    fn grow_dense(&mut self, dense_len: usize) {
        self.dense.resize(dense_len, None);
        if self.sparse.is_empty() {
            return;
        }
        let above = self.sparse.split_off(&(dense_len as u32));
        for (index, value) in std::mem::replace(&mut self.sparse, above) {
            self.dense[index as usize] = Some(value);
        }
    }
}

impl From<Vec<Value>> for Elements {
    fn from(values: Vec<Value>) -> Self {
        let length = values.len() as u32;
        Self {
            dense: values.into_iter().map(Some).collect(),
            sparse: BTreeMap::new(),
            length,
        }
    }
}
