//! Packed storage keyed by entity id.
//!
//! Values live in a dense `Vec` so stages iterate them contiguously. A hash map
//! translates ids to dense indices and removal swaps the last element into the
//! vacated slot.

use std::collections::HashMap;

use crate::ecs::EntityId;

/// Errors raised by [`PackedStore`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("entity {0} is already present in the store")]
    Duplicate(EntityId),
    #[error("entity {0} is not present in the store")]
    NotFound(EntityId),
}

/// Dense array of values with an id to index map.
#[derive(Debug, Clone)]
pub struct PackedStore<V> {
    index_of: HashMap<EntityId, usize>,
    ids: Vec<EntityId>,
    values: Vec<V>,
}

impl<V> PackedStore<V> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index_of: HashMap::with_capacity(capacity),
            ids: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Insert a value for `id`. Fails if `id` is already present.
    pub fn insert(&mut self, id: EntityId, value: V) -> Result<(), StoreError> {
        if self.index_of.contains_key(&id) {
            return Err(StoreError::Duplicate(id));
        }
        self.index_of.insert(id, self.values.len());
        self.ids.push(id);
        self.values.push(value);
        Ok(())
    }

    /// Remove and return the value for `id`. Fails if `id` is absent.
    pub fn erase(&mut self, id: EntityId) -> Result<V, StoreError> {
        let index = self.index_of.remove(&id).ok_or(StoreError::NotFound(id))?;

        let value = self.values.swap_remove(index);
        self.ids.swap_remove(index);

        // Re-point the element that moved into `index`
        if let Some(&moved) = self.ids.get(index) {
            self.index_of.insert(moved, index);
        }

        debug_assert_eq!(self.index_of.len(), self.ids.len());
        debug_assert_eq!(self.ids.len(), self.values.len());

        Ok(value)
    }

    pub fn get(&self, id: EntityId) -> Result<&V, StoreError> {
        let index = self.index_of.get(&id).ok_or(StoreError::NotFound(id))?;
        Ok(&self.values[*index])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Result<&mut V, StoreError> {
        let index = self.index_of.get(&id).ok_or(StoreError::NotFound(id))?;
        Ok(&mut self.values[*index])
    }

    #[inline]
    pub fn contains(&self, id: EntityId) -> bool {
        self.index_of.contains_key(&id)
    }

    /// Dense index of `id`, valid until the next erase.
    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.index_of.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.index_of.reserve(additional);
        self.ids.reserve(additional);
        self.values.reserve(additional);
    }

    pub fn clear(&mut self) {
        self.index_of.clear();
        self.ids.clear();
        self.values.clear();
    }

    /// Ids in dense order.
    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    /// Values in dense order.
    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [V] {
        &mut self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &V)> {
        self.ids.iter().copied().zip(self.values.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut V)> {
        self.ids.iter().copied().zip(self.values.iter_mut())
    }
}

impl<V> Default for PackedStore<V> {
    fn default() -> Self {
        Self::new()
    }
}
