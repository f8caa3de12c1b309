//! Normalized entity collections

use crate::types::Address;
use std::collections::HashMap;

/// Entities of one kind keyed by id, remembering first-insertion order.
#[derive(Debug, Clone)]
pub struct EntityArena<T> {
    ids: Vec<Address>,
    entities: HashMap<Address, T>,
}

impl<T> Default for EntityArena<T> {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            entities: HashMap::new(),
        }
    }
}

impl<T> EntityArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced entity keeps its position
    pub fn upsert(&mut self, id: Address, entity: T) {
        if self.entities.insert(id.clone(), entity).is_none() {
            self.ids.push(id);
        }
    }

    pub fn get(&self, id: &Address) -> Option<&T> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: &Address) -> Option<&mut T> {
        self.entities.get_mut(id)
    }

    pub fn contains(&self, id: &Address) -> bool {
        self.entities.contains_key(id)
    }

    pub fn ids(&self) -> &[Address] {
        &self.ids
    }

    /// Entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &T)> {
        self.ids
            .iter()
            .filter_map(move |id| self.entities.get(id).map(|entity| (id, entity)))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
