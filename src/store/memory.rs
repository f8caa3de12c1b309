//! In-process replica. Every write is visible to the next read.

use crate::error::StorageError;
use crate::store::{PointerKey, ReplicatedStore};
use crate::types::Address;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
struct MemoryState {
    entries: HashMap<Address, Vec<u8>>,
    pointers: HashMap<PointerKey, Address>,
    links: HashMap<(Address, String), Vec<Address>>,
}

/// HashMap-backed replica
#[derive(Default)]
pub struct MemoryReplica {
    state: RwLock<MemoryState>,
}

impl MemoryReplica {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn entry_count(&self) -> usize {
        self.state.read().entries.len()
    }
}

#[async_trait]
impl ReplicatedStore for MemoryReplica {
    async fn put_entry(&self, address: &Address, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.state
            .write()
            .entries
            .entry(address.clone())
            .or_insert(bytes);
        Ok(())
    }

    async fn get_entry(&self, address: &Address) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.state.read().entries.get(address).cloned())
    }

    async fn set_pointer(&self, key: &PointerKey, target: &Address) -> Result<(), StorageError> {
        self.state.write().pointers.insert(key.clone(), target.clone());
        Ok(())
    }

    async fn get_pointer(&self, key: &PointerKey) -> Result<Option<Address>, StorageError> {
        Ok(self.state.read().pointers.get(key).cloned())
    }

    async fn add_link(
        &self,
        source: &Address,
        tag: &str,
        target: &Address,
    ) -> Result<(), StorageError> {
        let mut state = self.state.write();
        let targets = state
            .links
            .entry((source.clone(), tag.to_string()))
            .or_default();
        if !targets.contains(target) {
            targets.push(target.clone());
        }
        Ok(())
    }

    async fn remove_link(
        &self,
        source: &Address,
        tag: &str,
        target: &Address,
    ) -> Result<(), StorageError> {
        if let Some(targets) = self
            .state
            .write()
            .links
            .get_mut(&(source.clone(), tag.to_string()))
        {
            targets.retain(|t| t != target);
        }
        Ok(())
    }

    async fn get_links(&self, source: &Address, tag: &str) -> Result<Vec<Address>, StorageError> {
        Ok(self
            .state
            .read()
            .links
            .get(&(source.clone(), tag.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
