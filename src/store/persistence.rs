//! Durable replica backed by sled

use crate::error::StorageError;
use crate::store::{PointerKey, ReplicatedStore};
use crate::types::Address;
use async_trait::async_trait;
use std::path::Path;

const ENTRIES_TREE: &str = "entries";
const POINTERS_TREE: &str = "pointers";
const LINKS_TREE: &str = "links";

/// Sled-based implementation of ReplicatedStore
///
/// Layout:
/// - `entries`: address -> bytes
/// - `pointers`: "{kind}:{owner}" -> target address
/// - `links`: source || 0x00 || tag || 0x00 || seq(u64 BE) -> target address
pub struct SledReplica {
    db: sled::Db,
    entries: sled::Tree,
    pointers: sled::Tree,
    links: sled::Tree,
}

impl SledReplica {
    /// Open (or create) a replica at the given directory
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to open sled database: {}", e),
            ))
        })?;
        Self::from_db(db)
    }

    /// Build a replica over an already opened database
    pub fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        let entries = db.open_tree(ENTRIES_TREE)?;
        let pointers = db.open_tree(POINTERS_TREE)?;
        let links = db.open_tree(LINKS_TREE)?;
        Ok(Self {
            db,
            entries,
            pointers,
            links,
        })
    }

    /// Get the underlying sled database (for advanced operations)
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn link_prefix(source: &Address, tag: &str) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(source.as_str().len() + tag.len() + 2);
        prefix.extend_from_slice(source.as_str().as_bytes());
        prefix.push(0);
        prefix.extend_from_slice(tag.as_bytes());
        prefix.push(0);
        prefix
    }

    fn find_link(&self, prefix: &[u8], target: &Address) -> Result<Option<sled::IVec>, StorageError> {
        for item in self.links.scan_prefix(prefix) {
            let (key, value) = item?;
            if value.as_ref() == target.as_str().as_bytes() {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }
}

fn decode_address(bytes: &[u8]) -> Result<Address, StorageError> {
    String::from_utf8(bytes.to_vec())
        .map(Address::from)
        .map_err(|e| StorageError::Codec(format!("Stored address is not UTF-8: {}", e)))
}

#[async_trait]
impl ReplicatedStore for SledReplica {
    async fn put_entry(&self, address: &Address, bytes: Vec<u8>) -> Result<(), StorageError> {
        let key = address.as_str().as_bytes();
        if self.entries.contains_key(key)? {
            return Ok(());
        }
        self.entries.insert(key, bytes)?;
        Ok(())
    }

    async fn get_entry(&self, address: &Address) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self
            .entries
            .get(address.as_str().as_bytes())?
            .map(|value| value.to_vec()))
    }

    async fn set_pointer(&self, key: &PointerKey, target: &Address) -> Result<(), StorageError> {
        self.pointers
            .insert(key.storage_key().as_bytes(), target.as_str().as_bytes())?;
        Ok(())
    }

    async fn get_pointer(&self, key: &PointerKey) -> Result<Option<Address>, StorageError> {
        match self.pointers.get(key.storage_key().as_bytes())? {
            Some(value) => Ok(Some(decode_address(&value)?)),
            None => Ok(None),
        }
    }

    async fn add_link(
        &self,
        source: &Address,
        tag: &str,
        target: &Address,
    ) -> Result<(), StorageError> {
        let prefix = Self::link_prefix(source, tag);
        if self.find_link(&prefix, target)?.is_some() {
            return Ok(());
        }

        let seq = self.db.generate_id()?;
        let mut key = prefix;
        key.extend_from_slice(&seq.to_be_bytes());
        self.links.insert(key, target.as_str().as_bytes())?;
        Ok(())
    }

    async fn remove_link(
        &self,
        source: &Address,
        tag: &str,
        target: &Address,
    ) -> Result<(), StorageError> {
        let prefix = Self::link_prefix(source, tag);
        if let Some(key) = self.find_link(&prefix, target)? {
            self.links.remove(key)?;
        }
        Ok(())
    }

    async fn get_links(&self, source: &Address, tag: &str) -> Result<Vec<Address>, StorageError> {
        let prefix = Self::link_prefix(source, tag);
        let mut targets = Vec::new();
        for item in self.links.scan_prefix(&prefix) {
            let (_, value) = item?;
            targets.push(decode_address(&value)?);
        }
        Ok(targets)
    }
}
