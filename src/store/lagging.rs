//! Replica with controllable replication lag
//!
//! Wraps another replica and delays visibility of every write by a number of reads:
//! a new entry or link stays invisible, and an overwritten pointer keeps returning its
//! previous target, until that key has been read `lag` times. `flush()` makes every
//! pending write visible at once.

use crate::error::StorageError;
use crate::store::{PointerKey, ReplicatedStore};
use crate::types::Address;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

type LinkKey = (Address, String, Address);

struct StalePointer {
    previous: Option<Address>,
    remaining: u32,
}

#[derive(Default)]
struct PendingWrites {
    entries: HashMap<Address, u32>,
    pointers: HashMap<PointerKey, StalePointer>,
    added_links: HashMap<LinkKey, u32>,
    removed_links: HashMap<LinkKey, u32>,
}

impl PendingWrites {
    fn len(&self) -> usize {
        self.entries.len() + self.pointers.len() + self.added_links.len() + self.removed_links.len()
    }
}

/// Eventually-consistent wrapper around any replica
pub struct LaggingReplica<S> {
    inner: S,
    lag: Mutex<u32>,
    pending: Mutex<PendingWrites>,
}

impl<S: ReplicatedStore> LaggingReplica<S> {
    /// Every write is hidden from the next `lag` reads of its key
    pub fn new(inner: S, lag: u32) -> Self {
        Self {
            inner,
            lag: Mutex::new(lag),
            pending: Mutex::new(PendingWrites::default()),
        }
    }

    /// Change the lag applied to subsequent writes
    pub fn set_lag(&self, lag: u32) {
        *self.lag.lock() = lag;
    }

    /// Make every pending write visible
    pub fn flush(&self) {
        *self.pending.lock() = PendingWrites::default();
    }

    /// Number of writes not yet visible to readers
    pub fn pending_writes(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn lag(&self) -> u32 {
        *self.lag.lock()
    }
}

/// Consume one read of a pending write; `true` while the write is still hidden.
fn consume(remaining: &mut u32) -> bool {
    if *remaining == 0 {
        return false;
    }
    *remaining -= 1;
    true
}

#[async_trait]
impl<S: ReplicatedStore> ReplicatedStore for LaggingReplica<S> {
    async fn put_entry(&self, address: &Address, bytes: Vec<u8>) -> Result<(), StorageError> {
        let lag = self.lag();
        let already_visible = self.inner.get_entry(address).await?.is_some()
            && !self.pending.lock().entries.contains_key(address);
        self.inner.put_entry(address, bytes).await?;
        if lag > 0 && !already_visible {
            self.pending
                .lock()
                .entries
                .entry(address.clone())
                .or_insert(lag);
        }
        Ok(())
    }

    async fn get_entry(&self, address: &Address) -> Result<Option<Vec<u8>>, StorageError> {
        {
            let mut pending = self.pending.lock();
            if let Some(remaining) = pending.entries.get_mut(address) {
                if consume(remaining) {
                    return Ok(None);
                }
                pending.entries.remove(address);
            }
        }
        self.inner.get_entry(address).await
    }

    async fn set_pointer(&self, key: &PointerKey, target: &Address) -> Result<(), StorageError> {
        let lag = self.lag();
        let previous = self.inner.get_pointer(key).await?;
        self.inner.set_pointer(key, target).await?;
        if lag > 0 {
            let mut pending = self.pending.lock();
            // A second write before the first replicated keeps the oldest visible value.
            let previous = match pending.pointers.remove(key) {
                Some(stale) => stale.previous,
                None => previous,
            };
            pending.pointers.insert(
                key.clone(),
                StalePointer {
                    previous,
                    remaining: lag,
                },
            );
        }
        Ok(())
    }

    async fn get_pointer(&self, key: &PointerKey) -> Result<Option<Address>, StorageError> {
        {
            let mut pending = self.pending.lock();
            if let Some(stale) = pending.pointers.get_mut(key) {
                if consume(&mut stale.remaining) {
                    return Ok(stale.previous.clone());
                }
                pending.pointers.remove(key);
            }
        }
        self.inner.get_pointer(key).await
    }

    async fn add_link(
        &self,
        source: &Address,
        tag: &str,
        target: &Address,
    ) -> Result<(), StorageError> {
        let lag = self.lag();
        self.inner.add_link(source, tag, target).await?;
        let key = (source.clone(), tag.to_string(), target.clone());
        let mut pending = self.pending.lock();
        pending.removed_links.remove(&key);
        if lag > 0 {
            pending.added_links.insert(key, lag);
        }
        Ok(())
    }

    async fn remove_link(
        &self,
        source: &Address,
        tag: &str,
        target: &Address,
    ) -> Result<(), StorageError> {
        let lag = self.lag();
        self.inner.remove_link(source, tag, target).await?;
        let key = (source.clone(), tag.to_string(), target.clone());
        let mut pending = self.pending.lock();
        if pending.added_links.remove(&key).is_none() && lag > 0 {
            pending.removed_links.insert(key, lag);
        }
        Ok(())
    }

    async fn get_links(&self, source: &Address, tag: &str) -> Result<Vec<Address>, StorageError> {
        let mut targets = self.inner.get_links(source, tag).await?;
        let mut pending = self.pending.lock();

        let matches = |key: &LinkKey| key.0 == *source && key.1 == tag;

        pending.added_links.retain(|key, remaining| {
            if !matches(key) {
                return true;
            }
            if consume(remaining) {
                targets.retain(|t| *t != key.2);
                true
            } else {
                false
            }
        });

        pending.removed_links.retain(|key, remaining| {
            if !matches(key) {
                return true;
            }
            if consume(remaining) {
                if !targets.contains(&key.2) {
                    targets.push(key.2.clone());
                }
                true
            } else {
                false
            }
        });

        Ok(targets)
    }
}
