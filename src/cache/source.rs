//! Where cache misses are resolved

use crate::commit::Commit;
use crate::consistency::{retry_transient, ReadPolicy};
use crate::content::ContentStore;
use crate::context::Context;
use crate::entry::{ContentEntry, Entry, Record};
use crate::error::VcError;
use crate::perspective::PerspectiveRegistry;
use crate::types::Address;
use async_trait::async_trait;
use std::sync::Arc;

/// Resolves an address into whichever entry it holds
#[async_trait]
pub trait EntrySource: Send + Sync {
    async fn fetch_entry(&self, id: &Address) -> Result<Entry, VcError>;
}

/// Resolves entries from the replicated store; perspectives get their current pointers
pub struct StoreEntrySource {
    store: Arc<ContentStore>,
    registry: Arc<PerspectiveRegistry>,
    policy: ReadPolicy,
}

impl StoreEntrySource {
    pub fn new(
        store: Arc<ContentStore>,
        registry: Arc<PerspectiveRegistry>,
        policy: ReadPolicy,
    ) -> Self {
        Self {
            store,
            registry,
            policy,
        }
    }
}

#[async_trait]
impl EntrySource for StoreEntrySource {
    async fn fetch_entry(&self, id: &Address) -> Result<Entry, VcError> {
        let record = retry_transient(&self.policy, "entry", || self.store.get_record(id)).await?;
        let entry = match record {
            Record::Context(record) => Entry::Context(Context::from_record(id.clone(), record)),
            Record::Commit(record) => Entry::Commit(Commit::from_record(id.clone(), record)),
            Record::Content(content) => Entry::Content(ContentEntry {
                id: id.clone(),
                content,
            }),
            Record::Perspective(record) => {
                Entry::Perspective(self.registry.with_pointers(id, record).await?)
            }
        };
        Ok(entry)
    }
}
