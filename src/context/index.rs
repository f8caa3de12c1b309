//! Context Index
//!
//! Creates contexts and lists the perspectives grouped under them. Listing order is creation
//! order (perspective `created_at`, ties broken by id), which is deterministic once the
//! replica has seen every perspective of the context.

use crate::consistency::{retry_transient, ReadPolicy};
use crate::content::ContentStore;
use crate::context::{Context, ContextRecord};
use crate::entry::codec::{address_of, record_address};
use crate::entry::{EntryType, Record};
use crate::error::VcError;
use crate::perspective::{Perspective, PerspectiveRegistry};
use crate::store::{CREATED_CONTEXTS_TAG, PERSPECTIVES_TAG};
use crate::types::{Address, Timestamp};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info};

/// Link source standing for an agent; never stored as an entry
pub fn agent_address(creator: &str) -> Address {
    address_of(format!("agent\0{}", creator).as_bytes())
}

pub struct ContextIndex {
    store: Arc<ContentStore>,
    registry: Arc<PerspectiveRegistry>,
    policy: ReadPolicy,
}

impl ContextIndex {
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

    fn record(&self, timestamp: Timestamp, nonce: u64) -> ContextRecord {
        ContextRecord {
            creator_id: self.registry.creator_id().to_string(),
            timestamp,
            nonce,
        }
    }

    /// Create a context authored by this agent
    pub async fn create(&self, timestamp: Timestamp) -> Result<Address, VcError> {
        self.create_with_nonce(timestamp, 0).await
    }

    pub async fn create_with_nonce(
        &self,
        timestamp: Timestamp,
        nonce: u64,
    ) -> Result<Address, VcError> {
        let id = self
            .store
            .put_record(&Record::Context(self.record(timestamp, nonce)))
            .await?;
        self.store
            .replica()
            .add_link(
                &agent_address(self.registry.creator_id()),
                CREATED_CONTEXTS_TAG,
                &id,
            )
            .await?;
        info!(context = %id, timestamp, "Context created");
        Ok(id)
    }

    /// Id a context would get, without storing it
    pub fn address_of(&self, timestamp: Timestamp, nonce: u64) -> Result<Address, VcError> {
        Ok(record_address(&Record::Context(self.record(timestamp, nonce)))?)
    }

    pub async fn get(&self, id: &Address) -> Result<Context, VcError> {
        let record = retry_transient(&self.policy, "context", || self.store.get_record(id)).await?;
        match record {
            Record::Context(record) => Ok(Context::from_record(id.clone(), record)),
            other => Err(VcError::UnexpectedEntryType {
                address: id.clone(),
                found: other.entry_type(),
                expected: vec![EntryType::Context],
            }),
        }
    }

    /// Contexts `creator` created, oldest first
    pub async fn contexts_created_by(&self, creator: &str) -> Result<Vec<Context>, VcError> {
        let ids = self
            .store
            .replica()
            .get_links(&agent_address(creator), CREATED_CONTEXTS_TAG)
            .await?;
        let mut contexts = try_join_all(ids.iter().map(|id| self.get(id))).await?;
        contexts.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.nonce.cmp(&b.nonce))
                .then_with(|| a.id.cmp(&b.id))
        });
        debug!(creator, count = contexts.len(), "Listed created contexts");
        Ok(contexts)
    }

    /// Perspectives grouped under `id`, oldest first.
    ///
    /// Perspectives whose context pointer already names a different context are skipped;
    /// their link removal has not reached this replica yet.
    pub async fn list_perspectives(&self, id: &Address) -> Result<Vec<Perspective>, VcError> {
        let ids = self
            .store
            .replica()
            .get_links(id, PERSPECTIVES_TAG)
            .await?;

        let mut perspectives: Vec<Perspective> =
            try_join_all(ids.iter().map(|pid| self.registry.get(pid)))
                .await?
                .into_iter()
                .filter(|p| p.context_id.as_ref().map_or(true, |c| c == id))
                .collect();

        perspectives.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        debug!(context = %id, count = perspectives.len(), "Listed perspectives");
        Ok(perspectives)
    }
}
