//! Perspective Registry
//!
//! Mutable head and context pointers over the replicated store. Writes are last-write-wins
//! and resolve once a replica accepted them; reads may trail writes, including the caller's
//! own. `await_head` is the bounded re-read for callers that need to observe a write.

use crate::clock::{instance_seed, MonotonicClock};
use crate::commit::{Commit, CommitGraph};
use crate::consistency::{read_until, retry_transient, ReadPolicy};
use crate::content::ContentStore;
use crate::entry::{EntryType, Record};
use crate::error::VcError;
use crate::perspective::{
    is_root_sentinel, root_sentinel, Origin, Perspective, PerspectiveRecord,
};
use crate::provenance::check_pointer;
use crate::store::{PointerKey, PERSPECTIVES_TAG};
use crate::types::Address;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Parameters for a new perspective
#[derive(Debug, Clone, Default)]
pub struct NewPerspective {
    pub name: String,
    pub head: Option<Address>,
    pub context: Option<Address>,
    pub origin: Origin,
}

impl NewPerspective {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_head(mut self, head: Address) -> Self {
        self.head = Some(head);
        self
    }

    pub fn in_context(mut self, context: Address) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }
}

pub struct PerspectiveRegistry {
    store: Arc<ContentStore>,
    graph: Arc<CommitGraph>,
    clock: Arc<MonotonicClock>,
    policy: ReadPolicy,
    creator_id: String,
    nonce: AtomicU64,
}

impl PerspectiveRegistry {
    pub fn new(
        store: Arc<ContentStore>,
        graph: Arc<CommitGraph>,
        clock: Arc<MonotonicClock>,
        policy: ReadPolicy,
        creator_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            graph,
            clock,
            policy,
            creator_id: creator_id.into(),
            nonce: AtomicU64::new(instance_seed()),
        }
    }

    pub fn creator_id(&self) -> &str {
        &self.creator_id
    }

    /// Create a perspective and bind its pointers.
    ///
    /// Without a head the perspective points at the root sentinel and cannot be checked out
    /// until `update_head` assigns a real commit.
    pub async fn create(&self, new: NewPerspective) -> Result<Address, VcError> {
        Ok(self.create_resolved(new).await?.id)
    }

    /// `create`, returning the perspective as written
    pub async fn create_resolved(&self, new: NewPerspective) -> Result<Perspective, VcError> {
        if let (Some(head), Origin::Local) = (&new.head, new.origin) {
            self.graph.get_commit_with_retry(head).await?;
        }

        let record = PerspectiveRecord {
            name: new.name,
            creator_id: self.creator_id.clone(),
            origin: new.origin,
            created_at: self.clock.now(),
            nonce: self.nonce.fetch_add(1, Ordering::Relaxed),
        };
        let id = self
            .store
            .put_record(&Record::Perspective(record.clone()))
            .await?;

        let head = new.head.unwrap_or_else(root_sentinel);
        self.write_pointer(&PointerKey::head(&id), &head).await?;
        if let Some(context) = &new.context {
            self.write_pointer(&PointerKey::context(&id), context).await?;
            self.store
                .replica()
                .add_link(context, PERSPECTIVES_TAG, &id)
                .await?;
        }

        info!(
            perspective = %id,
            name = %record.name,
            head = %head,
            context = ?new.context,
            "Perspective created"
        );
        Ok(Perspective::from_record(id, record, head, new.context))
    }

    /// Point a perspective at a new head; the later physical write wins
    pub async fn update_head(&self, id: &Address, head: &Address) -> Result<(), VcError> {
        let record = self.get_record(id).await?;
        if record.origin == Origin::Local && !is_root_sentinel(head) {
            self.graph.get_commit_with_retry(head).await?;
        }
        self.write_pointer(&PointerKey::head(id), head).await?;
        info!(perspective = %id, head = %head, "Head updated");
        Ok(())
    }

    /// `update_head` that first checks the head this replica currently shows.
    ///
    /// Fails with `StaleWrite` when another writer moved the head away from `expected`.
    /// The check is a read followed by a write, not an atomic swap.
    pub async fn update_head_checked(
        &self,
        id: &Address,
        expected: &Address,
        head: &Address,
    ) -> Result<(), VcError> {
        let observed = self.get_head(id).await?;
        if observed != *expected && observed != *head {
            return Err(VcError::StaleWrite {
                perspective: id.clone(),
                observed,
            });
        }
        self.update_head(id, head).await
    }

    /// Move a perspective under another context
    pub async fn update_context(&self, id: &Address, context: &Address) -> Result<(), VcError> {
        self.get_record(id).await?;
        let key = PointerKey::context(id);
        let previous = self.store.replica().get_pointer(&key).await?;

        self.write_pointer(&key, context).await?;
        let replica = self.store.replica();
        if let Some(previous) = previous.filter(|p| p != context) {
            replica.remove_link(&previous, PERSPECTIVES_TAG, id).await?;
        }
        replica.add_link(context, PERSPECTIVES_TAG, id).await?;

        info!(perspective = %id, context = %context, "Context updated");
        Ok(())
    }

    /// Current head as seen by this replica; may trail recent writes
    pub async fn get_head(&self, id: &Address) -> Result<Address, VcError> {
        self.store
            .replica()
            .get_pointer(&PointerKey::head(id))
            .await?
            .ok_or_else(|| VcError::NotFound(id.clone()))
    }

    /// Re-read the head until it shows `expected`
    pub async fn await_head(&self, id: &Address, expected: &Address) -> Result<Address, VcError> {
        let what = format!("head of perspective {}", id.short());
        read_until(&self.policy, &what, || self.get_head(id), |head| head == expected).await
    }

    pub async fn get_context(&self, id: &Address) -> Result<Option<Address>, VcError> {
        Ok(self
            .store
            .replica()
            .get_pointer(&PointerKey::context(id))
            .await?)
    }

    /// Immutable record of a perspective
    pub async fn get_record(&self, id: &Address) -> Result<PerspectiveRecord, VcError> {
        let record = retry_transient(&self.policy, "perspective", || self.store.get_record(id))
            .await?;
        match record {
            Record::Perspective(record) => Ok(record),
            other => Err(VcError::UnexpectedEntryType {
                address: id.clone(),
                found: other.entry_type(),
                expected: vec![EntryType::Perspective],
            }),
        }
    }

    /// Record plus current pointers
    pub async fn get(&self, id: &Address) -> Result<Perspective, VcError> {
        let record = self.get_record(id).await?;
        self.with_pointers(id, record).await
    }

    /// Attach the current pointers to an already fetched record
    pub async fn with_pointers(
        &self,
        id: &Address,
        record: PerspectiveRecord,
    ) -> Result<Perspective, VcError> {
        let head = match self.get_head(id).await {
            Ok(head) => head,
            // Pointer not replicated yet: the record exists, so the perspective is empty here.
            Err(VcError::NotFound(_)) => root_sentinel(),
            Err(err) => return Err(err),
        };
        let context = self.get_context(id).await?;
        Ok(Perspective::from_record(id.clone(), record, head, context))
    }

    /// Resolve the head commit
    pub async fn checkout(&self, id: &Address) -> Result<Commit, VcError> {
        let head = self.get_head(id).await?;
        if is_root_sentinel(&head) {
            return Err(VcError::EmptyPerspective(id.clone()));
        }
        debug!(perspective = %id, head = %head, "Checkout");
        self.graph.get_commit_with_retry(&head).await
    }

    async fn write_pointer(&self, key: &PointerKey, target: &Address) -> Result<(), VcError> {
        check_pointer(
            self.store.validator().as_ref(),
            key,
            target,
            &self.creator_id,
        )?;
        self.store.replica().set_pointer(key, target).await?;
        Ok(())
    }
}
