//! Version Control API
//!
//! The call surface consumed by clients: contexts, perspectives, commits, entries and merges
//! over one replicated store. Mutations write through to the local cache so the caller
//! observes its own writes even while the replicated registry still shows older state.

use crate::cache::{LocalCache, StoreEntrySource};
use crate::clock::MonotonicClock;
use crate::commit::{Commit, CommitGraph, CommitRecord};
use crate::config::{StorageBackend, UprtclConfig};
use crate::consistency::ReadPolicy;
use crate::content::{Content, ContentStore};
use crate::context::{Context, ContextIndex};
use crate::draft::DraftStore;
use crate::entry::{ContentEntry, Entry, EntryType};
use crate::error::VcError;
use crate::merge::{MergeEngine, MergeOutcome};
use crate::perspective::{is_root_sentinel, NewPerspective, Perspective, PerspectiveRegistry};
use crate::provenance::{AcceptAll, EntryValidator};
use crate::store::{MemoryReplica, ReplicatedStore, SledReplica};
use crate::types::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Perspective as listed under a context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedPerspective {
    pub id: Address,
    pub payload: Perspective,
}

/// Addresses created by `create_context_perspective_and_commit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bootstrap {
    pub context_id: Address,
    pub perspective_id: Address,
    pub commit_id: Address,
}

/// Version control API service
pub struct VersionControlApi {
    store: Arc<ContentStore>,
    graph: Arc<CommitGraph>,
    registry: Arc<PerspectiveRegistry>,
    contexts: ContextIndex,
    drafts: DraftStore,
    merges: MergeEngine,
    cache: LocalCache,
    clock: Arc<MonotonicClock>,
    /// Set when the replica is a sled database that buffers writes
    durable: Option<Arc<SledReplica>>,
}

impl VersionControlApi {
    /// Wire every component over one replica
    ///
    /// # Arguments
    /// * `replica` - The replicated store all components share
    /// * `validator` - Gate consulted before every write
    /// * `creator_id` - Author of records and pointer updates issued through this instance
    /// * `policy` - Budget for bounded re-reads
    pub fn new(
        replica: Arc<dyn ReplicatedStore>,
        validator: Arc<dyn EntryValidator>,
        creator_id: impl Into<String>,
        policy: ReadPolicy,
    ) -> Self {
        let clock = Arc::new(MonotonicClock::new());
        let store = Arc::new(ContentStore::new(replica, validator));
        let graph = Arc::new(CommitGraph::new(store.clone(), policy.clone()));
        let registry = Arc::new(PerspectiveRegistry::new(
            store.clone(),
            graph.clone(),
            clock.clone(),
            policy.clone(),
            creator_id,
        ));
        let contexts = ContextIndex::new(store.clone(), registry.clone(), policy.clone());
        let drafts = DraftStore::new(store.clone(), policy.clone(), registry.creator_id());
        let merges = MergeEngine::new(
            store.clone(),
            graph.clone(),
            registry.clone(),
            clock.clone(),
            policy.clone(),
        );
        let source = StoreEntrySource::new(store.clone(), registry.clone(), policy);
        let cache = LocalCache::new(Arc::new(source));

        Self {
            store,
            graph,
            registry,
            contexts,
            drafts,
            merges,
            cache,
            clock,
            durable: None,
        }
    }

    /// Open the replica named by the configuration; every write is accepted
    pub fn open(config: &UprtclConfig) -> Result<Self, VcError> {
        let (replica, durable): (Arc<dyn ReplicatedStore>, Option<Arc<SledReplica>>) =
            match config.storage.backend {
                StorageBackend::Memory => (Arc::new(MemoryReplica::new()), None),
                StorageBackend::Sled => {
                    let path = config.storage.resolved_path();
                    debug!(path = %path.display(), "Opening sled store");
                    let sled = Arc::new(SledReplica::new(&path)?);
                    (sled.clone(), Some(sled))
                }
            };
        info!(backend = ?config.storage.backend, creator = %config.agent.creator_id, "Opened store");
        let mut api = Self::new(
            replica,
            Arc::new(AcceptAll),
            config.agent.creator_id.clone(),
            config.read_policy(),
        );
        api.durable = durable;
        Ok(api)
    }

    /// Flush buffered writes to disk; a no-op for in-memory replicas
    pub fn flush(&self) -> Result<(), VcError> {
        if let Some(sled) = &self.durable {
            sled.flush()?;
        }
        Ok(())
    }

    pub fn creator_id(&self) -> &str {
        self.registry.creator_id()
    }

    /// Current time on this instance's monotonic clock
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub async fn create_context(&self, timestamp: Timestamp) -> Result<Address, VcError> {
        let id = self.contexts.create(timestamp).await?;
        self.cache.upsert(Entry::Context(Context {
            id: id.clone(),
            creator_id: self.creator_id().to_string(),
            timestamp,
            nonce: 0,
        }));
        Ok(id)
    }

    /// Contexts `creator` created, oldest first
    pub async fn contexts_created_by(&self, creator: &str) -> Result<Vec<Context>, VcError> {
        self.contexts.contexts_created_by(creator).await
    }

    /// Create an empty perspective, optionally grouped under a context
    pub async fn create_perspective(
        &self,
        name: &str,
        context: Option<&Address>,
    ) -> Result<Address, VcError> {
        let mut new = NewPerspective::named(name);
        new.context = context.cloned();
        self.create_perspective_with(new).await
    }

    /// Create a perspective from full parameters (initial head, origin)
    pub async fn create_perspective_with(&self, new: NewPerspective) -> Result<Address, VcError> {
        let perspective = self.registry.create_resolved(new).await?;
        let id = perspective.id.clone();
        self.cache.upsert(Entry::Perspective(perspective));
        Ok(id)
    }

    pub async fn update_perspective_context(
        &self,
        perspective: &Address,
        context: &Address,
    ) -> Result<(), VcError> {
        self.registry.update_context(perspective, context).await?;
        self.cache.set_context(perspective, context);
        Ok(())
    }

    pub async fn update_perspective_head(
        &self,
        perspective: &Address,
        head: &Address,
    ) -> Result<(), VcError> {
        self.registry.update_head(perspective, head).await?;
        self.cache.set_head(perspective, head);
        Ok(())
    }

    /// Head as the replicated registry shows it; may trail recent writes
    pub async fn get_perspective_head(&self, perspective: &Address) -> Result<Address, VcError> {
        self.registry.get_head(perspective).await
    }

    /// Re-read the head until it shows `expected`
    pub async fn await_perspective_head(
        &self,
        perspective: &Address,
        expected: &Address,
    ) -> Result<Address, VcError> {
        self.registry.await_head(perspective, expected).await
    }

    /// Perspectives of a context in creation order
    pub async fn get_context_perspectives(
        &self,
        context: &Address,
    ) -> Result<Vec<ListedPerspective>, VcError> {
        Ok(self
            .contexts
            .list_perspectives(context)
            .await?
            .into_iter()
            .map(|payload| ListedPerspective {
                id: payload.id.clone(),
                payload,
            })
            .collect())
    }

    pub async fn create_commit(
        &self,
        parents: Vec<Address>,
        content: &Address,
        message: &str,
        creator: &str,
        timestamp: Timestamp,
    ) -> Result<Address, VcError> {
        let record = CommitRecord::new(content.clone(), parents, message, creator, timestamp);
        let id = self.graph.create_commit(record.clone()).await?;
        self.cache
            .upsert(Entry::Commit(Commit::from_record(id.clone(), record)));
        Ok(id)
    }

    /// Resolve any address through the local cache
    pub async fn get_entry(&self, address: &Address) -> Result<Entry, VcError> {
        self.cache.get_cached_entry(address, &EntryType::ALL).await
    }

    /// Merge `from` into `to`; returns the new head of `to`
    pub async fn merge_branches(&self, from: &Address, to: &Address) -> Result<Address, VcError> {
        Ok(self.merge(from, to).await?.head().clone())
    }

    pub async fn merge(&self, from: &Address, to: &Address) -> Result<MergeOutcome, VcError> {
        let outcome = self.merges.merge_perspectives(from, to).await?;
        self.cache.set_head(to, outcome.head());
        Ok(outcome)
    }

    pub async fn put_content(&self, content: &Content) -> Result<Address, VcError> {
        let id = self.store.put_content(content).await?;
        self.cache.upsert(Entry::Content(ContentEntry {
            id: id.clone(),
            content: content.clone(),
        }));
        Ok(id)
    }

    pub async fn get_content(&self, address: &Address) -> Result<Content, VcError> {
        match self
            .cache
            .get_cached_entry(address, &[EntryType::Content])
            .await?
        {
            Entry::Content(entry) => Ok(entry.content),
            other => Err(VcError::UnexpectedEntryType {
                address: address.clone(),
                found: other.entry_type(),
                expected: vec![EntryType::Content],
            }),
        }
    }

    /// Create a context, a root commit and a perspective on it in one go
    pub async fn create_context_perspective_and_commit(
        &self,
        name: &str,
        content: &Address,
        message: &str,
    ) -> Result<Bootstrap, VcError> {
        let now = self.now();
        let context_id = self.create_context(now).await?;
        let commit_id = self
            .create_commit(vec![], content, message, &self.creator_id().to_string(), now)
            .await?;
        let perspective_id = self
            .create_perspective_with(
                NewPerspective::named(name)
                    .with_head(commit_id.clone())
                    .in_context(context_id.clone()),
            )
            .await?;

        Ok(Bootstrap {
            context_id,
            perspective_id,
            commit_id,
        })
    }

    /// Commit on top of the perspective's head, as this instance last saw it, and advance it
    pub async fn create_commit_in_perspective(
        &self,
        perspective: &Address,
        content: &Address,
        message: &str,
    ) -> Result<Address, VcError> {
        let head = self.cache.get_perspective(perspective).await?.head_commit_id;
        let parents = if is_root_sentinel(&head) {
            vec![]
        } else {
            vec![head]
        };

        let creator = self.creator_id().to_string();
        let commit = self
            .create_commit(parents, content, message, &creator, self.now())
            .await?;
        self.update_perspective_head(perspective, &commit).await?;
        Ok(commit)
    }

    /// Replace this author's draft for `entry`, or clear it with `None`
    pub async fn set_draft(&self, entry: &Address, draft: Option<&Content>) -> Result<(), VcError> {
        self.drafts.set_draft(entry, draft).await
    }

    pub async fn get_draft(&self, entry: &Address) -> Result<Option<Content>, VcError> {
        self.drafts.get_draft(entry).await
    }

    /// The commit followed by its ancestors
    pub async fn get_commit_history(&self, commit: &Address) -> Result<Vec<Commit>, VcError> {
        self.graph.history(commit).await
    }

    pub async fn checkout(&self, perspective: &Address) -> Result<Commit, VcError> {
        self.registry.checkout(perspective).await
    }

    /// Re-fetch an entry, replacing the cached copy
    pub async fn refresh(&self, address: &Address) -> Result<Entry, VcError> {
        self.cache.refresh(address).await
    }

    pub fn store(&self) -> &Arc<ContentStore> {
        &self.store
    }

    pub fn graph(&self) -> &Arc<CommitGraph> {
        &self.graph
    }

    pub fn registry(&self) -> &Arc<PerspectiveRegistry> {
        &self.registry
    }

    pub fn contexts(&self) -> &ContextIndex {
        &self.contexts
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }
}
