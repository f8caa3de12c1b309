//! Local Cache
//!
//! Normalized, read-through view over the replicated store. Entries live in one arena per
//! entry type. A miss is resolved through an `EntrySource`; concurrent misses for the same
//! address share one fetch. Local writes are upserted directly so the writer observes them
//! without waiting for replication. Pointer writes are also remembered as overrides and laid
//! over every later fetch of that perspective until it is explicitly refreshed. Entries are
//! never evicted.

pub mod entity;
pub mod source;

pub use entity::EntityArena;
pub use source::{EntrySource, StoreEntrySource};

use crate::commit::Commit;
use crate::context::Context;
use crate::entry::{ContentEntry, Entry, EntryType};
use crate::error::VcError;
use crate::perspective::Perspective;
use crate::types::Address;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

type Waiters = Vec<oneshot::Sender<Result<Entry, VcError>>>;

#[derive(Default)]
struct Entities {
    contexts: EntityArena<Context>,
    perspectives: EntityArena<Perspective>,
    commits: EntityArena<Commit>,
    contents: EntityArena<ContentEntry>,
}

impl Entities {
    fn lookup(&self, entry_type: EntryType, id: &Address) -> Option<Entry> {
        match entry_type {
            EntryType::Context => self.contexts.get(id).cloned().map(Entry::Context),
            EntryType::Perspective => self.perspectives.get(id).cloned().map(Entry::Perspective),
            EntryType::Commit => self.commits.get(id).cloned().map(Entry::Commit),
            EntryType::Content => self.contents.get(id).cloned().map(Entry::Content),
        }
    }

    fn upsert(&mut self, entry: Entry) {
        match entry {
            Entry::Context(context) => self.contexts.upsert(context.id.clone(), context),
            Entry::Perspective(perspective) => {
                self.perspectives.upsert(perspective.id.clone(), perspective)
            }
            Entry::Commit(commit) => self.commits.upsert(commit.id.clone(), commit),
            Entry::Content(content) => self.contents.upsert(content.id.clone(), content),
        }
    }
}

/// Removes an abandoned fetch from the in-flight table.
///
/// Dropping the waiters' senders wakes them; they retry and one becomes the new leader.
struct InFlight<'a> {
    table: &'a Mutex<HashMap<Address, Waiters>>,
    id: &'a Address,
    done: bool,
}

impl InFlight<'_> {
    fn finish(mut self) -> Waiters {
        self.done = true;
        self.table.lock().remove(self.id).unwrap_or_default()
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.table.lock().remove(self.id);
        }
    }
}

/// Pointer values this instance wrote for one perspective
#[derive(Debug, Clone, Default)]
struct PointerOverride {
    head: Option<Address>,
    context: Option<Address>,
}

impl PointerOverride {
    fn apply(&self, perspective: &mut Perspective) {
        if let Some(head) = &self.head {
            perspective.head_commit_id = head.clone();
        }
        if let Some(context) = &self.context {
            perspective.context_id = Some(context.clone());
        }
    }
}

enum Role {
    Leader,
    Waiter(oneshot::Receiver<Result<Entry, VcError>>),
}

pub struct LocalCache {
    source: Arc<dyn EntrySource>,
    entities: RwLock<Entities>,
    in_flight: Mutex<HashMap<Address, Waiters>>,
    overrides: Mutex<HashMap<Address, PointerOverride>>,
}

impl LocalCache {
    pub fn new(source: Arc<dyn EntrySource>) -> Self {
        Self {
            source,
            entities: RwLock::new(Entities::default()),
            in_flight: Mutex::new(HashMap::new()),
            overrides: Mutex::new(HashMap::new()),
        }
    }

    /// Cached entry if its type is one of `acceptable`, fetching it on a miss.
    ///
    /// Fails with `UnexpectedEntryType` when the address holds another kind of entry.
    pub async fn get_cached_entry(
        &self,
        id: &Address,
        acceptable: &[EntryType],
    ) -> Result<Entry, VcError> {
        if let Some(entry) = self.lookup(id, acceptable) {
            return Ok(entry);
        }

        debug!(id = %id, "Cache miss");
        let entry = self.fetch_shared(id).await?;
        if acceptable.contains(&entry.entry_type()) {
            Ok(entry)
        } else {
            Err(VcError::UnexpectedEntryType {
                address: id.clone(),
                found: entry.entry_type(),
                expected: acceptable.to_vec(),
            })
        }
    }

    /// Fetch again, replacing the cached copy and dropping local pointer overrides
    pub async fn refresh(&self, id: &Address) -> Result<Entry, VcError> {
        self.overrides.lock().remove(id);
        self.fetch_shared(id).await
    }

    pub async fn get_commit(&self, id: &Address) -> Result<Commit, VcError> {
        match self.get_cached_entry(id, &[EntryType::Commit]).await? {
            Entry::Commit(commit) => Ok(commit),
            other => Err(unexpected(id, &other, EntryType::Commit)),
        }
    }

    pub async fn get_perspective(&self, id: &Address) -> Result<Perspective, VcError> {
        match self.get_cached_entry(id, &[EntryType::Perspective]).await? {
            Entry::Perspective(perspective) => Ok(perspective),
            other => Err(unexpected(id, &other, EntryType::Perspective)),
        }
    }

    /// Record a local write
    pub fn upsert(&self, entry: Entry) {
        self.entities.write().upsert(entry);
    }

    /// Record a local head change; it wins over fetched state until `refresh`
    pub fn set_head(&self, perspective: &Address, head: &Address) {
        let mut overrides = self.overrides.lock();
        let entry = overrides.entry(perspective.clone()).or_default();
        entry.head = Some(head.clone());
        self.apply_override(perspective, entry);
    }

    /// Record a local context change; it wins over fetched state until `refresh`
    pub fn set_context(&self, perspective: &Address, context: &Address) {
        let mut overrides = self.overrides.lock();
        let entry = overrides.entry(perspective.clone()).or_default();
        entry.context = Some(context.clone());
        self.apply_override(perspective, entry);
    }

    fn apply_override(&self, perspective: &Address, pointers: &PointerOverride) {
        if let Some(cached) = self.entities.write().perspectives.get_mut(perspective) {
            pointers.apply(cached);
        }
    }

    /// Cache a fetched entry with local pointer writes laid over it
    ///
    /// Holds the override table while upserting so a concurrent `set_head` cannot be lost.
    fn store_fetched(&self, mut entry: Entry) -> Entry {
        let overrides = self.overrides.lock();
        if let Entry::Perspective(perspective) = &mut entry {
            if let Some(pointers) = overrides.get(&perspective.id) {
                pointers.apply(perspective);
            }
        }
        self.entities.write().upsert(entry.clone());
        entry
    }

    /// Cached perspectives of a context, in the order the cache first saw them
    pub fn perspectives_of(&self, context: &Address) -> Vec<Perspective> {
        self.entities
            .read()
            .perspectives
            .iter()
            .filter(|(_, p)| p.context_id.as_ref() == Some(context))
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn contains(&self, id: &Address) -> bool {
        self.lookup(id, &EntryType::ALL).is_some()
    }

    /// Number of cached entries across all types
    pub fn len(&self) -> usize {
        let entities = self.entities.read();
        entities.contexts.len()
            + entities.perspectives.len()
            + entities.commits.len()
            + entities.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, id: &Address, acceptable: &[EntryType]) -> Option<Entry> {
        let entities = self.entities.read();
        acceptable
            .iter()
            .find_map(|entry_type| entities.lookup(*entry_type, id))
    }

    /// One fetch per address at a time; everyone asking meanwhile gets its result
    async fn fetch_shared(&self, id: &Address) -> Result<Entry, VcError> {
        loop {
            let role = {
                let mut in_flight = self.in_flight.lock();
                match in_flight.get_mut(id) {
                    Some(waiters) => {
                        let (tx, rx) = oneshot::channel();
                        waiters.push(tx);
                        Role::Waiter(rx)
                    }
                    None => {
                        in_flight.insert(id.clone(), Vec::new());
                        Role::Leader
                    }
                }
            };

            match role {
                Role::Waiter(rx) => match rx.await {
                    Ok(result) => {
                        debug!(id = %id, "Joined in-flight fetch");
                        return result;
                    }
                    // Leader was cancelled before finishing; try again.
                    Err(_) => continue,
                },
                Role::Leader => {
                    let guard = InFlight {
                        table: &self.in_flight,
                        id,
                        done: false,
                    };
                    let result = self
                        .source
                        .fetch_entry(id)
                        .await
                        .map(|entry| self.store_fetched(entry));
                    let waiters = guard.finish();
                    if !waiters.is_empty() {
                        debug!(id = %id, waiters = waiters.len(), "Sharing fetch result");
                    }
                    for waiter in waiters {
                        let _ = waiter.send(result.clone());
                    }
                    return result;
                }
            }
        }
    }
}

fn unexpected(id: &Address, entry: &Entry, expected: EntryType) -> VcError {
    VcError::UnexpectedEntryType {
        address: id.clone(),
        found: entry.entry_type(),
        expected: vec![expected],
    }
}
