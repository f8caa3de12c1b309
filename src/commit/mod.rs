//! Commit Graph
//!
//! Immutable commits form a DAG over content snapshots. A commit's id is the address of its
//! canonical record, so creating the same commit twice yields the same id and stores nothing
//! new. Parents must resolve before a child is accepted, which keeps the graph acyclic by
//! construction.

pub mod ancestry;

pub use ancestry::Ancestors;

use crate::consistency::{retry_transient, ReadPolicy};
use crate::content::ContentStore;
use crate::entry::codec::record_address;
use crate::entry::{EntryType, Record};
use crate::error::VcError;
use crate::types::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Canonical, hashed fields of a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub content_id: Address,
    pub parent_ids: Vec<Address>,
    pub creator_id: String,
    pub timestamp: Timestamp,
    pub message: String,
}

impl CommitRecord {
    pub fn new(
        content_id: impl Into<Address>,
        parent_ids: Vec<Address>,
        message: impl Into<String>,
        creator_id: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            content_id: content_id.into(),
            parent_ids,
            creator_id: creator_id.into(),
            timestamp,
            message: message.into(),
        }
    }
}

/// A stored commit together with its id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub id: Address,
    #[serde(rename = "dataId", alias = "contentId")]
    pub content_id: Address,
    #[serde(rename = "parentsIds")]
    pub parent_ids: Vec<Address>,
    pub creator_id: String,
    pub timestamp: Timestamp,
    pub message: String,
}

impl Commit {
    pub fn from_record(id: Address, record: CommitRecord) -> Self {
        Self {
            id,
            content_id: record.content_id,
            parent_ids: record.parent_ids,
            creator_id: record.creator_id,
            timestamp: record.timestamp,
            message: record.message,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_ids.is_empty()
    }
}

pub struct CommitGraph {
    store: Arc<ContentStore>,
    policy: ReadPolicy,
}

impl CommitGraph {
    /// `policy` bounds the re-reads used for parent checks and ancestor walks
    pub fn new(store: Arc<ContentStore>, policy: ReadPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &ReadPolicy {
        &self.policy
    }

    /// Id a commit would get, without storing it
    pub fn commit_address(&self, record: &CommitRecord) -> Result<Address, VcError> {
        Ok(record_address(&Record::Commit(record.clone()))?)
    }

    /// Store a commit after checking that every parent resolves.
    ///
    /// Parents that have not replicated yet are re-read under the graph's policy; a parent
    /// that never shows up fails the call with `DanglingParent`.
    pub async fn create_commit(&self, record: CommitRecord) -> Result<Address, VcError> {
        for parent in &record.parent_ids {
            match self.get_commit_with_retry(parent).await {
                Ok(_) => {}
                Err(VcError::NotFound(_)) => {
                    return Err(VcError::DanglingParent {
                        parent: parent.clone(),
                    })
                }
                Err(err) => return Err(err),
            }
        }

        let parents = record.parent_ids.len();
        let id = self.store.put_record(&Record::Commit(record)).await?;
        info!(commit = %id, parents, "Commit created");
        Ok(id)
    }

    /// Single read of a commit
    pub async fn get_commit(&self, id: &Address) -> Result<Commit, VcError> {
        match self.store.get_record(id).await? {
            Record::Commit(record) => Ok(Commit::from_record(id.clone(), record)),
            other => Err(VcError::UnexpectedEntryType {
                address: id.clone(),
                found: other.entry_type(),
                expected: vec![EntryType::Commit],
            }),
        }
    }

    /// Read a commit, re-reading while this replica has not seen it
    pub async fn get_commit_with_retry(&self, id: &Address) -> Result<Commit, VcError> {
        retry_transient(&self.policy, "commit", || self.get_commit(id)).await
    }

    /// Ancestors of `id` in breadth-first order, excluding `id` itself
    pub fn ancestors_of(&self, id: &Address) -> Ancestors<'_> {
        Ancestors::new(self, id.clone(), false)
    }

    /// `id` followed by its ancestors
    pub async fn history(&self, id: &Address) -> Result<Vec<Commit>, VcError> {
        let mut walk = Ancestors::new(self, id.clone(), true);
        let mut commits = Vec::new();
        while let Some((commit, _)) = walk.next_commit().await? {
            commits.push(commit);
        }
        debug!(commit = %id, len = commits.len(), "History resolved");
        Ok(commits)
    }

    /// Whether `ancestor` is reachable from `descendant`; a commit counts as its own ancestor
    pub async fn is_ancestor(
        &self,
        ancestor: &Address,
        descendant: &Address,
    ) -> Result<bool, VcError> {
        let mut walk = Ancestors::new(self, descendant.clone(), true);
        while let Some((commit, _)) = walk.next_commit().await? {
            if commit.id == *ancestor {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Best common ancestor of two commits, `None` for disjoint histories
    pub async fn lowest_common_ancestor(
        &self,
        a: &Address,
        b: &Address,
    ) -> Result<Option<Address>, VcError> {
        ancestry::lowest_common_ancestor(self, a, b).await
    }
}
