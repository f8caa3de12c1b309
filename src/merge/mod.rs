//! Merge Engine
//!
//! Reconciles two perspectives. The `to` perspective's head moves to the result: the `from`
//! head itself for a fast-forward, or a new commit with parents `[to_head, from_head]` whose
//! content is the three-way merge of both heads against their best common ancestor.

pub mod three_way;

use crate::clock::MonotonicClock;
use crate::commit::{CommitGraph, CommitRecord};
use crate::consistency::{retry_transient, ReadPolicy};
use crate::content::ContentStore;
use crate::error::VcError;
use crate::perspective::{is_root_sentinel, PerspectiveRegistry};
use crate::types::Address;
use serde::Serialize;
use std::sync::Arc;
use three_way::ContentMerger;
use tracing::info;

/// How a merge was resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "head", rename_all = "snake_case")]
pub enum MergeOutcome {
    /// `to` already contains `from`; nothing changed
    UpToDate(Address),
    /// `to` was an ancestor of `from` and now points at it
    FastForward(Address),
    /// A merge commit was created
    Merged(Address),
}

impl MergeOutcome {
    /// Head of the `to` perspective after the merge
    pub fn head(&self) -> &Address {
        match self {
            MergeOutcome::UpToDate(head)
            | MergeOutcome::FastForward(head)
            | MergeOutcome::Merged(head) => head,
        }
    }
}

pub struct MergeEngine {
    store: Arc<ContentStore>,
    graph: Arc<CommitGraph>,
    registry: Arc<PerspectiveRegistry>,
    clock: Arc<MonotonicClock>,
    policy: ReadPolicy,
}

impl MergeEngine {
    pub fn new(
        store: Arc<ContentStore>,
        graph: Arc<CommitGraph>,
        registry: Arc<PerspectiveRegistry>,
        clock: Arc<MonotonicClock>,
        policy: ReadPolicy,
    ) -> Self {
        Self {
            store,
            graph,
            registry,
            clock,
            policy,
        }
    }

    /// Merge `from` into `to`, returning the new head of `to`
    pub async fn merge(&self, from: &Address, to: &Address) -> Result<Address, VcError> {
        Ok(self.merge_perspectives(from, to).await?.head().clone())
    }

    pub async fn merge_perspectives(
        &self,
        from: &Address,
        to: &Address,
    ) -> Result<MergeOutcome, VcError> {
        let from_head = self.resolve_head(from).await?;
        let to_head = self.resolve_head(to).await?;

        let outcome = self
            .merge_heads(from, to, &from_head, &to_head)
            .await?;
        match &outcome {
            MergeOutcome::UpToDate(_) => {}
            MergeOutcome::FastForward(head) | MergeOutcome::Merged(head) => {
                self.registry.update_head(to, head).await?
            }
        }

        info!(from = %from, to = %to, outcome = ?outcome, "Merge finished");
        Ok(outcome)
    }

    async fn merge_heads(
        &self,
        from: &Address,
        to: &Address,
        from_head: &Address,
        to_head: &Address,
    ) -> Result<MergeOutcome, VcError> {
        if from_head == to_head {
            return Ok(MergeOutcome::UpToDate(to_head.clone()));
        }

        let ancestor = self
            .graph
            .lowest_common_ancestor(from_head, to_head)
            .await?
            .ok_or_else(|| VcError::UnrelatedHistories {
                from: from.clone(),
                to: to.clone(),
            })?;

        if ancestor == *to_head {
            return Ok(MergeOutcome::FastForward(from_head.clone()));
        }
        if ancestor == *from_head {
            return Ok(MergeOutcome::UpToDate(to_head.clone()));
        }

        let from_commit = self.graph.get_commit_with_retry(from_head).await?;
        let to_commit = self.graph.get_commit_with_retry(to_head).await?;
        let content_id = if from_commit.content_id == to_commit.content_id {
            to_commit.content_id.clone()
        } else {
            let base = self.graph.get_commit_with_retry(&ancestor).await?;
            ContentMerger::new(&self.store, &self.policy)
                .merge_root(&from_commit.content_id, &to_commit.content_id, &base.content_id)
                .await?
        };

        let from_name = self.registry.get_record(from).await?.name;
        let to_name = self.registry.get_record(to).await?.name;
        let record = CommitRecord::new(
            content_id,
            vec![to_head.clone(), from_head.clone()],
            format!("merge {} into {}", from_name, to_name),
            self.registry.creator_id(),
            self.clock.now(),
        );
        let commit = self.graph.create_commit(record).await?;
        Ok(MergeOutcome::Merged(commit))
    }

    async fn resolve_head(&self, perspective: &Address) -> Result<Address, VcError> {
        let head = retry_transient(&self.policy, "perspective head", || {
            self.registry.get_head(perspective)
        })
        .await?;
        if is_root_sentinel(&head) {
            return Err(VcError::EmptyPerspective(perspective.clone()));
        }
        Ok(head)
    }
}
