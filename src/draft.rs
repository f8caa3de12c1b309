//! Drafts
//!
//! Each author keeps at most one uncommitted `Content` per entry address. The draft body is
//! stored as an ordinary content record; a `draft` pointer owned by the author's workspace
//! for that entry names it. Clearing a draft points the workspace at the root sentinel.

use crate::consistency::{retry_transient, ReadPolicy};
use crate::content::{Content, ContentStore};
use crate::entry::codec::address_of;
use crate::error::VcError;
use crate::perspective::{is_root_sentinel, root_sentinel};
use crate::provenance::check_pointer;
use crate::store::PointerKey;
use crate::types::Address;
use std::sync::Arc;
use tracing::{debug, info};

/// Address of `creator`'s workspace for `entry`; never stored, only used as a pointer owner
pub fn workspace_address(creator: &str, entry: &Address) -> Address {
    address_of(format!("workspace\0{}\0{}", creator, entry).as_bytes())
}

pub struct DraftStore {
    store: Arc<ContentStore>,
    policy: ReadPolicy,
    creator_id: String,
}

impl DraftStore {
    pub fn new(store: Arc<ContentStore>, policy: ReadPolicy, creator_id: impl Into<String>) -> Self {
        Self {
            store,
            policy,
            creator_id: creator_id.into(),
        }
    }

    /// Replace the draft for `entry`, or clear it with `None`
    pub async fn set_draft(&self, entry: &Address, draft: Option<&Content>) -> Result<(), VcError> {
        let target = match draft {
            Some(content) => self.store.put_content(content).await?,
            None => root_sentinel(),
        };
        let key = PointerKey::draft(&workspace_address(&self.creator_id, entry));
        check_pointer(
            self.store.validator().as_ref(),
            &key,
            &target,
            &self.creator_id,
        )?;
        self.store.replica().set_pointer(&key, &target).await?;
        info!(entry = %entry, cleared = draft.is_none(), "Draft updated");
        Ok(())
    }

    /// This author's draft for `entry`, `None` when there is none
    pub async fn get_draft(&self, entry: &Address) -> Result<Option<Content>, VcError> {
        let key = PointerKey::draft(&workspace_address(&self.creator_id, entry));
        let target = match self.store.replica().get_pointer(&key).await? {
            Some(target) if !is_root_sentinel(&target) => target,
            _ => {
                debug!(entry = %entry, "No draft");
                return Ok(None);
            }
        };
        let content =
            retry_transient(&self.policy, "draft", || self.store.get_content(&target)).await?;
        Ok(Some(content))
    }

    pub fn creator_id(&self) -> &str {
        &self.creator_id
    }
}
