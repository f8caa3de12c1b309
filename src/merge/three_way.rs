//! Three-way content merge
//!
//! Every value (a payload, a named link target, a content id) resolves against the common
//! ancestor's value: unchanged keeps it, a change on one side wins, the same change on both
//! sides is taken once, and anything else conflicts. Links changed on both sides to two
//! different live targets are merged recursively into a new content object.

use crate::consistency::{retry_transient, ReadPolicy};
use crate::content::{Content, ContentStore, Link};
use crate::error::VcError;
use crate::types::Address;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use tracing::debug;

/// Outcome of resolving one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    /// Merged value, `None` when the merge deletes it
    Resolved(Option<T>),
    Conflict,
}

/// Resolve one value given its state on both sides and in the common ancestor
pub fn resolve<T: PartialEq + Clone>(
    from: Option<&T>,
    to: Option<&T>,
    base: Option<&T>,
) -> Resolution<T> {
    if from == to {
        Resolution::Resolved(to.cloned())
    } else if base == from {
        Resolution::Resolved(to.cloned())
    } else if base == to {
        Resolution::Resolved(from.cloned())
    } else {
        Resolution::Conflict
    }
}

pub(crate) fn child_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Name -> target, first occurrence wins
fn link_index(content: Option<&Content>) -> HashMap<&str, &Address> {
    let mut index = HashMap::new();
    if let Some(content) = content {
        for link in &content.links {
            index.entry(link.name.as_str()).or_insert(&link.address);
        }
    }
    index
}

/// Merges content trees, collecting every conflicting path
pub(crate) struct ContentMerger<'a> {
    store: &'a ContentStore,
    policy: &'a ReadPolicy,
    conflicts: Vec<String>,
}

impl<'a> ContentMerger<'a> {
    pub(crate) fn new(store: &'a ContentStore, policy: &'a ReadPolicy) -> Self {
        Self {
            store,
            policy,
            conflicts: Vec::new(),
        }
    }

    /// Merge the content ids of two commits against their ancestor's.
    ///
    /// Fails with `MergeConflict` naming every conflicting path, sorted.
    pub(crate) async fn merge_root(
        mut self,
        from: &Address,
        to: &Address,
        base: &Address,
    ) -> Result<Address, VcError> {
        let merged = self
            .merge_address("/".to_string(), Some(from), Some(to), Some(base))
            .await?;

        if !self.conflicts.is_empty() {
            let mut paths = self.conflicts;
            paths.sort();
            paths.dedup();
            debug!(?paths, "Content merge conflicted");
            return Err(VcError::MergeConflict { paths });
        }
        merged.ok_or_else(|| VcError::MergeConflict {
            paths: vec!["/".to_string()],
        })
    }

    /// Resolve one address; recurse into both contents when both sides changed it
    fn merge_address<'b>(
        &'b mut self,
        path: String,
        from: Option<&'b Address>,
        to: Option<&'b Address>,
        base: Option<&'b Address>,
    ) -> BoxFuture<'b, Result<Option<Address>, VcError>>
    where
        'a: 'b,
    {
        async move {
            match resolve(from, to, base) {
                Resolution::Resolved(address) => Ok(address),
                Resolution::Conflict => match (from, to) {
                    (Some(from), Some(to)) => {
                        self.merge_contents(path, from, to, base).await.map(Some)
                    }
                    // Deleted on one side, modified on the other
                    _ => {
                        self.conflicts.push(path);
                        Ok(to.cloned())
                    }
                },
            }
        }
        .boxed()
    }

    async fn merge_contents(
        &mut self,
        path: String,
        from: &Address,
        to: &Address,
        base: Option<&Address>,
    ) -> Result<Address, VcError> {
        let from_content = self.fetch(from).await?;
        let to_content = self.fetch(to).await?;
        let base_content = match base {
            Some(base) => self.fetch(base).await?,
            None => None,
        };

        // Opaque data on either side cannot be merged structurally.
        let (Some(from_content), Some(to_content)) = (from_content, to_content) else {
            self.conflicts.push(path);
            return Ok(to.clone());
        };

        let conflicts_before = self.conflicts.len();
        let payload = match resolve(
            Some(&from_content.payload),
            Some(&to_content.payload),
            base_content.as_ref().map(|c| &c.payload),
        ) {
            Resolution::Resolved(payload) => payload.unwrap_or_default(),
            Resolution::Conflict => {
                self.conflicts.push(path.clone());
                to_content.payload.clone()
            }
        };

        let from_links = link_index(Some(&from_content));
        let to_links = link_index(Some(&to_content));
        let base_links = link_index(base_content.as_ref());

        let mut names: Vec<&str> = Vec::new();
        for link in to_content.links.iter().chain(from_content.links.iter()) {
            if !names.contains(&link.name.as_str()) {
                names.push(link.name.as_str());
            }
        }

        let mut links = Vec::new();
        for name in names {
            let merged = self
                .merge_address(
                    child_path(&path, name),
                    from_links.get(name).copied(),
                    to_links.get(name).copied(),
                    base_links.get(name).copied(),
                )
                .await?;
            if let Some(address) = merged {
                links.push(Link::new(name, address));
            }
        }

        if self.conflicts.len() > conflicts_before {
            return Ok(to.clone());
        }

        let merged = Content::new(payload, links);
        let address = self.store.put_content(&merged).await?;
        debug!(path = %path, address = %address, "Merged content");
        Ok(address)
    }

    /// Typed content at `address`, `None` if the address holds something else
    async fn fetch(&self, address: &Address) -> Result<Option<Content>, VcError> {
        match retry_transient(self.policy, "content", || self.store.get_content(address)).await {
            Ok(content) => Ok(Some(content)),
            Err(VcError::InvalidEntry { .. }) | Err(VcError::UnexpectedEntryType { .. }) => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
