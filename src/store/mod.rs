//! Replicated Store
//!
//! Key-value content service the version-control components are built on. The store is
//! eventually consistent: a write resolves once one replica accepted it, and a later read
//! (even by the same caller) may still observe older state.
//!
//! Three concerns share the service:
//! - immutable entries keyed by address
//! - mutable pointers (perspective head, perspective context), last write wins
//! - tagged link lists from one address to many (context -> perspectives)

pub mod lagging;
pub mod memory;
pub mod persistence;

pub use lagging::LaggingReplica;
pub use memory::MemoryReplica;
pub use persistence::SledReplica;

use crate::error::StorageError;
use crate::types::Address;
use async_trait::async_trait;
use std::fmt;

/// Link tag from a context to the perspectives grouped under it
pub const PERSPECTIVES_TAG: &str = "perspectives";

/// Link tag from an agent to the contexts it created
pub const CREATED_CONTEXTS_TAG: &str = "created_contexts";

/// Mutable pointer kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Head,
    Context,
    /// Uncommitted draft in an author's workspace for one entry
    Draft,
}

impl fmt::Display for PointerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerKind::Head => f.write_str("head"),
            PointerKind::Context => f.write_str("context"),
            PointerKind::Draft => f.write_str("draft"),
        }
    }
}

/// Key of a mutable pointer: (kind, owning perspective or workspace)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PointerKey {
    pub kind: PointerKind,
    pub owner: Address,
}

impl PointerKey {
    pub fn head(owner: &Address) -> Self {
        Self {
            kind: PointerKind::Head,
            owner: owner.clone(),
        }
    }

    pub fn context(owner: &Address) -> Self {
        Self {
            kind: PointerKind::Context,
            owner: owner.clone(),
        }
    }

    pub fn draft(workspace: &Address) -> Self {
        Self {
            kind: PointerKind::Draft,
            owner: workspace.clone(),
        }
    }

    /// Flat key used by backends that store pointers in a single keyspace
    pub fn storage_key(&self) -> String {
        format!("{}:{}", self.kind, self.owner)
    }
}

/// Replicated store interface
#[async_trait]
pub trait ReplicatedStore: Send + Sync {
    /// Store immutable bytes under their address. Storing the same address twice is a no-op.
    async fn put_entry(&self, address: &Address, bytes: Vec<u8>) -> Result<(), StorageError>;

    /// Fetch an entry, `None` if this replica has not seen it (yet).
    async fn get_entry(&self, address: &Address) -> Result<Option<Vec<u8>>, StorageError>;

    /// Overwrite a pointer unconditionally.
    async fn set_pointer(&self, key: &PointerKey, target: &Address) -> Result<(), StorageError>;

    async fn get_pointer(&self, key: &PointerKey) -> Result<Option<Address>, StorageError>;

    /// Add `target` to the link list of `(source, tag)`; adding an existing link is a no-op.
    async fn add_link(
        &self,
        source: &Address,
        tag: &str,
        target: &Address,
    ) -> Result<(), StorageError>;

    async fn remove_link(
        &self,
        source: &Address,
        tag: &str,
        target: &Address,
    ) -> Result<(), StorageError>;

    /// Link targets in insertion order
    async fn get_links(&self, source: &Address, tag: &str) -> Result<Vec<Address>, StorageError>;
}
