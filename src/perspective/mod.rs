//! Perspectives
//!
//! A perspective is a named, mutable pointer to a head commit, optionally grouped under a
//! context. Its identity is the address of an immutable record written once at creation;
//! the head and the context are registry pointers keyed by that address.

pub mod registry;

pub use registry::{NewPerspective, PerspectiveRegistry};

use crate::types::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Head of a perspective created without one
pub const ROOT_SENTINEL: &str = "0000000000000000000000000000000000000000000000000000000000000000";

pub fn root_sentinel() -> Address {
    Address::from(ROOT_SENTINEL)
}

pub fn is_root_sentinel(address: &Address) -> bool {
    address.as_str() == ROOT_SENTINEL
}

/// Where a perspective's head lives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Heads are commits held by this store
    #[default]
    Local,
    /// Heads are proxy addresses resolved elsewhere; not checked on write
    Proxy,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Local => f.write_str("local"),
            Origin::Proxy => f.write_str("proxy"),
        }
    }
}

/// Immutable, hashed part of a perspective
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerspectiveRecord {
    pub name: String,
    pub creator_id: String,
    pub origin: Origin,
    pub created_at: Timestamp,
    pub nonce: u64,
}

/// Perspective record resolved together with its current pointers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Perspective {
    pub id: Address,
    pub name: String,
    pub context_id: Option<Address>,
    pub head_commit_id: Address,
    pub creator_id: String,
    pub origin: Origin,
    pub created_at: Timestamp,
}

impl Perspective {
    pub fn from_record(
        id: Address,
        record: PerspectiveRecord,
        head_commit_id: Address,
        context_id: Option<Address>,
    ) -> Self {
        Self {
            id,
            name: record.name,
            context_id,
            head_commit_id,
            creator_id: record.creator_id,
            origin: record.origin,
            created_at: record.created_at,
        }
    }

    /// Whether the head is still the root sentinel
    pub fn is_empty(&self) -> bool {
        is_root_sentinel(&self.head_commit_id)
    }
}
