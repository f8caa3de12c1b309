//! Contexts
//!
//! A context groups perspectives that share one logical history. Its id is the address of
//! `{creator_id, timestamp, nonce}`, so the same agent creating a context at the same
//! timestamp gets the same context back.

pub mod index;

pub use index::ContextIndex;

use crate::types::{Address, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRecord {
    pub creator_id: String,
    pub timestamp: Timestamp,
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub id: Address,
    pub creator_id: String,
    pub timestamp: Timestamp,
    pub nonce: u64,
}

impl Context {
    pub fn from_record(id: Address, record: ContextRecord) -> Self {
        Self {
            id,
            creator_id: record.creator_id,
            timestamp: record.timestamp,
            nonce: record.nonce,
        }
    }
}
