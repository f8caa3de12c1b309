//! Entries
//!
//! Closed set of entity kinds held by the replicated store. Every cached or fetched
//! entity is one `Entry` variant; callers branch on `EntryType` instead of probing.

pub mod codec;

use crate::commit::{Commit, CommitRecord};
use crate::content::Content;
use crate::context::{Context, ContextRecord};
use crate::perspective::{Perspective, PerspectiveRecord};
use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Context,
    Perspective,
    Commit,
    Content,
}

impl EntryType {
    pub const ALL: [EntryType; 4] = [
        EntryType::Context,
        EntryType::Perspective,
        EntryType::Commit,
        EntryType::Content,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Context => "context",
            EntryType::Perspective => "perspective",
            EntryType::Commit => "commit",
            EntryType::Content => "content",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content object together with its address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub id: Address,
    #[serde(flatten)]
    pub content: Content,
}

/// A resolved entity, serialized as `{ "type": ..., "entry": ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "entry", rename_all = "lowercase")]
pub enum Entry {
    Context(Context),
    Perspective(Perspective),
    Commit(Commit),
    Content(ContentEntry),
}

impl Entry {
    pub fn id(&self) -> &Address {
        match self {
            Entry::Context(context) => &context.id,
            Entry::Perspective(perspective) => &perspective.id,
            Entry::Commit(commit) => &commit.id,
            Entry::Content(content) => &content.id,
        }
    }

    pub fn entry_type(&self) -> EntryType {
        match self {
            Entry::Context(_) => EntryType::Context,
            Entry::Perspective(_) => EntryType::Perspective,
            Entry::Commit(_) => EntryType::Commit,
            Entry::Content(_) => EntryType::Content,
        }
    }
}

/// Immutable, content-addressed form of each entity as written to the replica.
///
/// Perspectives are stored as their immutable record only; head and context are
/// registry pointers keyed by the record's address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    Context(ContextRecord),
    Perspective(PerspectiveRecord),
    Commit(CommitRecord),
    Content(Content),
}

impl Record {
    pub fn entry_type(&self) -> EntryType {
        match self {
            Record::Context(_) => EntryType::Context,
            Record::Perspective(_) => EntryType::Perspective,
            Record::Commit(_) => EntryType::Commit,
            Record::Content(_) => EntryType::Content,
        }
    }

    /// Identity of the agent that authored the record, if the kind carries one
    pub fn creator_id(&self) -> Option<&str> {
        match self {
            Record::Context(context) => Some(&context.creator_id),
            Record::Perspective(perspective) => Some(&perspective.creator_id),
            Record::Commit(commit) => Some(&commit.creator_id),
            Record::Content(_) => None,
        }
    }
}
