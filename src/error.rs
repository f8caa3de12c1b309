//! Error types for the version-control substrate.

use crate::entry::EntryType;
use crate::types::{Address, Hash};
use thiserror::Error;

/// Replica and codec errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    pub(crate) fn hash_mismatch(expected: &Address, actual: &Hash) -> Self {
        StorageError::HashMismatch {
            expected: expected.to_string(),
            actual: hex::encode(actual),
        }
    }
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Codec(err.to_string())
    }
}

/// Domain errors surfaced by every component.
///
/// `Clone` so that one in-flight fetch can hand the same failure to every coalesced caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VcError {
    #[error("Not found on this replica: {0}")]
    NotFound(Address),

    #[error("Commit references unknown parent {parent}")]
    DanglingParent { parent: Address },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Histories of {from} and {to} share no common ancestor")]
    UnrelatedHistories { from: Address, to: Address },

    #[error("Merge conflict at: {}", .paths.join(", "))]
    MergeConflict { paths: Vec<String> },

    #[error("{what} did not converge after {attempts} attempts")]
    ConsistencyTimeout { what: String, attempts: u32 },

    #[error("Head of {perspective} was overwritten by a concurrent writer (now {observed})")]
    StaleWrite {
        perspective: Address,
        observed: Address,
    },

    #[error("Entry {address} is a {found}, expected one of {expected:?}")]
    UnexpectedEntryType {
        address: Address,
        found: EntryType,
        expected: Vec<EntryType>,
    },

    #[error("Perspective {0} has no head yet")]
    EmptyPerspective(Address),

    #[error("Invalid entry at {address}: {reason}")]
    InvalidEntry { address: Address, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl VcError {
    /// Whether a retry may observe a different outcome
    pub fn is_transient(&self) -> bool {
        matches!(self, VcError::NotFound(_))
    }
}

impl From<StorageError> for VcError {
    fn from(err: StorageError) -> Self {
        VcError::Storage(err.to_string())
    }
}

impl From<config::ConfigError> for VcError {
    fn from(err: config::ConfigError) -> Self {
        VcError::ConfigError(err.to_string())
    }
}
