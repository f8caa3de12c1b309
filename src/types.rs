//! Shared identifier and time types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// BLAKE3 digest
pub type Hash = [u8; 32];

/// Milliseconds since the Unix epoch
pub type Timestamp = u64;

/// Opaque identifier for anything held by the replicated store.
///
/// Content-derived addresses are the lowercase hex rendering of a BLAKE3 digest.
/// Addresses handed in by callers (proxy addresses, external data ids) are kept verbatim.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(value: impl Into<String>) -> Self {
        Address(value.into())
    }

    pub fn from_hash(hash: &Hash) -> Self {
        Address(hex::encode(hash))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 characters, for log lines and tables
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(12)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short())
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Address(value.to_string())
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Address(value)
    }
}

/// Current wall-clock time in milliseconds
pub fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
