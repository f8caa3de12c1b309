//! Provenance gate
//!
//! Every write is offered to an `EntryValidator` before it reaches the replica. The gate
//! is pass/fail only: a rejection aborts the write with `ValidationFailed`.

use crate::entry::Record;
use crate::error::VcError;
use crate::store::PointerKey;
use crate::types::Address;
use std::collections::HashSet;
use tracing::warn;

/// Write validation hook
pub trait EntryValidator: Send + Sync {
    /// Validate an immutable record about to be stored at `address`
    fn validate_record(&self, address: &Address, record: &Record) -> Result<(), String>;

    /// Validate a pointer update issued by `author`
    fn validate_pointer(
        &self,
        _key: &PointerKey,
        _target: &Address,
        _author: &str,
    ) -> Result<(), String> {
        Ok(())
    }
}

/// Accepts every write
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl EntryValidator for AcceptAll {
    fn validate_record(&self, _address: &Address, _record: &Record) -> Result<(), String> {
        Ok(())
    }
}

/// Accepts records and pointer updates authored by a fixed set of agents.
///
/// Content objects carry no author and always pass.
#[derive(Debug, Clone, Default)]
pub struct CreatorAllowList {
    allowed: HashSet<String>,
}

impl CreatorAllowList {
    pub fn new<I, S>(creators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: creators.into_iter().map(Into::into).collect(),
        }
    }

    fn check(&self, author: &str) -> Result<(), String> {
        if self.allowed.contains(author) {
            Ok(())
        } else {
            Err(format!("author '{}' is not allowed to write", author))
        }
    }
}

impl EntryValidator for CreatorAllowList {
    fn validate_record(&self, _address: &Address, record: &Record) -> Result<(), String> {
        match record.creator_id() {
            Some(creator) => self.check(creator),
            None => Ok(()),
        }
    }

    fn validate_pointer(
        &self,
        _key: &PointerKey,
        _target: &Address,
        author: &str,
    ) -> Result<(), String> {
        self.check(author)
    }
}

pub(crate) fn check_record(
    validator: &dyn EntryValidator,
    address: &Address,
    record: &Record,
) -> Result<(), VcError> {
    validator.validate_record(address, record).map_err(|reason| {
        warn!(address = %address, kind = %record.entry_type(), %reason, "Write rejected");
        VcError::ValidationFailed(reason)
    })
}

pub(crate) fn check_pointer(
    validator: &dyn EntryValidator,
    key: &PointerKey,
    target: &Address,
    author: &str,
) -> Result<(), VcError> {
    validator
        .validate_pointer(key, target, author)
        .map_err(|reason| {
            warn!(pointer = %key.storage_key(), target = %target, %reason, "Pointer update rejected");
            VcError::ValidationFailed(reason)
        })
}
