//! Content store
//!
//! Content-addressed storage over the replicated store. Raw blobs are addressed by the
//! hash of their bytes; typed records by the hash of their canonical encoding.
//! Storing the same bytes twice returns the same address and writes nothing new.

use crate::content::Content;
use crate::entry::codec::{address_of, decode_record, encode_record, verify};
use crate::entry::{EntryType, Record};
use crate::error::VcError;
use crate::provenance::{check_record, EntryValidator};
use crate::store::ReplicatedStore;
use crate::types::Address;
use std::sync::Arc;
use tracing::debug;

pub struct ContentStore {
    replica: Arc<dyn ReplicatedStore>,
    validator: Arc<dyn EntryValidator>,
}

impl ContentStore {
    pub fn new(replica: Arc<dyn ReplicatedStore>, validator: Arc<dyn EntryValidator>) -> Self {
        Self { replica, validator }
    }

    /// Underlying replica
    pub fn replica(&self) -> &Arc<dyn ReplicatedStore> {
        &self.replica
    }

    pub fn validator(&self) -> &Arc<dyn EntryValidator> {
        &self.validator
    }

    /// Store raw bytes, returning their address
    pub async fn put(&self, bytes: &[u8]) -> Result<Address, VcError> {
        let address = address_of(bytes);
        self.replica.put_entry(&address, bytes.to_vec()).await?;
        debug!(address = %address, size = bytes.len(), "Stored blob");
        Ok(address)
    }

    /// Fetch bytes by address.
    ///
    /// `NotFound` means this replica has not seen the address yet; it may exist elsewhere.
    pub async fn get(&self, address: &Address) -> Result<Vec<u8>, VcError> {
        let bytes = self
            .replica
            .get_entry(address)
            .await?
            .ok_or_else(|| VcError::NotFound(address.clone()))?;
        verify(address, &bytes)?;
        Ok(bytes)
    }

    pub async fn contains(&self, address: &Address) -> Result<bool, VcError> {
        Ok(self.replica.get_entry(address).await?.is_some())
    }

    /// Validate, encode and store a typed record
    pub async fn put_record(&self, record: &Record) -> Result<Address, VcError> {
        let bytes = encode_record(record)?;
        let address = address_of(&bytes);
        check_record(self.validator.as_ref(), &address, record)?;
        self.replica.put_entry(&address, bytes).await?;
        debug!(address = %address, kind = %record.entry_type(), "Stored record");
        Ok(address)
    }

    /// Fetch and decode a typed record
    pub async fn get_record(&self, address: &Address) -> Result<Record, VcError> {
        let bytes = self.get(address).await?;
        match decode_record(&bytes) {
            Some(record) => record.map_err(|e| VcError::InvalidEntry {
                address: address.clone(),
                reason: e.to_string(),
            }),
            None => Err(VcError::InvalidEntry {
                address: address.clone(),
                reason: "opaque blob, not a typed entry".to_string(),
            }),
        }
    }

    pub async fn put_content(&self, content: &Content) -> Result<Address, VcError> {
        self.put_record(&Record::Content(content.clone())).await
    }

    pub async fn get_content(&self, address: &Address) -> Result<Content, VcError> {
        match self.get_record(address).await? {
            Record::Content(content) => Ok(content),
            other => Err(VcError::UnexpectedEntryType {
                address: address.clone(),
                found: other.entry_type(),
                expected: vec![EntryType::Content],
            }),
        }
    }
}
