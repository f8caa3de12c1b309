//! Canonical encoding of records and address computation
//!
//! Address = BLAKE3(bytes), rendered as lowercase hex. Typed records are encoded as
//! `ENTRY_MAGIC || bincode(Record)`; anything without the prefix is an opaque blob.

use crate::entry::Record;
use crate::error::StorageError;
use crate::types::{Address, Hash};
use blake3::Hasher;

const ENTRY_MAGIC: &[u8; 8] = b"UPRTCL\x00\x01";

/// Encode a record into its canonical byte form
pub fn encode_record(record: &Record) -> Result<Vec<u8>, StorageError> {
    let body = bincode::serialize(record)?;
    let mut bytes = Vec::with_capacity(ENTRY_MAGIC.len() + body.len());
    bytes.extend_from_slice(ENTRY_MAGIC);
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// Decode a typed record.
///
/// Returns `None` for opaque blobs (no magic prefix).
pub fn decode_record(bytes: &[u8]) -> Option<Result<Record, StorageError>> {
    let body = bytes.strip_prefix(ENTRY_MAGIC.as_slice())?;
    Some(bincode::deserialize(body).map_err(StorageError::from))
}

/// Hash arbitrary bytes
pub fn compute_hash(bytes: &[u8]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    *hasher.finalize().as_bytes()
}

/// Address of a byte string
pub fn address_of(bytes: &[u8]) -> Address {
    Address::from_hash(&compute_hash(bytes))
}

/// Address of a record's canonical encoding
pub fn record_address(record: &Record) -> Result<Address, StorageError> {
    Ok(address_of(&encode_record(record)?))
}

/// Re-hash fetched bytes and compare against the address they were stored under
pub fn verify(address: &Address, bytes: &[u8]) -> Result<(), StorageError> {
    let actual = compute_hash(bytes);
    if Address::from_hash(&actual) != *address {
        return Err(StorageError::hash_mismatch(address, &actual));
    }
    Ok(())
}
