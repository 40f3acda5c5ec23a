//! Binary key layouts.
//!
//! - `records_db`: `id_be_u64(8)` → bincode `Record`. Big-endian ids sort numerically.
//! - `votes_db`: `id_be_u64(8) ++ voter_bytes` → `category_code(1)`.
//!   Prefix scan on the id yields every vote on a record.
//! - `creators_db`: `creator_len_be_u16(2) ++ creator_bytes ++ id_be_u64(8)` → empty.
//!   The length prefix keeps one creator's keys from being a prefix of another's;
//!   ids are monotonic so a prefix scan returns submission order.
//! - `meta_db`: utf-8 key → little-endian integer or raw bytes.

use tally_types::{AccountId, RecordId};

use crate::LmdbError;

pub const COUNTER_KEY: &str = "catalog_counter";
pub const SCHEMA_VERSION_KEY: &str = "schema_version";

pub fn record_key(id: RecordId) -> [u8; 8] {
    id.to_be_bytes()
}

/// Largest key LMDB accepts with its default page size.
pub const MAX_KEY_LEN: usize = 511;

const _: () = assert!(2 + AccountId::MAX_LEN + 8 <= MAX_KEY_LEN);

/// The account's bytes, refusing identities too long to key a database.
fn account_bytes(account: &AccountId) -> Result<&[u8], LmdbError> {
    account
        .check_len()
        .map_err(|e| LmdbError::Serialization(e.to_string()))?;
    Ok(account.as_bytes())
}

pub fn vote_key(record: RecordId, voter: &AccountId) -> Result<Vec<u8>, LmdbError> {
    let bytes = account_bytes(voter)?;
    let mut key = Vec::with_capacity(8 + bytes.len());
    key.extend_from_slice(&record.to_be_bytes());
    key.extend_from_slice(bytes);
    Ok(key)
}

pub fn vote_prefix(record: RecordId) -> [u8; 8] {
    record.to_be_bytes()
}

pub fn creator_prefix(creator: &AccountId) -> Result<Vec<u8>, LmdbError> {
    let bytes = account_bytes(creator)?;
    // Bounded by AccountId::MAX_LEN, so the length fits a u16.
    let len = bytes.len() as u16;
    let mut key = Vec::with_capacity(2 + bytes.len() + 8);
    key.extend_from_slice(&len.to_be_bytes());
    key.extend_from_slice(bytes);
    Ok(key)
}

pub fn creator_key(creator: &AccountId, id: RecordId) -> Result<Vec<u8>, LmdbError> {
    let mut key = creator_prefix(creator)?;
    key.extend_from_slice(&id.to_be_bytes());
    Ok(key)
}

/// Decode the 8-byte big-endian id at the start of a record or vote key.
pub fn id_from_prefix(key: &[u8]) -> Result<RecordId, LmdbError> {
    let arr: [u8; 8] = key
        .get(..8)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| LmdbError::Serialization("key shorter than a record id".into()))?;
    Ok(RecordId::from_be_bytes(arr))
}

/// Decode the 8-byte big-endian id at the end of a creator key.
pub fn id_from_suffix(key: &[u8]) -> Result<RecordId, LmdbError> {
    let start = key
        .len()
        .checked_sub(8)
        .ok_or_else(|| LmdbError::Serialization("key shorter than a record id".into()))?;
    id_from_prefix(&key[start..])
}

/// Decode the voter from a vote key.
pub fn voter_from_vote_key(key: &[u8]) -> Result<AccountId, LmdbError> {
    let raw = key
        .get(8..)
        .ok_or_else(|| LmdbError::Serialization("vote key shorter than a record id".into()))?;
    let voter = std::str::from_utf8(raw).map_err(|e| LmdbError::Serialization(e.to_string()))?;
    Ok(AccountId::new(voter))
}
