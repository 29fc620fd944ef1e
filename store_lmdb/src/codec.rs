//! Record encoding shared by the location and user stores.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};
use serde::de::DeserializeOwned;
use serde::Serialize;

use cleanchain_store::Versioned;

use crate::LmdbError;

pub(crate) fn encode<T: Serialize>(record: &Versioned<T>) -> Result<Vec<u8>, LmdbError> {
    Ok(bincode::serialize(record)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<Versioned<T>, LmdbError> {
    Ok(bincode::deserialize(bytes)?)
}

pub(crate) fn get<T: DeserializeOwned>(
    env: &Arc<Env>,
    db: &Database<Bytes, Bytes>,
    key: &str,
) -> Result<Versioned<T>, LmdbError> {
    let rtxn = env.read_txn()?;
    let bytes = db
        .get(&rtxn, key.as_bytes())?
        .ok_or_else(|| LmdbError::NotFound(key.to_string()))?;
    decode(bytes)
}

/// Insert at version 1, refusing to overwrite.
pub(crate) fn insert<T: Serialize>(
    env: &Arc<Env>,
    db: &Database<Bytes, Bytes>,
    key: &str,
    value: &T,
) -> Result<(), LmdbError> {
    let mut wtxn = env.write_txn()?;
    if db.get(&wtxn, key.as_bytes())?.is_some() {
        return Err(LmdbError::Duplicate(key.to_string()));
    }
    let bytes = encode(&Versioned::new(1, value))?;
    db.put(&mut wtxn, key.as_bytes(), &bytes)?;
    wtxn.commit()?;
    Ok(())
}

/// Read the stored version and write the new record inside one write
/// transaction. Dropping the transaction on any early return aborts it.
pub(crate) fn compare_and_swap<T: Serialize + DeserializeOwned>(
    env: &Arc<Env>,
    db: &Database<Bytes, Bytes>,
    key: &str,
    expected_version: u64,
    value: &T,
) -> Result<u64, LmdbError> {
    let mut wtxn = env.write_txn()?;
    let current_version = {
        let bytes = db
            .get(&wtxn, key.as_bytes())?
            .ok_or_else(|| LmdbError::NotFound(key.to_string()))?;
        decode::<T>(bytes)?.version
    };
    if current_version != expected_version {
        return Err(LmdbError::Conflict(key.to_string()));
    }
    let next_version = current_version + 1;
    let bytes = encode(&Versioned::new(next_version, value))?;
    db.put(&mut wtxn, key.as_bytes(), &bytes)?;
    wtxn.commit()?;
    Ok(next_version)
}

pub(crate) fn list<T: DeserializeOwned>(
    env: &Arc<Env>,
    db: &Database<Bytes, Bytes>,
) -> Result<Vec<T>, LmdbError> {
    let rtxn = env.read_txn()?;
    let mut records = Vec::new();
    for entry in db.iter(&rtxn)? {
        let (_key, bytes) = entry?;
        records.push(decode::<T>(bytes)?.value);
    }
    Ok(records)
}
