//! Atomic read-modify-write on top of versioned compare-and-swap.
//!
//! [`update_location`] and [`update_user`] read a record, hand a copy to the
//! caller's mutator, and write it back conditioned on the version that was
//! read. If another writer got there first the store reports `Conflict` and
//! the whole cycle runs again against the fresh record, up to
//! `max_attempts` times. The mutator may therefore run more than once and
//! must derive its decision from the record alone.

use crate::{Location, LocationStore, StoreError, User, UserStore, Versioned};
use cleanchain_types::{LocationId, WalletId};
use tracing::{debug, warn};

/// What the mutator decided.
#[derive(Debug)]
pub enum Mutation<R> {
    /// Persist the mutated record and return `R`.
    Write(R),
    /// Discard any changes and return `R` without writing.
    Skip(R),
}

/// Atomically update one location.
pub fn update_location<R, F>(
    store: &dyn LocationStore,
    id: &LocationId,
    max_attempts: u32,
    mutate: F,
) -> Result<R, StoreError>
where
    F: FnMut(&mut Location) -> Mutation<R>,
{
    retry_cas(
        id.as_str(),
        max_attempts,
        || store.get_location(id),
        |version, location| store.compare_and_swap_location(version, location),
        mutate,
    )
}

/// Atomically update one user.
pub fn update_user<R, F>(
    store: &dyn UserStore,
    id: &WalletId,
    max_attempts: u32,
    mutate: F,
) -> Result<R, StoreError>
where
    F: FnMut(&mut User) -> Mutation<R>,
{
    retry_cas(
        id.as_str(),
        max_attempts,
        || store.get_user(id),
        |version, user| store.compare_and_swap_user(version, user),
        mutate,
    )
}

fn retry_cas<T, R>(
    key: &str,
    max_attempts: u32,
    mut read: impl FnMut() -> Result<Versioned<T>, StoreError>,
    mut write: impl FnMut(u64, &T) -> Result<u64, StoreError>,
    mut mutate: impl FnMut(&mut T) -> Mutation<R>,
) -> Result<R, StoreError> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let Versioned { version, mut value } = read()?;
        let result = match mutate(&mut value) {
            Mutation::Skip(result) => return Ok(result),
            Mutation::Write(result) => result,
        };
        match write(version, &value) {
            Ok(_) => return Ok(result),
            Err(StoreError::Conflict(_)) if attempt < max_attempts => {
                debug!(key, attempt, "version conflict, retrying update");
            }
            Err(e) => {
                if e.is_conflict() {
                    warn!(key, attempts = attempt, "update abandoned after repeated conflicts");
                }
                return Err(e);
            }
        }
    }
}
