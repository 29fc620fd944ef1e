//! Nullable store: thread-safe in-memory storage for testing.

use cleanchain_store::{Location, LocationStore, StoreError, User, UserStore, Versioned};
use cleanchain_types::{LocationId, WalletId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;

/// An in-memory location + user store.
/// Thread-safe for use with tokio's multi-threaded runtime.
///
/// Compare-and-swap is exact: a write presenting a stale version fails with
/// `Conflict` just like the LMDB backend. Tests can additionally force the
/// next N writes to conflict with [`NullStore::inject_conflicts`].
pub struct NullStore {
    locations: Mutex<HashMap<String, Versioned<Location>>>,
    users: Mutex<HashMap<String, Versioned<User>>>,
    injected_conflicts: AtomicU32,
    cas_writes: AtomicU64,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            locations: Mutex::new(HashMap::new()),
            users: Mutex::new(HashMap::new()),
            injected_conflicts: AtomicU32::new(0),
            cas_writes: AtomicU64::new(0),
        }
    }

    /// Make the next `n` compare-and-swap calls (on either collection) fail.
    pub fn inject_conflicts(&self, n: u32) {
        self.injected_conflicts.store(n, Ordering::SeqCst);
    }

    /// Number of compare-and-swap writes that landed.
    pub fn cas_writes(&self) -> u64 {
        self.cas_writes.load(Ordering::SeqCst)
    }

    fn take_injected_conflict(&self) -> bool {
        self.injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn cas<T: Clone>(
        &self,
        map: &Mutex<HashMap<String, Versioned<T>>>,
        key: &str,
        expected_version: u64,
        value: &T,
    ) -> Result<u64, StoreError> {
        if self.take_injected_conflict() {
            return Err(StoreError::Conflict(key.to_string()));
        }
        let mut map = map.lock().unwrap();
        let current = map
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        if current.version != expected_version {
            return Err(StoreError::Conflict(key.to_string()));
        }
        current.version += 1;
        current.value = value.clone();
        self.cas_writes.fetch_add(1, Ordering::SeqCst);
        Ok(current.version)
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

fn insert<T: Clone>(
    map: &Mutex<HashMap<String, Versioned<T>>>,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let mut map = map.lock().unwrap();
    if map.contains_key(key) {
        return Err(StoreError::Duplicate(key.to_string()));
    }
    map.insert(key.to_string(), Versioned::new(1, value.clone()));
    Ok(())
}

impl LocationStore for NullStore {
    fn get_location(&self, id: &LocationId) -> Result<Versioned<Location>, StoreError> {
        self.locations
            .lock()
            .unwrap()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn insert_location(&self, location: &Location) -> Result<(), StoreError> {
        insert(&self.locations, location.id.as_str(), location)
    }

    fn compare_and_swap_location(
        &self,
        expected_version: u64,
        location: &Location,
    ) -> Result<u64, StoreError> {
        self.cas(&self.locations, location.id.as_str(), expected_version, location)
    }

    fn list_locations(&self) -> Result<Vec<Location>, StoreError> {
        let mut all: Vec<Location> = self
            .locations
            .lock()
            .unwrap()
            .values()
            .map(|v| v.value.clone())
            .collect();
        all.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(all)
    }
}

impl UserStore for NullStore {
    fn get_user(&self, id: &WalletId) -> Result<Versioned<User>, StoreError> {
        self.users
            .lock()
            .unwrap()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        insert(&self.users, user.id.as_str(), user)
    }

    fn compare_and_swap_user(&self, expected_version: u64, user: &User) -> Result<u64, StoreError> {
        self.cas(&self.users, user.id.as_str(), expected_version, user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cleanchain_store::{update_location, Mutation};
    use cleanchain_types::{Coordinates, TokenAmount};

    fn location(id: &str) -> Location {
        Location::new(
            LocationId::parse(id).unwrap(),
            "Pier",
            Coordinates::new(40.0, -73.0).unwrap(),
            Some(TokenAmount::new(10)),
        )
    }

    #[test]
    fn stale_version_conflicts() {
        let store = NullStore::new();
        let loc = location("a");
        store.insert_location(&loc).unwrap();
        assert_eq!(store.compare_and_swap_location(1, &loc).unwrap(), 2);
        assert!(store.compare_and_swap_location(1, &loc).unwrap_err().is_conflict());
        assert_eq!(store.get_location(&loc.id).unwrap().version, 2);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let store = NullStore::new();
        store.insert_location(&location("a")).unwrap();
        assert!(matches!(
            store.insert_location(&location("a")),
            Err(StoreError::Duplicate(_))
        ));
    }

    #[test]
    fn injected_conflicts_are_retried_by_update() {
        let store = NullStore::new();
        let loc = location("a");
        store.insert_location(&loc).unwrap();
        store.inject_conflicts(2);

        let mut runs = 0;
        let result = update_location(&store, &loc.id, 5, |l| {
            runs += 1;
            l.name = "Renamed".into();
            Mutation::Write(())
        });
        assert!(result.is_ok());
        assert_eq!(runs, 3);
        assert_eq!(store.cas_writes(), 1);
        assert_eq!(store.get_location(&loc.id).unwrap().value.name, "Renamed");
    }

    #[test]
    fn listing_is_sorted_by_id() {
        let store = NullStore::new();
        for id in ["c", "a", "b"] {
            store.insert_location(&location(id)).unwrap();
        }
        let ids: Vec<String> = store
            .list_locations()
            .unwrap()
            .into_iter()
            .map(|l| l.id.to_string())
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }
}
