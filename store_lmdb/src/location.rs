//! LMDB implementation of LocationStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use cleanchain_store::{Location, LocationStore, StoreError, Versioned};
use cleanchain_types::LocationId;

use crate::codec;

pub struct LmdbLocationStore {
    pub(crate) env: Arc<Env>,
    pub(crate) locations_db: Database<Bytes, Bytes>,
}

impl LocationStore for LmdbLocationStore {
    fn get_location(&self, id: &LocationId) -> Result<Versioned<Location>, StoreError> {
        Ok(codec::get(&self.env, &self.locations_db, id.as_str())?)
    }

    fn insert_location(&self, location: &Location) -> Result<(), StoreError> {
        Ok(codec::insert(
            &self.env,
            &self.locations_db,
            location.id.as_str(),
            location,
        )?)
    }

    fn compare_and_swap_location(
        &self,
        expected_version: u64,
        location: &Location,
    ) -> Result<u64, StoreError> {
        Ok(codec::compare_and_swap(
            &self.env,
            &self.locations_db,
            location.id.as_str(),
            expected_version,
            location,
        )?)
    }

    fn list_locations(&self) -> Result<Vec<Location>, StoreError> {
        Ok(codec::list(&self.env, &self.locations_db)?)
    }
}
