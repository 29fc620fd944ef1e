//! LMDB implementation of UserStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use cleanchain_store::{StoreError, User, UserStore, Versioned};
use cleanchain_types::WalletId;

use crate::codec;

pub struct LmdbUserStore {
    pub(crate) env: Arc<Env>,
    pub(crate) users_db: Database<Bytes, Bytes>,
}

impl UserStore for LmdbUserStore {
    fn get_user(&self, id: &WalletId) -> Result<Versioned<User>, StoreError> {
        Ok(codec::get(&self.env, &self.users_db, id.as_str())?)
    }

    fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        Ok(codec::insert(&self.env, &self.users_db, user.id.as_str(), user)?)
    }

    fn compare_and_swap_user(&self, expected_version: u64, user: &User) -> Result<u64, StoreError> {
        Ok(codec::compare_and_swap(
            &self.env,
            &self.users_db,
            user.id.as_str(),
            expected_version,
            user,
        )?)
    }
}
