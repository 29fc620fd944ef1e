//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tracing::info;

use crate::location::LmdbLocationStore;
use crate::user::LmdbUserStore;
use crate::LmdbError;

/// Named databases opened in every environment.
pub(crate) const LOCATIONS_DB: &str = "locations";
pub(crate) const USERS_DB: &str = "users";

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    locations_db: Database<Bytes, Bytes>,
    users_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process per path and is
        // never memory-mapped by another handle in this process.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let locations_db = env.create_database(&mut wtxn, Some(LOCATIONS_DB))?;
        let users_db = env.create_database(&mut wtxn, Some(USERS_DB))?;
        wtxn.commit()?;

        info!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            locations_db,
            users_db,
        })
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    pub fn location_store(&self) -> LmdbLocationStore {
        LmdbLocationStore {
            env: Arc::clone(&self.env),
            locations_db: self.locations_db,
        }
    }

    pub fn user_store(&self) -> LmdbUserStore {
        LmdbUserStore {
            env: Arc::clone(&self.env),
            users_db: self.users_db,
        }
    }
}
