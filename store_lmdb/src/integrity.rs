//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the node begins
//! serving requests.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use cleanchain_store::{Location, User, Versioned};
use serde::de::DeserializeOwned;

use crate::environment::{LOCATIONS_DB, USERS_DB};
use crate::LmdbError;

/// Summary of an integrity check run.
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Decode every record in every database.
///
/// Undecodable records and records whose key disagrees with their id are
/// recorded in the report rather than causing a hard error.
pub fn check_integrity(env: &Arc<Env>) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        errors: Vec::new(),
    };
    check_database::<Location>(env, LOCATIONS_DB, |l| l.id.to_string(), &mut report)?;
    check_database::<User>(env, USERS_DB, |u| u.id.to_string(), &mut report)?;
    Ok(report)
}

fn check_database<T: DeserializeOwned>(
    env: &Arc<Env>,
    name: &str,
    key_of: impl Fn(&T) -> String,
    report: &mut IntegrityReport,
) -> Result<(), LmdbError> {
    let rtxn = env.read_txn()?;
    let db: Option<Database<Bytes, Bytes>> = env.open_database(&rtxn, Some(name))?;
    let Some(db) = db else {
        report.errors.push(format!("database '{name}' is missing"));
        return Ok(());
    };
    report.databases_checked += 1;

    for entry in db.iter(&rtxn)? {
        let (key, bytes) = entry?;
        report.total_entries += 1;
        let key = String::from_utf8_lossy(key);
        match bincode::deserialize::<Versioned<T>>(bytes) {
            Ok(record) if key_of(&record.value) != key => {
                report
                    .errors
                    .push(format!("{name}/{key}: stored under the wrong key"));
            }
            Ok(_) => {}
            Err(e) => report.errors.push(format!("{name}/{key}: {e}")),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;
    use cleanchain_store::LocationStore;
    use cleanchain_types::{Coordinates, LocationId};

    #[test]
    fn fresh_environment_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 4, 16 * 1024 * 1024).unwrap();
        env.location_store()
            .insert_location(&Location::new(
                LocationId::parse("a").unwrap(),
                "A",
                Coordinates::new(1.0, 2.0).unwrap(),
                None,
            ))
            .unwrap();
        let report = check_integrity(env.env()).unwrap();
        assert!(report.is_healthy(), "{:?}", report.errors);
        assert_eq!(report.databases_checked, 2);
        assert_eq!(report.total_entries, 1);
    }

    #[test]
    fn garbage_record_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 4, 16 * 1024 * 1024).unwrap();
        {
            let mut wtxn = env.env().write_txn().unwrap();
            let db: Database<Bytes, Bytes> = env
                .env()
                .create_database(&mut wtxn, Some(LOCATIONS_DB))
                .unwrap();
            db.put(&mut wtxn, b"broken", &[0xff, 0x01]).unwrap();
            wtxn.commit().unwrap();
        }
        let report = check_integrity(env.env()).unwrap();
        assert!(!report.is_healthy());
        assert_eq!(report.total_entries, 1);
    }
}
