//! LMDB storage backend for CleanChain.
//!
//! Implements the storage traits from `cleanchain-store` using the `heed` LMDB
//! bindings. Locations and users each live in their own named database within
//! a single environment, stored as bincode-encoded `Versioned<T>` values.
//!
//! LMDB admits one write transaction at a time, so a compare-and-swap that
//! reads the stored version and writes the new record inside the same write
//! transaction cannot interleave with another writer.

pub mod environment;
pub mod error;
pub mod integrity;
pub mod location;
pub mod user;

mod codec;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use integrity::{check_integrity, IntegrityReport};
pub use location::LmdbLocationStore;
pub use user::LmdbUserStore;
