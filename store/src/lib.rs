//! Location and user records, and the abstract storage traits behind them.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.
//!
//! Records are versioned. A write only lands when the caller presents the
//! version it read ([`LocationStore::compare_and_swap_location`]); the
//! [`atomic`] helpers build the read-modify-write loop on top of that.

pub mod atomic;
pub mod error;
pub mod location;
pub mod user;

pub use atomic::{update_location, update_user, Mutation};
pub use error::StoreError;
pub use location::{
    Location, LocationStatus, LocationStore, RewardStatus, Vote, VoteTally, VoteType,
};
pub use user::{User, UserStore};

use serde::{Deserialize, Serialize};

/// A record together with the version it was read at.
///
/// Versions start at 1 on insert and increase by one on every successful
/// compare-and-swap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

impl<T> Versioned<T> {
    pub fn new(version: u64, value: T) -> Self {
        Self { version, value }
    }
}
