//! User records and the user storage trait.

use crate::{StoreError, Versioned};
use cleanchain_types::{Timestamp, TokenAmount, WalletId};
use serde::{Deserialize, Serialize};

/// A participant, keyed by canonical wallet identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: WalletId,
    /// Ledger address rewards are paid to.
    pub wallet_address: Option<WalletId>,
    /// Off-chain running total of rewards. Advisory only; the ledger is
    /// authoritative for balances.
    pub tokens: TokenAmount,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub joined_at: Timestamp,
    pub updated_at: Option<Timestamp>,
}

impl User {
    /// A new user paid out to their own identifier.
    pub fn new(id: WalletId, now: Timestamp) -> Self {
        Self {
            wallet_address: Some(id.clone()),
            id,
            tokens: TokenAmount::ZERO,
            email: None,
            display_name: None,
            joined_at: now,
            updated_at: None,
        }
    }
}

/// Trait for user storage operations.
pub trait UserStore: Send + Sync {
    fn get_user(&self, id: &WalletId) -> Result<Versioned<User>, StoreError>;

    /// Insert a new user at version 1. Fails with `Duplicate` if the id exists.
    fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    /// Replace the stored user if it is still at `expected_version`.
    fn compare_and_swap_user(&self, expected_version: u64, user: &User) -> Result<u64, StoreError>;
}
