//! The external token ledger, as seen by the reward engine.
//!
//! The ledger is authoritative for balances. The engine only ever asks it to
//! move tokens to a wallet and, for diagnostics, to report a balance. Amounts
//! crossing this boundary are in the ledger's smallest unit.

pub mod error;
pub mod http;

pub use error::LedgerError;
pub use http::HttpLedgerClient;

use cleanchain_types::{TxId, WalletId};
use futures_util::future::BoxFuture;

/// Acknowledgement of a completed transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferReceipt {
    pub tx_id: TxId,
}

/// A token ledger the engine can pay rewards from.
pub trait TokenLedger: Send + Sync {
    /// Transfer `amount` base units to `to`. Resolves once the ledger has
    /// acknowledged the transfer.
    fn transfer<'a>(
        &'a self,
        to: &'a WalletId,
        amount: u128,
    ) -> BoxFuture<'a, Result<TransferReceipt, LedgerError>>;

    /// Current balance of `address` in base units.
    fn balance_of<'a>(&'a self, address: &'a WalletId) -> BoxFuture<'a, Result<u128, LedgerError>>;

    /// Human-readable name of this ledger backend.
    fn name(&self) -> &str;
}
