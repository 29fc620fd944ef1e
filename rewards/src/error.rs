use cleanchain_store::StoreError;
use cleanchain_token_ledger::LedgerError;
use cleanchain_types::{LocationId, TokenAmount, TxId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewardError {
    #[error("location not found: {0}")]
    NotFound(LocationId),

    #[error("location {0} has no claim owner")]
    NotClaimed(LocationId),

    #[error("location {0} has no reward reservation")]
    NotInFlight(LocationId),

    /// The ledger refused or failed the transfer. The reservation is kept.
    #[error("transfer for {location} failed: {source}")]
    Transfer {
        location: LocationId,
        #[source]
        source: LedgerError,
    },

    /// No acknowledgement within the bound. The transfer may still land, so the
    /// reservation is kept for reconciliation.
    #[error("transfer for {location} timed out after {after_secs}s")]
    TransferTimedOut { location: LocationId, after_secs: u64 },

    /// The ledger acknowledged `tx_id` but the location could not be marked
    /// rewarded. Confirm it with `confirm_in_flight`.
    #[error("transfer {tx_id} for {location} landed but finalizing failed: {source}")]
    Finalize {
        location: LocationId,
        tx_id: TxId,
        #[source]
        source: StoreError,
    },

    /// This call's transfer landed after the reservation had already been
    /// resolved, so `tx_id` paid the owner a second time and is not recorded.
    #[error("transfer {tx_id} for {location} landed after the reward was settled, not recorded")]
    UnrecordedTransfer { location: LocationId, tx_id: TxId },

    /// The task driving the transfer stopped before reporting back (panic or
    /// runtime shutdown).
    #[error("reward task for {location} did not complete: {reason}")]
    Interrupted { location: LocationId, reason: String },

    #[error("reward {0} does not fit in ledger units")]
    AmountOverflow(TokenAmount),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl RewardError {
    /// Whether the location was left `InFlight` by this error.
    pub fn leaves_reservation(&self) -> bool {
        matches!(
            self,
            Self::Transfer { .. }
                | Self::TransferTimedOut { .. }
                | Self::Finalize { .. }
                | Self::Interrupted { .. }
        )
    }

    /// Whether an operator has to look at the ledger: the reservation was
    /// left behind, or a transfer went out that no record accounts for.
    pub fn needs_reconciliation(&self) -> bool {
        self.leaves_reservation() || matches!(self, Self::UnrecordedTransfer { .. })
    }
}
