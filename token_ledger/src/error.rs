use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger refused the transfer (e.g. contract revert, insufficient funds).
    #[error("transfer rejected by ledger: {0}")]
    Rejected(String),

    #[error("ledger endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("ledger request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response from ledger: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Other(String),
}
