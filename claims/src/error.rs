use cleanchain_store::StoreError;
use cleanchain_types::{LocationId, TypesError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("location not found: {0}")]
    NotFound(LocationId),

    #[error("invalid claimant position: {0}")]
    InvalidPosition(#[from] TypesError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ClaimError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}
