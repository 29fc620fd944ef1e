use cleanchain_rewards::RewardError;
use cleanchain_store::StoreError;
use cleanchain_types::LocationId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VotingError {
    #[error("location not found: {0}")]
    NotFound(LocationId),

    #[error("store error: {0}")]
    Store(StoreError),
}

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("location not found: {0}")]
    NotFound(LocationId),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error(transparent)]
    Reward(#[from] RewardError),
}
