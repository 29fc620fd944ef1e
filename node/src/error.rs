use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("claim error: {0}")]
    Claim(#[from] cleanchain_claims::ClaimError),

    #[error("voting error: {0}")]
    Voting(#[from] cleanchain_verification::VotingError),

    #[error("consensus error: {0}")]
    Consensus(#[from] cleanchain_verification::ConsensusError),

    #[error("reward error: {0}")]
    Reward(#[from] cleanchain_rewards::RewardError),

    #[error("store error: {0}")]
    Store(#[from] cleanchain_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] cleanchain_store_lmdb::LmdbError),

    #[error("invalid input: {0}")]
    Invalid(#[from] cleanchain_types::TypesError),

    #[error("location not found: {0}")]
    LocationNotFound(String),

    #[error("upload rejected: {0}")]
    UploadRejected(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("seed error: {0}")]
    Seed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
