//! Community verification of cleanups.
//!
//! Two steps, run back to back for every accepted vote:
//! 1. **Voting**: any user other than the claim owner casts one up or down
//!    vote on a location. Votes are append-only.
//! 2. **Consensus**: once enough up-votes exist on a claimed location, the
//!    reward is requested from the [`RewardIssuer`](cleanchain_rewards::RewardIssuer),
//!    whose reservation guarantees a single payout however many votes race.

pub mod consensus;
pub mod error;
pub mod voting;

pub use consensus::{ConsensusEvaluator, ConsensusResult};
pub use error::{ConsensusError, VotingError};
pub use voting::{VoteResult, VotingEngine};
