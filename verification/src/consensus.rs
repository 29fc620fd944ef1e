//! Consensus: decide whether a location's votes earn its claim owner the reward.
//!
//! The policy is a fixed count of up-votes. Votes are append-only, so once the
//! count is met it stays met and every later evaluation keeps asking for the
//! reward; the issuer's reservation turns those repeats into no-ops.

use std::sync::Arc;

use cleanchain_rewards::{RewardIssuer, RewardResult};
use cleanchain_store::{LocationStore, StoreError};
use cleanchain_types::{ConsensusPolicy, LocationId};
use tracing::{debug, info};

use crate::error::ConsensusError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsensusResult {
    /// Not enough up-votes yet. `needed` is the policy's threshold.
    Pending { up_votes: u32, needed: u32 },
    /// Threshold met but nobody has claimed the location.
    AwaitingClaim,
    /// The reward was already paid or is being paid.
    Settled,
    /// Threshold met; this is what the issuer did about it.
    Reached(RewardResult),
}

pub struct ConsensusEvaluator {
    locations: Arc<dyn LocationStore>,
    issuer: Arc<RewardIssuer>,
    policy: ConsensusPolicy,
}

impl ConsensusEvaluator {
    pub fn new(
        locations: Arc<dyn LocationStore>,
        issuer: Arc<RewardIssuer>,
        policy: ConsensusPolicy,
    ) -> Self {
        Self {
            locations,
            issuer,
            policy,
        }
    }

    pub fn policy(&self) -> &ConsensusPolicy {
        &self.policy
    }

    /// Evaluate the current votes on `location_id`.
    pub async fn evaluate(&self, location_id: &LocationId) -> Result<ConsensusResult, ConsensusError> {
        let location = self
            .locations
            .get_location(location_id)
            .map_err(|e| match e {
                StoreError::NotFound(_) => ConsensusError::NotFound(location_id.clone()),
                other => ConsensusError::Store(other),
            })?
            .value;

        if location.is_rewarded() || location.is_reward_in_flight() {
            return Ok(ConsensusResult::Settled);
        }

        let needed = self.policy.required_up_votes();
        if !location.is_claimed() {
            let up_votes = location.tally().up;
            if !self.policy.is_reached(up_votes) {
                return Ok(ConsensusResult::Pending { up_votes, needed });
            }
            debug!(location = %location_id, up_votes, "consensus reached on unclaimed location");
            return Ok(ConsensusResult::AwaitingClaim);
        }

        let up_votes = location.tally_since_claim().up;
        if !self.policy.is_reached(up_votes) {
            return Ok(ConsensusResult::Pending { up_votes, needed });
        }

        info!(location = %location_id, up_votes, "consensus reached, requesting reward");
        let result = self.issuer.issue_reward(location_id).await?;
        Ok(ConsensusResult::Reached(result))
    }
}
