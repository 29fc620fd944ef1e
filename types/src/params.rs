//! Engine parameters: the tunable values of the location lifecycle.
//!
//! Every value here is configuration, loaded from the `[params]` table of the
//! node's TOML file. Nothing in the engine hard-codes them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::amount::LEDGER_DECIMALS;
use crate::TokenAmount;

/// How community votes are turned into a reward decision.
///
/// Only the fixed-count rule is supported: it is monotone over an append-only
/// vote set, so once reached it can never be "un-reached" by later down-votes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsensusPolicy {
    /// Consensus when at least `min_up_votes` up-votes have been cast.
    FixedCount { min_up_votes: u32 },
}

impl ConsensusPolicy {
    /// Whether the given tally reaches consensus.
    pub fn is_reached(&self, up_votes: u32) -> bool {
        match self {
            Self::FixedCount { min_up_votes } => up_votes >= *min_up_votes,
        }
    }

    /// Up-votes required before consensus.
    pub fn required_up_votes(&self) -> u32 {
        match self {
            Self::FixedCount { min_up_votes } => *min_up_votes,
        }
    }
}

impl Default for ConsensusPolicy {
    fn default() -> Self {
        Self::FixedCount { min_up_votes: 3 }
    }
}

/// All engine parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    // ── Claims ───────────────────────────────────────────────────────────
    /// Maximum claimant-to-location distance in metres.
    pub claim_radius_m: f64,

    // ── Consensus ────────────────────────────────────────────────────────
    pub consensus: ConsensusPolicy,

    // ── Rewards ──────────────────────────────────────────────────────────
    /// Reward used only when a location carries no `reward_tokens` of its own.
    pub fallback_reward_tokens: TokenAmount,

    /// Decimal places of the ledger's smallest unit.
    pub ledger_decimals: u32,

    /// Upper bound on a single ledger transfer call, in seconds.
    pub ledger_timeout_secs: u64,

    // ── Ambient ──────────────────────────────────────────────────────────
    /// Upper bound on a notification dispatch, in seconds.
    pub notify_timeout_secs: u64,

    /// How many times an atomic store update is retried on version conflict.
    pub store_retry_attempts: u32,
}

impl EngineParams {
    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_secs(self.ledger_timeout_secs)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }

    /// Resolve the reward for a location: its own amount when positive,
    /// otherwise the configured fallback.
    pub fn reward_for(&self, location_reward: Option<TokenAmount>) -> TokenAmount {
        match location_reward {
            Some(amount) if !amount.is_zero() => amount,
            _ => self.fallback_reward_tokens,
        }
    }
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            claim_radius_m: 10_000.0,
            consensus: ConsensusPolicy::default(),
            fallback_reward_tokens: TokenAmount::new(10),
            ledger_decimals: LEDGER_DECIMALS,
            ledger_timeout_secs: 60,
            notify_timeout_secs: 10,
            store_retry_attempts: 5,
        }
    }
}
