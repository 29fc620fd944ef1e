//! Location records, the votes they carry, and the location storage trait.

use crate::{StoreError, Versioned};
use cleanchain_types::{Coordinates, LocationId, Timestamp, TokenAmount, TxId, WalletId};
use serde::{Deserialize, Serialize};

/// Direction of a community vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Up,
    Down,
}

/// A single, immutable vote on a location's cleanup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: WalletId,
    pub vote_type: VoteType,
    pub cast_at: Timestamp,
}

/// Up/down counts over a location's votes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    pub up: u32,
    pub down: u32,
}

impl VoteTally {
    pub fn total(&self) -> u32 {
        self.up + self.down
    }
}

/// Where a location is in the reward sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardStatus {
    #[default]
    Unrewarded,
    /// A ledger transfer has been (or is being) attempted. The reservation is
    /// kept after a failed or timed-out transfer so that only reconciliation
    /// can resolve it.
    InFlight {
        reserved_at: Timestamp,
        attempts: u32,
        last_error: Option<String>,
    },
    Rewarded {
        tx_id: TxId,
        amount: TokenAmount,
        rewarded_at: Timestamp,
    },
}

/// Coarse status shown to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationStatus {
    Unclaimed,
    Claimed,
    Cleaned,
}

/// The canonical per-location record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub coordinates: Coordinates,
    /// Per-location reward; the engine's fallback applies when absent.
    pub reward_tokens: Option<TokenAmount>,
    pub claimed_by: Option<WalletId>,
    pub claimed_at: Option<Timestamp>,
    pub cleaned_by: Option<WalletId>,
    pub before_photo_url: Option<String>,
    pub after_photo_url: Option<String>,
    pub photo_uploaded: bool,
    pub cleaned: bool,
    pub verified: bool,
    pub reward: RewardStatus,
    /// Append-only, in insertion order.
    pub votes: Vec<Vote>,
}

impl Location {
    /// A fresh, unclaimed location.
    pub fn new(
        id: LocationId,
        name: impl Into<String>,
        coordinates: Coordinates,
        reward_tokens: Option<TokenAmount>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            coordinates,
            reward_tokens,
            claimed_by: None,
            claimed_at: None,
            cleaned_by: None,
            before_photo_url: None,
            after_photo_url: None,
            photo_uploaded: false,
            cleaned: false,
            verified: false,
            reward: RewardStatus::Unrewarded,
            votes: Vec::new(),
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed_by.is_some()
    }

    pub fn is_rewarded(&self) -> bool {
        matches!(self.reward, RewardStatus::Rewarded { .. })
    }

    pub fn is_reward_in_flight(&self) -> bool {
        matches!(self.reward, RewardStatus::InFlight { .. })
    }

    pub fn is_claimed_by(&self, wallet: &WalletId) -> bool {
        self.claimed_by.as_ref() == Some(wallet)
    }

    pub fn status(&self) -> LocationStatus {
        if self.cleaned {
            LocationStatus::Cleaned
        } else if self.is_claimed() {
            LocationStatus::Claimed
        } else {
            LocationStatus::Unclaimed
        }
    }

    pub fn has_voted(&self, voter: &WalletId) -> bool {
        self.votes.iter().any(|v| &v.voter == voter)
    }

    pub fn tally(&self) -> VoteTally {
        tally(self.votes.iter())
    }

    /// Votes cast at or after the current claim. Votes from before anyone
    /// claimed the location do not vouch for the claimant's cleanup.
    ///
    /// Timestamps have one-second resolution, so a vote in the same second
    /// as the claim counts.
    pub fn tally_since_claim(&self) -> VoteTally {
        match self.claimed_at {
            Some(claimed_at) => tally(self.votes.iter().filter(|v| v.cast_at >= claimed_at)),
            None => VoteTally::default(),
        }
    }

    /// `rewarded ⇒ cleaned ∧ verified`, `cleaned ⇒ claimed`, no self-votes,
    /// one vote per voter.
    pub fn invariants_hold(&self) -> bool {
        let reward_ok = !self.is_rewarded() || (self.cleaned && self.verified);
        let cleaned_ok = !self.cleaned || self.is_claimed();
        let no_self_vote = self
            .claimed_by
            .as_ref()
            .map_or(true, |owner| !self.has_voted(owner));
        let unique_votes = self
            .votes
            .iter()
            .enumerate()
            .all(|(i, v)| !self.votes[..i].iter().any(|w| w.voter == v.voter));
        reward_ok && cleaned_ok && no_self_vote && unique_votes
    }
}

/// Trait for location storage operations.
pub trait LocationStore: Send + Sync {
    fn get_location(&self, id: &LocationId) -> Result<Versioned<Location>, StoreError>;

    /// Insert a new location at version 1. Fails with `Duplicate` if the id exists.
    fn insert_location(&self, location: &Location) -> Result<(), StoreError>;

    /// Replace the stored location if it is still at `expected_version`.
    ///
    /// Returns the new version, `Conflict` if the record moved on, or
    /// `NotFound` if it does not exist.
    fn compare_and_swap_location(
        &self,
        expected_version: u64,
        location: &Location,
    ) -> Result<u64, StoreError>;

    fn list_locations(&self) -> Result<Vec<Location>, StoreError>;

    /// Locations whose claim owner is `wallet`.
    fn locations_claimed_by(&self, wallet: &WalletId) -> Result<Vec<Location>, StoreError> {
        Ok(self
            .list_locations()?
            .into_iter()
            .filter(|l| l.is_claimed_by(wallet))
            .collect())
    }

    /// Locations holding a reward reservation that has not been confirmed.
    fn list_in_flight(&self) -> Result<Vec<Location>, StoreError> {
        Ok(self
            .list_locations()?
            .into_iter()
            .filter(Location::is_reward_in_flight)
            .collect())
    }
}

fn tally<'a>(votes: impl Iterator<Item = &'a Vote>) -> VoteTally {
    votes.fold(VoteTally::default(), |mut t, v| {
        match v.vote_type {
            VoteType::Up => t.up += 1,
            VoteType::Down => t.down += 1,
        }
        t
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(s: &str) -> WalletId {
        WalletId::parse(s).unwrap()
    }

    fn location() -> Location {
        Location::new(
            LocationId::parse("park").unwrap(),
            "Community Park",
            Coordinates::new(28.6139, 77.2090).unwrap(),
            Some(TokenAmount::new(25)),
        )
    }

    #[test]
    fn status_follows_lifecycle() {
        let mut loc = location();
        assert_eq!(loc.status(), LocationStatus::Unclaimed);
        loc.claimed_by = Some(wallet("0xa"));
        assert_eq!(loc.status(), LocationStatus::Claimed);
        loc.cleaned = true;
        assert_eq!(loc.status(), LocationStatus::Cleaned);
    }

    #[test]
    fn tally_counts_each_direction() {
        let mut loc = location();
        for (voter, vote_type) in [("0x1", VoteType::Up), ("0x2", VoteType::Down), ("0x3", VoteType::Up)] {
            loc.votes.push(Vote {
                voter: wallet(voter),
                vote_type,
                cast_at: Timestamp::new(1),
            });
        }
        let tally = loc.tally();
        assert_eq!(tally, VoteTally { up: 2, down: 1 });
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn only_votes_since_the_claim_vouch_for_it() {
        let mut loc = location();
        for (voter, at) in [("0x1", 5), ("0x2", 10), ("0x3", 11)] {
            loc.votes.push(Vote {
                voter: wallet(voter),
                vote_type: VoteType::Up,
                cast_at: Timestamp::new(at),
            });
        }
        assert_eq!(loc.tally_since_claim(), VoteTally::default());

        loc.claimed_by = Some(wallet("0xowner"));
        loc.claimed_at = Some(Timestamp::new(10));
        assert_eq!(loc.tally_since_claim(), VoteTally { up: 2, down: 0 });
        assert_eq!(loc.tally().up, 3);
    }

    #[test]
    fn invariants_detect_reward_without_cleaning() {
        let mut loc = location();
        assert!(loc.invariants_hold());
        loc.reward = RewardStatus::Rewarded {
            tx_id: TxId::new("0xabc"),
            amount: TokenAmount::new(25),
            rewarded_at: Timestamp::new(5),
        };
        assert!(!loc.invariants_hold());
        loc.claimed_by = Some(wallet("0xa"));
        loc.cleaned = true;
        loc.verified = true;
        assert!(loc.invariants_hold());
    }

    #[test]
    fn invariants_detect_self_vote_and_duplicates() {
        let mut loc = location();
        loc.claimed_by = Some(wallet("0xa"));
        loc.votes.push(Vote {
            voter: wallet("0xb"),
            vote_type: VoteType::Up,
            cast_at: Timestamp::new(1),
        });
        assert!(loc.invariants_hold());
        loc.votes.push(loc.votes[0].clone());
        assert!(!loc.invariants_hold());
        loc.votes.pop();
        loc.votes.push(Vote {
            voter: wallet("0xa"),
            vote_type: VoteType::Up,
            cast_at: Timestamp::new(2),
        });
        assert!(!loc.invariants_hold());
    }
}
