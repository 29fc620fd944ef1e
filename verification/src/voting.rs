//! Voting: users other than the claim owner vote on a location's cleanup.

use std::sync::Arc;

use cleanchain_store::{update_location, LocationStore, Mutation, StoreError, Vote, VoteType};
use cleanchain_types::{Clock, LocationId, WalletId};
use serde::Serialize;
use tracing::debug;

use crate::error::VotingError;

/// The outcome of casting a vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum VoteResult {
    /// The vote was appended. Counts include it.
    Recorded { up_votes: u32, total_votes: u32 },
    /// The voter owns the claim on this location.
    SelfVoteForbidden,
    /// The voter already voted on this location.
    DuplicateVote,
}

/// Engine for casting votes.
pub struct VotingEngine {
    locations: Arc<dyn LocationStore>,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
}

impl VotingEngine {
    pub fn new(locations: Arc<dyn LocationStore>, clock: Arc<dyn Clock>, max_attempts: u32) -> Self {
        Self {
            locations,
            clock,
            max_attempts,
        }
    }

    /// Cast `voter`'s vote on `location_id`.
    ///
    /// The ownership and uniqueness checks run inside the same atomic update as
    /// the append, so two simultaneous votes from one voter record exactly one.
    pub fn cast_vote(
        &self,
        location_id: &LocationId,
        voter: &WalletId,
        vote_type: VoteType,
    ) -> Result<VoteResult, VotingError> {
        let now = self.clock.now();
        let result = update_location(
            self.locations.as_ref(),
            location_id,
            self.max_attempts,
            |location| {
                if location.is_claimed_by(voter) {
                    return Mutation::Skip(VoteResult::SelfVoteForbidden);
                }
                if location.has_voted(voter) {
                    return Mutation::Skip(VoteResult::DuplicateVote);
                }
                location.votes.push(Vote {
                    voter: voter.clone(),
                    vote_type,
                    cast_at: now,
                });
                let tally = location.tally();
                Mutation::Write(VoteResult::Recorded {
                    up_votes: tally.up,
                    total_votes: tally.total(),
                })
            },
        )
        .map_err(|e| match e {
            StoreError::NotFound(_) => VotingError::NotFound(location_id.clone()),
            other => VotingError::Store(other),
        })?;

        debug!(location = %location_id, %voter, ?vote_type, ?result, "vote cast");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cleanchain_nullables::{NullClock, NullStore};
    use cleanchain_store::Location;
    use cleanchain_types::Coordinates;

    fn setup() -> (Arc<NullStore>, VotingEngine, LocationId) {
        let store = Arc::new(NullStore::new());
        let id = LocationId::parse("loc-1").unwrap();
        let mut loc = Location::new(id.clone(), "Park", Coordinates::new(0.0, 0.0).unwrap(), None);
        loc.claimed_by = Some(wallet("0xowner"));
        store.insert_location(&loc).unwrap();
        let engine = VotingEngine::new(store.clone(), Arc::new(NullClock::new(50)), 100);
        (store, engine, id)
    }

    fn wallet(s: &str) -> WalletId {
        WalletId::parse(s).unwrap()
    }

    #[test]
    fn vote_is_appended_with_counts() {
        let (store, engine, id) = setup();
        assert_eq!(
            engine.cast_vote(&id, &wallet("0xa"), VoteType::Up).unwrap(),
            VoteResult::Recorded { up_votes: 1, total_votes: 1 }
        );
        assert_eq!(
            engine.cast_vote(&id, &wallet("0xb"), VoteType::Down).unwrap(),
            VoteResult::Recorded { up_votes: 1, total_votes: 2 }
        );
        let votes = store.get_location(&id).unwrap().value.votes;
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].voter, wallet("0xa"));
        assert_eq!(votes[1].vote_type, VoteType::Down);
    }

    #[test]
    fn owner_cannot_vote() {
        let (store, engine, id) = setup();
        assert_eq!(
            engine.cast_vote(&id, &wallet("0xOWNER"), VoteType::Up).unwrap(),
            VoteResult::SelfVoteForbidden
        );
        assert!(store.get_location(&id).unwrap().value.votes.is_empty());
    }

    #[test]
    fn second_vote_is_a_duplicate_even_if_direction_changes() {
        let (store, engine, id) = setup();
        engine.cast_vote(&id, &wallet("0xa"), VoteType::Up).unwrap();
        assert_eq!(
            engine.cast_vote(&id, &wallet("0xA"), VoteType::Down).unwrap(),
            VoteResult::DuplicateVote
        );
        let loc = store.get_location(&id).unwrap().value;
        assert_eq!(loc.tally().up, 1);
        assert_eq!(loc.tally().down, 0);
    }

    #[test]
    fn unknown_location_is_not_found() {
        let (_, engine, _) = setup();
        let missing = LocationId::parse("missing").unwrap();
        assert!(matches!(
            engine.cast_vote(&missing, &wallet("0xa"), VoteType::Up),
            Err(VotingError::NotFound(_))
        ));
    }

    #[test]
    fn concurrent_votes_from_one_voter_record_once() {
        let (store, engine, id) = setup();
        let engine = Arc::new(engine);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                let id = id.clone();
                std::thread::spawn(move || engine.cast_vote(&id, &wallet("0xa"), VoteType::Up))
            })
            .collect();
        let recorded = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .filter(|r| matches!(r, VoteResult::Recorded { .. }))
            .count();
        assert_eq!(recorded, 1);
        assert_eq!(store.get_location(&id).unwrap().value.votes.len(), 1);
    }
}
