//! Read models returned to API callers.
//!
//! Field names follow the public JSON contract (camelCase). Status and the
//! `rewarded` flag are derived from the stored record, never stored twice.

use cleanchain_store::{Location, LocationStatus, RewardStatus, User, VoteType};
use cleanchain_types::{Timestamp, TokenAmount};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteView {
    pub voter_id: String,
    pub vote_type: VoteType,
    pub cast_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationView {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub reward_tokens: Option<TokenAmount>,
    pub status: LocationStatus,
    pub claimed: bool,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<Timestamp>,
    pub cleaned: bool,
    pub cleaned_by: Option<String>,
    pub verified: bool,
    pub rewarded: bool,
    pub reward_tx_id: Option<String>,
    pub before_photo_url: Option<String>,
    pub after_photo_url: Option<String>,
    pub after_image_uploaded: bool,
    pub up_votes: u32,
    pub down_votes: u32,
    pub votes: Vec<VoteView>,
}

impl From<&Location> for LocationView {
    fn from(l: &Location) -> Self {
        let tally = l.tally();
        let reward_tx_id = match &l.reward {
            RewardStatus::Rewarded { tx_id, .. } => Some(tx_id.to_string()),
            _ => None,
        };
        Self {
            id: l.id.to_string(),
            name: l.name.clone(),
            lat: l.coordinates.lat,
            lng: l.coordinates.lng,
            reward_tokens: l.reward_tokens,
            status: l.status(),
            claimed: l.is_claimed(),
            claimed_by: l.claimed_by.as_ref().map(ToString::to_string),
            claimed_at: l.claimed_at,
            cleaned: l.cleaned,
            cleaned_by: l.cleaned_by.as_ref().map(ToString::to_string),
            verified: l.verified,
            rewarded: l.is_rewarded(),
            reward_tx_id,
            before_photo_url: l.before_photo_url.clone(),
            after_photo_url: l.after_photo_url.clone(),
            after_image_uploaded: l.photo_uploaded,
            up_votes: tally.up,
            down_votes: tally.down,
            votes: l
                .votes
                .iter()
                .map(|v| VoteView {
                    voter_id: v.voter.to_string(),
                    vote_type: v.vote_type,
                    cast_at: v.cast_at,
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub user_id: String,
    pub wallet_address: Option<String>,
    pub tokens: TokenAmount,
    pub username: Option<String>,
    pub email: Option<String>,
    pub joined_at: Timestamp,
    pub updated_at: Option<Timestamp>,
}

impl From<&User> for UserView {
    fn from(u: &User) -> Self {
        Self {
            user_id: u.id.to_string(),
            wallet_address: u.wallet_address.as_ref().map(ToString::to_string),
            tokens: u.tokens,
            username: u.display_name.clone(),
            email: u.email.clone(),
            joined_at: u.joined_at,
            updated_at: u.updated_at,
        }
    }
}

/// Location summary for reconciliation listings.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InFlightView {
    pub id: String,
    pub name: String,
    pub claimed_by: Option<String>,
    pub reserved_at: Timestamp,
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl InFlightView {
    pub fn from_location(l: &Location) -> Option<Self> {
        match &l.reward {
            RewardStatus::InFlight {
                reserved_at,
                attempts,
                last_error,
            } => Some(Self {
                id: l.id.to_string(),
                name: l.name.clone(),
                claimed_by: l.claimed_by.as_ref().map(ToString::to_string),
                reserved_at: *reserved_at,
                attempts: *attempts,
                last_error: last_error.clone(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cleanchain_store::Vote;
    use cleanchain_types::{Coordinates, LocationId, TxId, WalletId};
    use serde_json::json;

    #[test]
    fn location_view_derives_status_and_counts() {
        let owner = WalletId::parse("0xOwner").unwrap();
        let mut loc = Location::new(
            LocationId::parse("loc-1").unwrap(),
            "Beach",
            Coordinates::new(10.0, 20.0).unwrap(),
            Some(TokenAmount::new(25)),
        );
        loc.claimed_by = Some(owner.clone());
        loc.votes.push(Vote {
            voter: WalletId::parse("0xv").unwrap(),
            vote_type: VoteType::Up,
            cast_at: Timestamp::new(5),
        });
        loc.cleaned = true;
        loc.verified = true;
        loc.cleaned_by = Some(owner);
        loc.reward = RewardStatus::Rewarded {
            tx_id: TxId::new("0xtx"),
            amount: TokenAmount::new(25),
            rewarded_at: Timestamp::new(9),
        };

        let value = serde_json::to_value(LocationView::from(&loc)).unwrap();
        assert_eq!(value["status"], "cleaned");
        assert_eq!(value["claimedBy"], "0xowner");
        assert_eq!(value["rewarded"], true);
        assert_eq!(value["rewardTxId"], "0xtx");
        assert_eq!(value["upVotes"], 1);
        assert_eq!(value["votes"][0], json!({"voterId": "0xv", "voteType": "up", "castAt": 5}));
    }

    #[test]
    fn in_flight_view_only_for_reservations() {
        let loc = Location::new(
            LocationId::parse("loc-1").unwrap(),
            "Beach",
            Coordinates::new(0.0, 0.0).unwrap(),
            None,
        );
        assert!(InFlightView::from_location(&loc).is_none());
    }
}
