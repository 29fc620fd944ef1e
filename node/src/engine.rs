//! The lifecycle engine: one facade over claims, voting, consensus and
//! rewards, recording metrics for each inbound operation.

use std::sync::Arc;
use std::time::Instant;

use cleanchain_claims::{ClaimResult, ClaimService};
use cleanchain_geo::DistanceReport;
use cleanchain_notify::Notifier;
use cleanchain_rewards::{RewardIssuer, RewardResult};
use cleanchain_store::{
    update_location, update_user, LocationStore, Mutation, StoreError, User, UserStore, VoteType,
};
use cleanchain_token_ledger::TokenLedger;
use cleanchain_types::{Clock, Coordinates, EngineParams, LocationId, TxId, WalletId};
use cleanchain_verification::{
    ConsensusError, ConsensusEvaluator, ConsensusResult, VoteResult, VotingEngine,
};
use tracing::{info, warn};

use crate::metered::MeteredNotifier;
use crate::metrics::EngineMetrics;
use crate::views::{InFlightView, LocationView, UserView};
use crate::NodeError;

/// External collaborators the engine is wired to.
#[derive(Clone)]
pub struct Collaborators {
    pub locations: Arc<dyn LocationStore>,
    pub users: Arc<dyn UserStore>,
    pub ledger: Arc<dyn TokenLedger>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

/// What happened to a vote, and what consensus made of it.
///
/// `consensus` is only evaluated for recorded votes.
#[derive(Clone, Debug, PartialEq)]
pub struct VoteOutcome {
    pub vote: VoteResult,
    pub consensus: Option<ConsensusResult>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Registration {
    pub is_new_user: bool,
    pub user: UserView,
}

/// Profile fields to merge into a user record. `None` leaves a field as is.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub wallet_address: Option<WalletId>,
}

pub struct LifecycleEngine {
    locations: Arc<dyn LocationStore>,
    users: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
    claims: ClaimService,
    voting: VotingEngine,
    consensus: ConsensusEvaluator,
    issuer: Arc<RewardIssuer>,
    metrics: Arc<EngineMetrics>,
    ledger_name: String,
    params: EngineParams,
}

impl LifecycleEngine {
    pub fn new(deps: Collaborators, params: EngineParams, metrics: Arc<EngineMetrics>) -> Self {
        let notifier: Arc<dyn Notifier> = Arc::new(MeteredNotifier::new(
            deps.notifier.clone(),
            metrics.notification_failures.clone(),
            params.notify_timeout(),
        ));
        let issuer = Arc::new(RewardIssuer::new(
            deps.locations.clone(),
            deps.users.clone(),
            deps.ledger.clone(),
            notifier.clone(),
            deps.clock.clone(),
            params.clone(),
        ));
        let engine = Self {
            claims: ClaimService::new(
                deps.locations.clone(),
                deps.users.clone(),
                notifier,
                deps.clock.clone(),
                params.clone(),
            ),
            voting: VotingEngine::new(
                deps.locations.clone(),
                deps.clock.clone(),
                params.store_retry_attempts,
            ),
            consensus: ConsensusEvaluator::new(deps.locations.clone(), issuer.clone(), params.consensus),
            issuer,
            ledger_name: deps.ledger.name().to_string(),
            locations: deps.locations,
            users: deps.users,
            clock: deps.clock,
            metrics,
            params,
        };
        engine.refresh_in_flight_gauge();
        engine
    }

    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn ledger_name(&self) -> &str {
        &self.ledger_name
    }

    // ── Claims ──────────────────────────────────────────────────────────

    pub async fn claim_location(
        &self,
        id: &LocationId,
        claimant: &WalletId,
        lat: f64,
        lng: f64,
    ) -> Result<ClaimResult, NodeError> {
        let result = self.claims.claim(id, claimant, lat, lng).await;
        let label = match &result {
            Ok(ClaimResult::Claimed { .. }) => "claimed",
            Ok(ClaimResult::AlreadyClaimed { .. }) => "already_claimed",
            Ok(ClaimResult::AlreadyCleaned { .. }) => "already_cleaned",
            Ok(ClaimResult::TooFar { .. }) => "too_far",
            Err(_) => "error",
        };
        self.metrics.claims.with_label_values(&[label]).inc();
        Ok(result?)
    }

    // ── Voting & consensus ──────────────────────────────────────────────

    /// Cast a vote and, if it was recorded, evaluate consensus.
    ///
    /// A failed reward transfer is returned as an error even though the vote
    /// itself was recorded; the location is left `InFlight` for reconciliation.
    pub async fn vote(
        &self,
        id: &LocationId,
        voter: &WalletId,
        vote_type: VoteType,
    ) -> Result<VoteOutcome, NodeError> {
        let vote = self.voting.cast_vote(id, voter, vote_type)?;
        let label = match vote {
            VoteResult::Recorded { .. } => "recorded",
            VoteResult::DuplicateVote => "duplicate",
            VoteResult::SelfVoteForbidden => "self_vote",
        };
        self.metrics.votes.with_label_values(&[label]).inc();

        if !matches!(vote, VoteResult::Recorded { .. }) {
            return Ok(VoteOutcome {
                vote,
                consensus: None,
            });
        }

        let started = Instant::now();
        let consensus = self.consensus.evaluate(id).await;
        match &consensus {
            Ok(ConsensusResult::Reached(RewardResult::Rewarded { .. })) => {
                self.metrics.rewards_issued.inc();
                self.metrics
                    .reward_latency_ms
                    .observe(started.elapsed().as_secs_f64() * 1000.0);
                self.refresh_in_flight_gauge();
            }
            Err(ConsensusError::Reward(e)) if e.needs_reconciliation() => {
                self.metrics.reward_failures.inc();
                self.refresh_in_flight_gauge();
            }
            _ => {}
        }
        Ok(VoteOutcome {
            vote,
            consensus: Some(consensus?),
        })
    }

    // ── Geometry ────────────────────────────────────────────────────────

    pub fn distance(&self, lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> Result<DistanceReport, NodeError> {
        let a = Coordinates::new(lat1, lng1)?;
        let b = Coordinates::new(lat2, lng2)?;
        Ok(self.claims.geo().check(a, b))
    }

    // ── Read models ─────────────────────────────────────────────────────

    pub fn location(&self, id: &LocationId) -> Result<LocationView, NodeError> {
        let location = self.locations.get_location(id).map_err(|e| not_found(id, e))?;
        Ok(LocationView::from(&location.value))
    }

    pub fn locations(&self) -> Result<Vec<LocationView>, NodeError> {
        Ok(self
            .locations
            .list_locations()?
            .iter()
            .map(LocationView::from)
            .collect())
    }

    pub fn user_locations(&self, wallet: &WalletId) -> Result<Vec<LocationView>, NodeError> {
        Ok(self
            .locations
            .locations_claimed_by(wallet)?
            .iter()
            .map(LocationView::from)
            .collect())
    }

    // ── Uploads ─────────────────────────────────────────────────────────

    /// Record the after-cleanup photo of a claimed location.
    pub fn complete_upload(&self, id: &LocationId, after_photo_url: &str) -> Result<LocationView, NodeError> {
        let url = after_photo_url.trim();
        if url.is_empty() {
            return Err(NodeError::UploadRejected("afterPhotoUrl is empty".into()));
        }
        let updated = update_location(
            self.locations.as_ref(),
            id,
            self.params.store_retry_attempts,
            |location| {
                if !location.is_claimed() {
                    return Mutation::Skip(Err("location is not claimed"));
                }
                if location.cleaned {
                    return Mutation::Skip(Err("location is already cleaned"));
                }
                location.after_photo_url = Some(url.to_string());
                location.photo_uploaded = true;
                Mutation::Write(Ok(LocationView::from(&*location)))
            },
        )
        .map_err(|e| not_found(id, e))?;

        let view = updated.map_err(|reason| NodeError::UploadRejected(reason.to_string()))?;
        self.metrics.uploads_completed.inc();
        info!(location = %id, "after photo recorded");
        Ok(view)
    }

    // ── Users ───────────────────────────────────────────────────────────

    /// Create the user for `wallet` if it does not exist yet.
    pub fn register_wallet(&self, wallet: &WalletId) -> Result<Registration, NodeError> {
        match self.users.get_user(wallet) {
            Ok(existing) => {
                return Ok(Registration {
                    is_new_user: false,
                    user: UserView::from(&existing.value),
                })
            }
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let user = User::new(wallet.clone(), self.clock.now());
        match self.users.insert_user(&user) {
            Ok(()) => {
                info!(%wallet, "registered new user");
                Ok(Registration {
                    is_new_user: true,
                    user: UserView::from(&user),
                })
            }
            // Lost a registration race; the other request created it.
            Err(StoreError::Duplicate(_)) => Ok(Registration {
                is_new_user: false,
                user: UserView::from(&self.users.get_user(wallet)?.value),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Merge profile fields into the user, creating the user if needed.
    pub fn update_profile(&self, wallet: &WalletId, update: ProfileUpdate) -> Result<UserView, NodeError> {
        self.register_wallet(wallet)?;
        let now = self.clock.now();
        let user = update_user(
            self.users.as_ref(),
            wallet,
            self.params.store_retry_attempts,
            |user| {
                if let Some(name) = &update.display_name {
                    user.display_name = Some(name.clone());
                }
                if let Some(email) = &update.email {
                    user.email = Some(email.clone());
                }
                if let Some(address) = &update.wallet_address {
                    user.wallet_address = Some(address.clone());
                }
                user.updated_at = Some(now);
                Mutation::Write(UserView::from(&*user))
            },
        )?;
        Ok(user)
    }

    pub fn user(&self, wallet: &WalletId) -> Result<UserView, NodeError> {
        Ok(UserView::from(&self.users.get_user(wallet)?.value))
    }

    // ── Reconciliation ──────────────────────────────────────────────────

    pub fn list_in_flight(&self) -> Result<Vec<InFlightView>, NodeError> {
        let in_flight = self.issuer.list_in_flight()?;
        self.metrics.rewards_in_flight.set(in_flight.len() as i64);
        Ok(in_flight.iter().filter_map(InFlightView::from_location).collect())
    }

    pub async fn retry_in_flight(&self, id: &LocationId) -> Result<RewardResult, NodeError> {
        let result = self.issuer.retry_in_flight(id).await;
        self.record_reconciliation(&result);
        Ok(result?)
    }

    pub async fn confirm_in_flight(&self, id: &LocationId, tx_id: TxId) -> Result<RewardResult, NodeError> {
        let result = self.issuer.confirm_in_flight(id, tx_id).await;
        self.record_reconciliation(&result);
        Ok(result?)
    }

    fn record_reconciliation(&self, result: &Result<RewardResult, cleanchain_rewards::RewardError>) {
        match result {
            Ok(RewardResult::Rewarded { .. }) => self.metrics.rewards_issued.inc(),
            Err(e) if e.needs_reconciliation() => self.metrics.reward_failures.inc(),
            _ => {}
        }
        self.refresh_in_flight_gauge();
    }

    fn refresh_in_flight_gauge(&self) {
        match self.locations.list_in_flight() {
            Ok(in_flight) => self.metrics.rewards_in_flight.set(in_flight.len() as i64),
            Err(e) => warn!(error = %e, "failed to count in-flight rewards"),
        }
    }
}

fn not_found(id: &LocationId, e: StoreError) -> NodeError {
    match e {
        StoreError::NotFound(_) => NodeError::LocationNotFound(id.to_string()),
        other => NodeError::Store(other),
    }
}
