use std::future::Future;
use std::sync::Arc;

use cleanchain_notify::{dispatch, Notifier, RewardNotice};
use cleanchain_store::{
    update_location, update_user, Location, LocationStore, Mutation, RewardStatus, StoreError,
    UserStore,
};
use cleanchain_token_ledger::TokenLedger;
use cleanchain_types::{Clock, EngineParams, LocationId, TokenAmount, TxId, WalletId};
use tracing::{debug, error, info, warn};

use crate::RewardError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RewardResult {
    /// This call transferred the reward.
    Rewarded { tx_id: TxId, amount: TokenAmount },
    AlreadyRewarded,
    /// Another caller holds the reservation.
    InProgress,
    /// The claim owner has no payout address. Nothing was reserved.
    NoWalletOnFile,
}

enum Reservation {
    Taken,
    AlreadyRewarded,
    InProgress,
    Unclaimed,
    OwnerChanged,
}

/// Issues rewards through the token ledger.
///
/// Every public operation that may reach the ledger runs on its own tokio
/// task: a caller that stops waiting (a dropped HTTP request) cannot cancel a
/// transfer between the ledger call and its record.
#[derive(Clone)]
pub struct RewardIssuer {
    locations: Arc<dyn LocationStore>,
    users: Arc<dyn UserStore>,
    ledger: Arc<dyn TokenLedger>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    params: EngineParams,
}

impl RewardIssuer {
    pub fn new(
        locations: Arc<dyn LocationStore>,
        users: Arc<dyn UserStore>,
        ledger: Arc<dyn TokenLedger>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        params: EngineParams,
    ) -> Self {
        Self {
            locations,
            users,
            ledger,
            notifier,
            clock,
            params,
        }
    }

    /// Pay the claim owner of `id`, at most once over the location's lifetime.
    pub async fn issue_reward(&self, id: &LocationId) -> Result<RewardResult, RewardError> {
        self.detached(id, |issuer, id| async move { issuer.reserve_and_pay(&id).await })
            .await
    }

    /// Locations whose reward is reserved but unconfirmed.
    pub fn list_in_flight(&self) -> Result<Vec<Location>, RewardError> {
        Ok(self.locations.list_in_flight()?)
    }

    /// Re-send the transfer for a location stuck `InFlight`.
    ///
    /// Only reservations whose last attempt recorded a failure, or that are
    /// older than the ledger timeout, are retried. A reservation whose
    /// transfer may still be running answers `InProgress`.
    pub async fn retry_in_flight(&self, id: &LocationId) -> Result<RewardResult, RewardError> {
        self.detached(id, |issuer, id| async move { issuer.retry(&id).await })
            .await
    }

    /// Record a transfer the operator verified on the ledger, without sending
    /// another one.
    pub async fn confirm_in_flight(
        &self,
        id: &LocationId,
        tx_id: TxId,
    ) -> Result<RewardResult, RewardError> {
        self.detached(id, |issuer, id| async move { issuer.confirm(&id, tx_id).await })
            .await
    }

    async fn detached<F, Fut>(&self, id: &LocationId, job: F) -> Result<RewardResult, RewardError>
    where
        F: FnOnce(RewardIssuer, LocationId) -> Fut,
        Fut: Future<Output = Result<RewardResult, RewardError>> + Send + 'static,
    {
        match tokio::spawn(job(self.clone(), id.clone())).await {
            Ok(result) => result,
            Err(e) => {
                error!(location = %id, error = %e, "reward task did not complete");
                Err(RewardError::Interrupted {
                    location: id.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn reserve_and_pay(&self, id: &LocationId) -> Result<RewardResult, RewardError> {
        for _ in 0..self.params.store_retry_attempts.max(1) {
            let location = self.read_location(id)?;
            match location.reward {
                RewardStatus::Rewarded { .. } => return Ok(RewardResult::AlreadyRewarded),
                RewardStatus::InFlight { .. } => return Ok(RewardResult::InProgress),
                RewardStatus::Unrewarded => {}
            }
            let owner = location
                .claimed_by
                .clone()
                .ok_or_else(|| RewardError::NotClaimed(id.clone()))?;
            let Some(payout) = self.payout_address(&owner)? else {
                info!(location = %id, %owner, "claim owner has no wallet on file, reward not issued");
                return Ok(RewardResult::NoWalletOnFile);
            };
            let amount = self.params.reward_for(location.reward_tokens);
            let units = self.ledger_units(amount)?;

            let now = self.clock.now();
            let reservation = update_location(
                self.locations.as_ref(),
                id,
                self.params.store_retry_attempts,
                |loc| {
                    match loc.reward {
                        RewardStatus::Rewarded { .. } => {
                            return Mutation::Skip(Reservation::AlreadyRewarded)
                        }
                        RewardStatus::InFlight { .. } => return Mutation::Skip(Reservation::InProgress),
                        RewardStatus::Unrewarded => {}
                    }
                    match &loc.claimed_by {
                        None => return Mutation::Skip(Reservation::Unclaimed),
                        Some(current) if current != &owner => {
                            return Mutation::Skip(Reservation::OwnerChanged)
                        }
                        Some(_) => {}
                    }
                    loc.reward = RewardStatus::InFlight {
                        reserved_at: now,
                        attempts: 1,
                        last_error: None,
                    };
                    Mutation::Write(Reservation::Taken)
                },
            )
            .map_err(|e| store_error(id, e))?;

            match reservation {
                Reservation::Taken => {
                    debug!(location = %id, %owner, %amount, "reward reserved");
                    return self.pay(id, &owner, &payout, amount, units).await;
                }
                Reservation::AlreadyRewarded => return Ok(RewardResult::AlreadyRewarded),
                Reservation::InProgress => return Ok(RewardResult::InProgress),
                Reservation::Unclaimed => return Err(RewardError::NotClaimed(id.clone())),
                Reservation::OwnerChanged => {
                    debug!(location = %id, "claim owner changed under reservation, re-reading");
                }
            }
        }
        Err(RewardError::Store(StoreError::Conflict(id.to_string())))
    }

    async fn retry(&self, id: &LocationId) -> Result<RewardResult, RewardError> {
        let location = self.read_location(id)?;
        let observed_attempts = match &location.reward {
            RewardStatus::Rewarded { .. } => return Ok(RewardResult::AlreadyRewarded),
            RewardStatus::Unrewarded => return Err(RewardError::NotInFlight(id.clone())),
            RewardStatus::InFlight { attempts, .. } => *attempts,
        };
        let owner = location
            .claimed_by
            .clone()
            .ok_or_else(|| RewardError::NotClaimed(id.clone()))?;
        let Some(payout) = self.payout_address(&owner)? else {
            self.record_failure(id, "no wallet on file".to_string());
            return Ok(RewardResult::NoWalletOnFile);
        };
        let amount = self.params.reward_for(location.reward_tokens);
        let units = self.ledger_units(amount)?;

        // Two concurrent retries observe the same attempt count; only one bumps it.
        let now = self.clock.now();
        let stale_after = self.params.ledger_timeout_secs;
        let won = update_location(
            self.locations.as_ref(),
            id,
            self.params.store_retry_attempts,
            |loc| match &mut loc.reward {
                RewardStatus::InFlight {
                    reserved_at,
                    attempts,
                    last_error,
                } if *attempts == observed_attempts => {
                    let age = now.as_secs().saturating_sub(reserved_at.as_secs());
                    if last_error.is_none() && age < stale_after {
                        return Mutation::Skip(false);
                    }
                    *attempts += 1;
                    *last_error = None;
                    *reserved_at = now;
                    Mutation::Write(true)
                }
                _ => Mutation::Skip(false),
            },
        )
        .map_err(|e| store_error(id, e))?;
        if !won {
            debug!(location = %id, "transfer may still be running, not retrying");
            return Ok(RewardResult::InProgress);
        }

        info!(location = %id, attempt = observed_attempts + 1, "retrying reward transfer");
        self.pay(id, &owner, &payout, amount, units).await
    }

    async fn confirm(&self, id: &LocationId, tx_id: TxId) -> Result<RewardResult, RewardError> {
        let location = self.read_location(id)?;
        match location.reward {
            RewardStatus::Rewarded { .. } => return Ok(RewardResult::AlreadyRewarded),
            RewardStatus::Unrewarded => return Err(RewardError::NotInFlight(id.clone())),
            RewardStatus::InFlight { .. } => {}
        }
        let owner = location
            .claimed_by
            .clone()
            .ok_or_else(|| RewardError::NotClaimed(id.clone()))?;
        let amount = self.params.reward_for(location.reward_tokens);
        info!(location = %id, %tx_id, "operator confirmed reward transfer");
        // Resolved concurrently: nothing was sent by this call.
        Ok(self
            .finalize(id, &owner, amount, tx_id)
            .await?
            .unwrap_or(RewardResult::AlreadyRewarded))
    }

    async fn pay(
        &self,
        id: &LocationId,
        owner: &WalletId,
        payout: &WalletId,
        amount: TokenAmount,
        units: u128,
    ) -> Result<RewardResult, RewardError> {
        let timeout = self.params.ledger_timeout();
        let receipt =
            match tokio::time::timeout(timeout, self.ledger.transfer(payout, units)).await {
                Ok(Ok(receipt)) => receipt,
                Ok(Err(source)) => {
                    error!(location = %id, to = %payout, error = %source, "reward transfer failed");
                    self.record_failure(id, source.to_string());
                    return Err(RewardError::Transfer {
                        location: id.clone(),
                        source,
                    });
                }
                Err(_) => {
                    error!(
                        location = %id,
                        to = %payout,
                        timeout_secs = timeout.as_secs(),
                        "reward transfer timed out"
                    );
                    self.record_failure(id, format!("timed out after {}s", timeout.as_secs()));
                    return Err(RewardError::TransferTimedOut {
                        location: id.clone(),
                        after_secs: timeout.as_secs(),
                    });
                }
            };
        let tx_id = receipt.tx_id;
        match self.finalize(id, owner, amount, tx_id.clone()).await? {
            Some(result) => Ok(result),
            None => {
                error!(
                    location = %id,
                    to = %payout,
                    %tx_id,
                    "transfer landed after the reward was settled, owner paid twice"
                );
                Err(RewardError::UnrecordedTransfer {
                    location: id.clone(),
                    tx_id,
                })
            }
        }
    }

    /// Mark the reservation rewarded with `tx_id`.
    ///
    /// `Ok(None)` when the reservation was already resolved by someone else.
    async fn finalize(
        &self,
        id: &LocationId,
        owner: &WalletId,
        amount: TokenAmount,
        tx_id: TxId,
    ) -> Result<Option<RewardResult>, RewardError> {
        let now = self.clock.now();
        let finalized = update_location(
            self.locations.as_ref(),
            id,
            self.params.store_retry_attempts,
            |loc| {
                if !loc.is_reward_in_flight() {
                    return Mutation::Skip(None);
                }
                loc.cleaned = true;
                loc.verified = true;
                loc.cleaned_by = Some(owner.clone());
                loc.reward = RewardStatus::Rewarded {
                    tx_id: tx_id.clone(),
                    amount,
                    rewarded_at: now,
                };
                Mutation::Write(Some(loc.name.clone()))
            },
        );
        let location_name = match finalized {
            Ok(Some(name)) => name,
            Ok(None) => return Ok(None),
            Err(source) => {
                error!(location = %id, %tx_id, error = %source, "failed to finalize reward");
                return Err(RewardError::Finalize {
                    location: id.clone(),
                    tx_id,
                    source,
                });
            }
        };

        info!(location = %id, %owner, %amount, %tx_id, "reward issued");
        self.credit_owner(owner, amount);
        self.notify_rewarded(owner, location_name, amount).await;
        Ok(Some(RewardResult::Rewarded { tx_id, amount }))
    }

    /// Bump the advisory off-chain counter. The ledger stays authoritative.
    fn credit_owner(&self, owner: &WalletId, amount: TokenAmount) {
        let now = self.clock.now();
        let credited = update_user(
            self.users.as_ref(),
            owner,
            self.params.store_retry_attempts,
            |user| {
                user.tokens = user.tokens.saturating_add(amount);
                user.updated_at = Some(now);
                Mutation::Write(())
            },
        );
        if let Err(e) = credited {
            warn!(%owner, %amount, error = %e, "failed to update token counter");
        }
    }

    async fn notify_rewarded(&self, owner: &WalletId, location_name: String, amount: TokenAmount) {
        let Ok(user) = self.users.get_user(owner) else {
            return;
        };
        let Some(email) = user.value.email else {
            debug!(%owner, "no email on file, skipping reward notification");
            return;
        };
        let notice = RewardNotice {
            email,
            name: user.value.display_name.unwrap_or_else(|| owner.to_string()),
            location_name,
            amount,
        };
        dispatch(
            "rewarded",
            self.params.notify_timeout(),
            self.notifier.notify_rewarded(&notice),
        )
        .await;
    }

    fn record_failure(&self, id: &LocationId, reason: String) {
        let recorded = update_location(
            self.locations.as_ref(),
            id,
            self.params.store_retry_attempts,
            |loc| match &mut loc.reward {
                RewardStatus::InFlight { last_error, .. } => {
                    *last_error = Some(reason.clone());
                    Mutation::Write(())
                }
                _ => Mutation::Skip(()),
            },
        );
        if let Err(e) = recorded {
            warn!(location = %id, error = %e, "failed to record transfer error");
        }
    }

    fn read_location(&self, id: &LocationId) -> Result<Location, RewardError> {
        self.locations
            .get_location(id)
            .map(|v| v.value)
            .map_err(|e| store_error(id, e))
    }

    fn payout_address(&self, owner: &WalletId) -> Result<Option<WalletId>, RewardError> {
        match self.users.get_user(owner) {
            Ok(user) => Ok(user.value.wallet_address),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn ledger_units(&self, amount: TokenAmount) -> Result<u128, RewardError> {
        amount
            .to_ledger_units(self.params.ledger_decimals)
            .ok_or(RewardError::AmountOverflow(amount))
    }
}

fn store_error(id: &LocationId, e: StoreError) -> RewardError {
    match e {
        StoreError::NotFound(_) => RewardError::NotFound(id.clone()),
        other => RewardError::Store(other),
    }
}
