//! Location claims.
//!
//! A user standing within the claim radius of an unclaimed, uncleaned
//! location becomes its owner. Ownership is decided inside one atomic store
//! update, so of two simultaneous claimants exactly one wins and the other
//! sees `AlreadyClaimed`.

pub mod error;

pub use error::ClaimError;

use std::sync::Arc;

use cleanchain_geo::GeoValidator;
use cleanchain_notify::{dispatch, ClaimNotice, Notifier};
use cleanchain_store::{update_location, LocationStore, Mutation, StoreError, UserStore};
use cleanchain_types::{Clock, Coordinates, EngineParams, LocationId, Timestamp, WalletId};
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq)]
pub enum ClaimResult {
    Claimed { claimed_at: Timestamp },
    AlreadyCleaned { by_you: bool },
    AlreadyClaimed { by_you: bool },
    /// Claimant is outside the radius. Distance in metres, rounded to 2 places.
    TooFar { distance_m: f64 },
}

pub struct ClaimService {
    locations: Arc<dyn LocationStore>,
    users: Arc<dyn UserStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    geo: GeoValidator,
    params: EngineParams,
}

impl ClaimService {
    pub fn new(
        locations: Arc<dyn LocationStore>,
        users: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        params: EngineParams,
    ) -> Self {
        Self {
            locations,
            users,
            notifier,
            clock,
            geo: GeoValidator::new(params.claim_radius_m),
            params,
        }
    }

    pub fn geo(&self) -> &GeoValidator {
        &self.geo
    }

    /// Claim `location_id` for `claimant` standing at (`lat`, `lng`).
    pub async fn claim(
        &self,
        location_id: &LocationId,
        claimant: &WalletId,
        lat: f64,
        lng: f64,
    ) -> Result<ClaimResult, ClaimError> {
        let position = Coordinates::new(lat, lng)?;
        let now = self.clock.now();

        let outcome = update_location(
            self.locations.as_ref(),
            location_id,
            self.params.store_retry_attempts,
            |location| {
                if location.cleaned {
                    let cleaner = location.cleaned_by.as_ref().or(location.claimed_by.as_ref());
                    return Mutation::Skip((
                        ClaimResult::AlreadyCleaned {
                            by_you: cleaner == Some(claimant),
                        },
                        None,
                    ));
                }
                if let Some(owner) = &location.claimed_by {
                    return Mutation::Skip((
                        ClaimResult::AlreadyClaimed {
                            by_you: owner == claimant,
                        },
                        None,
                    ));
                }
                let report = self.geo.check(position, location.coordinates);
                if !report.within_range {
                    return Mutation::Skip((
                        ClaimResult::TooFar {
                            distance_m: report.meters,
                        },
                        None,
                    ));
                }
                location.claimed_by = Some(claimant.clone());
                location.claimed_at = Some(now);
                Mutation::Write((
                    ClaimResult::Claimed { claimed_at: now },
                    Some(location.name.clone()),
                ))
            },
        )
        .map_err(|e| match e {
            StoreError::NotFound(_) => ClaimError::NotFound(location_id.clone()),
            other => ClaimError::Store(other),
        })?;

        let (result, claimed_name) = outcome;
        match &claimed_name {
            Some(name) => {
                info!(location = %location_id, %claimant, "location claimed");
                self.notify_claimed(claimant, name).await;
            }
            None => debug!(location = %location_id, %claimant, ?result, "claim refused"),
        }
        Ok(result)
    }

    async fn notify_claimed(&self, claimant: &WalletId, location_name: &str) {
        let user = match self.users.get_user(claimant) {
            Ok(user) => user.value,
            Err(e) => {
                debug!(%claimant, error = %e, "no user record, skipping claim notification");
                return;
            }
        };
        let Some(email) = user.email else {
            debug!(%claimant, "no email on file, skipping claim notification");
            return;
        };
        let notice = ClaimNotice {
            email,
            name: user.display_name.unwrap_or_else(|| claimant.to_string()),
            location_name: location_name.to_string(),
        };
        dispatch(
            "claimed",
            self.params.notify_timeout(),
            self.notifier.notify_claimed(&notice),
        )
        .await;
    }
}
