//! Reward issuance.
//!
//! A location's reward moves `Unrewarded → InFlight → Rewarded`. The
//! `InFlight` reservation is taken with a compare-and-swap *before* the ledger
//! is called, so however many callers race on one location only the one that
//! took the reservation ever transfers. A transfer that fails or times out
//! leaves the reservation in place; resolving it is an explicit operator step
//! ([`RewardIssuer::retry_in_flight`] or [`RewardIssuer::confirm_in_flight`]).

pub mod error;
pub mod issuer;

pub use error::RewardError;
pub use issuer::{RewardIssuer, RewardResult};
