//! Outbound notifications for claim and reward events.
//!
//! Notifications are advisory. A failed or slow notification never affects the
//! lifecycle state it describes, so callers go through [`dispatch`] which
//! bounds the wait and swallows the error after logging it.

pub mod error;
pub mod logger;
pub mod webhook;

pub use error::NotifyError;
pub use logger::LogNotifier;
pub use webhook::WebhookNotifier;

use std::future::Future;
use std::time::Duration;

use cleanchain_types::TokenAmount;
use futures_util::future::BoxFuture;
use serde::Serialize;
use tracing::warn;

/// Sent when a user claims a location.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClaimNotice {
    pub email: String,
    pub name: String,
    pub location_name: String,
}

/// Sent once a location's reward has been paid.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RewardNotice {
    pub email: String,
    pub name: String,
    pub location_name: String,
    pub amount: TokenAmount,
}

pub trait Notifier: Send + Sync {
    fn notify_claimed<'a>(&'a self, notice: &'a ClaimNotice) -> BoxFuture<'a, Result<(), NotifyError>>;

    fn notify_rewarded<'a>(&'a self, notice: &'a RewardNotice) -> BoxFuture<'a, Result<(), NotifyError>>;
}

/// Await a notification for at most `timeout`.
///
/// Returns whether it was delivered. Failures are logged at `warn` only.
pub async fn dispatch<F>(kind: &'static str, timeout: Duration, send: F) -> bool
where
    F: Future<Output = Result<(), NotifyError>>,
{
    let err = match tokio::time::timeout(timeout, send).await {
        Ok(Ok(())) => return true,
        Ok(Err(e)) => e,
        Err(_) => NotifyError::TimedOut,
    };
    warn!(kind, error = %err, "notification not delivered");
    false
}
