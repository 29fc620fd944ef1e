use futures_util::future::{self, BoxFuture};
use tracing::info;

use crate::{ClaimNotice, Notifier, NotifyError, RewardNotice};

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_claimed<'a>(&'a self, notice: &'a ClaimNotice) -> BoxFuture<'a, Result<(), NotifyError>> {
        info!(
            email = %notice.email,
            name = %notice.name,
            location = %notice.location_name,
            "location claimed"
        );
        Box::pin(future::ready(Ok(())))
    }

    fn notify_rewarded<'a>(&'a self, notice: &'a RewardNotice) -> BoxFuture<'a, Result<(), NotifyError>> {
        info!(
            email = %notice.email,
            name = %notice.name,
            location = %notice.location_name,
            amount = %notice.amount,
            "reward paid"
        );
        Box::pin(future::ready(Ok(())))
    }
}
