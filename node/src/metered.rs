//! Notifier wrapper that counts undelivered notifications.

use std::sync::Arc;
use std::time::Duration;

use cleanchain_notify::{ClaimNotice, Notifier, NotifyError, RewardNotice};
use futures_util::future::BoxFuture;
use prometheus::IntCounterVec;

/// Bounds each notification by `timeout` and counts the ones that fail.
///
/// The timeout matches the one callers dispatch with, so a slow notifier is
/// counted as `TimedOut` here rather than silently dropped upstream.
pub struct MeteredNotifier {
    inner: Arc<dyn Notifier>,
    failures: IntCounterVec,
    timeout: Duration,
}

impl MeteredNotifier {
    pub fn new(inner: Arc<dyn Notifier>, failures: IntCounterVec, timeout: Duration) -> Self {
        Self {
            inner,
            failures,
            timeout,
        }
    }

    async fn observe<F>(&self, kind: &'static str, send: F) -> Result<(), NotifyError>
    where
        F: std::future::Future<Output = Result<(), NotifyError>>,
    {
        let result = match tokio::time::timeout(self.timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::TimedOut),
        };
        if result.is_err() {
            self.failures.with_label_values(&[kind]).inc();
        }
        result
    }
}

impl Notifier for MeteredNotifier {
    fn notify_claimed<'a>(&'a self, notice: &'a ClaimNotice) -> BoxFuture<'a, Result<(), NotifyError>> {
        Box::pin(self.observe("claimed", self.inner.notify_claimed(notice)))
    }

    fn notify_rewarded<'a>(&'a self, notice: &'a RewardNotice) -> BoxFuture<'a, Result<(), NotifyError>> {
        Box::pin(self.observe("rewarded", self.inner.notify_rewarded(notice)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineMetrics;
    use cleanchain_nullables::NullNotifier;

    fn notice() -> ClaimNotice {
        ClaimNotice {
            email: "a@example.org".into(),
            name: "alice".into(),
            location_name: "Pier 7".into(),
        }
    }

    #[tokio::test]
    async fn counts_failures_by_kind() {
        let metrics = EngineMetrics::new().unwrap();
        let inner = Arc::new(NullNotifier::new());
        let metered = MeteredNotifier::new(
            inner.clone(),
            metrics.notification_failures.clone(),
            Duration::from_secs(5),
        );

        metered.notify_claimed(&notice()).await.unwrap();
        inner.set_failing(true);
        assert!(metered.notify_claimed(&notice()).await.is_err());

        let claimed = metrics.notification_failures.with_label_values(&["claimed"]);
        assert_eq!(claimed.get(), 1);
        assert_eq!(inner.claimed().len(), 1);
    }
}
