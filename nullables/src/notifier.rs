//! Nullable notifier: captures notifications for assertions.

use cleanchain_notify::{ClaimNotice, Notifier, NotifyError, RewardNotice};
use futures_util::future::{self, BoxFuture};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct NullNotifier {
    claimed: Mutex<Vec<ClaimNotice>>,
    rewarded: Mutex<Vec<RewardNotice>>,
    failing: AtomicBool,
}

impl NullNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent notification fail (nothing is recorded).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn claimed(&self) -> Vec<ClaimNotice> {
        self.claimed.lock().unwrap().clone()
    }

    pub fn rewarded(&self) -> Vec<RewardNotice> {
        self.rewarded.lock().unwrap().clone()
    }

    fn record<T: Clone>(&self, sink: &Mutex<Vec<T>>, notice: &T) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Unreachable("null notifier set to fail".into()));
        }
        sink.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

impl Notifier for NullNotifier {
    fn notify_claimed<'a>(&'a self, notice: &'a ClaimNotice) -> BoxFuture<'a, Result<(), NotifyError>> {
        Box::pin(future::ready(self.record(&self.claimed, notice)))
    }

    fn notify_rewarded<'a>(&'a self, notice: &'a RewardNotice) -> BoxFuture<'a, Result<(), NotifyError>> {
        Box::pin(future::ready(self.record(&self.rewarded, notice)))
    }
}
