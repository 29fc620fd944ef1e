//! Nullable token ledger: records transfers instead of sending them.

use cleanchain_token_ledger::{LedgerError, TokenLedger, TransferReceipt};
use cleanchain_types::{TxId, WalletId};
use futures_util::future::BoxFuture;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// How the next transfers should behave.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerBehaviour {
    /// Acknowledge after the configured delay.
    Succeed,
    /// Fail every transfer with `LedgerError::Rejected`.
    Reject(String),
    /// Never complete. Exercises the caller's timeout.
    Hang,
}

/// A deterministic token ledger for testing.
///
/// Transaction ids are `0xnull-1`, `0xnull-2`, ... in acknowledgement order.
pub struct NullLedger {
    behaviour: Mutex<LedgerBehaviour>,
    delay: Duration,
    transfers: Mutex<Vec<(WalletId, u128)>>,
    attempts: AtomicU64,
    next_tx: AtomicU64,
}

impl NullLedger {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    /// Acknowledge transfers only after `delay`, widening race windows in
    /// concurrency tests.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            behaviour: Mutex::new(LedgerBehaviour::Succeed),
            delay,
            transfers: Mutex::new(Vec::new()),
            attempts: AtomicU64::new(0),
            next_tx: AtomicU64::new(1),
        }
    }

    pub fn set_behaviour(&self, behaviour: LedgerBehaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    /// Transfers that were acknowledged.
    pub fn transfers(&self) -> Vec<(WalletId, u128)> {
        self.transfers.lock().unwrap().clone()
    }

    pub fn transfer_count(&self) -> usize {
        self.transfers.lock().unwrap().len()
    }

    /// Every call to `transfer`, successful or not.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Default for NullLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenLedger for NullLedger {
    fn transfer<'a>(
        &'a self,
        to: &'a WalletId,
        amount: u128,
    ) -> BoxFuture<'a, Result<TransferReceipt, LedgerError>> {
        Box::pin(async move {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let behaviour = self.behaviour.lock().unwrap().clone();
            match behaviour {
                LedgerBehaviour::Hang => std::future::pending().await,
                LedgerBehaviour::Reject(reason) => Err(LedgerError::Rejected(reason)),
                LedgerBehaviour::Succeed => {
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                    self.transfers.lock().unwrap().push((to.clone(), amount));
                    let n = self.next_tx.fetch_add(1, Ordering::SeqCst);
                    Ok(TransferReceipt {
                        tx_id: TxId::new(format!("0xnull-{n}")),
                    })
                }
            }
        })
    }

    fn balance_of<'a>(&'a self, address: &'a WalletId) -> BoxFuture<'a, Result<u128, LedgerError>> {
        let balance = self
            .transfers
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to == address)
            .map(|(_, amount)| *amount)
            .sum();
        Box::pin(std::future::ready(Ok(balance)))
    }

    fn name(&self) -> &str {
        "null-ledger"
    }
}
