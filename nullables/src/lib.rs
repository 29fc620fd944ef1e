//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the engine (clock, storage, token ledger,
//! notifications) sits behind a trait. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (inject conflicts, failures, hangs)
//! - Record what was asked of them so tests can assert on it
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests, or run the node
//! with `store = "memory"` to use [`NullStore`] as a throwaway backend.

pub mod clock;
pub mod ledger;
pub mod notifier;
pub mod store;

pub use clock::NullClock;
pub use ledger::{LedgerBehaviour, NullLedger};
pub use notifier::NullNotifier;
pub use store::NullStore;
