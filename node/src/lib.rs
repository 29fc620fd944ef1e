//! CleanChain node: the location lifecycle engine and everything needed to
//! run it.
//!
//! The node wires the lifecycle components together:
//! - Claims gated by distance to the location
//! - Append-only community voting
//! - Fixed-count consensus and exactly-once reward issuance
//! - Reconciliation of rewards left in flight
//! - Seeding, configuration, logging, metrics and graceful shutdown

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod metered;
pub mod metrics;
pub mod node;
pub mod seed;
pub mod shutdown;
pub mod views;

pub use config::{LedgerConfig, NodeConfig, NotifierConfig, StoreBackend};
pub use engine::{Collaborators, LifecycleEngine, ProfileUpdate, Registration, VoteOutcome};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metered::MeteredNotifier;
pub use metrics::EngineMetrics;
pub use node::CleanChainNode;
pub use seed::{seed_from_str, seed_locations, SeedReport};
pub use shutdown::ShutdownController;
pub use views::{InFlightView, LocationView, UserView, VoteView};
