//! HTTP API for the CleanChain node.
//!
//! Provides endpoints for:
//! - Location listing and detail
//! - Claiming a location from the claimant's position
//! - Community votes (and the consensus/reward they trigger)
//! - Distance checks
//! - Per-user claimed locations and upload completion
//! - Wallet login and profile updates
//! - Health and Prometheus metrics

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{router, RpcServer, RpcState};
