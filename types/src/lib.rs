//! Fundamental types for the CleanChain lifecycle engine.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! identifiers, coordinates, token amounts, timestamps, and engine parameters.

pub mod address;
pub mod amount;
pub mod coordinates;
pub mod error;
pub mod ids;
pub mod params;
pub mod time;

pub use address::WalletId;
pub use amount::TokenAmount;
pub use coordinates::Coordinates;
pub use error::TypesError;
pub use ids::{LocationId, TxId};
pub use params::{ConsensusPolicy, EngineParams};
pub use time::{Clock, SystemClock, Timestamp};
