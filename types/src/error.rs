//! Errors raised while constructing validated values.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TypesError {
    #[error("invalid wallet identifier: {0:?}")]
    InvalidWallet(String),

    #[error("invalid location identifier: {0:?}")]
    InvalidLocation(String),

    #[error("invalid coordinates: lat={lat}, lng={lng}")]
    InvalidCoordinates { lat: f64, lng: f64 },

    #[error("reward amount must be positive")]
    ZeroReward,
}
