//! Geographic coordinates in floating-point degrees.

use serde::{Deserialize, Serialize};

use crate::TypesError;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Build validated coordinates. Latitude must lie in [-90, 90] and
    /// longitude in [-180, 180]; NaN and infinities are rejected.
    pub fn new(lat: f64, lng: f64) -> Result<Self, TypesError> {
        let coords = Self { lat, lng };
        if coords.is_valid() {
            Ok(coords)
        } else {
            Err(TypesError::InvalidCoordinates { lat, lng })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}
