//! Seeding locations from a TOML file.
//!
//! ```toml
//! [[locations]]
//! id = "community-park"
//! name = "Community Park"
//! lat = 28.6139
//! lng = 77.2090
//! reward_tokens = 25
//! before_photo_url = "https://example.org/park-before.jpg"
//! ```
//!
//! Existing ids are left untouched, so seeding is safe to repeat on every start.

use std::path::Path;

use cleanchain_store::{Location, LocationStore, StoreError};
use cleanchain_types::{Coordinates, LocationId, TokenAmount};
use serde::Deserialize;
use tracing::{debug, info};

use crate::NodeError;

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    locations: Vec<SeedLocation>,
}

#[derive(Debug, Deserialize)]
struct SeedLocation {
    id: String,
    name: String,
    lat: f64,
    lng: f64,
    #[serde(default)]
    reward_tokens: Option<u64>,
    #[serde(default)]
    before_photo_url: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

pub fn seed_locations(store: &dyn LocationStore, path: &Path) -> Result<SeedReport, NodeError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| NodeError::Seed(format!("{}: {e}", path.display())))?;
    let report = seed_from_str(store, &content)?;
    info!(
        path = %path.display(),
        inserted = report.inserted,
        skipped = report.skipped,
        "seeded locations"
    );
    Ok(report)
}

pub fn seed_from_str(store: &dyn LocationStore, content: &str) -> Result<SeedReport, NodeError> {
    let file: SeedFile = toml::from_str(content).map_err(|e| NodeError::Seed(e.to_string()))?;

    // Validate everything before inserting anything.
    let mut locations = Vec::with_capacity(file.locations.len());
    for seed in file.locations {
        let id = LocationId::parse(&seed.id)?;
        let coordinates = Coordinates::new(seed.lat, seed.lng)
            .map_err(|e| NodeError::Seed(format!("location {id}: {e}")))?;
        let mut location = Location::new(
            id,
            seed.name,
            coordinates,
            seed.reward_tokens.map(TokenAmount::new),
        );
        location.before_photo_url = seed.before_photo_url;
        locations.push(location);
    }

    let mut report = SeedReport::default();
    for location in &locations {
        match store.insert_location(location) {
            Ok(()) => report.inserted += 1,
            Err(StoreError::Duplicate(_)) => {
                debug!(location = %location.id, "already present, not seeding");
                report.skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cleanchain_nullables::NullStore;

    const SEED: &str = r#"
        [[locations]]
        id = "pdeu"
        name = "Pandit Deendayal Energy University"
        lat = 29.5239
        lng = 79.0890
        reward_tokens = 100
        before_photo_url = "https://example.org/before.jpg"

        [[locations]]
        id = "lake"
        name = "City Lake"
        lat = 28.6039
        lng = 77.2000
    "#;

    #[test]
    fn inserts_new_locations_once() {
        let store = NullStore::new();
        let first = seed_from_str(&store, SEED).unwrap();
        assert_eq!(first, SeedReport { inserted: 2, skipped: 0 });
        let again = seed_from_str(&store, SEED).unwrap();
        assert_eq!(again, SeedReport { inserted: 0, skipped: 2 });

        let pdeu = store
            .get_location(&LocationId::parse("pdeu").unwrap())
            .unwrap()
            .value;
        assert_eq!(pdeu.reward_tokens, Some(TokenAmount::new(100)));
        assert!(!pdeu.is_claimed());
        let lake = store
            .get_location(&LocationId::parse("lake").unwrap())
            .unwrap()
            .value;
        assert_eq!(lake.reward_tokens, None);
    }

    #[test]
    fn invalid_coordinates_abort_before_any_insert() {
        let store = NullStore::new();
        let bad = r#"
            [[locations]]
            id = "ok"
            name = "Fine"
            lat = 1.0
            lng = 1.0

            [[locations]]
            id = "bad"
            name = "Off the map"
            lat = 123.0
            lng = 1.0
        "#;
        assert!(matches!(seed_from_str(&store, bad), Err(NodeError::Seed(_))));
        assert!(store.list_locations().unwrap().is_empty());
    }
}
