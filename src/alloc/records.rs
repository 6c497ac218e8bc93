use rand::Rng;
use serde::Serialize;

use crate::alloc::distribution::ClassCounts;
use crate::catalog::{BoundingBox, BuildingClass, Location};

/// Largest cluster multiplier, reached at 500,000 inhabitants.
const MAX_CLUSTER_MULTIPLIER: f64 = 5.0;
const CLUSTER_SIZE_PER_MULTIPLIER: f64 = 50.0;

/// One synthetic building.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Building {
    /// 16 lowercase hex characters.
    pub unique_id: String,
    /// `<PREFIX>_<STATE>_<serial>`, serial zero-padded to six digits.
    pub building_id: String,
    pub location: String,
    pub region: String,
    pub state: String,
    pub population: u64,
    pub class: BuildingClass,
    pub latitude: f64,
    pub longitude: f64,
    pub cluster_size: u32,
}

/// Expands per-class counts into building records.
///
/// Building ids are numbered sequentially across every location the factory
/// is used for.
#[derive(Debug, Clone)]
pub struct BuildingRecordFactory {
    id_prefix: String,
    default_bounds: BoundingBox,
    next_serial: u64,
}

impl BuildingRecordFactory {
    pub fn new(id_prefix: impl Into<String>, default_bounds: BoundingBox) -> Self {
        Self {
            id_prefix: id_prefix.into(),
            default_bounds,
            next_serial: 1,
        }
    }

    /// Creates one building of `class` in `location`.
    pub fn build<R: Rng>(&mut self, location: &Location, class: BuildingClass, rng: &mut R) -> Building {
        let unique_id = format!("{:016x}", rng.random::<u64>());
        let building_id = format!(
            "{}_{}_{:06}",
            self.id_prefix,
            state_code(location),
            self.next_serial
        );
        self.next_serial += 1;

        let bounds = location.bounds.unwrap_or(self.default_bounds);
        let (latitude, longitude) = bounds.sample(rng);

        Building {
            unique_id,
            building_id,
            location: location.name.clone(),
            region: location.region.clone(),
            state: location.state.clone(),
            population: location.population,
            class,
            latitude,
            longitude,
            cluster_size: rng.random_range(1..=max_cluster_size(location.population)),
        }
    }

    /// Creates every building described by `counts`, in shuffled class
    /// order.
    pub fn expand<R: Rng>(&mut self, location: &Location, counts: &ClassCounts, rng: &mut R) -> Vec<Building> {
        counts
            .shuffled_units(rng)
            .into_iter()
            .map(|class| self.build(location, class, rng))
            .collect()
    }
}

/// Upper bound of the cluster size draw: 50 per 100,000 inhabitants, capped
/// at 250 and never below 1.
pub fn max_cluster_size(population: u64) -> u32 {
    let multiplier = (population as f64 / 100_000.0).min(MAX_CLUSTER_MULTIPLIER);
    ((CLUSTER_SIZE_PER_MULTIPLIER * multiplier).floor() as u32).max(1)
}

fn state_code(location: &Location) -> String {
    let source = if location.state.trim().is_empty() {
        &location.name
    } else {
        &location.state
    };
    let code: String = source
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(3)
        .collect::<String>()
        .to_ascii_uppercase();
    if code.is_empty() { "UNK".to_string() } else { code }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, malaysia::COUNTRY_BOUNDS};
    use crate::rng::stream_rng;

    #[test]
    fn ids_are_sequential_and_well_formed() {
        let catalog = Catalog::malaysia();
        let kl = catalog.get("Kuala Lumpur").expect("KL present");
        let mut factory = BuildingRecordFactory::new("MY", COUNTRY_BOUNDS);
        let mut rng = stream_rng(1, 1, 0);

        let first = factory.build(kl, BuildingClass::Office, &mut rng);
        let second = factory.build(kl, BuildingClass::Hotel, &mut rng);
        assert_eq!(first.building_id, "MY_FED_000001");
        assert_eq!(second.building_id, "MY_FED_000002");
        assert_eq!(first.unique_id.len(), 16);
        assert!(first.unique_id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first.unique_id, second.unique_id);
    }

    #[test]
    fn coordinates_fall_back_to_default_bounds() {
        let catalog = Catalog::malaysia();
        let kl = catalog.get("Kuala Lumpur").expect("KL present");
        let muar = catalog.get("Muar").expect("Muar present");
        assert!(muar.bounds.is_none());
        let kl_bounds = kl.bounds.expect("KL has bounds");

        let mut factory = BuildingRecordFactory::new("MY", COUNTRY_BOUNDS);
        let mut rng = stream_rng(2, 1, 0);
        for _ in 0..200 {
            let b = factory.build(kl, BuildingClass::Residential, &mut rng);
            assert!(kl_bounds.contains(b.latitude, b.longitude));
            let b = factory.build(muar, BuildingClass::Residential, &mut rng);
            assert!(COUNTRY_BOUNDS.contains(b.latitude, b.longitude));
        }
    }

    #[test]
    fn cluster_size_bounds_follow_population() {
        assert_eq!(max_cluster_size(10_000), 5);
        assert_eq!(max_cluster_size(1_000), 1);
        assert_eq!(max_cluster_size(200_000), 100);
        assert_eq!(max_cluster_size(1_800_000), 250);

        let location = Location::new("Village", 1_000, "R", "S");
        let mut factory = BuildingRecordFactory::new("MY", COUNTRY_BOUNDS);
        let mut rng = stream_rng(3, 1, 0);
        for _ in 0..50 {
            assert_eq!(factory.build(&location, BuildingClass::Residential, &mut rng).cluster_size, 1);
        }
    }

    #[test]
    fn expand_matches_counts() {
        let counts: ClassCounts = [
            (BuildingClass::Residential, 6),
            (BuildingClass::School, 2),
            (BuildingClass::Clinic, 1),
        ]
        .into_iter()
        .collect();
        let location = Location::new("Town", 40_000, "R", "Perak");
        let mut factory = BuildingRecordFactory::new("MY", COUNTRY_BOUNDS);
        let mut rng = stream_rng(4, 1, 0);

        let buildings = factory.expand(&location, &counts, &mut rng);
        assert_eq!(buildings.len(), 9);
        let schools = buildings.iter().filter(|b| b.class == BuildingClass::School).count();
        assert_eq!(schools, 2);
        assert!(buildings.iter().all(|b| b.building_id.starts_with("MY_PER_")));
    }
}
