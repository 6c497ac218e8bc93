//! Built-in Malaysian reference catalog.

use std::collections::BTreeMap;

use super::Catalog;
use super::archetype::BuildingClass;
use super::location::{AuthoritativeCounts, BoundingBox, Location, UrbanProfile};

/// Country-wide coordinate box used when a location has none of its own.
pub const COUNTRY_BOUNDS: BoundingBox = BoundingBox::new(1.0, 7.0, 99.5, 119.5);

/// `(name, population, state, region)` in catalog order.
const LOCATIONS: &[(&str, u64, &str, &str)] = &[
    ("Kuala Lumpur", 1_800_000, "Federal Territory", "Central"),
    ("George Town", 708_000, "Penang", "Northern"),
    ("Ipoh", 657_000, "Perak", "Northern"),
    ("Shah Alam", 641_000, "Selangor", "Central"),
    ("Petaling Jaya", 613_000, "Selangor", "Central"),
    ("Johor Bahru", 497_000, "Johor", "Southern"),
    ("Subang Jaya", 469_000, "Selangor", "Central"),
    ("Klang", 440_000, "Selangor", "Central"),
    ("Kota Kinabalu", 452_000, "Sabah", "East Malaysia"),
    ("Malacca City", 455_000, "Malacca", "Southern"),
    ("Alor Setar", 405_000, "Kedah", "Northern"),
    ("Seremban", 372_000, "Negeri Sembilan", "Central"),
    ("Kuantan", 366_000, "Pahang", "East Coast"),
    ("Iskandar Puteri", 360_000, "Johor", "Southern"),
    ("Tawau", 313_000, "Sabah", "East Malaysia"),
    ("Ampang Jaya", 315_000, "Selangor", "Central"),
    ("Miri", 300_000, "Sarawak", "East Malaysia"),
    ("Kuching", 325_000, "Sarawak", "East Malaysia"),
    ("Sandakan", 279_000, "Sabah", "East Malaysia"),
    ("Kuala Terengganu", 285_000, "Terengganu", "East Coast"),
    ("Taiping", 245_000, "Perak", "Northern"),
    ("Batu Pahat", 239_000, "Johor", "Southern"),
    ("Kluang", 233_000, "Johor", "Southern"),
    ("Muar", 210_000, "Johor", "Southern"),
    ("Pasir Gudang", 200_000, "Johor", "Southern"),
    ("Kota Bharu", 491_000, "Kelantan", "East Coast"),
    ("Sungai Petani", 228_000, "Kedah", "Northern"),
    ("Sibu", 183_000, "Sarawak", "East Malaysia"),
    ("Lahad Datu", 156_000, "Sabah", "East Malaysia"),
    ("Putrajaya", 109_000, "Federal Territory", "Central"),
    ("Langkawi", 65_000, "Kedah", "Northern"),
    ("Port Klang", 180_000, "Selangor", "Central"),
    ("Cyberjaya", 65_000, "Selangor", "Central"),
    ("Kajang", 342_000, "Selangor", "Central"),
    ("Cheras", 381_000, "Selangor", "Central"),
    ("Puchong", 388_000, "Selangor", "Central"),
];

/// Coordinate boxes of the cities with surveyed extents.
const BOUNDS: &[(&str, BoundingBox)] = &[
    ("Kuala Lumpur", BoundingBox::new(3.1319, 3.1681, 101.6841, 101.7381)),
    ("George Town", BoundingBox::new(5.4000, 5.4300, 100.3000, 100.3300)),
    ("Ipoh", BoundingBox::new(4.5833, 4.6033, 101.0833, 101.1033)),
    ("Shah Alam", BoundingBox::new(3.0667, 3.1167, 101.4833, 101.5333)),
    ("Petaling Jaya", BoundingBox::new(3.1073, 3.1273, 101.6063, 101.6263)),
    ("Johor Bahru", BoundingBox::new(1.4833, 1.5033, 103.7333, 103.7533)),
    ("Langkawi", BoundingBox::new(6.3167, 6.3367, 99.8167, 99.8367)),
    ("Kota Kinabalu", BoundingBox::new(5.9667, 5.9867, 116.0667, 116.0867)),
    ("Kuching", BoundingBox::new(1.5333, 1.5533, 110.3333, 110.3533)),
    ("Cyberjaya", BoundingBox::new(2.9167, 2.9367, 101.6333, 101.6533)),
];

/// Column order of [`OFFICIAL_COUNTS`]: hospitals, clinics, schools, hotels,
/// shopping centres, warehouses, office buildings.
const OFFICIAL_CLASSES: [BuildingClass; 7] = [
    BuildingClass::Hospital,
    BuildingClass::Clinic,
    BuildingClass::School,
    BuildingClass::Hotel,
    BuildingClass::Commercial,
    BuildingClass::Warehouse,
    BuildingClass::Office,
];

/// Published facility counts (health, education, tourism and state
/// planning sources, 2023).
const OFFICIAL_COUNTS: &[(&str, [u64; 7])] = &[
    ("Kuala Lumpur", [28, 180, 450, 650, 85, 45, 1200]),
    ("George Town", [8, 45, 180, 180, 25, 15, 280]),
    ("Ipoh", [7, 40, 165, 45, 18, 12, 195]),
    ("Johor Bahru", [6, 35, 150, 85, 35, 85, 380]),
    ("Kota Kinabalu", [5, 28, 120, 95, 15, 8, 180]),
    ("Kuching", [4, 22, 95, 65, 12, 6, 125]),
    ("Alor Setar", [4, 25, 110, 35, 12, 8, 95]),
    ("Kuantan", [3, 22, 95, 55, 8, 12, 85]),
    ("Kota Bharu", [4, 28, 135, 42, 8, 5, 78]),
    ("Kuala Terengganu", [2, 18, 78, 48, 6, 8, 65]),
    ("Langkawi", [0, 3, 15, 95, 5, 2, 8]),
    ("Cyberjaya", [0, 2, 12, 15, 8, 3, 185]),
    ("Putrajaya", [1, 8, 25, 12, 6, 2, 95]),
    ("Port Klang", [1, 12, 48, 25, 8, 125, 45]),
    ("Pasir Gudang", [1, 15, 55, 28, 8, 65, 35]),
];

fn official_counts(name: &str) -> Option<AuthoritativeCounts> {
    let (_, row) = OFFICIAL_COUNTS.iter().find(|(n, _)| *n == name)?;
    let counts: BTreeMap<BuildingClass, u64> =
        OFFICIAL_CLASSES.iter().copied().zip(row.iter().copied()).collect();
    Some(AuthoritativeCounts::new(counts))
}

fn curated_profile(name: &str) -> Option<UrbanProfile> {
    let p = |economic_center, tourist_destination, industrial_hub, port_city, university_city| {
        UrbanProfile {
            economic_center,
            tourist_destination,
            industrial_hub,
            port_city,
            university_city,
            heritage_site: false,
            island_resort: false,
        }
    };
    let profile = match name {
        "Kuala Lumpur" => p(true, true, false, false, true),
        "George Town" => UrbanProfile {
            heritage_site: true,
            ..p(true, true, true, true, true)
        },
        "Ipoh" | "Shah Alam" => p(true, false, true, false, true),
        "Petaling Jaya" => p(true, false, false, false, true),
        "Johor Bahru" => p(true, false, true, true, true),
        "Kota Kinabalu" | "Kuching" => p(true, true, false, true, true),
        "Malacca City" => UrbanProfile {
            heritage_site: true,
            ..p(false, true, false, true, false)
        },
        "Port Klang" | "Pasir Gudang" => p(false, false, true, true, false),
        "Langkawi" => UrbanProfile {
            island_resort: true,
            ..p(false, true, false, false, false)
        },
        "Alor Setar" | "Kota Bharu" => p(true, false, false, false, true),
        "Kuantan" => p(true, false, true, true, true),
        "Kuala Terengganu" => p(true, false, false, true, true),
        _ => return None,
    };
    Some(profile)
}

/// The built-in catalog: 36 Malaysian cities and towns.
pub fn catalog() -> Catalog {
    let locations = LOCATIONS
        .iter()
        .map(|&(name, population, state, region)| {
            let mut location = Location::new(name, population, region, state);
            if let Some(profile) = curated_profile(name) {
                location.profile = profile;
            }
            if let Some((_, bounds)) = BOUNDS.iter().find(|(n, _)| *n == name) {
                location.bounds = Some(*bounds);
            }
            location.authoritative = official_counts(name);
            location
        })
        .collect();
    Catalog::from_parts(locations, COUNTRY_BOUNDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_complete_and_valid() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 36);
        for location in catalog.locations() {
            assert!(location.check().is_ok(), "{} invalid", location.name);
        }
    }

    #[test]
    fn curated_flags_are_applied() {
        let catalog = catalog();
        let langkawi = catalog.get("Langkawi").expect("Langkawi present");
        assert!(langkawi.profile.island_resort);
        assert!(langkawi.profile.tourist_destination);
        let melaka = catalog.get("Malacca City").expect("Malacca present");
        assert!(melaka.profile.heritage_site);
        let kl = catalog.get("Kuala Lumpur").expect("KL present");
        assert!(kl.bounds.is_some());
    }

    #[test]
    fn official_counts_cover_the_surveyed_cities() {
        let catalog = catalog();
        let with_counts = catalog
            .locations()
            .iter()
            .filter(|l| l.authoritative.is_some())
            .count();
        assert_eq!(with_counts, OFFICIAL_COUNTS.len());

        let kl = catalog.get("Kuala Lumpur").expect("KL present");
        let counts = kl.authoritative.as_ref().expect("KL counts");
        assert_eq!(counts.get(BuildingClass::Hospital), 28);
        assert_eq!(counts.get(BuildingClass::Commercial), 85);
        assert_eq!(counts.get(BuildingClass::Office), 1200);
        assert_eq!(counts.get(BuildingClass::Residential), 0);
        assert!(catalog.get("Muar").expect("Muar present").authoritative.is_none());
    }
}
