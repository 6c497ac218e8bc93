//! Reference data: locations and per-class consumption archetypes.

/// Building classes and their consumption archetypes.
pub mod archetype;
/// Locations, urban profiles, coordinate boxes and filters.
pub mod location;
/// Built-in Malaysian catalog.
pub mod malaysia;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

pub use archetype::{Archetype, ArchetypeTable, BuildingClass};
pub use location::{AuthoritativeCounts, BoundingBox, Location, LocationFilter, UrbanProfile};

use crate::error::{GenerationError, Result};

/// Ordered set of candidate locations plus the fallback coordinate box.
///
/// Order matters: ties between equally populated locations resolve to the
/// first one in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    locations: Vec<Location>,
    default_bounds: BoundingBox,
}

impl Catalog {
    /// Creates a catalog from validated locations.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReferenceData` if a location is invalid, a name is
    /// duplicated or the default box is malformed.
    pub fn new(locations: Vec<Location>, default_bounds: BoundingBox) -> Result<Self> {
        if !default_bounds.is_valid() {
            return Err(GenerationError::InvalidReferenceData(
                "default bounding box is malformed".into(),
            ));
        }
        for (i, location) in locations.iter().enumerate() {
            location.check()?;
            if locations[..i].iter().any(|l| l.name == location.name) {
                return Err(GenerationError::InvalidReferenceData(format!(
                    "location \"{}\" defined more than once",
                    location.name
                )));
            }
        }
        Ok(Self::from_parts(locations, default_bounds))
    }

    pub(crate) fn from_parts(locations: Vec<Location>, default_bounds: BoundingBox) -> Self {
        Self {
            locations,
            default_bounds,
        }
    }

    /// The built-in Malaysian catalog.
    pub fn malaysia() -> Self {
        malaysia::catalog()
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn get(&self, name: &str) -> Option<&Location> {
        self.locations
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
    }

    /// Locations matching `filter`, in catalog order.
    pub fn select(&self, filter: &LocationFilter) -> Vec<&Location> {
        self.locations.iter().filter(|l| filter.matches(l)).collect()
    }

    pub fn default_bounds(&self) -> BoundingBox {
        self.default_bounds
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::malaysia()
    }
}

/// Catalog and archetype table loaded together from one reference file.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub catalog: Catalog,
    /// `None` when the file defines no archetypes.
    pub archetypes: Option<ArchetypeTable>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReferenceFile {
    #[serde(default)]
    default_bounds: Option<BoundingBox>,
    #[serde(default)]
    locations: Vec<LocationEntry>,
    #[serde(default)]
    archetypes: BTreeMap<String, Archetype>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LocationEntry {
    name: String,
    population: u64,
    #[serde(default)]
    region: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    profile: Option<UrbanProfile>,
    #[serde(default)]
    bounds: Option<BoundingBox>,
    #[serde(default)]
    authoritative: Option<BTreeMap<String, u64>>,
}

impl ReferenceData {
    /// Parses a reference file from TOML.
    ///
    /// ```toml
    /// [[locations]]
    /// name = "Ipoh"
    /// population = 657000
    /// region = "Northern"
    /// profile = { economic_center = true, industrial_hub = true }
    /// bounds = { lat_min = 4.58, lat_max = 4.60, lon_min = 101.08, lon_max = 101.10 }
    ///
    /// [archetypes.Residential]
    /// base = 0.5
    /// peak = 12.0
    /// variance = 2.5
    /// night_factor = 0.3
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `InvalidReferenceData` for malformed TOML or data that breaks
    /// catalog or archetype invariants.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: ReferenceFile = toml::from_str(s)
            .map_err(|e| GenerationError::InvalidReferenceData(e.to_string()))?;

        let locations = file
            .locations
            .into_iter()
            .map(|entry| {
                let mut location =
                    Location::new(entry.name, entry.population, entry.region, entry.state);
                if let Some(profile) = entry.profile {
                    location.profile = profile;
                }
                location.bounds = entry.bounds;
                location.authoritative = entry
                    .authoritative
                    .as_ref()
                    .map(AuthoritativeCounts::from_labels);
                location
            })
            .collect();
        let catalog = Catalog::new(
            locations,
            file.default_bounds.unwrap_or(malaysia::COUNTRY_BOUNDS),
        )?;

        let archetypes = if file.archetypes.is_empty() {
            None
        } else {
            Some(ArchetypeTable::from_labels(file.archetypes)?)
        };

        Ok(Self {
            catalog,
            archetypes,
        })
    }

    /// Reads and parses a reference file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReferenceData` if the file cannot be read or parsed.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GenerationError::InvalidReferenceData(format!(
                "cannot read \"{}\": {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = r#"
default_bounds = { lat_min = 0.0, lat_max = 1.0, lon_min = 10.0, lon_max = 11.0 }

[[locations]]
name = "Alpha"
population = 1800000
region = "North"
profile = { economic_center = true }

[[locations]]
name = "Beta"
population = 65000
region = "South"
authoritative = { Hospital = 1, School = 4, Castle = 2 }

[archetypes.Residential]
base = 0.5
peak = 12.0
variance = 2.5
night_factor = 0.3
"#;

    #[test]
    fn reference_file_parses() {
        let data = ReferenceData::from_toml_str(REFERENCE).expect("reference should parse");
        assert_eq!(data.catalog.len(), 2);
        let alpha = data.catalog.get("alpha").expect("case-insensitive lookup");
        assert!(alpha.profile.economic_center);
        assert!(!alpha.profile.industrial_hub);

        let beta = data.catalog.get("Beta").expect("Beta present");
        let counts = beta.authoritative.as_ref().expect("authoritative table");
        assert_eq!(counts.get(BuildingClass::Residential), 2);
        assert_eq!(counts.total(), 7);

        let archetypes = data.archetypes.expect("archetypes present");
        assert_eq!(archetypes.len(), 1);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let dup = r#"
[[locations]]
name = "Alpha"
population = 10

[[locations]]
name = "Alpha"
population = 20
"#;
        assert!(ReferenceData::from_toml_str(dup).is_err());
    }

    #[test]
    fn select_preserves_catalog_order() {
        let catalog = Catalog::malaysia();
        let filter = LocationFilter {
            state: Some("Johor".into()),
            ..LocationFilter::default()
        };
        let names: Vec<&str> = catalog
            .select(&filter)
            .iter()
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "Johor Bahru",
                "Iskandar Puteri",
                "Batu Pahat",
                "Kluang",
                "Muar",
                "Pasir Gudang"
            ]
        );
    }
}
