use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::archetype::BuildingClass;
use crate::error::{GenerationError, Result};
use crate::rng::uniform;

/// Boolean attributes that bias a location's building mix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UrbanProfile {
    /// Business and administrative centre (more commercial and office space).
    pub economic_center: bool,
    /// Draws visitors (more hotels and restaurants).
    pub tourist_destination: bool,
    /// Manufacturing base (more industrial, factory and warehouse stock).
    pub industrial_hub: bool,
    /// Seaport (extra warehousing).
    pub port_city: bool,
    /// Hosts universities (extra schools).
    pub university_city: bool,
    /// Listed heritage city; strongest urban hotel demand after islands.
    pub heritage_site: bool,
    /// Island resort; highest hotel share.
    pub island_resort: bool,
}

impl UrbanProfile {
    /// Default profile for a location with no curated flags, by size.
    pub fn for_population(population: u64) -> Self {
        if population > 500_000 {
            Self {
                economic_center: true,
                industrial_hub: true,
                university_city: true,
                ..Self::default()
            }
        } else if population > 200_000 {
            Self {
                economic_center: true,
                university_city: true,
                ..Self::default()
            }
        } else {
            Self::default()
        }
    }
}

/// Latitude/longitude rectangle that building coordinates are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub const fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Whether the box is well formed (finite, ordered bounds).
    pub fn is_valid(&self) -> bool {
        [self.lat_min, self.lat_max, self.lon_min, self.lon_max]
            .iter()
            .all(|v| v.is_finite())
            && self.lat_min <= self.lat_max
            && self.lon_min <= self.lon_max
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&lat) && (self.lon_min..=self.lon_max).contains(&lon)
    }

    /// Uniform point inside the box, rounded to 6 decimals.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> (f64, f64) {
        let lat = round6(uniform(rng, self.lat_min, self.lat_max));
        let lon = round6(uniform(rng, self.lon_min, self.lon_max));
        (
            lat.clamp(self.lat_min, self.lat_max),
            lon.clamp(self.lon_min, self.lon_max),
        )
    }
}

fn round6(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

/// Externally supplied exact building counts for one location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthoritativeCounts {
    counts: BTreeMap<BuildingClass, u64>,
}

impl AuthoritativeCounts {
    pub fn new(counts: BTreeMap<BuildingClass, u64>) -> Self {
        Self { counts }
    }

    /// Builds counts from labelled entries; unknown labels are counted as
    /// Residential.
    pub fn from_labels(labelled: &BTreeMap<String, u64>) -> Self {
        let mut counts = BTreeMap::new();
        for (label, count) in labelled {
            let class = BuildingClass::from_label_or_residential(label);
            *counts.entry(class).or_insert(0) += count;
        }
        Self { counts }
    }

    pub fn get(&self, class: BuildingClass) -> u64 {
        self.counts.get(&class).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BuildingClass, u64)> + '_ {
        self.counts.iter().map(|(class, count)| (*class, *count))
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// One place buildings can be generated for.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub population: u64,
    pub region: String,
    pub state: String,
    pub profile: UrbanProfile,
    /// Coordinate box; `None` falls back to the catalog's country-wide box.
    pub bounds: Option<BoundingBox>,
    pub authoritative: Option<AuthoritativeCounts>,
}

impl Location {
    /// Creates a location with the default profile for its population.
    pub fn new(
        name: impl Into<String>,
        population: u64,
        region: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            population,
            region: region.into(),
            state: state.into(),
            profile: UrbanProfile::for_population(population),
            bounds: None,
            authoritative: None,
        }
    }

    pub fn with_profile(mut self, profile: UrbanProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_authoritative(mut self, counts: AuthoritativeCounts) -> Self {
        self.authoritative = Some(counts);
        self
    }

    /// Checks the invariants reference data must hold.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReferenceData` for an empty name, zero population or a
    /// malformed bounding box.
    pub fn check(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(GenerationError::InvalidReferenceData(
                "location name must not be empty".into(),
            ));
        }
        if self.population == 0 {
            return Err(GenerationError::InvalidReferenceData(format!(
                "location \"{}\" must have a population > 0",
                self.name
            )));
        }
        if let Some(bounds) = &self.bounds {
            if !bounds.is_valid() {
                return Err(GenerationError::InvalidReferenceData(format!(
                    "location \"{}\" has a malformed bounding box",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Location filter; every populated field must match. `"all"` (any case)
/// disables a text field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocationFilter {
    pub city: Option<String>,
    pub state: Option<String>,
    pub region: Option<String>,
    pub population_min: Option<u64>,
    pub population_max: Option<u64>,
}

impl LocationFilter {
    pub fn matches(&self, location: &Location) -> bool {
        text_matches(self.city.as_deref(), &location.name)
            && text_matches(self.state.as_deref(), &location.state)
            && text_matches(self.region.as_deref(), &location.region)
            && self.population_min.is_none_or(|min| location.population >= min)
            && self.population_max.is_none_or(|max| location.population <= max)
    }
}

fn text_matches(wanted: Option<&str>, actual: &str) -> bool {
    match wanted.map(str::trim) {
        None | Some("") => true,
        Some(w) if w.eq_ignore_ascii_case("all") => true,
        Some(w) => w.eq_ignore_ascii_case(actual),
    }
}
