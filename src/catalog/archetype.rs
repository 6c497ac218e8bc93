use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::warn;

use crate::error::{GenerationError, Result};

/// Functional type of a building. The set is closed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum BuildingClass {
    Residential,
    Commercial,
    Industrial,
    Office,
    Retail,
    Hospital,
    Clinic,
    School,
    Hotel,
    Restaurant,
    Warehouse,
    Factory,
    Apartment,
}

impl BuildingClass {
    /// Parses a class label, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBuildingClass` when the label names no class.
    pub fn parse_label(label: &str) -> Result<Self> {
        Self::from_str(label.trim())
            .map_err(|_| GenerationError::UnknownBuildingClass(label.to_string()))
    }

    /// Parses a class label, coercing unknown labels to `Residential`.
    pub fn from_label_or_residential(label: &str) -> Self {
        Self::parse_label(label).unwrap_or_else(|err| {
            warn!(%err, "coercing to Residential");
            BuildingClass::Residential
        })
    }

    /// All classes in declaration order.
    pub fn all() -> impl Iterator<Item = BuildingClass> {
        Self::iter()
    }
}

/// Baseline consumption shape of one building class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Archetype {
    /// Floor consumption (kWh per step).
    pub base: f64,
    /// Consumption at full activity (kWh per step).
    pub peak: f64,
    /// Spread of the additive Gaussian noise.
    pub variance: f64,
    /// Night-time activity multiplier used by the hour profiles.
    pub night_factor: f64,
}

impl Archetype {
    /// Creates a validated archetype.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReferenceData` if any field is negative or non-finite,
    /// or if `peak < base`.
    pub fn new(base: f64, peak: f64, variance: f64, night_factor: f64) -> Result<Self> {
        let archetype = Self {
            base,
            peak,
            variance,
            night_factor,
        };
        archetype.check()?;
        Ok(archetype)
    }

    fn check(&self) -> Result<()> {
        let fields = [self.base, self.peak, self.variance, self.night_factor];
        if fields.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(GenerationError::InvalidReferenceData(format!(
                "archetype fields must be finite and non-negative: {self:?}"
            )));
        }
        if self.peak < self.base {
            return Err(GenerationError::InvalidReferenceData(format!(
                "archetype peak {} is below base {}",
                self.peak, self.base
            )));
        }
        Ok(())
    }

    /// Consumption swing between base and peak.
    pub fn span(&self) -> f64 {
        self.peak - self.base
    }
}

/// Archetype per building class. Always contains `Residential`, which is the
/// fallback for any class without its own entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchetypeTable {
    entries: BTreeMap<BuildingClass, Archetype>,
}

impl ArchetypeTable {
    /// Builds a table from validated entries.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReferenceData` if an entry is invalid or if the table
    /// has no `Residential` entry.
    pub fn new(entries: BTreeMap<BuildingClass, Archetype>) -> Result<Self> {
        for archetype in entries.values() {
            archetype.check()?;
        }
        if !entries.contains_key(&BuildingClass::Residential) {
            return Err(GenerationError::InvalidReferenceData(
                "archetype table needs a Residential entry".into(),
            ));
        }
        Ok(Self { entries })
    }

    /// Builds a table from labelled entries, as found in reference files.
    ///
    /// Labels that name no class are logged and skipped.
    ///
    /// # Errors
    ///
    /// Same as [`ArchetypeTable::new`].
    pub fn from_labels(labelled: BTreeMap<String, Archetype>) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for (label, archetype) in labelled {
            match BuildingClass::parse_label(&label) {
                Ok(class) => {
                    entries.insert(class, archetype);
                }
                Err(err) => warn!(%err, "skipping archetype entry"),
            }
        }
        Self::new(entries)
    }

    /// Archetypes of a tropical climate grid, one per class.
    pub fn tropical_default() -> Self {
        use BuildingClass::*;
        let rows = [
            (Residential, 0.5, 12.0, 2.5, 0.3),
            (Commercial, 5.0, 80.0, 15.0, 0.2),
            (Industrial, 20.0, 200.0, 40.0, 0.7),
            (Office, 3.0, 45.0, 8.0, 0.1),
            (Retail, 2.0, 35.0, 6.0, 0.15),
            (Hospital, 25.0, 70.0, 12.0, 0.8),
            (Clinic, 2.0, 15.0, 3.0, 0.1),
            (School, 1.0, 25.0, 5.0, 0.05),
            (Hotel, 8.0, 40.0, 8.0, 0.6),
            (Restaurant, 3.0, 60.0, 15.0, 0.2),
            (Warehouse, 2.0, 30.0, 8.0, 0.4),
            (Factory, 30.0, 150.0, 35.0, 0.6),
            (Apartment, 1.0, 15.0, 4.0, 0.4),
        ];
        let entries = rows
            .into_iter()
            .map(|(class, base, peak, variance, night_factor)| {
                (
                    class,
                    Archetype {
                        base,
                        peak,
                        variance,
                        night_factor,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Archetype for `class`, or the Residential archetype when the table
    /// has no entry for it.
    pub fn get(&self, class: BuildingClass) -> &Archetype {
        match self.entries.get(&class) {
            Some(archetype) => archetype,
            None => {
                warn!(%class, "no archetype, using Residential");
                &self.entries[&BuildingClass::Residential]
            }
        }
    }

    /// Archetype for a class label, coercing unknown labels to Residential.
    pub fn for_label(&self, label: &str) -> &Archetype {
        self.get(BuildingClass::from_label_or_residential(label))
    }

    /// Whether the table carries its own entry for `class`.
    pub fn contains(&self, class: BuildingClass) -> bool {
        self.entries.contains_key(&class)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ArchetypeTable {
    fn default() -> Self {
        Self::tropical_default()
    }
}
