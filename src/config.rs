//! TOML-based generation configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::alloc::DistributionRules;
use crate::catalog::{
    ArchetypeTable, BoundingBox, Catalog, Location, LocationFilter, ReferenceData, UrbanProfile,
};
use crate::engine::{DEFAULT_ID_PREFIX, GenerationRequest, Generator, LocationSelection};
use crate::synth::{Frequency, SynthesisSettings};

/// Top-level generation configuration parsed from TOML.
///
/// All sections have defaults matching the baseline preset. Load from TOML
/// with [`GenerationConfig::from_toml_file`] or use
/// [`GenerationConfig::baseline`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Size, date range, frequency and seed.
    #[serde(default)]
    pub request: RequestConfig,
    /// Restricts the catalog; absent means every location.
    #[serde(default)]
    pub filter: Option<LocationFilter>,
    /// Generates for one location outside the catalog instead.
    #[serde(default)]
    pub custom_location: Option<CustomLocationConfig>,
    /// Urban-planning thresholds.
    #[serde(default)]
    pub distribution: DistributionRules,
    /// Noise, event and fasting-month settings.
    #[serde(default)]
    pub synthesis: SynthesisSettings,
    /// Id prefix and report options.
    #[serde(default)]
    pub output: OutputConfig,
    /// External reference data.
    #[serde(default)]
    pub reference: ReferenceConfig,
}

/// Request size, date range, frequency and seed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestConfig {
    /// Number of buildings to generate (must be > 0).
    pub total_buildings: u64,
    /// First timestamp, `YYYY-MM-DD[ HH:MM[:SS]]`.
    pub start: String,
    /// Last timestamp (inclusive), same format as `start`.
    pub end: String,
    /// Sampling frequency token, e.g. `"30T"` or `"H"`.
    pub frequency: String,
    /// Master random seed.
    pub seed: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            total_buildings: 100,
            start: "2024-01-01 00:00:00".to_string(),
            end: "2024-01-07 23:30:00".to_string(),
            frequency: "30T".to_string(),
            seed: 42,
        }
    }
}

/// A single location supplied in the configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomLocationConfig {
    pub name: String,
    pub population: u64,
    #[serde(default = "custom_label")]
    pub region: String,
    #[serde(default = "custom_label")]
    pub state: String,
    /// Defaults to the profile implied by the population.
    #[serde(default)]
    pub profile: Option<UrbanProfile>,
    #[serde(default)]
    pub bounds: Option<BoundingBox>,
}

fn custom_label() -> String {
    "Custom".to_string()
}

impl CustomLocationConfig {
    pub fn to_location(&self) -> Location {
        let mut location = Location::new(
            self.name.clone(),
            self.population,
            self.region.clone(),
            self.state.clone(),
        );
        if let Some(profile) = self.profile {
            location.profile = profile;
        }
        location.bounds = self.bounds;
        location
    }
}

/// Id prefix and report options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Prefix of every building id.
    pub id_prefix: String,
    /// Number of readings shown in the report.
    pub sample_size: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            sample_size: 5,
        }
    }
}

/// External reference data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReferenceConfig {
    /// TOML file with `[[locations]]` and `[archetypes.<Class>]`; the
    /// built-in Malaysian catalog is used when absent.
    pub catalog: Option<PathBuf>,
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"request.total_buildings"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

/// Parses `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM`
/// or a bare date (midnight).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl GenerationConfig {
    /// Returns the baseline configuration: 100 buildings across the whole
    /// catalog, one January week at 30-minute resolution.
    pub fn baseline() -> Self {
        Self {
            request: RequestConfig::default(),
            filter: None,
            custom_location: None,
            distribution: DistributionRules::default(),
            synthesis: SynthesisSettings::default(),
            output: OutputConfig::default(),
            reference: ReferenceConfig::default(),
        }
    }

    /// Returns the capital-week preset: Kuala Lumpur only, one dry-season
    /// week at hourly resolution.
    pub fn capital_week() -> Self {
        Self {
            request: RequestConfig {
                total_buildings: 200,
                start: "2024-06-03 00:00:00".to_string(),
                end: "2024-06-09 23:00:00".to_string(),
                frequency: "H".to_string(),
                ..RequestConfig::default()
            },
            filter: Some(LocationFilter {
                city: Some("Kuala Lumpur".to_string()),
                ..LocationFilter::default()
            }),
            ..Self::baseline()
        }
    }

    /// Returns the small-towns preset: locations up to 250,000 inhabitants
    /// during a fasting month.
    pub fn small_towns() -> Self {
        Self {
            request: RequestConfig {
                total_buildings: 150,
                start: "2024-03-11 00:00:00".to_string(),
                end: "2024-03-17 23:30:00".to_string(),
                ..RequestConfig::default()
            },
            filter: Some(LocationFilter {
                population_max: Some(250_000),
                ..LocationFilter::default()
            }),
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "capital_week", "small_towns"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "capital_week" => Ok(Self::capital_week()),
            "small_towns" => Ok(Self::small_towns()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let r = &self.request;

        if r.total_buildings == 0 {
            errors.push(ConfigError::new("request.total_buildings", "must be > 0"));
        }
        if let Err(e) = r.frequency.parse::<Frequency>() {
            errors.push(ConfigError::new("request.frequency", e.to_string()));
        }
        let start = parse_timestamp(&r.start);
        let end = parse_timestamp(&r.end);
        if start.is_none() {
            errors.push(ConfigError::new(
                "request.start",
                format!("\"{}\" is not a date or timestamp", r.start),
            ));
        }
        if end.is_none() {
            errors.push(ConfigError::new(
                "request.end",
                format!("\"{}\" is not a date or timestamp", r.end),
            ));
        }
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                errors.push(ConfigError::new("request.end", "must be >= request.start"));
            }
        }

        if let Some(custom) = &self.custom_location {
            if self.filter.is_some() {
                errors.push(ConfigError::new(
                    "custom_location",
                    "cannot be combined with [filter]",
                ));
            }
            if custom.name.trim().is_empty() {
                errors.push(ConfigError::new("custom_location.name", "must not be empty"));
            }
            if custom.population == 0 {
                errors.push(ConfigError::new("custom_location.population", "must be > 0"));
            }
            if custom.bounds.is_some_and(|b| !b.is_valid()) {
                errors.push(ConfigError::new(
                    "custom_location.bounds",
                    "must be finite with min <= max",
                ));
            }
        }

        let d = &self.distribution;
        if !(0.0..=1.0).contains(&d.residential_floor) {
            errors.push(ConfigError::new(
                "distribution.residential_floor",
                "must be in [0.0, 1.0]",
            ));
        }
        if !(d.buildings_per_thousand > 0.0) {
            errors.push(ConfigError::new(
                "distribution.buildings_per_thousand",
                "must be > 0",
            ));
        }

        let s = &self.synthesis;
        if !(s.noise_scale >= 0.0) {
            errors.push(ConfigError::new("synthesis.noise_scale", "must be >= 0"));
        }
        let ev = &s.events;
        for (field, p) in [
            ("synthesis.events.outage_probability", ev.outage_probability),
            ("synthesis.events.surge_probability", ev.surge_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                errors.push(ConfigError::new(field, "must be in [0.0, 1.0]"));
            }
        }
        if !(ev.surge_min >= 0.0) {
            errors.push(ConfigError::new("synthesis.events.surge_min", "must be >= 0"));
        }
        if ev.surge_min > ev.surge_max {
            errors.push(ConfigError::new(
                "synthesis.events.surge_min",
                "must be <= synthesis.events.surge_max",
            ));
        }
        let fasting = &s.fasting;
        if fasting.months.iter().any(|m| !(1..=12).contains(m)) {
            errors.push(ConfigError::new(
                "synthesis.fasting.months",
                "months must be in 1..=12",
            ));
        }
        for (field, (first, last)) in [
            ("synthesis.fasting.daytime_hours", fasting.daytime_hours),
            ("synthesis.fasting.evening_hours", fasting.evening_hours),
        ] {
            if first > last || last > 23 {
                errors.push(ConfigError::new(field, "must be [first, last] with first <= last <= 23"));
            }
        }
        for (field, factor) in [
            ("synthesis.fasting.daytime_factor", fasting.daytime_factor),
            ("synthesis.fasting.evening_factor", fasting.evening_factor),
        ] {
            if !(factor >= 0.0) {
                errors.push(ConfigError::new(field, "must be >= 0"));
            }
        }

        if self.output.id_prefix.trim().is_empty() {
            errors.push(ConfigError::new("output.id_prefix", "must not be empty"));
        }

        errors
    }

    /// Location selection described by `[filter]` or `[custom_location]`.
    pub fn selection(&self) -> LocationSelection {
        match (&self.custom_location, &self.filter) {
            (Some(custom), _) => LocationSelection::Custom(custom.to_location()),
            (None, Some(filter)) => LocationSelection::Filter(filter.clone()),
            (None, None) => LocationSelection::All,
        }
    }

    /// Builds the generation request.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` for an unparseable date or frequency.
    pub fn to_request(&self) -> Result<GenerationRequest, ConfigError> {
        let r = &self.request;
        let start = parse_timestamp(&r.start)
            .ok_or_else(|| ConfigError::new("request.start", "not a date or timestamp"))?;
        let end = parse_timestamp(&r.end)
            .ok_or_else(|| ConfigError::new("request.end", "not a date or timestamp"))?;
        let frequency = r
            .frequency
            .parse::<Frequency>()
            .map_err(|e| ConfigError::new("request.frequency", e.to_string()))?;
        Ok(GenerationRequest {
            total_buildings: r.total_buildings,
            selection: self.selection(),
            start,
            end,
            frequency,
            seed: r.seed,
        })
    }

    /// Builds the generator, loading `[reference] catalog` when set.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the reference file cannot be loaded.
    pub fn generator(&self) -> Result<Generator, ConfigError> {
        let (catalog, archetypes) = match &self.reference.catalog {
            Some(path) => {
                let data = ReferenceData::from_toml_file(path)
                    .map_err(|e| ConfigError::new("reference.catalog", e.to_string()))?;
                (data.catalog, data.archetypes.unwrap_or_default())
            }
            None => (Catalog::malaysia(), ArchetypeTable::default()),
        };
        Ok(Generator::new(
            catalog,
            archetypes,
            self.distribution.clone(),
            self.synthesis.clone(),
        )
        .with_id_prefix(self.output.id_prefix.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = GenerationConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = GenerationConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in GenerationConfig::PRESETS {
            let cfg = GenerationConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[request]
total_buildings = 25
start = "2024-05-01"
end = "2024-05-02 12:00"
frequency = "2h"
seed = 7

[filter]
region = "Northern"
population_min = 100000

[distribution]
residential_floor = 0.55

[synthesis]
noise_scale = 0.1

[synthesis.events]
outage_probability = 0.01

[synthesis.fasting]
months = [4]

[output]
id_prefix = "TST"
sample_size = 2
"#;
        let cfg = GenerationConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.request.total_buildings), Some(25));
        assert_eq!(
            cfg.as_ref().map(|c| c.synthesis.events.surge_probability),
            Some(0.015)
        );
        let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
        assert!(errors.is_empty(), "{errors:?}");

        let request = cfg.as_ref().map(|c| c.to_request());
        let request = request.and_then(Result::ok);
        assert_eq!(request.as_ref().map(|r| r.frequency.seconds()), Some(7_200));
        assert!(matches!(
            request.map(|r| r.selection),
            Some(LocationSelection::Filter(_))
        ));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[request]
total_buildings = 10
bogus_field = true
"#;
        assert!(GenerationConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_bad_request() {
        let mut cfg = GenerationConfig::baseline();
        cfg.request.total_buildings = 0;
        cfg.request.frequency = "fortnightly".to_string();
        cfg.request.end = "2023-12-31".to_string();
        let errors = cfg.validate();
        for field in ["request.total_buildings", "request.frequency", "request.end"] {
            assert!(errors.iter().any(|e| e.field == field), "{field} not flagged");
        }
    }

    #[test]
    fn validation_catches_bad_probabilities() {
        let mut cfg = GenerationConfig::baseline();
        cfg.synthesis.events.outage_probability = 1.5;
        cfg.synthesis.events.surge_min = 3.0;
        cfg.synthesis.fasting.months = vec![13];
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "synthesis.events.outage_probability"));
        assert!(errors.iter().any(|e| e.field == "synthesis.events.surge_min"));
        assert!(errors.iter().any(|e| e.field == "synthesis.fasting.months"));
    }

    #[test]
    fn custom_location_excludes_filter() {
        let toml = r#"
[filter]
state = "Johor"

[custom_location]
name = "New Town"
population = 30000
"#;
        let cfg = GenerationConfig::from_toml_str(toml).expect("parses");
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "custom_location"));
        assert!(matches!(cfg.selection(), LocationSelection::Custom(_)));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[request]
seed = 99
"#;
        let cfg = GenerationConfig::from_toml_str(toml).expect("parses");
        assert_eq!(cfg.request.seed, 99);
        assert_eq!(cfg.request.total_buildings, 100);
        assert_eq!(cfg.distribution.hospital_min_population, 80_000);
        assert!(cfg.filter.is_none());
        assert!(matches!(cfg.selection(), LocationSelection::All));
    }

    #[test]
    fn timestamps_accept_several_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 2, 29).and_then(|d| d.and_hms_opt(6, 30, 0));
        assert_eq!(parse_timestamp("2024-02-29 06:30:00"), expected);
        assert_eq!(parse_timestamp("2024-02-29T06:30:00"), expected);
        assert_eq!(parse_timestamp("2024-02-29 06:30"), expected);
        assert!(parse_timestamp("2024-02-29").is_some());
        assert!(parse_timestamp("29/02/2024").is_none());
    }
}
