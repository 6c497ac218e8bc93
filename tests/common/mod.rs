//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use synth_grid::catalog::{Catalog, Location, malaysia::COUNTRY_BOUNDS};
use synth_grid::engine::{GenerationRequest, LocationSelection};
use synth_grid::synth::{EventRates, SynthesisSettings};

/// Timestamp helper; panics on an invalid date.
pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .expect("valid timestamp")
}

/// One June day at hourly resolution, seed 42.
pub fn day_request(total_buildings: u64, selection: LocationSelection) -> GenerationRequest {
    GenerationRequest {
        total_buildings,
        selection,
        start: at(2024, 6, 3, 0, 0),
        end: at(2024, 6, 3, 23, 0),
        frequency: "H".parse().expect("valid frequency"),
        seed: 42,
    }
}

/// Two locations: a metropolis ("A", 1.8M) and a small city ("B", 65K).
pub fn two_city_catalog() -> Catalog {
    Catalog::new(
        vec![
            Location::new("A", 1_800_000, "Central", "Alpha"),
            Location::new("B", 65_000, "Northern", "Beta"),
        ],
        COUNTRY_BOUNDS,
    )
    .expect("valid catalog")
}

/// Synthesis settings without outages or surges.
pub fn eventless_settings() -> SynthesisSettings {
    SynthesisSettings {
        events: EventRates {
            outage_probability: 0.0,
            surge_probability: 0.0,
            ..EventRates::default()
        },
        ..SynthesisSettings::default()
    }
}
