use chrono::NaiveDateTime;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::clock::TimeGrid;
use super::events::{EventRates, FastingWindow, GridEvent};
use super::factors::{
    TimeContext, city_scale_factor, climate_factor, hour_factor, season_factor, week_factor,
};
use crate::alloc::Building;
use crate::catalog::{Archetype, ArchetypeTable, BuildingClass};
use crate::rng::gaussian_noise;

/// Tunable parts of the consumption model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SynthesisSettings {
    /// Noise standard deviation as a fraction of the archetype variance.
    pub noise_scale: f64,
    pub events: EventRates,
    pub fasting: FastingWindow,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            noise_scale: 0.15,
            events: EventRates::default(),
            fasting: FastingWindow::default(),
        }
    }
}

/// One synthesized consumption sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// `unique_id` of the building the reading belongs to.
    pub unique_id: String,
    pub timestamp: NaiveDateTime,
    /// Consumption in kWh, never negative, rounded to 3 decimals.
    pub value: f64,
}

/// Computes consumption values from archetypes and calendar factors.
#[derive(Debug, Clone, Default)]
pub struct ConsumptionSynthesizer {
    archetypes: ArchetypeTable,
    settings: SynthesisSettings,
}

impl ConsumptionSynthesizer {
    pub fn new(archetypes: ArchetypeTable, settings: SynthesisSettings) -> Self {
        Self {
            archetypes,
            settings,
        }
    }

    pub fn archetypes(&self) -> &ArchetypeTable {
        &self.archetypes
    }

    pub fn settings(&self) -> &SynthesisSettings {
        &self.settings
    }

    /// Class and archetype used for `class`. Classes without an archetype
    /// behave as Residential.
    fn resolve(&self, class: BuildingClass) -> (BuildingClass, &Archetype) {
        if self.archetypes.contains(class) {
            (class, self.archetypes.get(class))
        } else {
            warn!(%class, "no archetype, synthesizing as Residential");
            let fallback = BuildingClass::Residential;
            (fallback, self.archetypes.get(fallback))
        }
    }

    /// One consumption value for a building of `class` in a location of
    /// `population` at `timestamp`.
    pub fn value_at<R: Rng>(
        &self,
        rng: &mut R,
        class: BuildingClass,
        population: u64,
        timestamp: &NaiveDateTime,
    ) -> f64 {
        let (class, archetype) = self.resolve(class);
        self.value_with(rng, class, archetype, population, timestamp)
    }

    /// Same as [`value_at`](Self::value_at) for a free-form class label;
    /// unknown labels use the Residential model.
    pub fn value_for_label<R: Rng>(
        &self,
        rng: &mut R,
        label: &str,
        population: u64,
        timestamp: &NaiveDateTime,
    ) -> f64 {
        let class = BuildingClass::from_label_or_residential(label);
        self.value_at(rng, class, population, timestamp)
    }

    fn value_with<R: Rng>(
        &self,
        rng: &mut R,
        class: BuildingClass,
        archetype: &Archetype,
        population: u64,
        timestamp: &NaiveDateTime,
    ) -> f64 {
        let time = TimeContext::from_timestamp(timestamp);

        let climate = climate_factor(rng, time.hour);
        let hour = hour_factor(rng, class, archetype, &time);
        let week = week_factor(class, &time);
        let season = season_factor(rng, time.month);
        let city = city_scale_factor(rng, population);

        let shaped = (archetype.base + archetype.span() * hour) * week * season * climate * city;
        let noise = gaussian_noise(rng, self.settings.noise_scale * archetype.variance);
        let mut value = (shaped + noise).max(0.0);

        match GridEvent::draw(rng, &self.settings.events) {
            Some(GridEvent::Outage) => return 0.0,
            Some(event) => value = event.apply(value),
            None => {}
        }
        value *= self.settings.fasting.factor(class, time.month, time.hour);

        round3(value)
    }

    /// Readings for `building` at every timestamp of `grid`.
    pub fn series<R: Rng>(&self, rng: &mut R, building: &Building, grid: &TimeGrid) -> Vec<Reading> {
        let (class, archetype) = self.resolve(building.class);
        grid.iter()
            .map(|timestamp| Reading {
                unique_id: building.unique_id.clone(),
                timestamp,
                value: self.value_with(rng, class, archetype, building.population, &timestamp),
            })
            .collect()
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
