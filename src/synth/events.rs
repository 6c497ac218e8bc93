use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::BuildingClass;
use crate::rng::uniform;

/// Probabilities and magnitude of rare grid events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventRates {
    /// Chance that a reading is an outage (forced to zero).
    pub outage_probability: f64,
    /// Chance that a non-outage reading is a storm surge.
    pub surge_probability: f64,
    /// Lower bound of the surge multiplier.
    pub surge_min: f64,
    /// Upper bound of the surge multiplier.
    pub surge_max: f64,
}

impl Default for EventRates {
    fn default() -> Self {
        Self {
            outage_probability: 0.003,
            surge_probability: 0.015,
            surge_min: 1.4,
            surge_max: 2.2,
        }
    }
}

/// A rare event affecting one reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridEvent {
    Outage,
    /// Multiplier applied to the reading.
    Surge(f64),
}

impl GridEvent {
    /// Draws at most one event. The surge is only tried when no outage
    /// happened.
    pub fn draw<R: Rng>(rng: &mut R, rates: &EventRates) -> Option<Self> {
        if rng.random::<f64>() < rates.outage_probability {
            Some(Self::Outage)
        } else if rng.random::<f64>() < rates.surge_probability {
            Some(Self::Surge(uniform(rng, rates.surge_min, rates.surge_max)))
        } else {
            None
        }
    }

    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::Outage => 0.0,
            Self::Surge(factor) => value * factor,
        }
    }
}

/// Residential load shift during the fasting months: lower by day, higher
/// in the evening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FastingWindow {
    /// Calendar months (1-12) in which the shift applies.
    pub months: Vec<u32>,
    /// First and last hour of the fasting day.
    pub daytime_hours: (u32, u32),
    pub daytime_factor: f64,
    /// First and last hour of the evening meal period.
    pub evening_hours: (u32, u32),
    pub evening_factor: f64,
}

impl Default for FastingWindow {
    fn default() -> Self {
        Self {
            months: vec![3, 4],
            daytime_hours: (4, 17),
            daytime_factor: 0.6,
            evening_hours: (18, 23),
            evening_factor: 1.4,
        }
    }
}

impl FastingWindow {
    /// Returns `true` when `month` is a fasting month.
    pub fn is_active(&self, month: u32) -> bool {
        self.months.contains(&month)
    }

    /// Multiplier for a reading of `class` at `month` and `hour`; `1.0`
    /// outside the window or for non-residential classes.
    pub fn factor(&self, class: BuildingClass, month: u32, hour: u32) -> f64 {
        if class != BuildingClass::Residential || !self.is_active(month) {
            return 1.0;
        }
        let (day_start, day_end) = self.daytime_hours;
        let (evening_start, evening_end) = self.evening_hours;
        if (day_start..=day_end).contains(&hour) {
            self.daytime_factor
        } else if (evening_start..=evening_end).contains(&hour) {
            self.evening_factor
        } else {
            1.0
        }
    }
}
