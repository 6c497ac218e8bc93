//! Multiplicative consumption factors for a tropical climate.
//!
//! Banded factors draw a fresh uniform jitter on every call, so two calls
//! with the same inputs usually differ.

use std::f64::consts::PI;

use chrono::{Datelike, NaiveDateTime, Timelike};
use rand::Rng;
use strum::Display;

use crate::catalog::{Archetype, BuildingClass};
use crate::rng::uniform;

/// Calendar fields of one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeContext {
    /// 0-23.
    pub hour: u32,
    /// 0 = Monday, 6 = Sunday.
    pub weekday: u32,
    /// 1-12.
    pub month: u32,
}

impl TimeContext {
    pub fn new(hour: u32, weekday: u32, month: u32) -> Self {
        Self {
            hour,
            weekday,
            month,
        }
    }

    pub fn from_timestamp(timestamp: &NaiveDateTime) -> Self {
        Self {
            hour: timestamp.hour(),
            weekday: timestamp.weekday().num_days_from_monday(),
            month: timestamp.month(),
        }
    }

    pub fn is_weekend(&self) -> bool {
        self.weekday >= 5
    }

    /// Friday from noon, when weekly prayers slow business down.
    pub fn is_friday_afternoon(&self) -> bool {
        self.weekday == 4 && self.hour >= 12
    }
}

/// Air-conditioning load by time of day. The night band wraps midnight.
pub fn climate_factor<R: Rng>(rng: &mut R, hour: u32) -> f64 {
    match hour {
        11..=16 => uniform(rng, 1.4, 1.7),
        17..=21 => uniform(rng, 1.2, 1.4),
        22..=23 | 0..=6 => uniform(rng, 0.8, 1.1),
        _ => 1.0,
    }
}

/// Share of the base-to-peak swing in use at this hour, by class.
pub fn hour_factor<R: Rng>(
    rng: &mut R,
    class: BuildingClass,
    archetype: &Archetype,
    time: &TimeContext,
) -> f64 {
    use BuildingClass::*;

    let hour = time.hour;
    let h = f64::from(hour);
    let night = archetype.night_factor;

    match class {
        Residential => match hour {
            6..=8 => 0.6 + 0.3 * ((h - 6.0) * PI / 2.0).sin(),
            19..=23 => 0.7 + 0.3 * ((h - 19.0) * PI / 4.0).sin(),
            11..=16 => uniform(rng, 0.8, 1.2),
            0..=5 => night * uniform(rng, 0.8, 1.2),
            _ => uniform(rng, 0.4, 0.7),
        },
        Commercial | Office | Retail => match hour {
            8..=19 => {
                let ramp = 0.6 + 0.4 * ((h - 8.0) * PI / 11.0).sin();
                if (11..=16).contains(&hour) {
                    ramp * 1.3
                } else {
                    ramp
                }
            }
            20..=22 => uniform(rng, 0.2, 0.5),
            _ => night * uniform(rng, 0.5, 1.0),
        },
        Industrial | Factory => match hour {
            22..=23 | 0..=6 => uniform(rng, 0.9, 1.0),
            7..=10 => uniform(rng, 0.8, 1.0),
            11..=16 => uniform(rng, 0.5, 0.8),
            _ => uniform(rng, 0.7, 1.0),
        },
        Hospital => {
            let level = uniform(rng, 0.8, 1.0);
            if (11..=16).contains(&hour) {
                level * 1.2
            } else {
                level
            }
        }
        Clinic => match hour {
            11..=16 => uniform(rng, 0.8, 1.0) * 1.3,
            7..=19 => uniform(rng, 0.8, 1.0),
            _ => uniform(rng, 0.1, 0.2),
        },
        School if !time.is_weekend() && (7..=15).contains(&hour) => {
            if hour >= 11 {
                uniform(rng, 0.8, 1.2)
            } else {
                uniform(rng, 0.6, 0.9)
            }
        }
        School => uniform(rng, 0.05, 0.15),
        Hotel | Restaurant | Warehouse | Apartment => match hour {
            8..=18 => uniform(rng, 0.6, 1.0),
            _ => night + uniform(rng, 0.0, 0.3),
        },
    }
}

/// Weekly rhythm, including the Friday-afternoon slowdown.
pub fn week_factor(class: BuildingClass, time: &TimeContext) -> f64 {
    use BuildingClass::*;

    let slow_day = time.is_friday_afternoon();
    match class {
        Commercial | Office | Clinic => {
            if slow_day {
                0.7
            } else if time.is_weekend() {
                0.4
            } else {
                1.0
            }
        }
        School if slow_day || time.is_weekend() => 0.1,
        Residential if slow_day || time.is_weekend() => 1.2,
        Hospital | Hotel | School | Residential => 1.0,
        _ if time.is_weekend() => 0.8,
        _ => 1.0,
    }
}

/// Climate season by calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Season {
    /// November to February; monsoon rain, less cooling.
    Wet,
    /// May to August; hottest and driest.
    DryHot,
    /// March and April.
    Transition,
    /// September and October.
    InterMonsoon,
}

impl Season {
    pub fn from_month(month: u32) -> Self {
        match month {
            11 | 12 | 1 | 2 => Self::Wet,
            5..=8 => Self::DryHot,
            3 | 4 => Self::Transition,
            _ => Self::InterMonsoon,
        }
    }

    /// Range the season factor is drawn from.
    pub fn factor_range(self) -> (f64, f64) {
        match self {
            Self::Wet => (0.9, 1.1),
            Self::DryHot => (1.3, 1.7),
            Self::Transition => (1.2, 1.5),
            Self::InterMonsoon => (1.0, 1.3),
        }
    }
}

pub fn season_factor<R: Rng>(rng: &mut R, month: u32) -> f64 {
    let (low, high) = Season::from_month(month).factor_range();
    uniform(rng, low, high)
}

/// Bigger cities run more equipment per building.
pub fn city_scale_factor<R: Rng>(rng: &mut R, population: u64) -> f64 {
    match population {
        p if p > 500_000 => uniform(rng, 1.2, 1.4),
        p if p > 200_000 => uniform(rng, 1.0, 1.2),
        _ => uniform(rng, 0.8, 1.1),
    }
}
