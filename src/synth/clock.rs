use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, TimeDelta};

use crate::error::{GenerationError, Result};

/// Fixed sampling step parsed from a calendar frequency token such as
/// `30T`, `30min`, `H`, `2h`, `D` or `15S`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frequency {
    seconds: i64,
}

impl Frequency {
    /// Step of `seconds`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if `seconds` is not positive.
    pub fn from_seconds(seconds: i64) -> Result<Self> {
        if seconds <= 0 {
            return Err(GenerationError::InvalidRequest(format!(
                "frequency must be positive, got {seconds}s"
            )));
        }
        Ok(Self { seconds })
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn step(&self) -> TimeDelta {
        TimeDelta::seconds(self.seconds)
    }
}

impl FromStr for Frequency {
    type Err = GenerationError;

    fn from_str(token: &str) -> Result<Self> {
        let invalid = || GenerationError::InvalidRequest(format!("unknown frequency \"{token}\""));

        let trimmed = token.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (digits, unit) = trimmed.split_at(split);
        let multiple: i64 = if digits.is_empty() {
            1
        } else {
            digits.parse().map_err(|_| invalid())?
        };

        let unit_seconds = match unit.to_ascii_lowercase().as_str() {
            "s" | "sec" | "second" | "seconds" => 1,
            "t" | "min" | "minute" | "minutes" => 60,
            "h" | "hour" | "hours" => 3_600,
            "d" | "day" | "days" => 86_400,
            "w" | "week" | "weeks" => 604_800,
            _ => return Err(invalid()),
        };
        // Caps the step at roughly one century, well inside TimeDelta's range.
        let seconds = multiple
            .checked_mul(unit_seconds)
            .filter(|s| *s <= 100 * 366 * 86_400)
            .ok_or_else(invalid)?;
        Self::from_seconds(seconds)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.seconds;
        if s % 86_400 == 0 {
            write!(f, "{}D", s / 86_400)
        } else if s % 3_600 == 0 {
            write!(f, "{}h", s / 3_600)
        } else if s % 60 == 0 {
            write!(f, "{}min", s / 60)
        } else {
            write!(f, "{s}S")
        }
    }
}

/// Timestamps from `start` to `end` inclusive at a fixed step.
///
/// ```
/// use chrono::NaiveDate;
/// use synth_grid::synth::{Frequency, TimeGrid};
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1)
///     .and_then(|d| d.and_hms_opt(0, 0, 0))
///     .unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 1, 1)
///     .and_then(|d| d.and_hms_opt(1, 0, 0))
///     .unwrap();
/// let grid = TimeGrid::new(start, end, "30min".parse().unwrap()).unwrap();
/// assert_eq!(grid.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    start: NaiveDateTime,
    frequency: Frequency,
    len: usize,
}

impl TimeGrid {
    /// # Errors
    ///
    /// Returns `InvalidRequest` if `end` is before `start`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, frequency: Frequency) -> Result<Self> {
        if end < start {
            return Err(GenerationError::InvalidRequest(format!(
                "end {end} is before start {start}"
            )));
        }
        let span = (end - start).num_seconds();
        let steps = usize::try_from(span / frequency.seconds() + 1).map_err(|_| {
            GenerationError::InvalidRequest("date range has too many steps".into())
        })?;
        Ok(Self {
            start,
            frequency,
            len: steps,
        })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Last timestamp on the grid (at or before the requested end).
    pub fn last(&self) -> NaiveDateTime {
        self.len
            .checked_sub(1)
            .and_then(|step| self.timestamp(step))
            .unwrap_or(self.start)
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Timestamp of `step`, or `None` past the end of the grid.
    pub fn timestamp(&self, step: usize) -> Option<NaiveDateTime> {
        if step >= self.len {
            return None;
        }
        let offset = i64::try_from(step).ok()?.checked_mul(self.frequency.seconds())?;
        self.start.checked_add_signed(TimeDelta::try_seconds(offset)?)
    }

    pub fn iter(&self) -> TimeGridIter<'_> {
        TimeGridIter {
            grid: self,
            current: 0,
        }
    }
}

impl<'a> IntoIterator for &'a TimeGrid {
    type Item = NaiveDateTime;
    type IntoIter = TimeGridIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Walks a [`TimeGrid`] one step at a time.
#[derive(Debug, Clone)]
pub struct TimeGridIter<'a> {
    grid: &'a TimeGrid,
    current: usize,
}

impl Iterator for TimeGridIter<'_> {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<NaiveDateTime> {
        let timestamp = self.grid.timestamp(self.current)?;
        self.current += 1;
        Some(timestamp)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.grid.len.saturating_sub(self.current);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TimeGridIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .expect("valid timestamp")
    }

    fn freq(token: &str) -> Frequency {
        token.parse().expect("valid frequency")
    }

    #[test]
    fn parses_common_tokens() {
        assert_eq!(freq("30T").seconds(), 1_800);
        assert_eq!(freq("30min").seconds(), 1_800);
        assert_eq!(freq("H").seconds(), 3_600);
        assert_eq!(freq("2h").seconds(), 7_200);
        assert_eq!(freq("D").seconds(), 86_400);
        assert_eq!(freq("15S").seconds(), 15);
        assert_eq!(freq(" 1W ").seconds(), 604_800);
    }

    #[test]
    fn rejects_bad_tokens() {
        for token in ["", "30", "0min", "5 parsecs", "-5min", "99999999999999999999H"] {
            assert!(token.parse::<Frequency>().is_err(), "{token:?} accepted");
        }
    }

    #[test]
    fn display_uses_largest_whole_unit() {
        assert_eq!(freq("30T").to_string(), "30min");
        assert_eq!(freq("120min").to_string(), "2h");
        assert_eq!(freq("D").to_string(), "1D");
        assert_eq!(freq("15S").to_string(), "15S");
    }

    #[test]
    fn grid_includes_both_ends() {
        let grid = TimeGrid::new(at(1, 0, 0), at(2, 0, 0), freq("30min")).expect("grid");
        assert_eq!(grid.len(), 49);
        let stamps: Vec<_> = grid.iter().collect();
        assert_eq!(stamps.first(), Some(&at(1, 0, 0)));
        assert_eq!(stamps.last(), Some(&at(2, 0, 0)));
        assert_eq!(grid.last(), at(2, 0, 0));
    }

    #[test]
    fn grid_stops_before_uneven_end() {
        let grid = TimeGrid::new(at(1, 0, 0), at(1, 1, 10), freq("H")).expect("grid");
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.timestamp(1), Some(at(1, 1, 0)));
        assert_eq!(grid.timestamp(2), None);
    }

    #[test]
    fn single_point_grid() {
        let grid = TimeGrid::new(at(3, 12, 0), at(3, 12, 0), freq("30T")).expect("grid");
        assert_eq!(grid.iter().count(), 1);
    }

    #[test]
    fn reversed_range_is_invalid() {
        assert!(matches!(
            TimeGrid::new(at(2, 0, 0), at(1, 0, 0), freq("H")),
            Err(GenerationError::InvalidRequest(_))
        ));
    }
}
