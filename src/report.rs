//! Post-hoc summary of a generated dataset.

use std::collections::BTreeMap;
use std::fmt;

use crate::catalog::BuildingClass;
use crate::engine::Dataset;
use crate::synth::Reading;

/// Descriptive statistics of a [`Dataset`]. Computed after the fact and
/// never used to judge whether generation was correct.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub total_buildings: usize,
    /// `(location, buildings, strategy)` by descending building count.
    pub per_location: Vec<(String, u64, &'static str)>,
    /// Buildings per class, by descending count.
    pub per_class: Vec<(BuildingClass, u64)>,
    pub reading_count: usize,
    pub steps: usize,
    /// Mean reading value (kWh).
    pub mean_value: f64,
    /// Largest reading value (kWh).
    pub peak_value: f64,
    /// Fraction of readings that are exactly zero.
    pub zero_fraction: f64,
    /// First readings of the dataset.
    pub sample: Vec<Reading>,
}

impl GenerationReport {
    /// Summarizes `dataset`, keeping up to `sample_size` readings.
    pub fn from_dataset(dataset: &Dataset, sample_size: usize) -> Self {
        let mut per_location: Vec<_> = dataset
            .plans
            .iter()
            .map(|p| (p.location.clone(), p.count, p.strategy))
            .collect();
        per_location.sort_by(|a, b| b.1.cmp(&a.1));

        let mut classes: BTreeMap<BuildingClass, u64> = BTreeMap::new();
        for building in &dataset.buildings {
            *classes.entry(building.class).or_insert(0) += 1;
        }
        let mut per_class: Vec<_> = classes.into_iter().collect();
        per_class.sort_by(|a, b| b.1.cmp(&a.1));

        let readings = &dataset.readings;
        let (mean_value, peak_value, zero_fraction) = if readings.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let n = readings.len() as f64;
            let mut sum = 0.0_f64;
            let mut peak = 0.0_f64;
            let mut zeros = 0_usize;
            for r in readings {
                sum += r.value;
                peak = peak.max(r.value);
                if r.value == 0.0 {
                    zeros += 1;
                }
            }
            (sum / n, peak, zeros as f64 / n)
        };

        Self {
            total_buildings: dataset.buildings.len(),
            per_location,
            per_class,
            reading_count: readings.len(),
            steps: dataset.grid.len(),
            mean_value,
            peak_value,
            zero_fraction,
            sample: readings.iter().take(sample_size).cloned().collect(),
        }
    }

    /// Share of buildings of `class`, in percent.
    pub fn class_share_pct(&self, class: BuildingClass) -> f64 {
        if self.total_buildings == 0 {
            return 0.0;
        }
        let count = self
            .per_class
            .iter()
            .find(|(c, _)| *c == class)
            .map_or(0, |(_, n)| *n);
        100.0 * count as f64 / self.total_buildings as f64
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Generation Report ---")?;
        writeln!(f, "Buildings:             {}", self.total_buildings)?;
        writeln!(f, "Locations:             {}", self.per_location.len())?;
        for (location, count, strategy) in &self.per_location {
            writeln!(f, "  {location:<20} {count:>6}  ({strategy})")?;
        }
        writeln!(f, "Building classes:")?;
        for (class, count) in &self.per_class {
            writeln!(
                f,
                "  {:<20} {count:>6}  {:>5.1}%",
                class.to_string(),
                self.class_share_pct(*class)
            )?;
        }
        writeln!(
            f,
            "Readings:              {} ({} steps per building)",
            self.reading_count, self.steps
        )?;
        writeln!(f, "Mean value:            {:.3} kWh", self.mean_value)?;
        writeln!(f, "Peak value:            {:.3} kWh", self.peak_value)?;
        write!(f, "Zero readings:         {:.2}%", 100.0 * self.zero_fraction)?;
        if !self.sample.is_empty() {
            writeln!(f)?;
            write!(f, "Sample:")?;
            for r in &self.sample {
                write!(f, "\n  {} {} {:.3}", r.unique_id, r.timestamp, r.value)?;
            }
        }
        Ok(())
    }
}
