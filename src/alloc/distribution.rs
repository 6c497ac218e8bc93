//! Per-location building class mix.
//!
//! A location's counts come from one of two strategies, chosen once per
//! location: scaled authoritative counts when the location carries a usable
//! table, otherwise a percentage table derived from population tier and
//! urban profile.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{debug, warn};

use crate::catalog::{BuildingClass, Location, UrbanProfile};
use crate::error::{GenerationError, Result};

/// Absorbs float error in `share * count` before flooring.
const FLOOR_EPSILON: f64 = 1e-9;

/// Urban-planning thresholds applied when converting shares to counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistributionRules {
    /// Locations below this population get no hospital.
    pub hospital_min_population: u64,
    /// Locations below this population get no factory.
    pub factory_min_population: u64,
    /// Locations below this population get no apartment block.
    pub apartment_min_population: u64,
    /// Locations above this population get at least one school.
    pub school_min_population: u64,
    /// Locations above this population get at least one clinic.
    pub clinic_min_population: u64,
    /// Allocations above this count get at least one Residential and one
    /// Retail building.
    pub min_count_for_forced_classes: u64,
    /// Minimum Residential fraction of a location's buildings.
    pub residential_floor: f64,
    /// Expected building stock per 1,000 inhabitants, used to scale
    /// authoritative counts.
    pub buildings_per_thousand: f64,
}

impl Default for DistributionRules {
    fn default() -> Self {
        Self {
            hospital_min_population: 80_000,
            factory_min_population: 100_000,
            apartment_min_population: 50_000,
            school_min_population: 10_000,
            clinic_min_population: 15_000,
            min_count_for_forced_classes: 5,
            residential_floor: 0.5,
            buildings_per_thousand: 150.0,
        }
    }
}

impl DistributionRules {
    /// Whether a location of `population` may hold `class` at all.
    pub fn permits(&self, class: BuildingClass, population: u64) -> bool {
        match class {
            BuildingClass::Hospital => population >= self.hospital_min_population,
            BuildingClass::Factory => population >= self.factory_min_population,
            BuildingClass::Apartment => population >= self.apartment_min_population,
            _ => true,
        }
    }

    /// Whether `class` must get at least one building.
    pub fn forces(&self, class: BuildingClass, population: u64, count: u64) -> bool {
        match class {
            BuildingClass::Residential | BuildingClass::Retail => {
                count > self.min_count_for_forced_classes
            }
            BuildingClass::School => population > self.school_min_population,
            BuildingClass::Clinic => population > self.clinic_min_population,
            _ => false,
        }
    }

    /// Smallest Residential count allowed for an allocation of `count`.
    pub fn residential_minimum(&self, count: u64) -> u64 {
        let floor = (self.residential_floor * count as f64 - FLOOR_EPSILON).ceil();
        (floor.max(0.0) as u64).min(count)
    }
}

/// Population bracket of a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
pub enum CityTier {
    Metropolis,
    MajorCity,
    MediumCity,
    SmallCity,
    Town,
}

impl CityTier {
    pub fn from_population(population: u64) -> Self {
        match population {
            p if p > 1_000_000 => Self::Metropolis,
            p if p > 500_000 => Self::MajorCity,
            p if p > 200_000 => Self::MediumCity,
            p if p > 50_000 => Self::SmallCity,
            _ => Self::Town,
        }
    }

    /// Residential share before renormalization; larger cities skew lower.
    pub fn residential_base(self) -> f64 {
        match self {
            Self::Metropolis => 0.60,
            Self::MajorCity => 0.63,
            Self::MediumCity => 0.66,
            Self::SmallCity => 0.70,
            Self::Town => 0.75,
        }
    }
}

/// Fraction of a location's buildings per class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassShares {
    shares: BTreeMap<BuildingClass, f64>,
}

impl ClassShares {
    pub fn get(&self, class: BuildingClass) -> f64 {
        self.shares.get(&class).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BuildingClass, f64)> + '_ {
        self.shares.iter().map(|(class, share)| (*class, *share))
    }

    pub fn sum(&self) -> f64 {
        self.shares.values().sum()
    }

    fn add(&mut self, class: BuildingClass, share: f64) {
        *self.shares.entry(class).or_insert(0.0) += share;
    }

    fn normalized(mut self) -> Self {
        let total = self.sum();
        if total > 0.0 {
            for share in self.shares.values_mut() {
                *share /= total;
            }
        }
        self
    }

    /// Classes by descending share; equal shares keep declaration order.
    pub fn ranked(&self) -> Vec<(BuildingClass, f64)> {
        let mut ranked: Vec<_> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

/// Integer building count per class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassCounts {
    counts: BTreeMap<BuildingClass, u64>,
}

impl ClassCounts {
    pub fn get(&self, class: BuildingClass) -> u64 {
        self.counts.get(&class).copied().unwrap_or(0)
    }

    /// Non-zero entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (BuildingClass, u64)> + '_ {
        self.counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(class, count)| (*class, *count))
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    fn set(&mut self, class: BuildingClass, count: u64) {
        self.counts.insert(class, count);
    }

    fn add(&mut self, class: BuildingClass, count: u64) {
        *self.counts.entry(class).or_insert(0) += count;
    }

    /// One entry per building, grouped by class.
    pub fn units(&self) -> Vec<BuildingClass> {
        self.iter()
            .flat_map(|(class, count)| std::iter::repeat_n(class, count as usize))
            .collect()
    }

    /// One entry per building in random order. Only the order depends on
    /// `rng`.
    pub fn shuffled_units<R: Rng>(&self, rng: &mut R) -> Vec<BuildingClass> {
        let mut units = self.units();
        units.shuffle(rng);
        units
    }

    /// Moves single units from the largest non-residential class into
    /// Residential until Residential holds at least `minimum`. Ties give up
    /// the later-declared class first.
    fn enforce_residential_minimum(&mut self, minimum: u64) {
        while self.get(BuildingClass::Residential) < minimum {
            let donor = self
                .counts
                .iter()
                .filter(|(class, count)| **class != BuildingClass::Residential && **count > 0)
                .max_by_key(|(class, count)| (**count, **class))
                .map(|(class, _)| *class);
            let Some(donor) = donor else {
                break;
            };
            if let Some(count) = self.counts.get_mut(&donor) {
                *count -= 1;
            }
            self.add(BuildingClass::Residential, 1);
        }
    }
}

impl FromIterator<(BuildingClass, u64)> for ClassCounts {
    fn from_iter<I: IntoIterator<Item = (BuildingClass, u64)>>(iter: I) -> Self {
        let mut counts = Self::default();
        for (class, count) in iter {
            counts.add(class, count);
        }
        counts
    }
}

/// How a location's class counts are obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum DistributionStrategy {
    /// Externally supplied counts, already scaled to the allocation.
    Authoritative(ClassCounts),
    /// Percentage table to be converted into counts.
    Estimated(ClassShares),
}

impl DistributionStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Authoritative(_) => "authoritative",
            Self::Estimated(_) => "estimated",
        }
    }
}

/// Converts a location and its allocated count into counts per class.
#[derive(Debug, Clone, Default)]
pub struct BuildingTypeDistributor {
    rules: DistributionRules,
}

impl BuildingTypeDistributor {
    pub fn new(rules: DistributionRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &DistributionRules {
        &self.rules
    }

    /// Renormalized class shares for a location of `population` with
    /// `profile`. Classes a location that size may not hold get no share.
    pub fn percentage_table(&self, population: u64, profile: &UrbanProfile) -> ClassShares {
        use BuildingClass::*;

        let tier = CityTier::from_population(population);
        let mut shares = ClassShares::default();

        shares.add(Residential, tier.residential_base());
        if population > 100_000 {
            shares.add(Apartment, 0.10);
        }

        if profile.economic_center {
            shares.add(Commercial, 0.12);
            shares.add(Office, 0.08);
            shares.add(Retail, 0.08);
        } else {
            shares.add(Commercial, 0.06);
            shares.add(Office, 0.02);
            shares.add(Retail, 0.06);
        }

        let (hospital, clinic) = match population {
            p if p > 300_000 => (0.015, 0.025),
            p if p > 100_000 => (0.008, 0.03),
            p if p > 30_000 => (0.0, 0.025),
            _ => (0.0, 0.015),
        };
        shares.add(Hospital, hospital);
        shares.add(Clinic, clinic);

        let school = match population {
            p if p > 100_000 => 0.06,
            p if p > 20_000 => 0.08,
            _ => 0.10,
        };
        shares.add(School, school);
        if profile.university_city {
            shares.add(School, 0.01);
        }

        let (industrial, factory, warehouse) = match (profile.industrial_hub, population) {
            (true, p) if p > 200_000 => (0.08, 0.04, 0.03),
            (true, _) => (0.12, 0.06, 0.04),
            (false, _) => (0.02, 0.0, 0.01),
        };
        shares.add(Industrial, industrial);
        shares.add(Factory, factory);
        shares.add(Warehouse, warehouse);
        if profile.port_city {
            shares.add(Warehouse, 0.02);
        }

        let hotel = if profile.tourist_destination {
            if profile.island_resort {
                0.08
            } else if profile.heritage_site {
                0.05
            } else if tier == CityTier::Metropolis {
                0.04
            } else {
                0.03
            }
        } else if population > 200_000 {
            0.02
        } else {
            0.005
        };
        shares.add(Hotel, hotel);

        let restaurant = match tier {
            CityTier::Metropolis | CityTier::MajorCity => 0.06,
            _ if profile.tourist_destination => 0.05,
            CityTier::MediumCity => 0.04,
            _ => 0.02,
        };
        shares.add(Restaurant, restaurant);

        for (class, share) in shares.shares.iter_mut() {
            if !self.rules.permits(*class, population) {
                *share = 0.0;
            }
        }
        shares.normalized()
    }

    /// Picks the strategy for `location` and an allocation of `count`.
    ///
    /// Authoritative counts are used when they scale cleanly; any
    /// [`GenerationError::MissingAuthoritativeData`] is logged and answered
    /// with the percentage table.
    pub fn strategy_for(&self, location: &Location, count: u64) -> DistributionStrategy {
        match self.scale_authoritative(location, count) {
            Ok(counts) => DistributionStrategy::Authoritative(counts),
            Err(err) => {
                if location.authoritative.is_some() {
                    warn!(%err, "falling back to percentage model");
                } else {
                    debug!(%err, "using percentage model");
                }
                DistributionStrategy::Estimated(
                    self.percentage_table(location.population, &location.profile),
                )
            }
        }
    }

    /// Scales the location's authoritative table to `count` buildings.
    ///
    /// Non-residential classes are scaled by `count / estimated_total` and
    /// floored; classes the location may not hold are dropped. Residential
    /// takes whatever remains.
    ///
    /// # Errors
    ///
    /// Returns `MissingAuthoritativeData` when the table is absent or empty,
    /// when the scaled classes exceed `count` or when Residential would end
    /// up below its floor.
    pub fn scale_authoritative(&self, location: &Location, count: u64) -> Result<ClassCounts> {
        let missing = |reason: &str| GenerationError::MissingAuthoritativeData {
            location: location.name.clone(),
            reason: reason.to_string(),
        };

        let table = location
            .authoritative
            .as_ref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| missing("no authoritative counts"))?;
        let estimated_total =
            location.population as f64 / 1000.0 * self.rules.buildings_per_thousand;
        if estimated_total <= 0.0 {
            return Err(missing("estimated building stock is zero"));
        }
        let scale = count as f64 / estimated_total;

        let mut counts = ClassCounts::default();
        for (class, authoritative) in table.iter() {
            if class == BuildingClass::Residential
                || !self.rules.permits(class, location.population)
            {
                continue;
            }
            let scaled = (authoritative as f64 * scale + FLOOR_EPSILON).floor() as u64;
            counts.set(class, scaled);
        }

        let assigned = counts.total();
        if assigned > count {
            return Err(missing("scaled counts exceed the allocation"));
        }
        let residential = count - assigned;
        if residential < self.rules.residential_minimum(count) {
            return Err(missing("residential share would fall below its floor"));
        }
        counts.set(BuildingClass::Residential, residential);
        Ok(counts)
    }

    /// Counts per class for `location` and an allocation of `count`.
    ///
    /// The counts always sum to `count` and depend only on the location and
    /// `count`.
    pub fn distribute(&self, location: &Location, count: u64) -> ClassCounts {
        let strategy = self.strategy_for(location, count);
        self.counts_for(&strategy, location.population, count)
    }

    /// Resolves an already selected strategy into counts.
    pub fn counts_for(
        &self,
        strategy: &DistributionStrategy,
        population: u64,
        count: u64,
    ) -> ClassCounts {
        match strategy {
            DistributionStrategy::Authoritative(counts) => counts.clone(),
            DistributionStrategy::Estimated(shares) => {
                self.counts_from_shares(population, shares, count)
            }
        }
    }

    /// Counts from the percentage model alone.
    pub fn distribute_estimated(
        &self,
        population: u64,
        profile: &UrbanProfile,
        count: u64,
    ) -> ClassCounts {
        let shares = self.percentage_table(population, profile);
        self.counts_from_shares(population, &shares, count)
    }

    fn counts_from_shares(&self, population: u64, shares: &ClassShares, count: u64) -> ClassCounts {
        let mut counts = ClassCounts::default();
        let mut remaining = count;

        for (class, share) in shares.ranked() {
            let mut n = if self.rules.permits(class, population) {
                (share * count as f64 + FLOOR_EPSILON).floor() as u64
            } else {
                0
            };
            if n == 0 && self.rules.forces(class, population, count) {
                n = 1;
            }
            let n = n.min(remaining);
            remaining -= n;
            counts.set(class, n);
        }
        counts.add(BuildingClass::Residential, remaining);

        counts.enforce_residential_minimum(self.rules.residential_minimum(count));
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AuthoritativeCounts, Catalog};
    use crate::rng::stream_rng;

    fn distributor() -> BuildingTypeDistributor {
        BuildingTypeDistributor::default()
    }

    #[test]
    fn tiers_follow_population_brackets() {
        assert_eq!(CityTier::from_population(1_800_000), CityTier::Metropolis);
        assert_eq!(CityTier::from_population(1_000_000), CityTier::MajorCity);
        assert_eq!(CityTier::from_population(300_000), CityTier::MediumCity);
        assert_eq!(CityTier::from_population(65_000), CityTier::SmallCity);
        assert_eq!(CityTier::from_population(50_000), CityTier::Town);
    }

    #[test]
    fn percentage_table_is_normalized() {
        let d = distributor();
        for population in [5_000, 45_000, 120_000, 350_000, 900_000, 2_000_000] {
            let shares = d.percentage_table(population, &UrbanProfile::for_population(population));
            assert!((shares.sum() - 1.0).abs() < 1e-9, "{population}: {}", shares.sum());
        }
    }

    #[test]
    fn small_town_has_no_hospital_and_enough_housing() {
        let counts = distributor().distribute_estimated(50_000, &UrbanProfile::default(), 50);
        assert_eq!(counts.total(), 50);
        assert_eq!(counts.get(BuildingClass::Hospital), 0);
        assert!(counts.get(BuildingClass::Residential) >= 25);
        assert_eq!(counts.get(BuildingClass::Factory), 0);
    }

    #[test]
    fn forced_minimums_apply() {
        let counts = distributor().distribute_estimated(60_000, &UrbanProfile::default(), 8);
        assert_eq!(counts.total(), 8);
        assert!(counts.get(BuildingClass::Retail) >= 1);
        assert!(counts.get(BuildingClass::School) >= 1);
        assert!(counts.get(BuildingClass::Clinic) >= 1);
        assert!(counts.get(BuildingClass::Residential) >= 4);
    }

    #[test]
    fn metropolis_respects_residential_floor() {
        let catalog = Catalog::malaysia();
        let kl = catalog.get("Kuala Lumpur").expect("KL present");
        let counts = distributor().distribute_estimated(kl.population, &kl.profile, 1_000);
        assert_eq!(counts.total(), 1_000);
        assert!(counts.get(BuildingClass::Residential) >= 500);
        assert!(counts.get(BuildingClass::Hospital) > 0);
    }

    #[test]
    fn single_building_is_residential() {
        let counts = distributor().distribute_estimated(2_000_000, &UrbanProfile::default(), 1);
        assert_eq!(counts.get(BuildingClass::Residential), 1);
        assert_eq!(counts.total(), 1);
    }

    #[test]
    fn island_resort_gets_more_hotels() {
        let d = distributor();
        let plain = UrbanProfile {
            tourist_destination: true,
            ..UrbanProfile::default()
        };
        let island = UrbanProfile {
            island_resort: true,
            ..plain
        };
        assert!(
            d.percentage_table(65_000, &island).get(BuildingClass::Hotel)
                > d.percentage_table(65_000, &plain).get(BuildingClass::Hotel)
        );
    }

    #[test]
    fn authoritative_counts_scale_to_allocation() {
        let mut table = BTreeMap::new();
        table.insert(BuildingClass::Residential, 9_000);
        table.insert(BuildingClass::Hospital, 20);
        table.insert(BuildingClass::School, 400);
        table.insert(BuildingClass::Retail, 1_000);
        // Estimated stock: 100 * 150 = 15_000 -> scale 0.01 for 150 buildings.
        let location = Location::new("Town", 100_000, "R", "S")
            .with_authoritative(AuthoritativeCounts::new(table));
        let d = distributor();

        let strategy = d.strategy_for(&location, 150);
        assert_eq!(strategy.name(), "authoritative");
        let counts = d.distribute(&location, 150);
        assert_eq!(counts.get(BuildingClass::Hospital), 0);
        assert_eq!(counts.get(BuildingClass::School), 4);
        assert_eq!(counts.get(BuildingClass::Retail), 10);
        assert_eq!(counts.get(BuildingClass::Residential), 136);
        assert_eq!(counts.total(), 150);
    }

    #[test]
    fn oversized_authoritative_table_falls_back() {
        let mut table = BTreeMap::new();
        table.insert(BuildingClass::Commercial, 50_000);
        let location = Location::new("Town", 100_000, "R", "S")
            .with_authoritative(AuthoritativeCounts::new(table));
        let d = distributor();
        assert!(matches!(
            d.scale_authoritative(&location, 100),
            Err(GenerationError::MissingAuthoritativeData { .. })
        ));
        assert_eq!(d.strategy_for(&location, 100).name(), "estimated");
        assert_eq!(d.distribute(&location, 100).total(), 100);
    }

    #[test]
    fn kuala_lumpur_uses_official_counts() {
        let catalog = Catalog::malaysia();
        let kl = catalog.get("Kuala Lumpur").expect("KL present");
        let d = distributor();

        // Estimated stock: 1,800 * 150 = 270,000 -> scale 0.01.
        assert_eq!(d.strategy_for(kl, 2_700).name(), "authoritative");
        let counts = d.distribute(kl, 2_700);
        assert_eq!(counts.get(BuildingClass::Office), 12);
        assert_eq!(counts.get(BuildingClass::Hotel), 6);
        assert_eq!(counts.get(BuildingClass::School), 4);
        assert_eq!(counts.get(BuildingClass::Clinic), 1);
        assert_eq!(counts.get(BuildingClass::Hospital), 0);
        assert_eq!(counts.get(BuildingClass::Residential), 2_677);
        assert_eq!(counts.total(), 2_700);
    }

    #[test]
    fn kuala_lumpur_falls_back_when_counts_do_not_fit() {
        let catalog = Catalog::malaysia();
        let kl = catalog.get("Kuala Lumpur").expect("KL present");
        // Stock of 1,800 buildings -> official offices alone fill 2/3 of 1,000.
        let d = BuildingTypeDistributor::new(DistributionRules {
            buildings_per_thousand: 1.0,
            ..DistributionRules::default()
        });

        assert!(matches!(
            d.scale_authoritative(kl, 1_000),
            Err(GenerationError::MissingAuthoritativeData { .. })
        ));
        assert_eq!(d.strategy_for(kl, 1_000).name(), "estimated");
        let counts = d.distribute(kl, 1_000);
        assert_eq!(counts.total(), 1_000);
        assert!(counts.get(BuildingClass::Residential) >= 500);
    }

    #[test]
    fn missing_table_uses_percentage_model() {
        let location = Location::new("Town", 100_000, "R", "S");
        assert_eq!(distributor().strategy_for(&location, 10).name(), "estimated");
    }

    #[test]
    fn residential_minimum_rounds_up() {
        let rules = DistributionRules::default();
        assert_eq!(rules.residential_minimum(50), 25);
        assert_eq!(rules.residential_minimum(51), 26);
        assert_eq!(rules.residential_minimum(1), 1);
    }

    #[test]
    fn shuffling_changes_order_not_counts() {
        let counts = distributor().distribute_estimated(300_000, &UrbanProfile::default(), 40);
        let mut rng = stream_rng(5, 1, 0);
        let mut shuffled = counts.shuffled_units(&mut rng);
        assert_eq!(shuffled.len(), 40);
        shuffled.sort();
        assert_eq!(shuffled, counts.units());
    }
}
