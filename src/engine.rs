//! End-to-end dataset generation.
//!
//! [`Generator`] holds every piece of reference data and model setting; a
//! [`GenerationRequest`] says what to generate. Requests are validated in
//! full before any building is created, so a failed request produces no
//! output at all.

use std::mem;

use chrono::NaiveDateTime;
use rayon::prelude::*;
use tracing::{debug, info, info_span};

use crate::alloc::{
    Building, BuildingRecordFactory, BuildingTypeDistributor, ClassCounts, DistributionRules,
    allocate,
};
use crate::catalog::{ArchetypeTable, Catalog, Location, LocationFilter};
use crate::error::{GenerationError, Result};
use crate::rng::{RECORD_STREAM, SYNTHESIS_STREAM, stream_rng};
use crate::synth::{ConsumptionSynthesizer, Frequency, Reading, SynthesisSettings, TimeGrid};

/// Prefix of every building id.
pub const DEFAULT_ID_PREFIX: &str = "MY";

/// Which locations buildings are generated for.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationSelection {
    /// Every catalog location.
    All,
    /// Catalog locations matching the filter.
    Filter(LocationFilter),
    /// A single caller-supplied location outside the catalog.
    Custom(Location),
}

/// Parameters of one generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub total_buildings: u64,
    pub selection: LocationSelection,
    pub start: NaiveDateTime,
    /// Inclusive.
    pub end: NaiveDateTime,
    pub frequency: Frequency,
    /// Master seed; identical requests with the same seed give identical
    /// datasets.
    pub seed: u64,
}

impl GenerationRequest {
    /// Checks the request and builds its timestamp grid.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for a zero building total, a reversed date
    /// range, an invalid custom location or a reading count that does not
    /// fit in memory.
    pub fn validate(&self) -> Result<TimeGrid> {
        if self.total_buildings == 0 {
            return Err(GenerationError::InvalidRequest(
                "total_buildings must be > 0".into(),
            ));
        }
        if let LocationSelection::Custom(location) = &self.selection {
            location
                .check()
                .map_err(|err| GenerationError::InvalidRequest(err.to_string()))?;
        }
        let grid = TimeGrid::new(self.start, self.end, self.frequency)?;
        let readings = usize::try_from(self.total_buildings)
            .ok()
            .and_then(|n| n.checked_mul(grid.len()))
            .and_then(|n| n.checked_mul(mem::size_of::<Reading>()));
        if readings.is_none_or(|bytes| bytes > isize::MAX as usize) {
            return Err(GenerationError::InvalidRequest(format!(
                "{} buildings x {} steps is too many readings",
                self.total_buildings,
                grid.len()
            )));
        }
        Ok(grid)
    }
}

/// Outcome of allocation and distribution for one location.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPlan {
    pub location: String,
    pub population: u64,
    pub count: u64,
    /// `"authoritative"` or `"estimated"`.
    pub strategy: &'static str,
    pub counts: ClassCounts,
}

/// Complete output of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub plans: Vec<LocationPlan>,
    pub buildings: Vec<Building>,
    pub readings: Vec<Reading>,
    pub grid: TimeGrid,
}

/// Generation context: catalog, archetypes, distribution rules and
/// synthesis settings.
#[derive(Debug, Clone)]
pub struct Generator {
    catalog: Catalog,
    distributor: BuildingTypeDistributor,
    synthesizer: ConsumptionSynthesizer,
    id_prefix: String,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(
            Catalog::malaysia(),
            ArchetypeTable::default(),
            DistributionRules::default(),
            SynthesisSettings::default(),
        )
    }
}

impl Generator {
    pub fn new(
        catalog: Catalog,
        archetypes: ArchetypeTable,
        rules: DistributionRules,
        settings: SynthesisSettings,
    ) -> Self {
        Self {
            catalog,
            distributor: BuildingTypeDistributor::new(rules),
            synthesizer: ConsumptionSynthesizer::new(archetypes, settings),
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
        }
    }

    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn distributor(&self) -> &BuildingTypeDistributor {
        &self.distributor
    }

    pub fn synthesizer(&self) -> &ConsumptionSynthesizer {
        &self.synthesizer
    }

    /// Locations a selection resolves to, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCandidateSet` when nothing matches.
    pub fn candidates<'a>(&'a self, selection: &'a LocationSelection) -> Result<Vec<&'a Location>> {
        let candidates = match selection {
            LocationSelection::All => self.catalog.locations().iter().collect(),
            LocationSelection::Filter(filter) => self.catalog.select(filter),
            LocationSelection::Custom(location) => vec![location],
        };
        if candidates.is_empty() {
            return Err(GenerationError::EmptyCandidateSet);
        }
        Ok(candidates)
    }

    /// Allocates, distributes and expands the request into buildings.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCandidateSet` or `InvalidRequest`.
    pub fn plan_buildings(
        &self,
        request: &GenerationRequest,
    ) -> Result<(Vec<LocationPlan>, Vec<Building>)> {
        let candidates = self.candidates(&request.selection)?;
        let allocations = allocate(&candidates, request.total_buildings)?;
        info!(
            locations = allocations.len(),
            total = request.total_buildings,
            "allocated buildings"
        );

        let mut factory =
            BuildingRecordFactory::new(self.id_prefix.clone(), self.catalog.default_bounds());
        let mut plans = Vec::with_capacity(allocations.len());
        let mut buildings = Vec::new();

        for (index, allocation) in allocations.iter().enumerate() {
            if allocation.count == 0 {
                continue;
            }
            let location = allocation.location;
            let strategy = self.distributor.strategy_for(location, allocation.count);
            let name = strategy.name();
            let counts =
                self.distributor
                    .counts_for(&strategy, location.population, allocation.count);
            debug!(
                location = %location.name,
                count = allocation.count,
                strategy = name,
                "distributed building classes"
            );

            let mut rng = stream_rng(request.seed, RECORD_STREAM, index as u64);
            buildings.extend(factory.expand(location, &counts, &mut rng));
            plans.push(LocationPlan {
                location: location.name.clone(),
                population: location.population,
                count: allocation.count,
                strategy: name,
                counts,
            });
        }

        Ok((plans, buildings))
    }

    /// Synthesizes readings for every building on `grid`, in building
    /// order. Each building draws from its own stream, so the result does
    /// not depend on the number of worker threads.
    pub fn synthesize(&self, buildings: &[Building], grid: &TimeGrid, seed: u64) -> Vec<Reading> {
        buildings
            .par_iter()
            .enumerate()
            .flat_map_iter(|(index, building)| {
                let mut rng = stream_rng(seed, SYNTHESIS_STREAM, index as u64);
                self.synthesizer.series(&mut rng, building, grid)
            })
            .collect()
    }

    /// Runs the full pipeline for `request`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` or `EmptyCandidateSet`; nothing is produced
    /// on error.
    pub fn generate(&self, request: &GenerationRequest) -> Result<Dataset> {
        let span = info_span!("generate", seed = request.seed);
        let _guard = span.enter();

        let grid = request.validate()?;
        let (plans, buildings) = self.plan_buildings(request)?;
        info!(
            buildings = buildings.len(),
            steps = grid.len(),
            frequency = %request.frequency,
            "synthesizing readings"
        );
        let readings = self.synthesize(&buildings, &grid, request.seed);
        info!(readings = readings.len(), "generation complete");

        Ok(Dataset {
            plans,
            buildings,
            readings,
            grid,
        })
    }
}
