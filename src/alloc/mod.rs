//! Building allocation: how many buildings of which class go where.

/// Population-weighted split of the requested total across locations.
pub mod allocator;
/// Class mix per location.
pub mod distribution;
/// Concrete building records.
pub mod records;

pub use allocator::{LocationAllocation, allocate};
pub use distribution::{
    BuildingTypeDistributor, CityTier, ClassCounts, ClassShares, DistributionRules,
    DistributionStrategy,
};
pub use records::{Building, BuildingRecordFactory};
