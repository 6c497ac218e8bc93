use std::cmp::Reverse;

use crate::catalog::Location;
use crate::error::{GenerationError, Result};

/// Number of buildings assigned to one location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationAllocation<'a> {
    pub location: &'a Location,
    pub count: u64,
}

/// Splits `total` buildings across `candidates` in proportion to population.
///
/// Every location first receives `max(1, floor(total * weight))`. The
/// difference to `total` is then settled on the most populous location (the
/// first one in candidate order on ties), which never drops below one. If
/// the minimum-of-one rule has overshot by more than that, the rest of the
/// surplus is taken from the least populous locations first (later
/// candidates first on ties), so some small locations may end at zero.
///
/// The result keeps the candidates' order and sums to exactly `total`.
///
/// # Errors
///
/// Returns `EmptyCandidateSet` when there are no candidates and
/// `InvalidRequest` when `total` is zero or the candidates have no
/// population.
pub fn allocate<'a>(candidates: &[&'a Location], total: u64) -> Result<Vec<LocationAllocation<'a>>> {
    if candidates.is_empty() {
        return Err(GenerationError::EmptyCandidateSet);
    }
    if total == 0 {
        return Err(GenerationError::InvalidRequest(
            "total_buildings must be > 0".into(),
        ));
    }
    let population: u128 = candidates.iter().map(|l| u128::from(l.population)).sum();
    if population == 0 {
        return Err(GenerationError::InvalidRequest(
            "candidate locations have no population".into(),
        ));
    }

    let mut counts: Vec<u64> = candidates
        .iter()
        .map(|l| {
            let share = u128::from(total) * u128::from(l.population) / population;
            // share <= total, so the narrowing is lossless.
            (share as u64).max(1)
        })
        .collect();

    // Stable sort keeps catalog order among equal populations.
    let mut by_size: Vec<usize> = (0..candidates.len()).collect();
    by_size.sort_by_key(|&i| Reverse(candidates[i].population));

    let assigned: u64 = counts.iter().sum();
    if assigned < total {
        counts[by_size[0]] += total - assigned;
    } else {
        let largest = by_size[0];
        let mut surplus = assigned - total;
        let taken = surplus.min(counts[largest] - 1);
        counts[largest] -= taken;
        surplus -= taken;

        // total >= 1, so the walk stops before every count reaches zero.
        for &i in by_size.iter().rev() {
            if surplus == 0 {
                break;
            }
            let taken = surplus.min(counts[i]);
            counts[i] -= taken;
            surplus -= taken;
        }
    }

    Ok(candidates
        .iter()
        .zip(counts)
        .map(|(&location, count)| LocationAllocation { location, count })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(name: &str, population: u64) -> Location {
        Location::new(name, population, "Region", "State")
    }

    fn counts(allocations: &[LocationAllocation<'_>]) -> Vec<u64> {
        allocations.iter().map(|a| a.count).collect()
    }

    #[test]
    fn large_city_takes_the_majority() {
        let a = loc("A", 1_800_000);
        let b = loc("B", 65_000);
        let result = allocate(&[&a, &b], 100).expect("allocation");
        assert_eq!(counts(&result), vec![97, 3]);
    }

    #[test]
    fn remainder_goes_to_largest_location() {
        let a = loc("A", 100);
        let b = loc("B", 300);
        let c = loc("C", 100);
        // floors: 1, 4, 1 -> deficit of 1 lands on B.
        let result = allocate(&[&a, &b, &c], 7).expect("allocation");
        assert_eq!(counts(&result), vec![1, 5, 1]);
    }

    #[test]
    fn ties_resolve_to_first_in_order() {
        let a = loc("A", 500);
        let b = loc("B", 500);
        let result = allocate(&[&a, &b], 5).expect("allocation");
        assert_eq!(counts(&result), vec![3, 2]);
    }

    #[test]
    fn overshoot_drops_the_smallest_locations() {
        let a = loc("A", 1_000);
        let b = loc("B", 900);
        let c = loc("C", 10);
        let d = loc("D", 10);
        // Every location gets 1 -> 4 assigned for a total of 2.
        let result = allocate(&[&a, &b, &c, &d], 2).expect("allocation");
        assert_eq!(counts(&result).iter().sum::<u64>(), 2);
        assert_eq!(counts(&result), vec![1, 1, 0, 0]);
    }

    #[test]
    fn overshoot_is_settled_on_largest_before_dropping_towns() {
        let a = loc("A", 9_000);
        let b = loc("B", 500);
        let c = loc("C", 500);
        // floors: 9, 1 (from 0), 1 (from 0) -> one extra, taken from A.
        let result = allocate(&[&a, &b, &c], 10).expect("allocation");
        assert_eq!(counts(&result), vec![8, 1, 1]);

        // Equal small towns: the later one gives its building up first.
        let d = loc("D", 500);
        let result = allocate(&[&a, &b, &c, &d], 2).expect("allocation");
        assert_eq!(counts(&result), vec![1, 1, 0, 0]);
    }

    #[test]
    fn empty_candidates_fail() {
        assert_eq!(allocate(&[], 10), Err(GenerationError::EmptyCandidateSet));
    }

    #[test]
    fn zero_total_is_invalid() {
        let a = loc("A", 10);
        assert!(matches!(
            allocate(&[&a], 0),
            Err(GenerationError::InvalidRequest(_))
        ));
    }
}
