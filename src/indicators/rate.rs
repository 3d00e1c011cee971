//! Population-based normalization.

use crate::indicators::types::NormalizeReport;
use crate::indicators::utility::per_population;
use crate::population::AreaPopulationIndex;
use crate::records::SmoothedAreaRecord;
use std::collections::BTreeSet;

pub const PER_100K: f64 = 100_000.0;

/// `value` per 100,000 people. Undefined when the population is unknown or zero.
pub fn rate_per_100k(value: f64, population: Option<u64>) -> Option<f64> {
    population
        .filter(|p| *p > 0)
        .map(|p| per_population(value, p, PER_100K))
}

/// `value` as a percentage of the population.
pub fn share_of_population(value: f64, population: Option<u64>) -> Option<f64> {
    population
        .filter(|p| *p > 0)
        .map(|p| per_population(value, p, 100.0))
}

/// Attaches a per-100,000 rate of the 7-day average to every row.
///
/// Rows of areas missing from `index` keep an undefined rate; their codes
/// are collected in the report instead of failing the batch.
pub fn normalize(
    rows: Vec<SmoothedAreaRecord>,
    index: &AreaPopulationIndex,
) -> (Vec<SmoothedAreaRecord>, NormalizeReport) {
    let mut unmatched = BTreeSet::new();

    let rows = rows
        .into_iter()
        .map(|row| {
            let population = index.lookup(&row.area_code);
            if population.is_none() {
                unmatched.insert(row.area_code.clone());
            }

            let rate_per_100k = row.avg_7day.and_then(|avg| rate_per_100k(avg, population));
            SmoothedAreaRecord { rate_per_100k, ..row }
        })
        .collect();

    (
        rows,
        NormalizeReport {
            unmatched_areas: unmatched.into_iter().collect(),
        },
    )
}
