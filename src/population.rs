//! Area population reference data.
//!
//! Population tables arrive either already aggregated per area or broken
//! down by single year of age; [`AreaPopulationIndex::build`] folds both
//! into per-area totals.

use serde::Serialize;
use std::collections::HashMap;
use std::ops::RangeInclusive;

/// Oldest single-year age bucket; it stands for "90 and over".
pub const OLDEST_AGE: u8 = 90;

/// One row of a population reference table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationRow {
    pub area_code: String,
    pub area_name: String,
    /// `None` for rows that already cover every age.
    pub age: Option<u8>,
    pub population: u64,
}

impl PopulationRow {
    pub fn new(area_code: &str, area_name: &str, age: Option<u8>, population: u64) -> Self {
        PopulationRow {
            area_code: area_code.to_string(),
            area_name: area_name.to_string(),
            age,
            population,
        }
    }
}

#[derive(Debug, Default)]
struct AreaEntry {
    name: String,
    total: u64,
    by_age: HashMap<u8, u64>,
}

/// Lookup from area code to population, built once per run.
#[derive(Debug, Default)]
pub struct AreaPopulationIndex {
    areas: HashMap<String, AreaEntry>,
}

impl AreaPopulationIndex {
    /// Sums every row sharing an area code into one total.
    pub fn build(rows: &[PopulationRow]) -> Self {
        let mut areas: HashMap<String, AreaEntry> = HashMap::new();

        for row in rows {
            let entry = areas.entry(row.area_code.clone()).or_default();
            if entry.name.is_empty() {
                entry.name = row.area_name.clone();
            }
            entry.total += row.population;

            if let Some(age) = row.age {
                *entry.by_age.entry(age).or_default() += row.population;
            }
        }

        AreaPopulationIndex { areas }
    }

    /// Population of `area_code`, or `None` when the area has no reference row.
    pub fn lookup(&self, area_code: &str) -> Option<u64> {
        self.areas.get(area_code).map(|e| e.total)
    }

    /// Name the reference table gives `area_code`.
    pub fn name(&self, area_code: &str) -> Option<&str> {
        self.areas.get(area_code).map(|e| e.name.as_str())
    }

    /// Population of `area_code` within an inclusive age range.
    ///
    /// Only rows that carried an age contribute. Age [`OLDEST_AGE`] is the
    /// open-ended top bucket.
    pub fn age_band_total(&self, area_code: &str, ages: RangeInclusive<u8>) -> Option<u64> {
        let entry = self.areas.get(area_code)?;
        if entry.by_age.is_empty() {
            return None;
        }

        Some(
            entry
                .by_age
                .iter()
                .filter(|(age, _)| ages.contains(age))
                .map(|(_, n)| n)
                .sum(),
        )
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}
