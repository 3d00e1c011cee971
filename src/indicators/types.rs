//! Result tables handed to the rendering side.

use crate::indicators::vaccination::CoverageRow;
use crate::records::{Metric, SmoothedAreaRecord};
use serde::Serialize;

/// Sum of the most recent rows of one area, with its population rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyTotal {
    pub area_code: String,
    pub area_name: String,
    pub metric: Metric,
    pub total_last_7: f64,
    /// How many rows went into the total (fewer than the window for short series).
    pub rows_summed: usize,
    pub population: Option<u64>,
    pub rate_per_100000: Option<f64>,
}

/// A row of a ranked table. Ranks are 1-based with no gaps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    pub rank: usize,
    pub area_code: String,
    pub area_name: String,
    pub metric_value: Option<f64>,
}

/// The two orderings shown for council tables.
#[derive(Debug, Clone, Serialize)]
pub struct RankedTables {
    pub by_value: Vec<RankedRow>,
    pub by_name: Vec<RankedRow>,
}

/// Outcome of the per-area anomaly pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnomalyReport {
    pub corrected: usize,
    pub skipped: usize,
}

/// Areas whose population could not be found during normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizeReport {
    pub unmatched_areas: Vec<String>,
}

impl NormalizeReport {
    pub fn unmatched(&self) -> usize {
        self.unmatched_areas.len()
    }
}

/// Smoothed regional series plus the data-quality signals collected on the way.
#[derive(Debug, Clone, Serialize)]
pub struct RegionalSeries {
    pub rows: Vec<SmoothedAreaRecord>,
    pub anomaly: AnomalyReport,
    pub population: NormalizeReport,
}

/// Weekly council totals and both rankings of them.
#[derive(Debug, Clone, Serialize)]
pub struct CouncilTables {
    pub metric: Metric,
    pub totals: Vec<WeeklyTotal>,
    pub ranked: RankedTables,
    pub population: NormalizeReport,
}

/// Smoothed daily doses and the population coverage tables.
#[derive(Debug, Clone, Serialize)]
pub struct VaccinationReport {
    pub daily: Vec<SmoothedAreaRecord>,
    pub coverage: Vec<CoverageRow>,
}
