//! Vaccination indicators: daily doses derived from cumulative totals,
//! and the share of the population vaccinated overall and by age band.

use crate::indicators::rate::share_of_population;
use crate::population::{AreaPopulationIndex, OLDEST_AGE};
use crate::records::{DailyAreaRecord, Metric, is_date_sorted, partition_by_area};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Vaccination status counted by a coverage row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dose {
    /// At least one dose.
    #[serde(rename = "first", alias = "1+ Doses", alias = "1 Dose")]
    First,
    /// Both doses.
    #[serde(rename = "second", alias = "2 Doses")]
    Second,
}

impl Dose {
    fn from_metric(metric: Metric) -> Option<Dose> {
        match metric {
            Metric::CumFirstDoses => Some(Dose::First),
            Metric::CumSecondDoses => Some(Dose::Second),
            _ => None,
        }
    }
}

/// Age band used when vaccinations are reported by age.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeBand {
    pub label: &'static str,
    pub ages: RangeInclusive<u8>,
}

const fn band(label: &'static str, ages: RangeInclusive<u8>) -> AgeBand {
    AgeBand { label, ages }
}

/// Bands of the weekly vaccinations-by-age publication. The last band
/// runs through the open-ended 90+ bucket.
pub const VACCINATION_AGE_BANDS: [AgeBand; 12] = [
    band("Under 30", 0..=29),
    band("30-34", 30..=34),
    band("35-39", 35..=39),
    band("40-44", 40..=44),
    band("45-49", 45..=49),
    band("50-54", 50..=54),
    band("55-59", 55..=59),
    band("60-64", 60..=64),
    band("65-69", 65..=69),
    band("70-74", 70..=74),
    band("75-79", 75..=79),
    band("Over 80", 80..=OLDEST_AGE),
];

pub const ALL_AGES: &str = "All ages";

pub fn age_band(label: &str) -> Option<&'static AgeBand> {
    VACCINATION_AGE_BANDS.iter().find(|b| b.label == label.trim())
}

/// People vaccinated in one age band, as read from the by-age table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgeBandDoses {
    pub band: String,
    pub dose: Dose,
    pub vaccinations: f64,
}

/// Share of a population that has been vaccinated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageRow {
    pub area_code: String,
    pub area_name: String,
    /// [`ALL_AGES`] or an age band label.
    pub group: String,
    pub dose: Dose,
    pub vaccinated: Option<f64>,
    pub population: Option<u64>,
    pub percent: Option<f64>,
}

/// Day-on-day differences of a cumulative series, relabelled with the
/// daily metric. The first row, and any row next to a blank, is undefined.
///
/// Series of non-cumulative metrics are returned unchanged.
pub fn daily_from_cumulative(series: Vec<DailyAreaRecord>) -> Vec<DailyAreaRecord> {
    debug_assert!(is_date_sorted(&series), "series must be sorted by date");

    let mut previous: Option<f64> = None;
    series
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            let Some(daily) = record.metric.daily_counterpart() else {
                return record;
            };

            let value = match (i, previous, record.value) {
                (0, _, _) => None,
                (_, Some(prev), Some(cur)) => Some(cur - prev),
                _ => None,
            };
            previous = record.value;

            DailyAreaRecord {
                metric: daily,
                value,
                ..record
            }
        })
        .collect()
}

/// Latest cumulative total of each area as a share of its population.
pub fn overall_coverage(records: &[DailyAreaRecord], index: &AreaPopulationIndex) -> Vec<CoverageRow> {
    let cumulative: Vec<DailyAreaRecord> = records
        .iter()
        .filter(|r| r.metric.daily_counterpart().is_some())
        .cloned()
        .collect();

    partition_by_area(cumulative)
        .into_iter()
        .filter_map(|((area, metric), series)| {
            let dose = Dose::from_metric(metric)?;
            let vaccinated = series.iter().filter_map(|r| r.value).reduce(f64::max);
            let population = index.lookup(&area.area_code);

            Some(CoverageRow {
                area_code: area.area_code,
                area_name: area.area_name,
                group: ALL_AGES.to_string(),
                dose,
                vaccinated,
                population,
                percent: vaccinated.and_then(|v| share_of_population(v, population)),
            })
        })
        .collect()
}

/// Vaccinations by age band as a share of each band's population in
/// `area_code`. Unknown band labels get an undefined population.
pub fn age_band_coverage(
    area_code: &str,
    doses: &[AgeBandDoses],
    index: &AreaPopulationIndex,
) -> Vec<CoverageRow> {
    let area_name = index.name(area_code).unwrap_or_default().to_string();

    doses
        .iter()
        .map(|row| {
            let population = age_band(&row.band).and_then(|b| index.age_band_total(area_code, b.ages.clone()));

            CoverageRow {
                area_code: area_code.to_string(),
                area_name: area_name.clone(),
                group: row.band.trim().to_string(),
                dose: row.dose,
                vaccinated: Some(row.vaccinations),
                population,
                percent: share_of_population(row.vaccinations, population),
            }
        })
        .collect()
}
