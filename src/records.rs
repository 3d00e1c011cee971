//! Per-area daily records and the partitioning helpers used by every
//! grouped transform.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A tracked daily metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    CasesBySpecimenDate,
    CasesByPublishDate,
    Deaths28DaysByDeathDate,
    HospitalAdmissions,
    FirstDoses,
    SecondDoses,
    CumFirstDoses,
    CumSecondDoses,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::CasesBySpecimenDate,
        Metric::CasesByPublishDate,
        Metric::Deaths28DaysByDeathDate,
        Metric::HospitalAdmissions,
        Metric::FirstDoses,
        Metric::SecondDoses,
        Metric::CumFirstDoses,
        Metric::CumSecondDoses,
    ];

    /// Column name used by the dashboard CSV downloads.
    pub fn column(self) -> &'static str {
        match self {
            Metric::CasesBySpecimenDate => "newCasesBySpecimenDate",
            Metric::CasesByPublishDate => "newCasesByPublishDate",
            Metric::Deaths28DaysByDeathDate => "newDeaths28DaysByDeathDate",
            Metric::HospitalAdmissions => "newAdmissions",
            Metric::FirstDoses => "newPeopleVaccinatedFirstDoseByPublishDate",
            Metric::SecondDoses => "newPeopleVaccinatedSecondDoseByPublishDate",
            Metric::CumFirstDoses => "cumPeopleVaccinatedFirstDoseByPublishDate",
            Metric::CumSecondDoses => "cumPeopleVaccinatedSecondDoseByPublishDate",
        }
    }

    /// The daily metric a cumulative metric differences into.
    pub fn daily_counterpart(self) -> Option<Metric> {
        match self {
            Metric::CumFirstDoses => Some(Metric::FirstDoses),
            Metric::CumSecondDoses => Some(Metric::SecondDoses),
            _ => None,
        }
    }

    pub fn is_vaccination(self) -> bool {
        matches!(
            self,
            Metric::FirstDoses | Metric::SecondDoses | Metric::CumFirstDoses | Metric::CumSecondDoses
        )
    }

    pub fn from_column(column: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.column() == column)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// One row per area per day per metric.
///
/// A blank source cell is kept as a row with no value: it still holds its
/// place in every positional window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAreaRecord {
    pub area_code: String,
    pub area_name: String,
    pub date: NaiveDate,
    pub metric: Metric,
    pub value: Option<f64>,
}

impl DailyAreaRecord {
    pub fn new(
        area_code: &str,
        area_name: &str,
        date: NaiveDate,
        metric: Metric,
        value: impl Into<Option<f64>>,
    ) -> Self {
        DailyAreaRecord {
            area_code: area_code.to_string(),
            area_name: area_name.to_string(),
            date,
            metric,
            value: value.into(),
        }
    }

    pub fn area_key(&self) -> AreaKey {
        AreaKey {
            area_code: self.area_code.clone(),
            area_name: self.area_name.clone(),
        }
    }
}

/// A daily record with its smoothed value and, once normalized, its
/// per-100,000 rate. `None` means undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmoothedAreaRecord {
    pub area_code: String,
    pub area_name: String,
    pub date: NaiveDate,
    pub metric: Metric,
    pub value: Option<f64>,
    pub avg_7day: Option<f64>,
    pub rate_per_100k: Option<f64>,
    /// Recent rows whose counts are still being revised.
    pub provisional: bool,
}

impl SmoothedAreaRecord {
    pub fn from_record(record: DailyAreaRecord, avg_7day: Option<f64>) -> Self {
        SmoothedAreaRecord {
            area_code: record.area_code,
            area_name: record.area_name,
            date: record.date,
            metric: record.metric,
            value: record.value,
            avg_7day,
            rate_per_100k: None,
            provisional: false,
        }
    }
}

/// Identity of an area; the grouping key for per-area transforms.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AreaKey {
    pub area_code: String,
    pub area_name: String,
}

/// Key of a single ordered series: one area, one metric.
pub type SeriesKey = (AreaKey, Metric);

/// Splits a flat record set into independent per-area, per-metric series.
///
/// Rows keep their input order inside each group, so a date-sorted input
/// yields date-sorted groups.
pub fn partition_by_area(records: Vec<DailyAreaRecord>) -> BTreeMap<SeriesKey, Vec<DailyAreaRecord>> {
    let mut groups: BTreeMap<SeriesKey, Vec<DailyAreaRecord>> = BTreeMap::new();

    for record in records {
        groups
            .entry((record.area_key(), record.metric))
            .or_default()
            .push(record);
    }

    groups
}

/// Stable sort by date, the precondition of every windowed transform.
pub fn sort_by_date(records: &mut [DailyAreaRecord]) {
    records.sort_by_key(|r| r.date);
}

/// Drops rows dated before `start`.
pub fn since(records: Vec<DailyAreaRecord>, start: NaiveDate) -> Vec<DailyAreaRecord> {
    records.into_iter().filter(|r| r.date >= start).collect()
}

pub(crate) fn is_date_sorted(records: &[DailyAreaRecord]) -> bool {
    records.windows(2).all(|w| w[0].date < w[1].date)
}
