//! Trailing-week totals per area.
//!
//! The window counts rows, not calendar days: an area with gaps in its
//! reporting sums its last seven reported days, however far back they go.
//! Blank rows do take a slot; they just add nothing to the total.

use crate::indicators::rate::rate_per_100k;
use crate::indicators::types::{NormalizeReport, WeeklyTotal};
use crate::indicators::utility::defined_sum;
use crate::population::AreaPopulationIndex;
use crate::records::{DailyAreaRecord, Metric, is_date_sorted, partition_by_area};
use std::collections::BTreeSet;

/// Sum of the last `rows` rows of a date-sorted series, and how many
/// rows it covered. Shorter series are summed whole.
pub fn trailing_sum(series: &[DailyAreaRecord], rows: usize) -> (f64, usize) {
    debug_assert!(is_date_sorted(series), "series must be sorted by date");

    let tail = &series[series.len().saturating_sub(rows)..];
    let values: Vec<Option<f64>> = tail.iter().map(|r| r.value).collect();
    (defined_sum(&values), tail.len())
}

/// Trailing totals of `metric` for every area, joined with population.
pub fn weekly_totals(
    records: Vec<DailyAreaRecord>,
    metric: Metric,
    rows: usize,
    index: &AreaPopulationIndex,
) -> (Vec<WeeklyTotal>, NormalizeReport) {
    let mut unmatched = BTreeSet::new();
    let mut totals = Vec::new();

    let groups = partition_by_area(records.into_iter().filter(|r| r.metric == metric).collect());

    for ((area, _), series) in groups {
        let (total, rows_summed) = trailing_sum(&series, rows);
        let population = index.lookup(&area.area_code);
        if population.is_none() {
            unmatched.insert(area.area_code.clone());
        }

        totals.push(WeeklyTotal {
            area_code: area.area_code,
            area_name: area.area_name,
            metric,
            total_last_7: total,
            rows_summed,
            population,
            rate_per_100000: rate_per_100k(total, population),
        });
    }

    (
        totals,
        NormalizeReport {
            unmatched_areas: unmatched.into_iter().collect(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::population::PopulationRow;
    use chrono::NaiveDate;

    const METRIC: Metric = Metric::CasesByPublishDate;

    fn area(code: &str, values: &[f64]) -> Vec<DailyAreaRecord> {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| DailyAreaRecord::new(code, code, start + chrono::Duration::days(i as i64), METRIC, *v))
            .collect()
    }

    #[test]
    fn test_short_series_sums_everything() {
        assert_eq!(trailing_sum(&area("E1", &[5.0, 5.0, 5.0]), 7), (15.0, 3));
    }

    #[test]
    fn test_only_last_rows_counted() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_eq!(trailing_sum(&area("E1", &values), 7), (49.0, 7));
    }

    #[test]
    fn test_gaps_reach_further_back() {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let series: Vec<DailyAreaRecord> = (0..7)
            .map(|i| DailyAreaRecord::new("E1", "E1", start + chrono::Duration::days(i * 3), METRIC, 1.0))
            .collect();
        assert_eq!(trailing_sum(&series, 7), (7.0, 7));
    }

    #[test]
    fn test_blank_last_day_counts_as_a_row() {
        let mut series = area("E1", &[100.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0]);
        series[7].value = None;

        assert_eq!(trailing_sum(&series, 7), (6.0, 7));
    }

    #[test]
    fn test_all_blank_week_sums_to_zero() {
        let mut series = area("E1", &[3.0, 3.0]);
        for r in &mut series {
            r.value = None;
        }
        assert_eq!(trailing_sum(&series, 7), (0.0, 2));
    }

    #[test]
    fn test_weekly_totals_join_population() {
        let index = AreaPopulationIndex::build(&[PopulationRow::new("E1", "E1", None, 300_000)]);
        let mut records = area("E1", &[5.0, 5.0, 5.0]);
        records.extend(area("E2", &[1.0; 9]));
        records.push(DailyAreaRecord::new(
            "E1",
            "E1",
            NaiveDate::from_ymd_opt(2021, 1, 9).unwrap(),
            Metric::Deaths28DaysByDeathDate,
            100.0,
        ));

        let (totals, report) = weekly_totals(records, METRIC, 7, &index);

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].total_last_7, 15.0);
        assert_eq!(totals[0].population, Some(300_000));
        assert_eq!(totals[0].rate_per_100000, Some(5.0));
        assert_eq!(totals[1].total_last_7, 7.0);
        assert_eq!(totals[1].rate_per_100000, None);
        assert_eq!(report.unmatched_areas, vec!["E2".to_string()]);
    }
}
