//! Repair of a single known reporting discontinuity.
//!
//! A change in reporting method produced an artificial spike in cases by
//! publish date on 1st July 2020. Each area's value on that day is
//! replaced by the mean of the days either side of it. Blank neighbours
//! keep their position but do not count toward the mean.

use crate::indicators::types::AnomalyReport;
use crate::indicators::utility::defined_mean;
use crate::records::{DailyAreaRecord, Metric, is_date_sorted, partition_by_area};
use chrono::NaiveDate;
use tracing::debug;

/// Why an area's series was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The series does not contain the anomaly date.
    DateAbsent,
    /// Not enough rows on one side of the anomaly date.
    InsufficientNeighbours,
    /// Every neighbouring row is blank.
    UndefinedNeighbours,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnomalyOutcome {
    Corrected {
        index: usize,
        original: Option<f64>,
        replacement: f64,
    },
    Skipped(SkipReason),
}

/// A date-specific correction for one metric.
#[derive(Debug, Clone, Copy)]
pub struct AnomalyCorrection {
    pub date: NaiveDate,
    pub metric: Metric,
    /// Rows taken from each side of the anomaly.
    pub neighbours: usize,
}

impl AnomalyCorrection {
    pub fn new(date: NaiveDate, metric: Metric, neighbours: usize) -> Self {
        AnomalyCorrection {
            date,
            metric,
            neighbours,
        }
    }

    /// Corrects one area's date-sorted series in place.
    ///
    /// Only the value on the anomaly date can change. Series that do not
    /// span the date with enough rows on both sides are left as they are.
    pub fn correct(&self, series: &mut [DailyAreaRecord]) -> AnomalyOutcome {
        debug_assert!(is_date_sorted(series), "series must be sorted by date");

        let Some(index) = series
            .iter()
            .position(|r| r.metric == self.metric && r.date == self.date)
        else {
            return AnomalyOutcome::Skipped(SkipReason::DateAbsent);
        };

        if index < self.neighbours || index + self.neighbours >= series.len() {
            return AnomalyOutcome::Skipped(SkipReason::InsufficientNeighbours);
        }

        let surrounding: Vec<Option<f64>> = series[index - self.neighbours..index]
            .iter()
            .chain(&series[index + 1..=index + self.neighbours])
            .map(|r| r.value)
            .collect();

        let Some(replacement) = defined_mean(&surrounding) else {
            return AnomalyOutcome::Skipped(SkipReason::UndefinedNeighbours);
        };

        let original = series[index].value;
        series[index].value = Some(replacement);

        AnomalyOutcome::Corrected {
            index,
            original,
            replacement,
        }
    }

    /// Applies the correction independently to every area series of the
    /// target metric. Rows of other metrics pass through unchanged.
    pub fn correct_all(&self, records: Vec<DailyAreaRecord>) -> (Vec<DailyAreaRecord>, AnomalyReport) {
        let mut report = AnomalyReport::default();
        let mut out = Vec::with_capacity(records.len());

        for ((area, metric), mut series) in partition_by_area(records) {
            if metric == self.metric {
                match self.correct(&mut series) {
                    AnomalyOutcome::Corrected {
                        original,
                        replacement,
                        ..
                    } => {
                        debug!(area_code = %area.area_code, ?original, replacement, "Anomaly corrected");
                        report.corrected += 1;
                    }
                    AnomalyOutcome::Skipped(reason) => {
                        debug!(area_code = %area.area_code, ?reason, "Anomaly correction skipped");
                        report.skipped += 1;
                    }
                }
            }
            out.extend(series);
        }

        (out, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METRIC: Metric = Metric::CasesByPublishDate;

    fn anomaly_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 7, 1).unwrap()
    }

    fn correction() -> AnomalyCorrection {
        AnomalyCorrection::new(anomaly_date(), METRIC, 3)
    }

    /// Builds a daily series for one area whose `anomaly_at` row falls on
    /// the anomaly date.
    fn series(code: &str, values: &[f64], anomaly_at: usize) -> Vec<DailyAreaRecord> {
        let start = anomaly_date() - chrono::Duration::days(anomaly_at as i64);
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let date = start + chrono::Duration::days(i as i64);
                DailyAreaRecord::new(code, code, date, METRIC, *v)
            })
            .collect()
    }

    #[test]
    fn test_spike_replaced_by_neighbour_mean() {
        let mut s = series("E1", &[10.0, 10.0, 10.0, 100.0, 10.0, 10.0, 10.0], 3);
        let outcome = correction().correct(&mut s);

        assert_eq!(
            outcome,
            AnomalyOutcome::Corrected {
                index: 3,
                original: Some(100.0),
                replacement: 10.0
            }
        );
        assert_eq!(s[3].value, Some(10.0));
    }

    #[test]
    fn test_only_anomaly_row_changes() {
        let values = [1.0, 2.0, 3.0, 4.0, 500.0, 6.0, 7.0, 8.0, 9.0];
        let original = series("E1", &values, 4);
        let mut corrected = original.clone();
        correction().correct(&mut corrected);

        for (i, (before, after)) in original.iter().zip(&corrected).enumerate() {
            if i == 4 {
                assert_eq!(after.value, Some((2.0 + 3.0 + 4.0 + 6.0 + 7.0 + 8.0) / 6.0));
            } else {
                assert_eq!(before.value.map(f64::to_bits), after.value.map(f64::to_bits));
            }
        }
    }

    #[test]
    fn test_missing_date_is_a_no_op() {
        let start = anomaly_date() + chrono::Duration::days(10);
        let mut s: Vec<DailyAreaRecord> = (0..7)
            .map(|i| DailyAreaRecord::new("E1", "E1", start + chrono::Duration::days(i), METRIC, 5.0))
            .collect();
        let before = s.clone();

        assert_eq!(
            correction().correct(&mut s),
            AnomalyOutcome::Skipped(SkipReason::DateAbsent)
        );
        assert_eq!(s, before);
    }

    #[test]
    fn test_short_history_is_a_no_op() {
        let mut early = series("E1", &[10.0, 10.0, 100.0, 10.0, 10.0, 10.0], 2);
        assert_eq!(
            correction().correct(&mut early),
            AnomalyOutcome::Skipped(SkipReason::InsufficientNeighbours)
        );
        assert_eq!(early[2].value, Some(100.0));

        let mut late = series("E1", &[10.0, 10.0, 10.0, 100.0, 10.0, 10.0], 3);
        assert_eq!(
            correction().correct(&mut late),
            AnomalyOutcome::Skipped(SkipReason::InsufficientNeighbours)
        );
        assert_eq!(late[3].value, Some(100.0));
    }

    #[test]
    fn test_correct_all_is_per_area() {
        let mut records = series("E1", &[10.0, 10.0, 10.0, 100.0, 10.0, 10.0, 10.0], 3);
        records.extend(series("E2", &[0.0, 0.0, 0.0, 70.0, 0.0, 0.0, 0.0], 3));
        records.extend(series("E3", &[1.0, 50.0, 1.0], 1));

        let (corrected, report) = correction().correct_all(records);

        assert_eq!(report, AnomalyReport { corrected: 2, skipped: 1 });
        let on_date: Vec<(String, Option<f64>)> = corrected
            .iter()
            .filter(|r| r.date == anomaly_date())
            .map(|r| (r.area_code.clone(), r.value))
            .collect();
        assert_eq!(
            on_date,
            vec![("E1".into(), Some(10.0)), ("E2".into(), Some(0.0)), ("E3".into(), Some(50.0))]
        );
    }

    #[test]
    fn test_blank_neighbours_hold_their_place() {
        let mut s = series("E1", &[10.0, 10.0, 10.0, 100.0, 10.0, 10.0, 10.0, 40.0], 3);
        s[1].value = None;
        s[5].value = None;

        correction().correct(&mut s);

        // Neighbours stay rows 0..=2 and 4..=6; the 40 beyond them is not pulled in.
        assert_eq!(s[3].value, Some(10.0));
        assert_eq!(s[1].value, None);
    }

    #[test]
    fn test_blank_anomaly_value_is_filled() {
        let mut s = series("E1", &[4.0, 4.0, 4.0, 0.0, 8.0, 8.0, 8.0], 3);
        s[3].value = None;

        assert_eq!(
            correction().correct(&mut s),
            AnomalyOutcome::Corrected {
                index: 3,
                original: None,
                replacement: 6.0
            }
        );
    }

    #[test]
    fn test_all_blank_neighbours_is_a_no_op() {
        let mut s = series("E1", &[0.0, 0.0, 0.0, 100.0, 0.0, 0.0, 0.0], 3);
        for (i, r) in s.iter_mut().enumerate() {
            if i != 3 {
                r.value = None;
            }
        }

        assert_eq!(
            correction().correct(&mut s),
            AnomalyOutcome::Skipped(SkipReason::UndefinedNeighbours)
        );
        assert_eq!(s[3].value, Some(100.0));
    }

    #[test]
    fn test_other_metrics_untouched() {
        let mut records = series("E1", &[10.0, 10.0, 10.0, 100.0, 10.0, 10.0, 10.0], 3);
        for r in &mut records {
            r.metric = Metric::CasesBySpecimenDate;
        }
        let (out, report) = correction().correct_all(records.clone());

        assert_eq!(report, AnomalyReport::default());
        assert_eq!(out, records);
    }
}
