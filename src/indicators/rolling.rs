//! Trailing rolling means over per-area series.
//!
//! Windows are positional: a blank row occupies its slot but only
//! defined values are averaged and counted toward `min_periods`.

use crate::indicators::utility::defined_mean;
use crate::records::{DailyAreaRecord, SmoothedAreaRecord, is_date_sorted, partition_by_area};

/// A trailing window of `size` rows that produces a value once at least
/// `min_periods` defined values fall inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingWindow {
    size: usize,
    min_periods: usize,
}

impl RollingWindow {
    pub fn new(size: usize, min_periods: usize) -> Self {
        let size = size.max(1);
        RollingWindow {
            size,
            min_periods: min_periods.clamp(1, size),
        }
    }

    /// Only full windows produce a value; the first `size - 1` outputs are undefined.
    pub fn strict(size: usize) -> Self {
        Self::new(size, size)
    }

    /// Every position produces a value from however many defined rows are available.
    pub fn partial(size: usize) -> Self {
        Self::new(size, 1)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn min_periods(&self) -> usize {
        self.min_periods
    }

    /// Rolling mean of `values`, one output per input.
    pub fn smooth(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        (0..values.len())
            .map(|i| {
                let start = (i + 1).saturating_sub(self.size);
                let window = &values[start..=i];
                if window.iter().flatten().count() < self.min_periods {
                    None
                } else {
                    defined_mean(window)
                }
            })
            .collect()
    }

    /// Smooths a single date-sorted area series. The series is not re-sorted.
    pub fn smooth_series(&self, series: Vec<DailyAreaRecord>) -> Vec<SmoothedAreaRecord> {
        debug_assert!(is_date_sorted(&series), "series must be sorted by date");

        let values: Vec<Option<f64>> = series.iter().map(|r| r.value).collect();
        series
            .into_iter()
            .zip(self.smooth(&values))
            .map(|(record, avg)| SmoothedAreaRecord::from_record(record, avg))
            .collect()
    }

    /// Smooths every area and metric independently; windows never cross
    /// a group boundary.
    pub fn smooth_all(&self, records: Vec<DailyAreaRecord>) -> Vec<SmoothedAreaRecord> {
        partition_by_area(records)
            .into_values()
            .flat_map(|series| self.smooth_series(series))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Metric;
    use chrono::NaiveDate;

    fn area(code: &str, values: &[f64]) -> Vec<DailyAreaRecord> {
        let start = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                DailyAreaRecord::new(
                    code,
                    code,
                    start + chrono::Duration::days(i as i64),
                    Metric::Deaths28DaysByDeathDate,
                    *v,
                )
            })
            .collect()
    }

    fn defined(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_partial_window_defined_from_first_day() {
        assert_eq!(
            RollingWindow::partial(7).smooth(&defined(&[7.0, 7.0, 7.0])),
            vec![Some(7.0), Some(7.0), Some(7.0)]
        );
    }

    #[test]
    fn test_strict_window_short_series_undefined() {
        assert_eq!(RollingWindow::strict(7).smooth(&defined(&[7.0, 7.0, 7.0])), vec![None, None, None]);
    }

    #[test]
    fn test_strict_window_fills_after_size_rows() {
        let values: Vec<f64> = (1..=8).map(f64::from).collect();
        let out = RollingWindow::strict(7).smooth(&defined(&values));

        assert!(out[..6].iter().all(Option::is_none));
        assert_eq!(out[6], Some(4.0));
        assert_eq!(out[7], Some(5.0));
    }

    #[test]
    fn test_partial_window_uses_available_rows() {
        let out = RollingWindow::partial(3).smooth(&defined(&[3.0, 6.0, 9.0, 12.0]));
        assert_eq!(out, vec![Some(3.0), Some(4.5), Some(6.0), Some(9.0)]);
    }

    #[test]
    fn test_blank_keeps_its_slot() {
        let values = [Some(100.0), None, Some(1.0), Some(1.0), Some(1.0)];

        let partial = RollingWindow::partial(3).smooth(&values);
        assert_eq!(partial, vec![Some(100.0), Some(100.0), Some(50.5), Some(1.0), Some(1.0)]);

        let strict = RollingWindow::strict(3).smooth(&values);
        assert_eq!(strict, vec![None, None, None, None, Some(1.0)]);
    }

    #[test]
    fn test_leading_blanks_undefined_even_when_partial() {
        let out = RollingWindow::partial(7).smooth(&[None, None, Some(4.0)]);
        assert_eq!(out, vec![None, None, Some(4.0)]);
    }

    #[test]
    fn test_min_periods_clamped() {
        let w = RollingWindow::new(7, 20);
        assert_eq!(w.min_periods(), 7);
        let w = RollingWindow::new(0, 0);
        assert_eq!((w.size(), w.min_periods()), (1, 1));
    }

    #[test]
    fn test_empty_series() {
        assert!(RollingWindow::partial(7).smooth(&[]).is_empty());
    }

    #[test]
    fn test_groups_never_blend() {
        let mut records = area("A", &[10.0; 7]);
        records.extend(area("B", &[0.0; 7]));

        let out = RollingWindow::partial(7).smooth_all(records);
        assert_eq!(out.len(), 14);

        for row in &out {
            let expected = if row.area_code == "A" { 10.0 } else { 0.0 };
            assert_eq!(row.avg_7day, Some(expected));
        }
    }

    #[test]
    fn test_smooth_series_keeps_raw_values() {
        let out = RollingWindow::strict(2).smooth_series(area("A", &[1.0, 3.0]));
        assert_eq!(out[0].value, Some(1.0));
        assert_eq!(out[0].avg_7day, None);
        assert_eq!(out[1].avg_7day, Some(2.0));
        assert_eq!(out[1].rate_per_100k, None);
    }
}
