//! Pipeline settings loaded from an optional JSON file.

use crate::records::Metric;
use anyhow::{Context, Result, ensure};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Tunable constants of the indicator pipeline.
///
/// Stored as a JSON object on disk; every key is optional:
/// ```json
/// {
///   "window": 7,
///   "anomaly_date": "2020-07-01",
///   "anomaly_metric": "cases_by_publish_date",
///   "provisional_days": 5
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rows in each rolling-average window.
    pub window: usize,
    pub anomaly_date: NaiveDate,
    pub anomaly_metric: Metric,
    /// Rows averaged on each side of the anomaly date.
    pub anomaly_neighbours: usize,
    /// Rows summed for council trailing-week totals.
    pub trailing_rows: usize,
    /// Most recent nationwide rows flagged as incomplete.
    pub provisional_days: usize,
    /// First day of usable nationwide case data.
    pub cases_start: NaiveDate,
    /// First day of daily vaccination data.
    pub vaccinations_start: NaiveDate,
    /// Area whose population by age backs the vaccinations-by-age table.
    pub age_band_area: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            window: 7,
            anomaly_date: date(2020, 7, 1),
            anomaly_metric: Metric::CasesByPublishDate,
            anomaly_neighbours: 3,
            trailing_rows: 7,
            provisional_days: 5,
            cases_start: date(2020, 1, 28),
            vaccinations_start: date(2021, 1, 10),
            age_band_area: "E92000001".to_string(),
        }
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

impl PipelineConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
        Self::from_json(&content).with_context(|| format!("parsing config {path}"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.window > 0, "window must be at least 1");
        ensure!(self.trailing_rows > 0, "trailing_rows must be at least 1");
        ensure!(self.anomaly_neighbours > 0, "anomaly_neighbours must be at least 1");
        Ok(())
    }

    /// Start date applied to a nationwide series of `metric`.
    pub fn start_for(&self, metric: Metric) -> NaiveDate {
        if metric.is_vaccination() {
            self.vaccinations_start
        } else {
            self.cases_start
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.window, 7);
        assert_eq!(config.anomaly_date, NaiveDate::from_ymd_opt(2020, 7, 1).unwrap());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = PipelineConfig::from_json(r#"{"window": 14, "anomaly_metric": "cases_by_specimen_date"}"#).unwrap();
        assert_eq!(config.window, 14);
        assert_eq!(config.anomaly_metric, Metric::CasesBySpecimenDate);
        assert_eq!(config.trailing_rows, 7);
        assert_eq!(config.age_band_area, "E92000001");
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(PipelineConfig::from_json(r#"{"window": 0}"#).is_err());
    }

    #[test]
    fn test_start_for() {
        let config = PipelineConfig::default();
        assert_eq!(config.start_for(Metric::SecondDoses), config.vaccinations_start);
        assert_eq!(config.start_for(Metric::CumFirstDoses), config.vaccinations_start);
        assert_eq!(config.start_for(Metric::HospitalAdmissions), config.cases_start);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(PipelineConfig::load("/nonexistent/pipeline.json").is_err());
    }
}
