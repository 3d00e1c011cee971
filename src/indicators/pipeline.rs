//! The report flows built from the indicator components.

use crate::config::PipelineConfig;
use crate::indicators::anomaly::AnomalyCorrection;
use crate::indicators::rank::{RankKey, rank_tables};
use crate::indicators::rate::normalize;
use crate::indicators::rolling::RollingWindow;
use crate::indicators::types::{CouncilTables, RegionalSeries, VaccinationReport};
use crate::indicators::vaccination::{AgeBandDoses, age_band_coverage, daily_from_cumulative, overall_coverage};
use crate::indicators::weekly::weekly_totals;
use crate::population::AreaPopulationIndex;
use crate::records::{DailyAreaRecord, Metric, SmoothedAreaRecord, partition_by_area, since, sort_by_date};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Flags the last `n` rows of a series as provisional.
pub fn mark_provisional(series: &mut [SmoothedAreaRecord], n: usize) {
    let start = series.len().saturating_sub(n);
    for row in &mut series[start..] {
        row.provisional = true;
    }
}

/// Nationwide series: full-window averages only, trimmed to each metric's
/// first usable day, with the most recent days flagged as incomplete.
#[tracing::instrument(skip_all, fields(rows = records.len()))]
pub fn nationwide_series(mut records: Vec<DailyAreaRecord>, config: &PipelineConfig) -> Vec<SmoothedAreaRecord> {
    sort_by_date(&mut records);
    let window = RollingWindow::strict(config.window);

    let mut out = Vec::with_capacity(records.len());
    for ((_, metric), series) in partition_by_area(records) {
        let series = since(series, config.start_for(metric));
        let mut smoothed = window.smooth_series(series);
        mark_provisional(&mut smoothed, config.provisional_days);
        out.extend(smoothed);
    }

    info!(rows = out.len(), "Nationwide series smoothed");
    out
}

/// Regional series: anomaly-corrected, partially-windowed averages per
/// region, normalized per 100,000 people.
#[tracing::instrument(skip_all, fields(rows = records.len()))]
pub fn regional_series(
    mut records: Vec<DailyAreaRecord>,
    index: &AreaPopulationIndex,
    config: &PipelineConfig,
) -> RegionalSeries {
    sort_by_date(&mut records);

    let correction = AnomalyCorrection::new(config.anomaly_date, config.anomaly_metric, config.anomaly_neighbours);
    let (records, anomaly) = correction.correct_all(records);
    info!(corrected = anomaly.corrected, skipped = anomaly.skipped, "Anomaly correction applied");

    let smoothed = RollingWindow::partial(config.window).smooth_all(records);
    let (rows, population) = normalize(smoothed, index);

    if population.unmatched() > 0 {
        warn!(
            unmatched = population.unmatched(),
            areas = ?population.unmatched_areas,
            "Areas without population reference"
        );
    }

    RegionalSeries {
        rows,
        anomaly,
        population,
    }
}

/// Council tables: trailing-week totals of `metric` ranked by rate and by name.
#[tracing::instrument(skip_all, fields(rows = records.len(), metric = %metric))]
pub fn council_tables(
    mut records: Vec<DailyAreaRecord>,
    metric: Metric,
    index: &AreaPopulationIndex,
    config: &PipelineConfig,
) -> CouncilTables {
    sort_by_date(&mut records);

    let (totals, population) = weekly_totals(records, metric, config.trailing_rows, index);
    if population.unmatched() > 0 {
        warn!(unmatched = population.unmatched(), "Councils without population reference");
    }

    let ranked = rank_tables(&totals, RankKey::RatePer100k);
    info!(areas = totals.len(), "Council tables ranked");

    CouncilTables {
        metric,
        totals,
        ranked,
        population,
    }
}

/// Vaccination series: daily doses differenced from cumulative totals and
/// averaged over full windows, plus coverage overall and by age band.
///
/// When an area carries both a cumulative column and its daily
/// counterpart, the differenced series is kept.
#[tracing::instrument(skip_all, fields(rows = records.len(), bands = band_doses.len()))]
pub fn vaccination_series(
    mut records: Vec<DailyAreaRecord>,
    index: &AreaPopulationIndex,
    band_doses: &[AgeBandDoses],
    config: &PipelineConfig,
) -> VaccinationReport {
    sort_by_date(&mut records);
    let records: Vec<DailyAreaRecord> = records.into_iter().filter(|r| r.metric.is_vaccination()).collect();
    let records = since(records, config.vaccinations_start);

    let mut coverage = overall_coverage(&records, index);
    coverage.extend(age_band_coverage(&config.age_band_area, band_doses, index));

    let groups = partition_by_area(records);
    let derived: BTreeSet<_> = groups
        .keys()
        .filter_map(|(area, metric)| metric.daily_counterpart().map(|daily| (area.clone(), daily)))
        .collect();

    let window = RollingWindow::strict(config.window);
    let mut daily = Vec::new();
    for (key, series) in groups {
        if derived.contains(&key) {
            continue;
        }
        daily.extend(window.smooth_series(daily_from_cumulative(series)));
    }

    if coverage.iter().any(|c| c.population.is_none()) {
        warn!("Coverage rows without population reference");
    }
    info!(daily = daily.len(), coverage = coverage.len(), "Vaccination series complete");

    VaccinationReport { daily, coverage }
}
