//! Ranked tables of areas.
//!
//! Both orderings use a stable sort, so rows that compare equal keep
//! their input order and ranks are always `1..=n`.

use crate::indicators::types::{RankedRow, RankedTables, WeeklyTotal};
use std::cmp::Ordering;

/// Which value of a [`WeeklyTotal`] a table is ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankKey {
    Total,
    RatePer100k,
}

impl RankKey {
    pub fn value(self, row: &WeeklyTotal) -> Option<f64> {
        match self {
            RankKey::Total => Some(row.total_last_7),
            RankKey::RatePer100k => row.rate_per_100000,
        }
    }
}

/// Undefined values go last in either direction.
fn compare_values(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
            if descending { ord.reverse() } else { ord }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn assign_ranks(sorted: Vec<(&WeeklyTotal, Option<f64>)>) -> Vec<RankedRow> {
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, (row, value))| RankedRow {
            rank: i + 1,
            area_code: row.area_code.clone(),
            area_name: row.area_name.clone(),
            metric_value: value,
        })
        .collect()
}

/// Ranks rows by `key`, highest first when `descending`.
pub fn rank_by_value(rows: &[WeeklyTotal], key: RankKey, descending: bool) -> Vec<RankedRow> {
    let mut keyed: Vec<(&WeeklyTotal, Option<f64>)> = rows.iter().map(|r| (r, key.value(r))).collect();
    keyed.sort_by(|a, b| compare_values(a.1, b.1, descending));
    assign_ranks(keyed)
}

/// Ranks rows alphabetically by area name, carrying `key` as the shown value.
pub fn rank_by_name(rows: &[WeeklyTotal], key: RankKey) -> Vec<RankedRow> {
    let mut keyed: Vec<(&WeeklyTotal, Option<f64>)> = rows.iter().map(|r| (r, key.value(r))).collect();
    keyed.sort_by(|a, b| a.0.area_name.cmp(&b.0.area_name));
    assign_ranks(keyed)
}

/// Both council orderings from the same rows.
pub fn rank_tables(rows: &[WeeklyTotal], key: RankKey) -> RankedTables {
    RankedTables {
        by_value: rank_by_value(rows, key, true),
        by_name: rank_by_name(rows, key),
    }
}
