//! CSV ingestion of daily dashboard downloads and population tables.
//!
//! Files are read from local paths; retrieving them is done elsewhere.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use tracing::debug;

use crate::indicators::vaccination::AgeBandDoses;
use crate::population::{OLDEST_AGE, PopulationRow};
use crate::records::{DailyAreaRecord, Metric};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| names.contains(&h.trim()))
}

fn required_column(headers: &StringRecord, names: &[&str]) -> Result<usize> {
    column(headers, names).ok_or_else(|| anyhow!("missing column {}", names.join(" / ")))
}

fn cell(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).map(str::trim).unwrap_or("")
}

/// Parses an age header or cell; "90+" is the open-ended top bucket.
pub fn parse_age(s: &str) -> Option<u8> {
    let s = s.trim();
    if s == "90+" {
        return Some(OLDEST_AGE);
    }
    s.parse::<u8>().ok().filter(|age| *age <= OLDEST_AGE)
}

fn parse_count(s: &str) -> Result<u64> {
    let cleaned = s.replace(',', "");
    cleaned
        .parse::<u64>()
        .or_else(|_| cleaned.parse::<f64>().map(|v| v.round() as u64))
        .with_context(|| format!("invalid population {s:?}"))
}

/// Reads a dashboard CSV (`areaCode, areaName, date, <metric columns>`)
/// into one record per area, day and recognized metric column.
///
/// Blank metric cells produce a record with no value, so every area keeps
/// one row per day for each metric column.
pub fn read_daily_records<R: Read>(reader: R) -> Result<Vec<DailyAreaRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();

    let code_idx = required_column(&headers, &["areaCode", "area_code"])?;
    let name_idx = required_column(&headers, &["areaName", "area_name"])?;
    let date_idx = required_column(&headers, &["date"])?;

    let metrics: Vec<(usize, Metric)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| Metric::from_column(h.trim()).map(|m| (i, m)))
        .collect();

    if metrics.is_empty() {
        return Err(anyhow!("no metric columns found"));
    }

    let mut rows = Vec::new();
    let mut blank = 0usize;

    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        let row = line + 2;

        let date = NaiveDate::parse_from_str(cell(&record, date_idx), DATE_FORMAT)
            .with_context(|| format!("row {row}: invalid date"))?;

        for (idx, metric) in &metrics {
            let raw = cell(&record, *idx);
            let value: Option<f64> = if raw.is_empty() {
                blank += 1;
                None
            } else {
                Some(
                    raw.parse()
                        .with_context(|| format!("row {row}: invalid {metric} value {raw:?}"))?,
                )
            };

            rows.push(DailyAreaRecord::new(
                cell(&record, code_idx),
                cell(&record, name_idx),
                date,
                *metric,
                value,
            ));
        }
    }

    debug!(records = rows.len(), blank, "Daily records read");
    Ok(rows)
}

/// Reads a population table.
///
/// Either a long table with a `population` column (and optionally `age`),
/// or the wide layout with one column per single year of age
/// (`0` to `89` and `90+`); other columns are ignored.
pub fn read_population_rows<R: Read>(reader: R) -> Result<Vec<PopulationRow>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();

    let code_idx = required_column(&headers, &["Code", "area_code", "areaCode"])?;
    let name_idx = required_column(&headers, &["Name", "area_name", "areaName"])?;
    let population_idx = column(&headers, &["population", "Population"]);
    let age_idx = column(&headers, &["age", "Age"]);

    let age_columns: Vec<(usize, u8)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| parse_age(h).map(|age| (i, age)))
        .collect();

    if population_idx.is_none() && age_columns.is_empty() {
        return Err(anyhow!("population table has neither a population column nor age columns"));
    }

    let mut rows = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        let row = line + 2;
        let code = cell(&record, code_idx);
        let name = cell(&record, name_idx);

        if let Some(idx) = population_idx {
            let age = age_idx.and_then(|i| parse_age(cell(&record, i)));
            let population = parse_count(cell(&record, idx)).with_context(|| format!("row {row}"))?;
            rows.push(PopulationRow::new(code, name, age, population));
            continue;
        }

        for (idx, age) in &age_columns {
            let raw = cell(&record, *idx);
            if raw.is_empty() {
                continue;
            }
            let population = parse_count(raw).with_context(|| format!("row {row}, age {age}"))?;
            rows.push(PopulationRow::new(code, name, Some(*age), population));
        }
    }

    debug!(rows = rows.len(), "Population rows read");
    Ok(rows)
}

/// Reads vaccinations by age band (`band, dose, vaccinations`).
pub fn read_age_band_doses<R: Read>(reader: R) -> Result<Vec<AgeBandDoses>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();

    for (line, result) in rdr.deserialize().enumerate() {
        let record: AgeBandDoses = result.with_context(|| format!("row {}", line + 2))?;
        rows.push(record);
    }

    debug!(rows = rows.len(), "Age band doses read");
    Ok(rows)
}

/// Reads a dashboard CSV from `path`.
pub fn load_daily_records(path: &str) -> Result<Vec<DailyAreaRecord>> {
    let file = File::open(path).with_context(|| format!("opening {path}"))?;
    read_daily_records(file).with_context(|| format!("reading {path}"))
}

/// Reads vaccinations by age band from `path`.
pub fn load_age_band_doses(path: &str) -> Result<Vec<AgeBandDoses>> {
    let file = File::open(path).with_context(|| format!("opening {path}"))?;
    read_age_band_doses(file).with_context(|| format!("reading {path}"))
}

/// Reads a population table from `path`.
pub fn load_population_rows(path: &str) -> Result<Vec<PopulationRow>> {
    let file = File::open(path).with_context(|| format!("opening {path}"))?;
    read_population_rows(file).with_context(|| format!("reading {path}"))
}
