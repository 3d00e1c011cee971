//! Serialization of result tables for the rendering side.
//!
//! Undefined values are written as empty CSV cells and JSON `null`.
//! No rounding is applied.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use tracing::{debug, info};

/// Writes `rows` as a CSV table with a header row to any writer.
pub fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes `rows` to a CSV file at `path`, replacing any existing file.
pub fn write_table<T: Serialize>(path: &str, rows: &[T]) -> Result<()> {
    debug!(path, rows = rows.len(), "Writing CSV table");

    let file = File::create(path).with_context(|| format!("creating {path}"))?;
    write_rows(file, rows).with_context(|| format!("writing {path}"))?;

    info!(path, rows = rows.len(), "Table written");
    Ok(())
}

/// Pretty-printed JSON of any result.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Logs a result as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", to_json(value)?);
    Ok(())
}
