//! Epidemiological indicator calculations.
//!
//! Raw per-area daily counts flow through anomaly correction, rolling
//! averages and population normalization; council tables are built from
//! trailing-week totals and ranked two ways. Vaccination series are
//! differenced from cumulative totals and reported as population coverage.

pub mod anomaly;
pub mod pipeline;
pub mod rank;
pub mod rate;
pub mod rolling;
pub mod types;
pub mod utility;
pub mod vaccination;
pub mod weekly;
