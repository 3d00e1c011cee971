//! CLI entry point for the COVID indicator pipeline.
//!
//! Reads already-downloaded dashboard CSVs and a population table, and
//! writes smoothed series, vaccination coverage and ranked council tables
//! as CSV.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use covid_indicators::config::PipelineConfig;
use covid_indicators::indicators::pipeline::{
    council_tables, nationwide_series, regional_series, vaccination_series,
};
use covid_indicators::output::{print_json, write_table};
use covid_indicators::parser::{load_age_band_doses, load_daily_records, load_population_rows};
use covid_indicators::population::AreaPopulationIndex;
use covid_indicators::records::Metric;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "covid_indicators")]
#[command(about = "Rolling averages, population rates and council rankings from COVID dashboard data", long_about = None)]
struct Cli {
    /// JSON file overriding pipeline defaults
    #[arg(long, global = true)]
    config: Option<String>,

    /// Also log results as JSON
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// JSON log file; rotated daily
    #[arg(long, global = true, env = "LOG_FILE_PATH", default_value = "logs/covid_indicators.log")]
    log_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Strict 7-day averages for a nationwide (overview) series
    Nationwide {
        /// Dashboard CSV for the overview area
        #[arg(short, long)]
        input: String,

        /// CSV file to write the smoothed series to
        #[arg(short, long, default_value = "nationwide.csv")]
        output: String,

        /// Drop rows before this date (YYYY-MM-DD) for every metric
        #[arg(long)]
        since: Option<NaiveDate>,
    },
    /// Anomaly-corrected regional averages with rates per 100,000
    Regional {
        /// Dashboard CSV with one series per region
        #[arg(short, long)]
        input: String,

        /// Population table (long or single-year-of-age layout)
        #[arg(short, long)]
        population: String,

        /// CSV file to write the regional series to
        #[arg(short, long, default_value = "regional.csv")]
        output: String,
    },
    /// Daily doses from cumulative totals and percent of population vaccinated
    Vaccinations {
        /// Dashboard CSV with cumulative first/second dose columns
        #[arg(short, long)]
        input: String,

        /// Population table (single-year-of-age layout for age bands)
        #[arg(short, long)]
        population: String,

        /// Optional vaccinations-by-age table (band, dose, vaccinations)
        #[arg(short, long)]
        age_bands: Option<String>,

        /// CSV file to write the daily dose series to
        #[arg(short, long, default_value = "vaccinations.csv")]
        output: String,

        /// CSV file to write the coverage table to
        #[arg(short, long, default_value = "vaccination_coverage.csv")]
        coverage_output: String,
    },
    /// Past-week council totals ranked by rate and by name
    Council {
        /// Dashboard CSV with one series per council
        #[arg(short, long)]
        input: String,

        /// Population table (long or single-year-of-age layout)
        #[arg(short, long)]
        population: String,

        /// Metric column to total, e.g. newCasesByPublishDate
        #[arg(short, long, default_value = "newCasesByPublishDate")]
        metric: String,

        /// Directory to write the ranked tables to
        #[arg(short = 'd', long, default_value = "tables")]
        output_dir: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let cli = Cli::parse();
    let _log_guard = init_logging(&cli.log_file)?;

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Nationwide {
            input,
            output,
            since,
        } => {
            let mut config = config;
            if let Some(start) = since {
                config.cases_start = start;
                config.vaccinations_start = start;
            }

            let records = load_daily_records(&input)?;
            let rows = nationwide_series(records, &config);

            write_table(&output, &rows)?;
            if cli.json {
                print_json(&rows)?;
            }
        }
        Commands::Regional {
            input,
            population,
            output,
        } => {
            let index = load_index(&population)?;
            let records = load_daily_records(&input)?;
            let series = regional_series(records, &index, &config);

            info!(
                rows = series.rows.len(),
                anomalies_corrected = series.anomaly.corrected,
                anomalies_skipped = series.anomaly.skipped,
                unmatched_areas = series.population.unmatched(),
                "Regional series complete"
            );

            write_table(&output, &series.rows)?;
            if cli.json {
                print_json(&series)?;
            }
        }
        Commands::Vaccinations {
            input,
            population,
            age_bands,
            output,
            coverage_output,
        } => {
            let index = load_index(&population)?;
            let records = load_daily_records(&input)?;
            let band_doses = match &age_bands {
                Some(path) => load_age_band_doses(path)?,
                None => Vec::new(),
            };
            let report = vaccination_series(records, &index, &band_doses, &config);

            write_table(&output, &report.daily)?;
            write_table(&coverage_output, &report.coverage)?;
            if cli.json {
                print_json(&report)?;
            }
        }
        Commands::Council {
            input,
            population,
            metric,
            output_dir,
        } => {
            let metric = Metric::from_column(&metric).ok_or_else(|| anyhow!("unknown metric column {metric}"))?;
            let index = load_index(&population)?;
            let records = load_daily_records(&input)?;
            let tables = council_tables(records, metric, &index, &config);

            std::fs::create_dir_all(&output_dir).with_context(|| format!("creating {output_dir}"))?;
            write_table(&format!("{}/{}_totals.csv", output_dir, metric), &tables.totals)?;
            write_table(&format!("{}/{}_by_rate.csv", output_dir, metric), &tables.ranked.by_value)?;
            write_table(&format!("{}/{}_by_name.csv", output_dir, metric), &tables.ranked.by_name)?;

            if cli.json {
                print_json(&tables)?;
            }
        }
    }

    Ok(())
}

/// Colored stderr plus a JSON file rolled daily. The returned guard must
/// live until exit so buffered file lines are flushed.
fn init_logging(log_file: &Path) -> Result<WorkerGuard> {
    let log_dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = log_file
        .file_name()
        .unwrap_or(OsStr::new("covid_indicators.log"));

    let (non_blocking_file, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, log_file_name));

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .try_init()?;

    Ok(guard)
}

/// Builds the population index from a reference table on disk.
#[tracing::instrument]
fn load_index(path: &str) -> Result<AreaPopulationIndex> {
    let rows = load_population_rows(path)?;
    let index = AreaPopulationIndex::build(&rows);
    info!(areas = index.len(), rows = rows.len(), "Population index built");
    Ok(index)
}
