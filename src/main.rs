use std::error::Error;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};

use windmon_service::analysis::direction::compass_point;
use windmon_service::analysis::rating::rate_wind_speed;
use windmon_service::analysis::windy_days::{paginate, summarize_days, windy_days};
use windmon_service::cache::ObservationCache;
use windmon_service::config::{self, Config, DEFAULT_CONFIG_PATH};
use windmon_service::ingest::forecast;
use windmon_service::ingest::observations::{CachedObservations, PostgresObservationSource};
use windmon_service::logging::{self, DataSource};
use windmon_service::ranges::{self, QueryRange};
use windmon_service::{aggregate, AggregatedBucket, RawObservation};

#[derive(Parser, Debug)]
#[command(name = "windmon", version, about = "Lake wind observations and forecast, in 15-minute buckets")]
struct CliArgs {
    /// Path to the TOML configuration file
    #[arg(long, env = "WINDMON_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Default log filter when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate one local day of sensor observations
    Day {
        /// Local date (YYYY-MM-DD); defaults to today at the lake
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Fetch and aggregate the short-term forecast
    Forecast,
    /// Page through recent windy days
    Windy {
        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: usize,
        /// How many days back to look
        #[arg(long, default_value_t = 90)]
        days: u32,
    },
}

/// One chart row handed to the dashboard.
#[derive(Serialize)]
struct ChartRow<'a> {
    #[serde(flatten)]
    bucket: &'a AggregatedBucket,
    compass: &'static str,
    category: &'static str,
    color: &'static str,
}

fn chart_rows(buckets: &[AggregatedBucket]) -> Vec<ChartRow<'_>> {
    buckets
        .iter()
        .map(|b| {
            let category = rate_wind_speed(b.mean_wind_speed);
            ChartRow {
                bucket: b,
                compass: compass_point(b.mean_wind_direction),
                category: category.label(),
                color: category.color(),
            }
        })
        .collect()
}

/// Aggregates for display. A failure means "no chart data", never a crash.
fn buckets_for_display(source: DataSource, observations: &[RawObservation]) -> Vec<AggregatedBucket> {
    match aggregate(observations) {
        Ok(buckets) => {
            logging::log_aggregation_summary(source, observations.len(), buckets.len());
            buckets
        }
        Err(e) => {
            error!(source = %source, "No chart data available: {}", e);
            Vec::new()
        }
    }
}

fn open_observations(config: &Config) -> Result<CachedObservations<PostgresObservationSource>, Box<dyn Error>> {
    let database_url = config::database_url()?;
    let source = PostgresObservationSource::connect(&database_url, &config.location.station_id)?;
    Ok(CachedObservations::new(source, ObservationCache::new(config.cache_ttl())))
}

fn run_day(config: &Config, date: Option<NaiveDate>) -> Result<(), Box<dyn Error>> {
    let offset = config.utc_offset();
    let date = date.unwrap_or_else(|| ranges::local_date(Utc::now(), offset));
    let range = ranges::day_range(date, offset)?;
    info!("{}: observations for {} ({})", config.location.name, date, range.cache_key());

    let mut observations = open_observations(config)?;
    let raw = observations.observations(&range)?;
    let buckets = buckets_for_display(DataSource::Observations, &raw);

    println!("{}", serde_json::to_string_pretty(&chart_rows(&buckets))?);
    Ok(())
}

fn run_forecast(config: &Config) -> Result<(), Box<dyn Error>> {
    let range = ranges::forecast_range(Utc::now(), config.forecast.hours)?;
    let client = forecast::build_client(&config.forecast)?;

    let raw = match forecast::fetch_forecast_observations(&client, config, &range) {
        Ok(raw) => raw,
        Err(e) => {
            logging::log_fetch_failure(DataSource::Forecast, "fetch forecast", &e);
            return Err(e.into());
        }
    };
    let buckets = buckets_for_display(DataSource::Forecast, &raw);

    println!("{}", serde_json::to_string_pretty(&chart_rows(&buckets))?);
    Ok(())
}

fn run_windy(config: &Config, page: usize, days: u32) -> Result<(), Box<dyn Error>> {
    let offset = config.utc_offset();
    let today = ranges::local_date(Utc::now(), offset);
    let range: QueryRange = ranges::trailing_days_range(today, days, offset)?;

    let mut observations = open_observations(config)?;
    let raw = observations.observations(&range)?;
    let buckets = buckets_for_display(DataSource::Observations, &raw);

    let criteria = config.windy_criteria();
    let summaries = summarize_days(&buckets, offset, &criteria);
    let windy = windy_days(&summaries, &criteria);
    let page = paginate(&windy, page, config.windy_days.page_size)?;
    info!(
        "{} windy days in the last {} days, page {}/{}",
        page.total_items,
        days,
        page.page + 1,
        page.total_pages.max(1)
    );

    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = CliArgs::parse();
    logging::init_logging(&args.log_level);

    let config = config::load_config(&args.config)?;

    match args.command {
        Command::Day { date } => run_day(&config, date),
        Command::Forecast => run_forecast(&config),
        Command::Windy { page, days } => run_windy(&config, page, days),
    }
}
