//! Pricefeed CLI — fetch daily prices for one ticker.
//!
//! Commands:
//! - `fetch` — download a daily OHLCV table from Yahoo Finance and print it
//! - `config` — print the default fetch configuration as TOML

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use pricefeed_core::config::FetchConfig;
use pricefeed_core::data::{FetchOutcome, SeededSource, YahooProvider};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pricefeed",
    about = "Pricefeed CLI — daily price tables from Yahoo Finance"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch daily prices for a ticker and print the table.
    Fetch {
        /// Ticker symbol (e.g., SPY, SAP.DE, ^GSPC).
        ticker: String,

        /// Start date (YYYY-MM-DD). Defaults to 10 years ago.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD), inclusive. Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// TOML config file overriding retry, backoff and user-agent settings.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Seed the user-agent selection for reproducible request headers.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the default configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            ticker,
            start,
            end,
            config,
            seed,
        } => run_fetch(ticker, start, end, config, seed),
        Commands::Config => {
            print!("{}", FetchConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn run_fetch(
    ticker: String,
    start: Option<String>,
    end: Option<String>,
    config: Option<PathBuf>,
    seed: Option<u64>,
) -> Result<()> {
    if ticker.trim().is_empty() {
        bail!("ticker must not be empty");
    }

    let today = chrono::Local::now().date_naive();
    let start_date = parse_date(start.as_deref())?
        .unwrap_or_else(|| today - chrono::Duration::days(365 * 10));
    let end_date = parse_date(end.as_deref())?.unwrap_or(today);
    if start_date > end_date {
        bail!("start date {start_date} is after end date {end_date}");
    }

    let config = match config {
        Some(path) => FetchConfig::from_file(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => FetchConfig::default(),
    };

    let mut provider = YahooProvider::new(config)?;
    if let Some(seed) = seed {
        provider = provider.with_user_agent_source(Arc::new(SeededSource::new(seed)));
    }

    let report =
        provider.fetch_with_report(&ticker, start_of_day(start_date), end_of_day(end_date));

    println!("{}", report.table.dataframe());
    println!(
        "{}: {} rows ({} attempt{})",
        report.ticker,
        report.table.height(),
        report.attempts,
        if report.attempts == 1 { "" } else { "s" }
    );
    match &report.outcome {
        FetchOutcome::Success => {}
        FetchOutcome::NoTimestamp | FetchOutcome::Delisted => {
            eprintln!("No data for {}", report.ticker);
        }
        FetchOutcome::Fatal(err) | FetchOutcome::Exhausted(err) => {
            eprintln!("Fetch for {} gave up: {err}", report.ticker);
        }
    }

    Ok(())
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("bad date '{s}'"))
        })
        .transpose()
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::default()).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + chrono::Duration::seconds(86_399)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn day_bounds_cover_the_whole_day() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(start_of_day(day).timestamp(), 1704153600);
        assert_eq!(end_of_day(day).timestamp(), 1704239999);
    }

    #[test]
    fn parse_date_accepts_iso_and_rejects_garbage() {
        assert_eq!(
            parse_date(Some("2024-03-15")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(parse_date(None).unwrap(), None);
        assert!(parse_date(Some("15/03/2024")).is_err());
    }

    #[test]
    fn fetch_arguments_parse() {
        let cli = Cli::try_parse_from([
            "pricefeed", "fetch", "SPY", "--start", "2024-01-01", "--seed", "7",
        ])
        .unwrap();
        match cli.command {
            Commands::Fetch {
                ticker, start, seed, ..
            } => {
                assert_eq!(ticker, "SPY");
                assert_eq!(start.as_deref(), Some("2024-01-01"));
                assert_eq!(seed, Some(7));
            }
            Commands::Config => panic!("expected fetch"),
        }
    }
}
