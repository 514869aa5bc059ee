//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV rows from Yahoo's v8 chart API and normalizes them into a
//! [`PriceTable`]. Transient failures are retried with capped exponential
//! backoff; every path ends in a well-formed table, empty when nothing could be
//! fetched.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.

use super::backoff::{Backoff, Sleeper, ThreadSleeper};
use super::provider::{Disposition, FetchError, PriceProvider, DELISTED_DESCRIPTION};
use super::table::{PriceRecord, PriceTable};
use super::transport::{ChartReply, ChartRequest, ChartTransport, HttpTransport};
use super::user_agent::{choose, ThreadRngSource, UserAgentSource};
use crate::config::{ConfigError, FetchConfig};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

/// Tag stamped into the `provider` column.
pub const PROVIDER_TAG: &str = "yahoo";

/// Longest body excerpt kept in an `HttpStatus` error.
const BODY_SNIPPET_LEN: usize = 200;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Option<Vec<QuoteData>>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Option<Vec<Option<f64>>>,
}

/// How a fetch ended.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Parsed successfully. The table may still be empty if no row was complete.
    Success,
    /// The result object had no `timestamp` field.
    NoTimestamp,
    /// Upstream reported the symbol as delisted / without data.
    Delisted,
    /// A non-retryable failure stopped the loop early.
    Fatal(FetchError),
    /// Every attempt failed; carries the last error.
    Exhausted(FetchError),
}

/// Result of one `fetch_with_report` call.
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub ticker: String,
    pub table: PriceTable,
    pub outcome: FetchOutcome,
    pub attempts: u32,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    config: FetchConfig,
    transport: Arc<dyn ChartTransport>,
    sleeper: Arc<dyn Sleeper>,
    agents: Arc<dyn UserAgentSource>,
}

impl YahooProvider {
    /// Provider over HTTP, sleeping on the calling thread between attempts.
    pub fn new(config: FetchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let transport = HttpTransport::new(config.request_timeout())?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Provider over an arbitrary transport.
    pub fn with_transport(
        config: FetchConfig,
        transport: Arc<dyn ChartTransport>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            sleeper: Arc::new(ThreadSleeper),
            agents: Arc::new(ThreadRngSource),
        })
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_user_agent_source(mut self, agents: Arc<dyn UserAgentSource>) -> Self {
        self.agents = agents;
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch daily prices for `ticker`, returning the ticker and its table.
    pub fn fetch(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> (String, PriceTable) {
        let report = self.fetch_with_report(ticker, start, end);
        (report.ticker, report.table)
    }

    /// Like [`fetch`](Self::fetch), also reporting how the retry loop ended.
    pub fn fetch_with_report(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FetchReport {
        let max_attempts = self.config.max_attempts();
        let mut backoff = Backoff::new(self.config.initial_backoff(), self.config.max_backoff());
        let report = |table: PriceTable, outcome: FetchOutcome, attempts: u32| FetchReport {
            ticker: ticker.to_string(),
            table,
            outcome,
            attempts,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            tracing::debug!(ticker, attempt, max_attempts, "fetching chart");

            let err = match self.attempt(ticker, start, end) {
                Ok(table) => {
                    tracing::debug!(ticker, attempt, rows = table.height(), "chart parsed");
                    return report(table, FetchOutcome::Success, attempt);
                }
                Err(err) => err,
            };

            match err.disposition() {
                Disposition::NoData => {
                    tracing::info!(ticker, error = %err, "no data for ticker");
                    let outcome = match err {
                        FetchError::MissingTimestamp => FetchOutcome::NoTimestamp,
                        _ => FetchOutcome::Delisted,
                    };
                    return report(PriceTable::empty(), outcome, attempt);
                }
                Disposition::Fatal => {
                    tracing::error!(
                        ticker,
                        attempt,
                        error = %err,
                        "chart fetch failed, not retrying"
                    );
                    return report(PriceTable::empty(), FetchOutcome::Fatal(err), attempt);
                }
                Disposition::Retry if attempt >= max_attempts => {
                    tracing::warn!(ticker, attempts = attempt, error = %err, "retries exhausted");
                    return report(PriceTable::empty(), FetchOutcome::Exhausted(err), attempt);
                }
                Disposition::Retry => {
                    let delay = backoff.next_delay();
                    tracing::warn!(
                        ticker,
                        attempt,
                        delay_secs = delay.as_secs_f64(),
                        error = %err,
                        "chart fetch failed, backing off"
                    );
                    self.sleeper.sleep(delay);
                }
            }
        }
    }

    /// One request/parse round trip.
    fn attempt(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceTable, FetchError> {
        let request = self.chart_request(ticker, start, end)?;
        let reply = self.transport.get(&request)?;
        parse_reply(ticker, &reply)
    }

    /// Build the chart request for a ticker and range, picking a user agent.
    fn chart_request(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ChartRequest, FetchError> {
        let user_agent = choose(self.agents.as_ref(), &self.config.user_agent_pool)
            .ok_or_else(|| FetchError::InvalidRequest("user agent pool is empty".into()))?;

        Ok(ChartRequest {
            url: chart_url(&self.config.base_url, ticker),
            query: vec![
                ("period1", start.timestamp().to_string()),
                ("period2", end.timestamp().to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,splits".to_string()),
            ],
            user_agent: user_agent.to_string(),
        })
    }
}

impl PriceProvider for YahooProvider {
    fn name(&self) -> &str {
        PROVIDER_TAG
    }

    fn download_ticker(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> (String, PriceTable) {
        self.fetch(ticker, start, end)
    }
}

/// Chart endpoint for a ticker; the ticker goes into the path verbatim.
pub fn chart_url(base_url: &str, ticker: &str) -> String {
    format!(
        "{}/v8/finance/chart/{ticker}",
        base_url.trim_end_matches('/')
    )
}

/// Interpret a raw reply: delisting signal, HTTP status, then the chart payload.
fn parse_reply(ticker: &str, reply: &ChartReply) -> Result<PriceTable, FetchError> {
    let resp: ChartResponse = match serde_json::from_str(&reply.body) {
        Ok(resp) => resp,
        Err(_) if !reply.is_success() => {
            return Err(FetchError::HttpStatus {
                status: reply.status,
                body: snippet(&reply.body),
            });
        }
        Err(e) => return Err(FetchError::MalformedPayload(format!("invalid JSON: {e}"))),
    };

    if let Some(err) = &resp.chart.error {
        let description = err.description.clone().unwrap_or_default();
        if description == DELISTED_DESCRIPTION {
            return Err(FetchError::Delisted { description });
        }
    }

    if !reply.is_success() {
        return Err(FetchError::HttpStatus {
            status: reply.status,
            body: snippet(&reply.body),
        });
    }

    if let Some(err) = resp.chart.error {
        return Err(FetchError::Upstream {
            code: err.code.unwrap_or_default(),
            description: err.description.unwrap_or_default(),
        });
    }

    let data = resp
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or(FetchError::MissingQuoteField("chart.result[0]"))?;

    let records = parse_chart(ticker, data)?;
    PriceTable::from_records(&records)
        .map_err(|e| FetchError::MalformedPayload(format!("build table: {e}")))
}

/// Turn the first chart result into complete rows.
///
/// Rows with any missing value are dropped here; duplicates are collapsed when
/// the table is built.
fn parse_chart(ticker: &str, data: ChartData) -> Result<Vec<PriceRecord>, FetchError> {
    let timestamps = data.timestamp.ok_or(FetchError::MissingTimestamp)?;

    let indicators = data
        .indicators
        .ok_or(FetchError::MissingQuoteField("indicators"))?;
    let quote = indicators
        .quote
        .and_then(|q| q.into_iter().next())
        .ok_or(FetchError::MissingQuoteField("indicators.quote[0]"))?;

    let opens = quote
        .open
        .ok_or(FetchError::MissingQuoteField("indicators.quote[0].open"))?;
    let highs = quote
        .high
        .ok_or(FetchError::MissingQuoteField("indicators.quote[0].high"))?;
    let lows = quote
        .low
        .ok_or(FetchError::MissingQuoteField("indicators.quote[0].low"))?;
    let closes = quote
        .close
        .ok_or(FetchError::MissingQuoteField("indicators.quote[0].close"))?;
    let volumes = quote
        .volume
        .ok_or(FetchError::MissingQuoteField("indicators.quote[0].volume"))?;

    let adj_closes = match indicators.adjclose {
        None => closes.clone(),
        Some(adj) => adj
            .into_iter()
            .next()
            .ok_or(FetchError::MissingQuoteField("indicators.adjclose[0]"))?
            .adjclose
            .ok_or(FetchError::MissingQuoteField("indicators.adjclose[0].adjclose"))?,
    };

    let currency = data
        .meta
        .ok_or(FetchError::MissingQuoteField("meta"))?
        .currency;

    let n = timestamps.len();
    for (name, len) in [
        ("open", opens.len()),
        ("high", highs.len()),
        ("low", lows.len()),
        ("close", closes.len()),
        ("volume", volumes.len()),
        ("adjclose", adj_closes.len()),
    ] {
        if len != n {
            return Err(FetchError::MalformedPayload(format!(
                "{name} has {len} values for {n} timestamps"
            )));
        }
    }

    let Some(currency) = currency else {
        // Every row would be missing its currency.
        return Ok(Vec::new());
    };

    let mut records = Vec::with_capacity(n);
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| FetchError::MalformedPayload(format!("invalid timestamp: {ts}")))?;

        let (Some(open), Some(high), Some(low), Some(close), Some(adj_close), Some(volume)) = (
            opens[i],
            highs[i],
            lows[i],
            closes[i],
            adj_closes[i],
            volumes[i],
        ) else {
            continue;
        };

        records.push(PriceRecord {
            date,
            ticker: ticker.to_string(),
            open: open as f32,
            high: high as f32,
            low: low as f32,
            close: close as f32,
            adj_close: adj_close as f32,
            volume: volume as f32,
            currency: currency.clone(),
            provider: PROVIDER_TAG.to_string(),
        });
    }

    Ok(records)
}

fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_LEN).collect()
}
