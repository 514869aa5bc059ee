//! Price records and the fixed-schema price table.
//!
//! A `PriceTable` is always shaped by [`PriceSchema`], whether it holds rows or
//! not, so consumers never need to special-case the empty result.

use super::schema::PriceSchema;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// One daily OHLCV row, fully populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub ticker: String,
    pub open: f32,
    pub high: f32,
    pub low: f32,
    pub close: f32,
    pub adj_close: f32,
    pub volume: f32,
    pub currency: String,
    pub provider: String,
}

/// Daily price table for one ticker.
#[derive(Debug, Clone)]
pub struct PriceTable {
    df: DataFrame,
}

impl PriceTable {
    /// Empty table with the canonical columns and dtypes.
    pub fn empty() -> Self {
        Self {
            df: DataFrame::empty_with_schema(&PriceSchema::schema()),
        }
    }

    /// Build a table from records, collapsing exact duplicate rows.
    ///
    /// The first occurrence of a duplicated row is kept and input order is
    /// otherwise preserved.
    pub fn from_records(records: &[PriceRecord]) -> PolarsResult<Self> {
        if records.is_empty() {
            return Ok(Self::empty());
        }

        let epoch = epoch();
        let dates: Vec<i32> = records
            .iter()
            .map(|r| (r.date - epoch).num_days() as i32)
            .collect();
        let tickers: Vec<&str> = records.iter().map(|r| r.ticker.as_str()).collect();
        let opens: Vec<f32> = records.iter().map(|r| r.open).collect();
        let highs: Vec<f32> = records.iter().map(|r| r.high).collect();
        let lows: Vec<f32> = records.iter().map(|r| r.low).collect();
        let closes: Vec<f32> = records.iter().map(|r| r.close).collect();
        let adj_closes: Vec<f32> = records.iter().map(|r| r.adj_close).collect();
        let volumes: Vec<f32> = records.iter().map(|r| r.volume).collect();
        let currencies: Vec<&str> = records.iter().map(|r| r.currency.as_str()).collect();
        let providers: Vec<&str> = records.iter().map(|r| r.provider.as_str()).collect();

        let df = DataFrame::new(vec![
            Column::new("date".into(), dates).cast(&DataType::Date)?,
            Column::new("ticker".into(), tickers),
            Column::new("open".into(), opens),
            Column::new("high".into(), highs),
            Column::new("low".into(), lows),
            Column::new("close".into(), closes),
            Column::new("adj_close".into(), adj_closes),
            Column::new("volume".into(), volumes),
            Column::new("currency".into(), currencies),
            Column::new("provider".into(), providers),
        ])?;

        let df = df
            .lazy()
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()?;

        Ok(Self { df })
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn into_dataframe(self) -> DataFrame {
        self.df
    }

    /// Read the rows back out of the frame.
    pub fn records(&self) -> PolarsResult<Vec<PriceRecord>> {
        let df = &self.df;
        let date_ca = df.column("date")?.date()?;
        let ticker_ca = df.column("ticker")?.str()?;
        let open_ca = df.column("open")?.f32()?;
        let high_ca = df.column("high")?.f32()?;
        let low_ca = df.column("low")?.f32()?;
        let close_ca = df.column("close")?.f32()?;
        let adj_ca = df.column("adj_close")?.f32()?;
        let vol_ca = df.column("volume")?.f32()?;
        let currency_ca = df.column("currency")?.str()?;
        let provider_ca = df.column("provider")?.str()?;

        let epoch = epoch();
        let null_at = |column: &str, row: usize| {
            PolarsError::ComputeError(format!("null {column} at row {row}").into())
        };

        let mut records = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let days = date_ca.get(i).ok_or_else(|| null_at("date", i))?;
            records.push(PriceRecord {
                date: epoch + chrono::Duration::days(days as i64),
                ticker: ticker_ca.get(i).ok_or_else(|| null_at("ticker", i))?.to_string(),
                open: open_ca.get(i).ok_or_else(|| null_at("open", i))?,
                high: high_ca.get(i).ok_or_else(|| null_at("high", i))?,
                low: low_ca.get(i).ok_or_else(|| null_at("low", i))?,
                close: close_ca.get(i).ok_or_else(|| null_at("close", i))?,
                adj_close: adj_ca.get(i).ok_or_else(|| null_at("adj_close", i))?,
                volume: vol_ca.get(i).ok_or_else(|| null_at("volume", i))?,
                currency: currency_ca
                    .get(i)
                    .ok_or_else(|| null_at("currency", i))?
                    .to_string(),
                provider: provider_ca
                    .get(i)
                    .ok_or_else(|| null_at("provider", i))?
                    .to_string(),
            });
        }

        Ok(records)
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::empty()
    }
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}
