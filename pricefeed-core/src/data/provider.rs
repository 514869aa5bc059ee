//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over price sources so callers can swap
//! implementations and mock for tests. Providers never fail outward: a missing
//! result is an empty table with the canonical schema.

use super::table::PriceTable;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Upstream description that marks a symbol as having no data at all.
pub const DELISTED_DESCRIPTION: &str = "No data found, symbol may be delisted";

/// Structured error kinds raised while fetching and parsing one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("response has no timestamp field")]
    MissingTimestamp,

    #[error("response is missing field `{0}`")]
    MissingQuoteField(&'static str),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("symbol has no data: {description}")]
    Delisted { description: String },

    #[error("upstream error {code}: {description}")]
    Upstream { code: String, description: String },

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// What the retry loop should do after an attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Transient: back off and try again.
    Retry,
    /// The upstream has nothing for this ticker; return the empty table now.
    NoData,
    /// Retrying cannot help; return the empty table now.
    Fatal,
}

impl FetchError {
    pub fn disposition(&self) -> Disposition {
        match self {
            FetchError::MissingTimestamp | FetchError::Delisted { .. } => Disposition::NoData,
            FetchError::InvalidRequest(_) => Disposition::Fatal,
            FetchError::HttpStatus { status, .. } => match status {
                408 | 429 => Disposition::Retry,
                400..=499 => Disposition::Fatal,
                _ => Disposition::Retry,
            },
            FetchError::MissingQuoteField(_)
            | FetchError::MalformedPayload(_)
            | FetchError::Upstream { .. }
            | FetchError::Timeout(_)
            | FetchError::Network(_) => Disposition::Retry,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.disposition() == Disposition::Retry
    }
}

/// Trait for price providers (Yahoo Finance, and whatever else supplies the same table).
pub trait PriceProvider: Send + Sync {
    /// Short tag stamped into the `provider` column.
    fn name(&self) -> &str;

    /// Download daily prices for one ticker over `[start, end]`.
    ///
    /// Returns the ticker together with its table. Never fails: when nothing
    /// could be fetched, the table is empty but correctly shaped.
    fn download_ticker(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> (String, PriceTable);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_data_kinds_are_terminal() {
        assert_eq!(FetchError::MissingTimestamp.disposition(), Disposition::NoData);
        let delisted = FetchError::Delisted {
            description: DELISTED_DESCRIPTION.into(),
        };
        assert_eq!(delisted.disposition(), Disposition::NoData);
    }

    #[test]
    fn parse_and_transport_failures_retry() {
        assert!(FetchError::MissingQuoteField("indicators.quote[0].open").is_retryable());
        assert!(FetchError::MalformedPayload("eof".into()).is_retryable());
        assert!(FetchError::Timeout("30s".into()).is_retryable());
        assert!(FetchError::Network("reset".into()).is_retryable());
        assert!(FetchError::Upstream {
            code: "Internal Server Error".into(),
            description: "boom".into()
        }
        .is_retryable());
    }

    #[test]
    fn http_status_classification() {
        let status = |s| FetchError::HttpStatus {
            status: s,
            body: String::new(),
        };
        assert_eq!(status(429).disposition(), Disposition::Retry);
        assert_eq!(status(408).disposition(), Disposition::Retry);
        assert_eq!(status(500).disposition(), Disposition::Retry);
        assert_eq!(status(503).disposition(), Disposition::Retry);
        assert_eq!(status(401).disposition(), Disposition::Fatal);
        assert_eq!(status(404).disposition(), Disposition::Fatal);
    }

    #[test]
    fn invalid_request_is_fatal() {
        assert_eq!(
            FetchError::InvalidRequest("bad url".into()).disposition(),
            Disposition::Fatal
        );
    }
}
