//! HTTP transport for the chart endpoint.
//!
//! The transport only moves bytes: it returns status and body and leaves
//! interpretation to the provider, since Yahoo reports unknown symbols as a
//! 404 whose JSON body still carries the delisting description.

use super::provider::FetchError;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use std::time::Duration;

const ACCEPT_VALUE: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9";
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9";

/// One outbound chart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    pub url: String,
    pub query: Vec<(&'static str, String)>,
    pub user_agent: String,
}

/// Raw reply: HTTP status and decoded body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartReply {
    pub status: u16,
    pub body: String,
}

impl ChartReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends chart requests. Implemented over reqwest; tests script replies.
pub trait ChartTransport: Send + Sync {
    fn get(&self, request: &ChartRequest) -> Result<ChartReply, FetchError>;
}

/// Blocking reqwest transport with a per-request timeout.
///
/// `accept-encoding` is left to reqwest, which advertises gzip, deflate and
/// brotli and decodes the body accordingly.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl ChartTransport for HttpTransport {
    fn get(&self, request: &ChartRequest) -> Result<ChartReply, FetchError> {
        let resp = self
            .client
            .get(&request.url)
            .query(&request.query)
            .header(ACCEPT, ACCEPT_VALUE)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_VALUE)
            .header(USER_AGENT, request.user_agent.as_str())
            .send()
            .map_err(classify)?;

        let status = resp.status().as_u16();
        let body = resp.text().map_err(classify)?;
        Ok(ChartReply { status, body })
    }
}

fn classify(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(e.to_string())
    } else if e.is_builder() {
        FetchError::InvalidRequest(e.to_string())
    } else if e.is_decode() {
        FetchError::MalformedPayload(e.to_string())
    } else {
        FetchError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_success_range() {
        assert!(ChartReply::ok("{}").is_success());
        assert!(!ChartReply {
            status: 404,
            body: String::new()
        }
        .is_success());
    }

    #[test]
    fn client_builds_with_timeout() {
        assert!(HttpTransport::new(Duration::from_secs(30)).is_ok());
    }
}
