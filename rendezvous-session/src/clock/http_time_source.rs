use crate::clock::TimeSource;
use crate::error::ProbeError;
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::header::{CACHE_CONTROL, DATE};
use tracing::debug;

/// Reads the reference clock from the `Date` header of a `HEAD` request.
///
/// Any resource on the signaling origin works; no body is exchanged.
#[derive(Debug, Clone)]
pub struct HttpTimeSource {
    client: reqwest::Client,
    url: String,
}

impl HttpTimeSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TimeSource for HttpTimeSource {
    async fn fetch_reference_time(&self) -> Result<i64, ProbeError> {
        let response = self
            .client
            .head(&self.url)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| ProbeError::Request(e.to_string()))?;

        let header = response
            .headers()
            .get(DATE)
            .ok_or(ProbeError::MissingDateHeader)?;
        let value = header
            .to_str()
            .map_err(|e| ProbeError::InvalidDateHeader(e.to_string()))?;

        debug!("Date header from {}: {}", self.url, value);
        parse_http_date(value)
    }
}

/// Parse an IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`) into Unix milliseconds.
pub fn parse_http_date(value: &str) -> Result<i64, ProbeError> {
    DateTime::parse_from_rfc2822(value.trim())
        .map(|date| date.timestamp_millis())
        .map_err(|e| ProbeError::InvalidDateHeader(format!("{value:?}: {e}")))
}
