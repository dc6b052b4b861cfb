//! Downstream propagation client.
//!
//! Stamps outbound requests with the required correlation headers so the
//! identifier survives the next service boundary.

use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;

use crate::correlation::CorrelationHeaders;

#[derive(Debug, Error)]
pub enum DownstreamError {
    #[error("invalid downstream url: {0}")]
    Url(#[from] url::ParseError),

    #[error("downstream request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// HTTP client bound to a single downstream URL.
#[derive(Debug, Clone)]
pub struct DownstreamClient {
    client: reqwest::Client,
    url: reqwest::Url,
}

impl DownstreamClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, DownstreamError> {
        let url = reqwest::Url::parse(url)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }

    /// GET the downstream URL with `correlation` merged into the request headers.
    ///
    /// Returns the downstream status and body.
    pub async fn forward(
        &self,
        correlation: &CorrelationHeaders,
    ) -> Result<(StatusCode, String), DownstreamError> {
        let response = self
            .client
            .get(self.url.clone())
            .headers(correlation.to_header_map())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}
