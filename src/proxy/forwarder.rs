//! Outbound fetch.
//!
//! # Responsibilities
//! - Issue a plain GET to the target with no inbound headers
//! - Bound the fetch by connect and total timeouts
//! - Read the complete body, refusing bodies over the size cap
//!
//! # Design Decisions
//! - Redirects follow the client's default policy
//! - Bodies are decoded as lossy UTF-8 text
//! - Dropping the fetch future cancels the outbound request

use std::time::Instant;

use axum::http::StatusCode;

use crate::config::UpstreamConfig;
use crate::error::{error_chain, ProxyError};
use crate::observability::metrics;

/// A fully read upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relayed {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("response body exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

/// Shared outbound client.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl Forwarder {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        // Single hop: environment proxy settings are ignored.
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Fetch `url` and return its status and text body.
    pub async fn fetch(&self, url: &str) -> Result<Relayed, ProxyError> {
        let start = Instant::now();
        let result = self.fetch_inner(url).await;
        metrics::record_upstream_duration(start);

        result.map_err(|e| ProxyError::UpstreamFetchFailed {
            url: url.to_string(),
            message: error_chain(&e),
        })
    }

    async fn fetch_inner(&self, url: &str) -> Result<Relayed, FetchError> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();

        let limit = self.max_body_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(FetchError::TooLarge { limit });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(FetchError::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(url, status = %status, bytes = body.len(), "Upstream body read");

        Ok(Relayed {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}
