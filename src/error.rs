//! Request-level and startup error types.
//!
//! # Design Decisions
//! - Every request error is terminal and becomes a plain-text response
//! - No structured error bodies; the HTTP status is the only code
//! - Startup errors abort the process before traffic is accepted

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::config::loader::ConfigError;
use crate::http::response::text_response;

/// Usage hint returned for paths that do not carry a target URL.
pub const USAGE_HINT: &str = "Please provide a full URL, e.g. /https://example.com";

/// Message returned once a client exhausts its window.
pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";

/// Errors that terminate a proxied request.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The path does not encode a usable target URL.
    #[error("{}", USAGE_HINT)]
    InvalidTarget,

    /// The client exceeded its request quota for the current window.
    #[error("{}", RATE_LIMIT_MESSAGE)]
    RateLimitExceeded,

    /// The outbound fetch failed before a complete body was read.
    #[error("Error fetching {url}: {message}")]
    UpstreamFetchFailed { url: String, message: String },
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidTarget => StatusCode::BAD_REQUEST,
            ProxyError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::UpstreamFetchFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label used for the `outcome` metric dimension.
    pub fn outcome(&self) -> &'static str {
        match self {
            ProxyError::InvalidTarget => "invalid_target",
            ProxyError::RateLimitExceeded => "rate_limited",
            ProxyError::UpstreamFetchFailed { .. } => "upstream_error",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        text_response(self.status(), self.to_string())
    }
}

/// Errors that abort startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Render an error followed by its source chain, joined by `": "`.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        // Some clients repeat the cause in their own Display.
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] Inner);

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct Inner;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProxyError::InvalidTarget.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ProxyError::RateLimitExceeded.status(), StatusCode::TOO_MANY_REQUESTS);
        let err = ProxyError::UpstreamFetchFailed {
            url: "http://x".into(),
            message: "boom".into(),
        };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upstream_message_format() {
        let err = ProxyError::UpstreamFetchFailed {
            url: "http://127.0.0.1:1".into(),
            message: "connection refused".into(),
        };
        assert_eq!(err.to_string(), "Error fetching http://127.0.0.1:1: connection refused");
    }

    #[test]
    fn test_error_chain_joins_sources() {
        assert_eq!(error_chain(&Outer(Inner)), "outer: connection refused");
        assert_eq!(error_chain(&Inner), "connection refused");
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let response = ProxyError::InvalidTarget.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], USAGE_HINT.as_bytes());
    }
}
