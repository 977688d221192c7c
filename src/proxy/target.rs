//! Target URL extraction from the request path.

use axum::http::Uri;
use url::Url;

use crate::error::ProxyError;

const REQUIRED_PREFIX: &str = "http";

/// The destination encoded in an inbound request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRequest {
    /// Path and query exactly as received.
    pub raw_path: String,
    /// `raw_path` without its leading `/`.
    pub target_url: String,
}

impl TargetRequest {
    /// Build from the request target. The path is used as received, not
    /// percent-decoded, and keeps its query string.
    pub fn from_uri(uri: &Uri) -> Self {
        let raw_path = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
            .to_string();
        let target_url = raw_path
            .strip_prefix('/')
            .unwrap_or(raw_path.as_str())
            .to_string();
        Self { raw_path, target_url }
    }

    /// Check the target before any outbound I/O.
    ///
    /// The default check is a bare `http` prefix test, which also admits
    /// malformed URLs such as `httpfoo`; those fail later at fetch time.
    /// `strict` additionally requires an absolute http(s) URL with a host.
    pub fn validate(&self, strict: bool) -> Result<&str, ProxyError> {
        if !self.target_url.starts_with(REQUIRED_PREFIX) {
            return Err(ProxyError::InvalidTarget);
        }

        if strict {
            let url = Url::parse(&self.target_url).map_err(|_| ProxyError::InvalidTarget)?;
            if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
                return Err(ProxyError::InvalidTarget);
            }
        }

        Ok(&self.target_url)
    }
}
