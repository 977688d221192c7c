//! Origin allow-list middleware.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

/// Static set of origins allowed to read relayed responses.
#[derive(Debug, Clone, Default)]
pub struct OriginGuard {
    allowed: HashSet<String>,
}

impl OriginGuard {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: origins.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact string match; no wildcard or subdomain matching.
    pub fn allows(&self, origin: &str) -> bool {
        self.allowed.contains(origin)
    }

    /// Annotate response headers for the given request origin.
    pub fn decorate(&self, origin: Option<&str>, headers: &mut HeaderMap) {
        if let Some(origin) = origin.filter(|o| self.allows(o)) {
            if let Ok(value) = HeaderValue::from_str(origin) {
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
            }
        }
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

/// Always runs the rest of the pipeline, then decorates whatever came back.
pub async fn origin_guard(
    State(guard): State<Arc<OriginGuard>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let mut response = next.run(request).await;
    guard.decorate(origin.as_deref(), response.headers_mut());
    response
}
