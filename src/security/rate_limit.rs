//! Fixed-window rate limiting per client IP.
//!
//! A fixed window admits up to `2 × max_requests` across a window boundary
//! (a burst at the end of one window followed by one at the start of the
//! next). That approximation is accepted at this scale.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::RateLimitConfig;
use crate::error::ProxyError;
use crate::observability::metrics;
use crate::security::clock::{Clock, SystemClock};
use crate::security::window_store::{DashMapStore, WindowPolicy, WindowStore};

pub use crate::security::window_store::Decision;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Fixed-window limiter over an injectable store and clock.
#[derive(Debug, Clone)]
pub struct FixedWindowLimiter {
    store: Arc<dyn WindowStore>,
    clock: Arc<dyn Clock>,
    policy: WindowPolicy,
    enabled: bool,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            store: Arc::new(DashMapStore::new()),
            clock: Arc::new(SystemClock),
            policy: WindowPolicy { window, max_requests },
            enabled: true,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        let mut limiter = Self::new(config.max_requests, config.window());
        limiter.enabled = config.enabled;
        limiter
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn WindowStore>) -> Self {
        self.store = store;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn policy(&self) -> WindowPolicy {
        self.policy
    }

    /// Record one request from `client` and decide whether it may proceed.
    pub fn check(&self, client: IpAddr) -> Decision {
        if !self.enabled {
            return Decision::Allowed { remaining: self.policy.max_requests };
        }
        self.store.hit(client, self.clock.now(), self.policy)
    }

    /// Remove windows whose period has elapsed.
    pub fn sweep(&self) -> usize {
        self.store.sweep(self.clock.now(), self.policy.window)
    }

    /// Number of clients currently tracked.
    pub fn tracked(&self) -> usize {
        self.store.len()
    }
}

/// State for the rate limiting middleware.
#[derive(Debug, Clone)]
pub struct RateLimiterState {
    pub limiter: FixedWindowLimiter,
    pub trust_forwarded_for: bool,
}

impl RateLimiterState {
    pub fn new(limiter: FixedWindowLimiter, trust_forwarded_for: bool) -> Self {
        Self { limiter, trust_forwarded_for }
    }
}

/// Resolve the identity a request is counted against.
pub fn client_ip(request: &Request<Body>, trust_forwarded_for: bool) -> IpAddr {
    let forwarded = trust_forwarded_for
        .then(|| {
            request
                .headers()
                .get(X_FORWARDED_FOR)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(|v| v.trim().parse::<IpAddr>().ok())
        })
        .flatten();

    forwarded
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
        .to_canonical()
}

/// Middleware function for per-client rate limiting.
pub async fn rate_limit(
    State(state): State<Arc<RateLimiterState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.limiter.is_enabled() {
        return next.run(request).await;
    }

    let client = client_ip(&request, state.trust_forwarded_for);
    match state.limiter.check(client) {
        Decision::Allowed { remaining } => {
            tracing::trace!(client = %client, remaining, "Rate limit check passed");
            next.run(request).await
        }
        Decision::Limited { reset_in } => {
            tracing::warn!(client = %client, reset_in = ?reset_in, "Rate limit exceeded");
            let err = ProxyError::RateLimitExceeded;
            metrics::record_outcome(err.outcome());
            err.into_response()
        }
    }
}

/// Periodically evict elapsed windows until shutdown is signalled.
pub fn spawn_sweeper(
    limiter: FixedWindowLimiter,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = limiter.sweep();
                    let tracked = limiter.tracked();
                    metrics::set_tracked_clients(tracked);
                    if removed > 0 {
                        tracing::debug!(removed, tracked, "Swept elapsed rate limit windows");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rate limit sweeper stopping");
                    break;
                }
            }
        }
    })
}
