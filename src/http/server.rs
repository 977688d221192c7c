//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the single wildcard proxy route
//! - Wire up the gating pipeline in order: origin guard, rate limiter, handler
//! - Wire up ambient layers (request ID, tracing, request deadline)
//! - Run the rate limit sweeper alongside the listener
//! - Serve with peer addresses and graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{body::Body, http::Request, middleware, routing::any, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::request::{request_id, UuidRequestId};
use crate::proxy::{proxy_handler, Forwarder, ProxyState};
use crate::security::origin::{origin_guard, OriginGuard};
use crate::security::rate_limit::{rate_limit, spawn_sweeper, FixedWindowLimiter, RateLimiterState};

/// HTTP server for the relay proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    limiter: FixedWindowLimiter,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let limiter = FixedWindowLimiter::from_config(&config.rate_limit);
        Self::with_limiter(config, limiter)
    }

    /// Create a server around an existing limiter (custom store or clock).
    pub fn with_limiter(
        config: ProxyConfig,
        limiter: FixedWindowLimiter,
    ) -> Result<Self, reqwest::Error> {
        let forwarder = Arc::new(Forwarder::new(&config.upstream)?);
        let proxy_state = ProxyState {
            forwarder,
            strict_validation: config.upstream.strict_validation,
            relay_status: config.upstream.relay_status,
        };
        let guard = Arc::new(OriginGuard::new(config.origins.allowed.iter().cloned()));
        let rate_state = Arc::new(RateLimiterState::new(
            limiter.clone(),
            config.rate_limit.trust_forwarded_for,
        ));

        let policy = limiter.policy();
        tracing::debug!(
            allowed_origins = guard.len(),
            rate_limit_enabled = limiter.is_enabled(),
            max_requests = policy.max_requests,
            window = ?policy.window,
            "Gating pipeline configured"
        );
        if guard.is_empty() {
            tracing::warn!("Origin allow-list is empty; no browser origin can read relayed responses");
        }

        let router = Self::build_router(&config, proxy_state, guard, rate_state);
        Ok(Self {
            router,
            config,
            limiter,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers added later wrap earlier ones, so the origin guard sees every
    /// response the rate limiter and handler produce.
    #[allow(deprecated)]
    fn build_router(
        config: &ProxyConfig,
        proxy_state: ProxyState,
        guard: Arc<OriginGuard>,
        rate_state: Arc<RateLimiterState>,
    ) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(proxy_state)
            .layer(TimeoutLayer::new(config.listener.request_timeout()))
            .layer(middleware::from_fn_with_state(rate_state, rate_limit))
            .layer(middleware::from_fn_with_state(guard, origin_guard))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id(request),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let sweeper = self.limiter.is_enabled().then(|| {
            spawn_sweeper(
                self.limiter.clone(),
                self.config.rate_limit.sweep_interval(),
                shutdown.resubscribe(),
            )
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
