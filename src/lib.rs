//! Single-hop HTTP relay proxy.
//!
//! A request for `/<absolute-url>` is gated by an origin allow-list and a
//! per-client fixed-window rate limit, then the target is fetched and its
//! body relayed back.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
