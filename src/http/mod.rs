//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layer order)
//!     → request.rs (x-request-id assignment, trace span)
//!     → security::origin → security::rate_limit
//!     → proxy::handler
//!     → response.rs (plain-text bodies)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
