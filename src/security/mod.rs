//! Request gating subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → origin.rs (allow-list lookup, decorates the eventual response)
//!     → rate_limit.rs (fixed-window check per client IP)
//!     → Pass to proxy handler
//! ```
//!
//! # Design Decisions
//! - Origin guard never rejects; browsers enforce CORS on their side
//! - Rate limiter short-circuits with 429 before any outbound I/O
//! - Both stages are synchronous over in-process state

pub mod clock;
pub mod origin;
pub mod rate_limit;
pub mod window_store;

pub use origin::OriginGuard;
pub use rate_limit::{Decision, FixedWindowLimiter};
