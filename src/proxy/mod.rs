//! Target resolution and forwarding.
//!
//! # Data Flow
//! ```text
//! Gated request:
//!     → target.rs (strip leading '/', prefix check)
//!     → forwarder.rs (outbound GET, bounded body read)
//!     → handler.rs (relay body or synthesized error)
//! ```
//!
//! # Design Decisions
//! - No inbound headers are forwarded upstream
//! - The whole upstream body is read before relaying
//! - Upstream status is not relayed unless configured

pub mod forwarder;
pub mod handler;
pub mod target;

pub use forwarder::{Forwarder, Relayed};
pub use handler::{proxy_handler, ProxyState};
pub use target::TargetRequest;
