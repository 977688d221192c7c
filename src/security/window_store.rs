//! Per-client fixed-window state and its storage.
//!
//! # Design Decisions
//! - The counting rule lives on `ClientWindow`; stores only provide locking
//! - A store must serialize read-modify-write for one client
//! - Sweeping is behavior-neutral: an elapsed window resets on its next hit

use std::fmt;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Window length and ceiling applied to every client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    pub window: Duration,
    pub max_requests: u32,
}

/// Outcome of recording one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { reset_in: Duration },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }
}

/// Counter state for one client identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientWindow {
    pub count: u32,
    pub window_start: Instant,
}

impl ClientWindow {
    pub fn new(now: Instant) -> Self {
        Self { count: 0, window_start: now }
    }

    pub fn is_elapsed(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) >= window
    }

    /// Record one request at `now`.
    ///
    /// The increment that crosses the ceiling is kept, so `count` never
    /// exceeds `max_requests + 1`.
    pub fn hit(&mut self, now: Instant, policy: WindowPolicy) -> Decision {
        if self.is_elapsed(now, policy.window) {
            self.count = 0;
            self.window_start = now;
        }

        if self.count <= policy.max_requests {
            self.count = self.count.saturating_add(1);
        }

        if self.count > policy.max_requests {
            let elapsed = now.saturating_duration_since(self.window_start);
            Decision::Limited {
                reset_in: policy.window.saturating_sub(elapsed),
            }
        } else {
            Decision::Allowed {
                remaining: policy.max_requests - self.count,
            }
        }
    }
}

/// Storage for client windows, keyed by client IP.
pub trait WindowStore: Send + Sync + fmt::Debug {
    /// Look up or create the client's window and record one request.
    fn hit(&self, client: IpAddr, now: Instant, policy: WindowPolicy) -> Decision;

    /// Drop every window whose period has elapsed. Returns how many were removed.
    fn sweep(&self, now: Instant, window: Duration) -> usize;

    /// Number of tracked clients.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sharded in-memory store. The shard lock serializes updates per client.
#[derive(Debug, Default)]
pub struct DashMapStore {
    windows: DashMap<IpAddr, ClientWindow>,
}

impl DashMapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a single client's window.
    pub fn get(&self, client: &IpAddr) -> Option<ClientWindow> {
        self.windows.get(client).map(|w| *w)
    }
}

impl WindowStore for DashMapStore {
    fn hit(&self, client: IpAddr, now: Instant, policy: WindowPolicy) -> Decision {
        let mut window = self
            .windows
            .entry(client)
            .or_insert_with(|| ClientWindow::new(now));
        window.hit(now, policy)
    }

    fn sweep(&self, now: Instant, window: Duration) -> usize {
        let mut removed = 0;
        self.windows.retain(|_, w| {
            let keep = !w.is_elapsed(now, window);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    fn len(&self) -> usize {
        self.windows.len()
    }
}
