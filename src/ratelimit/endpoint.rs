//! Single-window limiter for expensive endpoint categories.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::debug;

use crate::clock::{Clock, SystemClock};

use super::window::SlidingWindow;

/// All endpoint categories use a one-minute window.
const WINDOW: Duration = Duration::from_secs(60);

/// Gates one category of expensive operations by arbitrary identifier.
///
/// Narrower than [`RateLimiter`](super::RateLimiter): a single 60-second
/// window, a plain boolean outcome, and the caller decides how to degrade
/// (serve a canned reply, skip the work) when it answers `false`. Typical
/// instances: one for AI-cost-bearing endpoints keyed by user id, one for
/// authentication endpoints keyed by client address.
///
/// Per-identifier state lives in a sharded map. The entry guard holds the
/// shard lock across the prune-check-record sequence, which keeps the
/// check-then-act race out without a dedicated mutex.
pub struct EndpointLimiter {
    /// Maximum acquisitions per identifier within a trailing minute
    requests_per_minute: usize,
    /// Per-identifier windows, created lazily
    windows: DashMap<String, SlidingWindow>,
    /// Injected time source
    clock: Arc<dyn Clock>,
}

impl EndpointLimiter {
    /// Create a limiter on the system clock.
    pub fn new(requests_per_minute: usize) -> Self {
        Self::with_clock(requests_per_minute, Arc::new(SystemClock))
    }

    /// Create a limiter with an injected clock.
    pub fn with_clock(requests_per_minute: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            requests_per_minute,
            windows: DashMap::new(),
            clock,
        }
    }

    /// Try to claim a slot for `id` within the current minute.
    ///
    /// Returns `false` without recording anything once the limit is
    /// reached.
    pub fn try_acquire(&self, id: &str) -> bool {
        let now = self.clock.now();
        let mut entry = self.windows.entry(id.to_string()).or_default();
        let window = entry.value_mut();

        window.prune(now, WINDOW);
        if window.count() >= self.requests_per_minute {
            debug!(
                id = %id,
                limit = self.requests_per_minute,
                "Endpoint limit reached"
            );
            return false;
        }

        window.record(now);
        true
    }

    /// Drop identifiers whose window is empty after pruning.
    ///
    /// Returns the number of identifiers removed.
    pub fn sweep_idle(&self) -> usize {
        let now = self.clock.now();
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            window.prune(now, WINDOW);
            !window.is_empty()
        });
        before - self.windows.len()
    }

    /// Number of identifiers currently tracked.
    pub fn tracked_id_count(&self) -> usize {
        self.windows.len()
    }
}
