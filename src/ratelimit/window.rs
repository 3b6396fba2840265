//! Sliding-window event tracking.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Ordered record of admitted events within a trailing time horizon.
///
/// Events are appended in non-decreasing order, so expiry is a prefix trim
/// from the front of the queue: amortized cost is bounded by the number of
/// expired entries, not the total.
#[derive(Debug, Default)]
pub struct SlidingWindow {
    events: VecDeque<Instant>,
}

impl SlidingWindow {
    /// Create an empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every event that is at least `horizon` old at `now`.
    ///
    /// An event exactly `horizon` old is expired. If `now` is earlier than a
    /// recorded event (host clock stepped backwards), elapsed time saturates
    /// to zero and nothing is removed.
    pub fn prune(&mut self, now: Instant, horizon: Duration) {
        while let Some(&oldest) = self.events.front() {
            if now.saturating_duration_since(oldest) >= horizon {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }

    /// Number of events currently tracked.
    ///
    /// Accurate only straight after a [`prune`](Self::prune) with the same
    /// `now` value.
    pub fn count(&self) -> usize {
        self.events.len()
    }

    /// Record an event at `now`. Admissibility must be checked by the caller
    /// beforehand; this appends unconditionally.
    pub fn record(&mut self, now: Instant) {
        self.events.push_back(now);
    }

    /// Whether the window holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Seconds until the oldest event leaves the window.
    ///
    /// Truncates the sub-second remainder and clamps to at least 1, so a
    /// rejected caller never retries at the exact expiry boundary.
    pub fn seconds_until_slot_free(&self, now: Instant, horizon: Duration) -> u64 {
        match self.events.front() {
            Some(&oldest) => {
                let elapsed = now.saturating_duration_since(oldest);
                horizon.saturating_sub(elapsed).as_secs().max(1)
            }
            None => 1,
        }
    }
}
