//! Sliding-window throttling incident tracker.

use std::time::Duration;

use tokio::time::Instant;

/// Append-only list of incident timestamps, pruned to a rolling window on
/// every read. Entries older than the window are never consulted.
#[derive(Debug, Default)]
pub struct IncidentTracker {
    events: Vec<Instant>,
}

impl IncidentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an incident at `now`, prune the window, and return the number
    /// of incidents still inside it.
    pub fn record_and_count(&mut self, now: Instant, window: Duration) -> usize {
        self.events.push(now);
        self.prune(now, window);
        self.events.len()
    }

    /// Incidents inside the window ending at `now`.
    pub fn count(&mut self, now: Instant, window: Duration) -> usize {
        self.prune(now, window);
        self.events.len()
    }

    fn prune(&mut self, now: Instant, window: Duration) {
        self.events
            .retain(|t| now.saturating_duration_since(*t) <= window);
    }
}
