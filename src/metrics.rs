// Engine metrics module
//
// Lightweight counters for what the progression engine has processed

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Engine activity counters
///
/// Uses atomic operations so the counters can be shared by reference between
/// the manager and whoever reports them, without locks.
#[derive(Debug)]
pub struct EngineMetrics {
    /// IDE events ingested
    pub events_recorded: AtomicU64,

    /// Challenges newly completed (replays are not counted)
    pub challenges_completed: AtomicU64,

    /// Completion events that referenced an id missing from the catalog
    pub unknown_challenge_ids: AtomicU64,

    /// Explicit progress resets
    pub resets: AtomicU64,

    /// State transitions applied
    pub state_updates: AtomicU64,

    /// Change notifications sent
    pub broadcasts: AtomicU64,

    /// Change notifications sent while nobody was subscribed
    pub undelivered_broadcasts: AtomicU64,

    start_time: Instant,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            events_recorded: AtomicU64::new(0),
            challenges_completed: AtomicU64::new(0),
            unknown_challenge_ids: AtomicU64::new(0),
            resets: AtomicU64::new(0),
            state_updates: AtomicU64::new(0),
            broadcasts: AtomicU64::new(0),
            undelivered_broadcasts: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_event(&self) {
        self.events_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_challenge_completed(&self) {
        self.challenges_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unknown_challenge(&self) {
        self.unknown_challenge_ids.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_state_update(&self) {
        self.state_updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a broadcast and whether any subscriber received it
    pub fn record_broadcast(&self, delivered: bool) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
        if !delivered {
            self.undelivered_broadcasts.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Engine Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Events: {}, challenges completed: {}, unknown challenge ids: {}, resets: {}",
            self.events_recorded.load(Ordering::Relaxed),
            self.challenges_completed.load(Ordering::Relaxed),
            self.unknown_challenge_ids.load(Ordering::Relaxed),
            self.resets.load(Ordering::Relaxed)
        );
        tracing::info!(
            "State updates: {}, broadcasts: {} ({} undelivered)",
            self.state_updates.load(Ordering::Relaxed),
            self.broadcasts.load(Ordering::Relaxed),
            self.undelivered_broadcasts.load(Ordering::Relaxed)
        );
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = EngineMetrics::new();
        assert_eq!(metrics.events_recorded.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.resets.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_counters() {
        let metrics = EngineMetrics::new();

        metrics.record_event();
        metrics.record_event();
        metrics.record_challenge_completed();
        metrics.record_unknown_challenge();
        metrics.record_reset();
        metrics.record_state_update();

        assert_eq!(metrics.events_recorded.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.challenges_completed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.unknown_challenge_ids.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.resets.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.state_updates.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_record_broadcast_tracks_undelivered() {
        let metrics = EngineMetrics::new();

        metrics.record_broadcast(true);
        metrics.record_broadcast(false);

        assert_eq!(metrics.broadcasts.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.undelivered_broadcasts.load(Ordering::Relaxed), 1);
    }
}
