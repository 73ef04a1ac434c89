use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Per-client poll loop counters
#[derive(Debug, Default)]
pub struct PollMetrics {
    pub ticks: AtomicU64,
    pub failed_ticks: AtomicU64,
    pub changes_detected: AtomicU64,
    pub changes_dropped: AtomicU64,
    pub alerts_shown: AtomicU64,
    pub alerts_ignored: AtomicU64,
    pub announcements_shown: AtomicU64,
}

impl PollMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed_tick(&self) {
        self.failed_ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Changes found in one diff, and how many of them were not forwarded.
    pub fn record_changes(&self, detected: usize, dropped: usize) {
        self.changes_detected
            .fetch_add(detected as u64, Ordering::Relaxed);
        self.changes_dropped.fetch_add(dropped as u64, Ordering::Relaxed);
    }

    pub fn record_alert_shown(&self) {
        self.alerts_shown.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_alert_ignored(&self) {
        self.alerts_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_announcement_shown(&self) {
        self.announcements_shown.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> PollStats {
        PollStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            failed_ticks: self.failed_ticks.load(Ordering::Relaxed),
            changes_detected: self.changes_detected.load(Ordering::Relaxed),
            changes_dropped: self.changes_dropped.load(Ordering::Relaxed),
            alerts_shown: self.alerts_shown.load(Ordering::Relaxed),
            alerts_ignored: self.alerts_ignored.load(Ordering::Relaxed),
            announcements_shown: self.announcements_shown.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            ticks = stats.ticks,
            failed_ticks = stats.failed_ticks,
            changes_detected = stats.changes_detected,
            changes_dropped = stats.changes_dropped,
            alerts_shown = stats.alerts_shown,
            alerts_ignored = stats.alerts_ignored,
            announcements_shown = stats.announcements_shown,
            "Poll loop metrics"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollStats {
    pub ticks: u64,
    pub failed_ticks: u64,
    pub changes_detected: u64,
    pub changes_dropped: u64,
    pub alerts_shown: u64,
    pub alerts_ignored: u64,
    pub announcements_shown: u64,
}

/// Times one tick and reports overruns of the poll interval.
pub struct TickTimer {
    budget: Duration,
    start: Instant,
}

impl TickTimer {
    pub fn start(budget: Duration) -> Self {
        Self {
            budget,
            start: Instant::now(),
        }
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.start.elapsed();
        if elapsed > self.budget {
            info!(
                elapsed_ms = elapsed.as_millis() as u64,
                interval_ms = self.budget.as_millis() as u64,
                "Tick overran poll interval, next tick delayed"
            );
        } else {
            debug!(elapsed_ms = elapsed.as_millis() as u64, "Tick finished");
        }
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_changes_counts_drops() {
        let metrics = PollMetrics::new();
        metrics.record_tick();
        metrics.record_changes(3, 2);
        metrics.record_changes(0, 0);
        let stats = metrics.get_stats();
        assert_eq!(stats.ticks, 1);
        assert_eq!(stats.changes_detected, 3);
        assert_eq!(stats.changes_dropped, 2);
    }
}
