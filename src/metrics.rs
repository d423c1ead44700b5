// Removal metrics
//
// Lightweight counters for what the agent has done since it started

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Process-wide removal metrics
///
/// Uses atomic operations so the counters can be updated through a shared
/// reference. Logged after every poll cycle and on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Torrents whose info block was parsed
    pub torrents_inspected: AtomicUsize,

    /// Torrents skipped because the daemon returned no info
    pub torrents_skipped: AtomicUsize,

    /// Torrents that went through the removal pipeline
    pub torrents_removed: AtomicUsize,

    /// Removal anomalies reported to the alert channel
    pub anomalies_alerted: AtomicUsize,

    /// Total time spent in the removal pipeline in milliseconds
    pub total_removal_time_ms: AtomicU64,

    /// Poll cycles that ran to completion
    pub cycles_completed: AtomicU64,

    /// Poll cycles aborted by a fatal error
    pub cycles_failed: AtomicU64,

    /// Agent start time
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            torrents_inspected: AtomicUsize::new(0),
            torrents_skipped: AtomicUsize::new(0),
            torrents_removed: AtomicUsize::new(0),
            anomalies_alerted: AtomicUsize::new(0),
            total_removal_time_ms: AtomicU64::new(0),
            cycles_completed: AtomicU64::new(0),
            cycles_failed: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_torrent_inspected(&self) {
        self.torrents_inspected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_torrent_skipped(&self) {
        self.torrents_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished removal and how long it took
    pub fn record_torrent_removed(&self, duration: Duration) {
        self.torrents_removed.fetch_add(1, Ordering::Relaxed);
        self.total_removal_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_anomalies(&self, count: usize) {
        self.anomalies_alerted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_cycle_completed(&self) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cycle_failed(&self) {
        self.cycles_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average time per removal in milliseconds
    pub fn avg_removal_time_ms(&self) -> f64 {
        let total = self.total_removal_time_ms.load(Ordering::Relaxed);
        let count = self.torrents_removed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Removal Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Cycles: {} completed, {} failed",
            self.cycles_completed.load(Ordering::Relaxed),
            self.cycles_failed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Torrents: {} inspected, {} skipped, {} removed, {} anomalies alerted",
            self.torrents_inspected.load(Ordering::Relaxed),
            self.torrents_skipped.load(Ordering::Relaxed),
            self.torrents_removed.load(Ordering::Relaxed),
            self.anomalies_alerted.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Total removal time: {:.2}s (avg: {:.2}ms per torrent)",
            self.total_removal_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.avg_removal_time_ms()
        );
    }

    /// One-line summary after each cycle
    pub fn log_periodic(&self) {
        tracing::info!(
            "Metrics: {} cycles, {} torrents removed, {} anomalies, uptime {:.0}s",
            self.cycles_completed.load(Ordering::Relaxed)
                + self.cycles_failed.load(Ordering::Relaxed),
            self.torrents_removed.load(Ordering::Relaxed),
            self.anomalies_alerted.load(Ordering::Relaxed),
            self.uptime().as_secs_f64()
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
