//! Metrics collection for thread and lock activity.

use hdrhistogram::Histogram;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Process-wide thread and lock counters
#[derive(Debug)]
pub struct Metrics {
    // Thread lifecycle
    threads_started: AtomicU64,
    threads_joined: AtomicU64,

    // Task outcomes
    tasks_completed: AtomicU64,
    tasks_failed: AtomicU64,
    tasks_panicked: AtomicU64,

    // Locking
    lock_acquisitions: AtomicU64,
    lock_contentions: AtomicU64,

    // Task run time; None if the histogram could not be allocated
    run_time_histogram: Option<RwLock<Histogram<u64>>>,

    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        // 3 significant figures, max value of 1 hour in nanoseconds
        let histogram = Histogram::new_with_max(3_600_000_000_000, 3)
            .ok()
            .map(RwLock::new);

        Self {
            threads_started: AtomicU64::new(0),
            threads_joined: AtomicU64::new(0),
            tasks_completed: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            tasks_panicked: AtomicU64::new(0),
            lock_acquisitions: AtomicU64::new(0),
            lock_contentions: AtomicU64::new(0),
            run_time_histogram: histogram,
            start_time: Instant::now(),
        }
    }

    pub fn record_thread_started(&self) {
        self.threads_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_thread_joined(&self) {
        self.threads_joined.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a task that ran to completion
    pub fn record_task_completed(&self, duration_ns: u64) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
        self.record_run_time(duration_ns);
    }

    /// Record a task that returned an error
    pub fn record_task_failed(&self, duration_ns: u64) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
        self.record_run_time(duration_ns);
    }

    /// Record a task that panicked
    pub fn record_task_panic(&self, duration_ns: u64) {
        self.tasks_panicked.fetch_add(1, Ordering::Relaxed);
        self.record_run_time(duration_ns);
    }

    /// Record a lock acquisition; `contended` if the lock was held on arrival
    pub fn record_lock_acquired(&self, contended: bool) {
        self.lock_acquisitions.fetch_add(1, Ordering::Relaxed);
        if contended {
            self.lock_contentions.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_run_time(&self, duration_ns: u64) {
        if let Some(histogram) = &self.run_time_histogram {
            // a sample lost to contention is acceptable
            if let Some(mut hist) = histogram.try_write() {
                let _ = hist.record(duration_ns);
            }
        }
    }

    /// Get a snapshot of current metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let (avg, p50, p99, max) = match &self.run_time_histogram {
            Some(histogram) => {
                let hist = histogram.read();
                if hist.len() > 0 {
                    (
                        hist.mean() as u64,
                        hist.value_at_quantile(0.50),
                        hist.value_at_quantile(0.99),
                        hist.max(),
                    )
                } else {
                    (0, 0, 0, 0)
                }
            }
            None => (0, 0, 0, 0),
        };

        MetricsSnapshot {
            uptime: self.start_time.elapsed(),
            threads_started: self.threads_started.load(Ordering::Relaxed),
            threads_joined: self.threads_joined.load(Ordering::Relaxed),
            tasks_completed: self.tasks_completed.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
            tasks_panicked: self.tasks_panicked.load(Ordering::Relaxed),
            lock_acquisitions: self.lock_acquisitions.load(Ordering::Relaxed),
            lock_contentions: self.lock_contentions.load(Ordering::Relaxed),
            avg_run_time_ns: avg,
            p50_run_time_ns: p50,
            p99_run_time_ns: p99,
            max_run_time_ns: max,
        }
    }

    /// Reset all metrics
    pub fn reset(&self) {
        self.threads_started.store(0, Ordering::Relaxed);
        self.threads_joined.store(0, Ordering::Relaxed);
        self.tasks_completed.store(0, Ordering::Relaxed);
        self.tasks_failed.store(0, Ordering::Relaxed);
        self.tasks_panicked.store(0, Ordering::Relaxed);
        self.lock_acquisitions.store(0, Ordering::Relaxed);
        self.lock_contentions.store(0, Ordering::Relaxed);

        if let Some(histogram) = &self.run_time_histogram {
            histogram.write().reset();
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub uptime: Duration,
    pub threads_started: u64,
    pub threads_joined: u64,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub tasks_panicked: u64,
    pub lock_acquisitions: u64,
    pub lock_contentions: u64,
    pub avg_run_time_ns: u64,
    pub p50_run_time_ns: u64,
    pub p99_run_time_ns: u64,
    pub max_run_time_ns: u64,
}

impl MetricsSnapshot {
    /// Fraction of acquisitions that had to wait (0.0 to 1.0)
    pub fn contention_ratio(&self) -> f64 {
        if self.lock_acquisitions == 0 {
            return 0.0;
        }
        self.lock_contentions as f64 / self.lock_acquisitions as f64
    }

    pub fn tasks_finished(&self) -> u64 {
        self.tasks_completed + self.tasks_failed + self.tasks_panicked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_basic() {
        let metrics = Metrics::new();

        metrics.record_thread_started();
        metrics.record_task_completed(1000);
        metrics.record_task_failed(2000);
        metrics.record_task_panic(3000);
        metrics.record_thread_joined();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.threads_started, 1);
        assert_eq!(snapshot.threads_joined, 1);
        assert_eq!(snapshot.tasks_finished(), 3);
        assert!(snapshot.avg_run_time_ns > 0);
        assert!(snapshot.max_run_time_ns >= 3000);
    }

    #[test]
    fn test_contention_ratio() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot().contention_ratio(), 0.0);

        metrics.record_lock_acquired(false);
        metrics.record_lock_acquired(true);
        metrics.record_lock_acquired(false);
        metrics.record_lock_acquired(true);

        assert_eq!(metrics.snapshot().contention_ratio(), 0.5);
    }

    #[test]
    fn test_metrics_reset() {
        let metrics = Metrics::new();

        metrics.record_task_completed(1000);
        metrics.record_lock_acquired(true);
        assert_eq!(metrics.snapshot().tasks_completed, 1);

        metrics.reset();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.tasks_completed, 0);
        assert_eq!(snapshot.lock_contentions, 0);
        assert_eq!(snapshot.avg_run_time_ns, 0);
    }
}
