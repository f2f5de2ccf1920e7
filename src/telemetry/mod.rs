//! Telemetry for managed threads and locks.
//!
//! A single process-wide [`Metrics`] collector is fed by every
//! [`ManagedThread`](crate::ManagedThread), scoped thread and
//! [`Mutex`](crate::Mutex). Read it with [`global`].

#[cfg(feature = "telemetry")]
pub mod metrics;

#[cfg(feature = "telemetry")]
pub use metrics::{Metrics, MetricsSnapshot};

#[cfg(feature = "telemetry")]
static GLOBAL_METRICS: std::sync::OnceLock<Metrics> = std::sync::OnceLock::new();

/// The process-wide metrics collector.
#[cfg(feature = "telemetry")]
pub fn global() -> &'static Metrics {
    GLOBAL_METRICS.get_or_init(Metrics::new)
}

// Stub implementations when telemetry is disabled
#[cfg(not(feature = "telemetry"))]
pub mod metrics {
    use std::time::Duration;

    #[derive(Debug, Clone, Default)]
    pub struct Metrics;

    impl Metrics {
        pub fn new() -> Self { Self }
        pub fn record_thread_started(&self) {}
        pub fn record_thread_joined(&self) {}
        pub fn record_task_completed(&self, _: u64) {}
        pub fn record_task_failed(&self, _: u64) {}
        pub fn record_task_panic(&self, _: u64) {}
        pub fn record_lock_acquired(&self, _: bool) {}
        pub fn snapshot(&self) -> MetricsSnapshot { MetricsSnapshot::default() }
        pub fn reset(&self) {}
    }

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
        pub fn contention_ratio(&self) -> f64 { 0.0 }
        pub fn tasks_finished(&self) -> u64 { 0 }
    }
}

#[cfg(not(feature = "telemetry"))]
pub use metrics::{Metrics, MetricsSnapshot};

#[cfg(not(feature = "telemetry"))]
static GLOBAL_METRICS: Metrics = Metrics;

#[cfg(not(feature = "telemetry"))]
pub fn global() -> &'static Metrics {
    &GLOBAL_METRICS
}
