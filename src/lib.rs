//! threadkit - managed threads and critical sections
//!
//! A small toolkit for running work on OS threads without losing its
//! failures, and for sharing state between those threads without races.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use threadkit::prelude::*;
//!
//! let map: Arc<MapMonitor<u32, u32>> = Arc::new((0..100).map(|k| (k, k)).collect());
//!
//! let mut remover = {
//!     let map = map.clone();
//!     ManagedThread::spawn(Task::new(move || {
//!         for key in 0..100 {
//!             map.remove_if_present(&key);
//!         }
//!     }))?
//! };
//!
//! let mut printer = ManagedThread::new();
//! printer.start(Task::new(move || {
//!     for key in (0..100).rev() {
//!         map.with_value_if_present(&key, |v| println!("rescued ({}, {})", key, v));
//!     }
//! }))?;
//!
//! // You spawn a thread, you join a thread.
//! printer.join()?;
//! remover.join()?;
//! # Ok::<(), threadkit::Error>(())
//! ```
//!
//! # Features
//!
//! - **Tasks**: closures, functions with bound arguments, or [`Runnable`] objects
//! - **Managed threads**: start/join lifecycle, failures reported instead of lost
//! - **Scoped threads**: contained tasks that borrow from the caller's stack
//! - **Locks**: a non-reentrant [`Mutex`] with an RAII [`ScopedLock`]
//! - **Monitors**: shared state whose operations are whole critical sections
//! - **Telemetry**: thread and lock counters (optional, on by default)

// Lint configuration
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod scope;
pub mod sync;
pub mod telemetry;

// Re-export key types at crate root
pub use config::{Config, ConfigBuilder, UnjoinedPolicy};
pub use error::{Error, Result};
pub use executor::{
    CapturingReporter, Failure, FailureReport, ManagedThread, Reporter, Runnable, StderrReporter,
    Task, TaskError, TaskResult, ThreadState,
};
pub use scope::{scope, scope_with_config};
pub use sync::{MapMonitor, Monitor, Mutex, ProtectedMap, ScopedLock};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_monitor_shared_by_managed_threads() {
        let map: Arc<MapMonitor<u32, u32>> = Arc::new(MapMonitor::new());

        let mut writers: Vec<ManagedThread> = (0..4)
            .map(|w| {
                let map = map.clone();
                ManagedThread::spawn(Task::new(move || {
                    for key in 0..50 {
                        map.put_if_absent(key, w);
                    }
                }))
                .unwrap()
            })
            .collect();

        for writer in &mut writers {
            writer.join().unwrap();
        }

        // one writer won each key, and nobody overwrote it afterwards
        assert_eq!(map.len(), 50);
        assert!(map.snapshot().values().all(|w| *w < 4));
    }

    #[test]
    fn test_scoped_lock_serializes_managed_threads() {
        let mutex = Arc::new(Mutex::new());
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let mut threads: Vec<ManagedThread> = ["RED", "GREEN", "YELLOW"]
            .into_iter()
            .map(|color| {
                let mutex = mutex.clone();
                let log = log.clone();
                ManagedThread::spawn(Task::new(move || {
                    for _ in 0..5 {
                        let _lock = mutex.lock();
                        log.lock().push(color);
                    }
                }))
                .unwrap()
            })
            .collect();

        for thread in threads.iter_mut().rev() {
            thread.join().unwrap();
        }

        assert_eq!(log.lock().len(), 15);
        assert!(!mutex.is_held());
    }
}
