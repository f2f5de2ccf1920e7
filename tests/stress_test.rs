//! Stress tests for threadkit

use parking_lot::Mutex as DataMutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use threadkit::prelude::*;
use threadkit::CapturingReporter;

#[test]
#[ignore] // Run with --ignored flag
fn stress_test_many_managed_threads() {
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..20 {
        let mut threads: Vec<ManagedThread> = (0..50)
            .map(|_| {
                let counter = counter.clone();
                ManagedThread::spawn(Task::new(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                }))
                .unwrap()
            })
            .collect();

        for thread in &mut threads {
            thread.join().unwrap();
        }
    }

    assert_eq!(counter.load(Ordering::Relaxed), 1_000);
}

#[test]
#[ignore]
fn stress_test_mutex_counter() {
    let mutex = Arc::new(Mutex::new());
    let unguarded = Arc::new(DataMutex::new(0u64));

    let mut threads: Vec<ManagedThread> = (0..8)
        .map(|_| {
            let mutex = mutex.clone();
            let unguarded = unguarded.clone();
            ManagedThread::spawn(Task::new(move || {
                for _ in 0..10_000 {
                    let _lock = mutex.lock();
                    // read and write separately so only the outer lock keeps this atomic
                    let value = *unguarded.lock();
                    *unguarded.lock() = value + 1;
                }
            }))
            .unwrap()
        })
        .collect();

    for thread in &mut threads {
        thread.join().unwrap();
    }

    assert_eq!(*unguarded.lock(), 80_000);
    assert!(!mutex.is_held());
}

#[test]
#[ignore]
fn stress_test_map_monitor_churn() {
    let map: Arc<MapMonitor<u32, u32>> = Arc::new(MapMonitor::new());
    let inserted = Arc::new(AtomicUsize::new(0));
    let removed = Arc::new(AtomicUsize::new(0));

    let mut threads = Vec::new();
    for worker in 0..8u32 {
        let map = map.clone();
        let inserted = inserted.clone();
        let removed = removed.clone();
        threads.push(
            ManagedThread::spawn(Task::new(move || {
                for round in 0..5_000u32 {
                    let key = (round * 7 + worker) % 256;
                    if round % 2 == 0 {
                        if map.put_if_absent(key, key) {
                            inserted.fetch_add(1, Ordering::Relaxed);
                        }
                    } else if let Some(value) = map.remove_if_present(&key) {
                        assert_eq!(value, key);
                        removed.fetch_add(1, Ordering::Relaxed);
                    }
                    map.update_if_present(&key, |v| assert_eq!(*v, key));
                }
            }))
            .unwrap(),
        );
    }

    for thread in &mut threads {
        thread.join().unwrap();
    }

    let remaining = map.len();
    assert_eq!(
        inserted.load(Ordering::Relaxed),
        removed.load(Ordering::Relaxed) + remaining
    );
}

#[test]
#[ignore]
fn stress_test_failure_storm() {
    let reporter = Arc::new(CapturingReporter::new());
    let config = Config::builder()
        .reporter(reporter.clone())
        .build()
        .unwrap();

    let mut threads: Vec<ManagedThread> = (0..200)
        .map(|i| {
            let mut thread = ManagedThread::with_config(config.clone());
            thread
                .start(Task::new(move || -> Result<()> {
                    if i % 2 == 0 {
                        panic!("storm {}", i);
                    }
                    Err(Error::config(format!("storm {}", i)))
                }))
                .unwrap();
            thread
        })
        .collect();

    for thread in &mut threads {
        thread.join().unwrap();
    }

    assert_eq!(reporter.len(), 200);
}

#[test]
#[ignore]
fn stress_test_nested_scopes() {
    let counter = DataMutex::new(0usize);

    for _ in 0..10 {
        scope(|s| {
            for _ in 0..20 {
                let counter = &counter;
                s.start(move || {
                    scope(|inner| {
                        for _ in 0..10 {
                            inner.start(move || *counter.lock() += 1).unwrap();
                        }
                    });
                })
                .unwrap();
            }
        });
    }

    assert_eq!(*counter.lock(), 2_000);
}
