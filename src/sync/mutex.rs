//! Binary, non-reentrant lock with explicit acquire/release and an RAII guard.

use crate::error::{Error, Result};
use crate::telemetry;
use parking_lot::Condvar;
use std::marker::PhantomData;
use std::thread::{self, ThreadId};

/// A lock that is either free or held by exactly one thread.
///
/// Unlike `std::sync::Mutex` it guards no data: it is shared by reference
/// among every party that must exclude the others, and each party decides
/// what its critical section covers. Prefer [`Mutex::lock`], which releases
/// on every exit path; `acquire`/`release` exist for code that needs the
/// two halves apart.
///
/// The lock is not reentrant. A thread that acquires a mutex it already
/// holds waits for itself forever. Two threads that take two mutexes in
/// opposite orders can deadlock. Neither case is detected.
#[derive(Debug, Default)]
pub struct Mutex {
    holder: parking_lot::Mutex<Option<ThreadId>>,
    released: Condvar,
}

impl Mutex {
    pub const fn new() -> Self {
        Self {
            holder: parking_lot::Mutex::new(None),
            released: Condvar::new(),
        }
    }

    /// Block until the lock is free, then take it.
    ///
    /// No fairness guarantee beyond the platform's.
    pub fn acquire(&self) {
        let me = thread::current().id();
        let mut holder = self.holder.lock();

        let contended = holder.is_some();
        while holder.is_some() {
            self.released.wait(&mut holder);
        }
        *holder = Some(me);
        drop(holder);

        telemetry::global().record_lock_acquired(contended);
    }

    /// Take the lock if it is free. Never blocks.
    pub fn try_acquire(&self) -> bool {
        let mut holder = self.holder.lock();
        if holder.is_some() {
            return false;
        }
        *holder = Some(thread::current().id());
        drop(holder);

        telemetry::global().record_lock_acquired(false);
        true
    }

    /// Give the lock back. Only the holding thread may do this.
    ///
    /// A bad release leaves the state untouched, so it can never let two
    /// holders in.
    pub fn release(&self) -> Result<()> {
        let me = thread::current().id();
        let mut holder = self.holder.lock();

        match *holder {
            None => Err(Error::NotHeld),
            Some(owner) if owner != me => Err(Error::NotHolder),
            Some(_) => {
                *holder = None;
                drop(holder);
                self.released.notify_one();
                Ok(())
            }
        }
    }

    /// Acquire and return a guard that releases on drop.
    pub fn lock(&self) -> ScopedLock<'_> {
        self.acquire();
        ScopedLock::new(self)
    }

    pub fn try_lock(&self) -> Option<ScopedLock<'_>> {
        if self.try_acquire() {
            Some(ScopedLock::new(self))
        } else {
            None
        }
    }

    pub fn is_held(&self) -> bool {
        self.holder.lock().is_some()
    }

    pub fn is_held_by_current_thread(&self) -> bool {
        *self.holder.lock() == Some(thread::current().id())
    }
}

/// Holds a [`Mutex`] for the rest of the enclosing block.
///
/// Released when dropped, including while a panic unwinds through the
/// block. The guard stays on the thread that acquired it (`!Send`).
#[must_use = "the mutex is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ScopedLock<'a> {
    mutex: &'a Mutex,
    _not_send: PhantomData<*const ()>,
}

impl<'a> ScopedLock<'a> {
    fn new(mutex: &'a Mutex) -> Self {
        Self {
            mutex,
            _not_send: PhantomData,
        }
    }

    pub fn mutex(&self) -> &'a Mutex {
        self.mutex
    }
}

impl Drop for ScopedLock<'_> {
    fn drop(&mut self) {
        // Only fails if someone called `release` behind the guard's back.
        if let Err(err) = self.mutex.release() {
            tracing::error!(%err, "scoped lock could not release its mutex");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_acquire_release() {
        let mutex = Mutex::new();
        assert!(!mutex.is_held());

        mutex.acquire();
        assert!(mutex.is_held());
        assert!(mutex.is_held_by_current_thread());
        assert!(!mutex.try_acquire());

        mutex.release().unwrap();
        assert!(!mutex.is_held());
    }

    #[test]
    fn test_release_misuse_keeps_state() {
        let mutex = Arc::new(Mutex::new());
        assert!(matches!(mutex.release(), Err(Error::NotHeld)));

        mutex.acquire();
        let other = mutex.clone();
        let result = thread::spawn(move || other.release()).join().unwrap();
        assert!(matches!(result, Err(Error::NotHolder)));

        // still ours
        assert!(mutex.is_held_by_current_thread());
        mutex.release().unwrap();
    }

    #[test]
    fn test_guard_releases_at_scope_end() {
        let mutex = Mutex::new();
        {
            let guard = mutex.lock();
            assert!(guard.mutex().is_held());
            assert!(mutex.try_lock().is_none());
        }
        assert!(!mutex.is_held());
        assert!(mutex.try_lock().is_some());
    }

    #[test]
    fn test_guard_releases_on_panic() {
        let mutex = Mutex::new();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = mutex.lock();
            panic!("error inside critical section");
        }));

        assert!(result.is_err());
        assert!(!mutex.is_held());
    }

    #[test]
    fn test_mutual_exclusion() {
        let mutex = Arc::new(Mutex::new());
        let inside = Arc::new(AtomicBool::new(false));
        let entries = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let mutex = mutex.clone();
                let inside = inside.clone();
                let entries = entries.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        let _guard = mutex.lock();
                        assert!(!inside.swap(true, Ordering::SeqCst), "two holders at once");
                        entries.fetch_add(1, Ordering::Relaxed);
                        inside.store(false, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(entries.load(Ordering::Relaxed), 8 * 500);
    }

    #[test]
    fn test_blocked_acquire_wakes_on_release() {
        let mutex = Arc::new(Mutex::new());
        mutex.acquire();

        let waiter = {
            let mutex = mutex.clone();
            thread::spawn(move || {
                let _guard = mutex.lock();
                mutex.is_held_by_current_thread()
            })
        };

        thread::sleep(std::time::Duration::from_millis(20));
        assert!(!waiter.is_finished());

        mutex.release().unwrap();
        assert!(waiter.join().unwrap());
    }
}
