use super::mutex::Mutex;
use std::cell::UnsafeCell;
use std::fmt;

/// Shared state that is only reachable from inside its own critical sections.
///
/// A monitor owns its [`Mutex`] and its state. Callers never hold the lock
/// themselves: they hand [`Monitor::enter`] the whole check-then-act
/// sequence, which runs atomically with respect to every other `enter` on the
/// same monitor. Types such as [`MapMonitor`](super::MapMonitor) build their
/// public operations out of single `enter` calls.
///
/// Calling `enter` on a monitor from inside one of its own critical sections
/// deadlocks, like any reentrant use of [`Mutex`]. A panic inside a critical
/// section releases the lock and leaves the state as the closure left it.
pub struct Monitor<S> {
    mutex: Mutex,
    state: UnsafeCell<S>,
}

// SAFETY: `state` is only dereferenced while `mutex` is held, so at most one
// thread has access at a time; `S: Send` is enough for it to move between
// threads that way.
unsafe impl<S: Send> Send for Monitor<S> {}
unsafe impl<S: Send> Sync for Monitor<S> {}

impl<S> Monitor<S> {
    pub fn new(state: S) -> Self {
        Self {
            mutex: Mutex::new(),
            state: UnsafeCell::new(state),
        }
    }

    /// Run `critical_section` with exclusive access to the state.
    pub fn enter<R>(&self, critical_section: impl FnOnce(&mut S) -> R) -> R {
        let _lock = self.mutex.lock();
        // SAFETY: the mutex is held until `_lock` drops at the end of this
        // function and is not reentrant, so no other reference to the state
        // exists while this one does.
        let state = unsafe { &mut *self.state.get() };
        critical_section(state)
    }

    /// Direct access; `&mut self` already proves exclusivity.
    pub fn get_mut(&mut self) -> &mut S {
        self.state.get_mut()
    }

    pub fn into_inner(self) -> S {
        self.state.into_inner()
    }
}

impl<S: Default> Default for Monitor<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> fmt::Debug for Monitor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("held", &self.mutex.is_held())
            .finish_non_exhaustive()
    }
}
