use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::{Containment, IntoTaskResult};
use crate::telemetry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

/// Handle for starting contained threads that may borrow from the caller.
///
/// Obtained from [`scope`] or [`scope_with_config`].
#[derive(Debug)]
pub struct Scope<'a, 'scope, 'env: 'scope> {
    inner: &'scope thread::Scope<'scope, 'env>,
    config: &'a Config,
    started: AtomicU64,
}

/// A thread started inside a [`Scope`].
///
/// `join` consumes the handle, so a scoped thread cannot be joined twice.
/// Threads that are never joined explicitly are joined when the scope ends.
#[derive(Debug)]
pub struct ScopedThread<'scope> {
    name: String,
    handle: thread::ScopedJoinHandle<'scope, ()>,
}

impl<'a, 'scope, 'env: 'scope> Scope<'a, 'scope, 'env> {
    /// Start `f` on a new thread. `f` may borrow anything that outlives the scope.
    pub fn start<F, R>(&self, f: F) -> Result<ScopedThread<'scope>>
    where
        F: FnOnce() -> R + Send + 'scope,
        R: IntoTaskResult,
    {
        let n = self.started.fetch_add(1, Ordering::Relaxed);
        let name = format!("{}-scoped-{}", self.config.thread_name_prefix, n);
        let containment = Containment::new(self.config.reporter.clone());

        let mut builder = thread::Builder::new().name(name.clone());
        if let Some(stack_size) = self.config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let thread_name = name.clone();
        let handle = builder
            .spawn_scoped(self.inner, move || {
                let _ = containment.execute(&thread_name, None, f);
            })
            .map_err(Error::Spawn)?;

        telemetry::global().record_thread_started();
        tracing::debug!(thread = %name, "started scoped thread");

        Ok(ScopedThread { name, handle })
    }

    /// Number of threads started in this scope so far.
    pub fn started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }
}

impl ScopedThread<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the thread's task has finished.
    pub fn join(self) {
        if let Err(payload) = self.handle.join() {
            tracing::error!(thread = %self.name, ?payload, "scoped thread unwound past containment");
            eprintln!(
                "threadkit: scoped thread '{}' unwound past containment (reporter panicked)",
                self.name
            );
        }
        telemetry::global().record_thread_joined();
    }
}

/// Run `f` with a [`Scope`] using the default [`Config`].
///
/// Every thread started in the scope has finished when this returns.
///
/// ```
/// let mut counts = [0usize; 2];
/// let (left, right) = counts.split_at_mut(1);
///
/// threadkit::scope(|s| {
///     s.start(|| left[0] += 1).unwrap();
///     s.start(|| right[0] += 2).unwrap();
/// });
///
/// assert_eq!(counts, [1, 2]);
/// ```
pub fn scope<'env, F, T>(f: F) -> T
where
    F: for<'a, 'scope> FnOnce(&'a Scope<'a, 'scope, 'env>) -> T,
{
    scope_with_config(&Config::default(), f)
}

pub fn scope_with_config<'env, F, T>(config: &Config, f: F) -> T
where
    F: for<'a, 'scope> FnOnce(&'a Scope<'a, 'scope, 'env>) -> T,
{
    thread::scope(|inner| {
        let scope = Scope {
            inner,
            config,
            started: AtomicU64::new(0),
        };
        f(&scope)
    })
}
