//! Owning wrapper around one OS thread.

use super::containment::Containment;
use super::task::Task;
use crate::config::{Config, UnjoinedPolicy};
use crate::error::{Error, Result};
use crate::telemetry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

/// Global thread ID counter.
static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle of a [`ManagedThread`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    Created,
    Running,
    Joined,
}

/// A thread that contains its task's failures and must be joined.
///
/// Each instance runs at most one task: `start` moves it from
/// [`ThreadState::Created`] to [`ThreadState::Running`] and `join` moves it to
/// the terminal [`ThreadState::Joined`]. The type is not `Clone`; moving it
/// moves the ownership of the OS thread.
///
/// Anything the task returns as an error, or panics with, is written to the
/// configured [`Reporter`](crate::Reporter) and never reaches `join`.
///
/// Dropping a running, unjoined instance is a programmer error and fails
/// loudly according to [`Config::unjoined_policy`]. It never detaches.
///
/// ```no_run
/// use threadkit::{ManagedThread, Task};
///
/// let mut worker = ManagedThread::new();
/// worker.start(Task::new(|| println!("hello from a managed thread")))?;
/// worker.join()?;
/// # Ok::<(), threadkit::Error>(())
/// ```
#[derive(Debug)]
pub struct ManagedThread {
    id: u64,
    name: String,
    state: ThreadState,
    handle: Option<JoinHandle<()>>,
    config: Config,
}

impl ManagedThread {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let id = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            id,
            name: config.thread_name(id),
            state: ThreadState::Created,
            handle: None,
            config,
        }
    }

    /// Create a thread and start `task` on it.
    pub fn spawn(task: impl Into<Task>) -> Result<Self> {
        let mut thread = Self::new();
        thread.start(task)?;
        Ok(thread)
    }

    /// Replace the generated `<prefix>-<id>` name.
    ///
    /// The OS thread takes its name at `start`, so renaming afterwards fails
    /// with [`Error::AlreadyStarted`].
    pub fn set_name<S: Into<String>>(&mut self, name: S) -> Result<()> {
        if self.state != ThreadState::Created {
            return Err(Error::AlreadyStarted);
        }
        self.name = name.into();
        Ok(())
    }

    pub fn start(&mut self, task: impl Into<Task>) -> Result<()> {
        if self.state != ThreadState::Created {
            return Err(Error::AlreadyStarted);
        }
        self.config.validate()?;
        if self.name.contains('\0') {
            return Err(Error::config("thread name must not contain NUL"));
        }

        let task = task.into();
        let containment = Containment::new(self.config.reporter.clone());
        let name = self.name.clone();
        let id = self.id;

        let mut builder = thread::Builder::new().name(name.clone());
        if let Some(stack_size) = self.config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        tracing::debug!(thread_id = id, thread = %name, task_id = task.id().as_u64(), "starting managed thread");

        let handle = builder
            .spawn(move || {
                let _ = containment.run_task(&name, task);
                tracing::trace!(thread_id = id, "managed thread finished");
            })
            .map_err(Error::Spawn)?;

        telemetry::global().record_thread_started();
        self.handle = Some(handle);
        self.state = ThreadState::Running;
        Ok(())
    }

    /// Block until the task has finished, normally or through a contained failure.
    pub fn join(&mut self) -> Result<()> {
        match self.state {
            ThreadState::Created => return Err(Error::NotStarted),
            ThreadState::Joined => return Err(Error::AlreadyJoined),
            ThreadState::Running => {}
        }

        let handle = self.handle.take().ok_or(Error::NotStarted)?;
        self.state = ThreadState::Joined;

        // The body is contained, so this only fails if a reporter panicked.
        if let Err(payload) = handle.join() {
            tracing::error!(thread_id = self.id, ?payload, "managed thread unwound past containment");
            eprintln!(
                "threadkit: managed thread '{}' unwound past containment (reporter panicked)",
                self.name
            );
        }

        telemetry::global().record_thread_joined();
        tracing::debug!(thread_id = self.id, "joined managed thread");
        Ok(())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ThreadState {
        self.state
    }

    /// Whether the task has finished running. Does not join.
    pub fn is_finished(&self) -> bool {
        match &self.handle {
            Some(handle) => handle.is_finished(),
            None => self.state == ThreadState::Joined,
        }
    }
}

impl Default for ManagedThread {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ManagedThread {
    fn drop(&mut self) {
        if self.state != ThreadState::Running {
            return;
        }

        let message = format!(
            "managed thread '{}' dropped without being joined; every started thread must be joined",
            self.name
        );
        tracing::error!(thread_id = self.id, "{}", message);

        match self.config.unjoined_policy {
            UnjoinedPolicy::Panic if !thread::panicking() => panic!("{}", message),
            _ => {
                eprintln!("threadkit: {} (aborting)", message);
                std::process::abort();
            }
        }
    }
}
