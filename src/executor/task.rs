//! Task representation and execution.

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};

/// Error a task may fail with.
pub type TaskError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Outcome of running a task body.
pub type TaskResult = Result<(), TaskError>;

/// Global task ID counter
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Return types accepted from a task body.
///
/// Bodies returning `()` always succeed; bodies returning `Result<(), E>`
/// fail with `E` converted into a [`TaskError`].
pub trait IntoTaskResult {
    fn into_task_result(self) -> TaskResult;
}

impl IntoTaskResult for () {
    fn into_task_result(self) -> TaskResult {
        Ok(())
    }
}

impl<E> IntoTaskResult for Result<(), E>
where
    E: Into<TaskError>,
{
    fn into_task_result(self) -> TaskResult {
        self.map_err(Into::into)
    }
}

/// An object with a single `run` capability.
///
/// Different behaviours share this one interface, so a
/// `Vec<Box<dyn Runnable>>` can be dispatched to threads uniformly.
pub trait Runnable: Send + 'static {
    fn run(&mut self) -> TaskResult;

    /// Label used in logs and diagnostics.
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }
}

impl<R: Runnable + ?Sized> Runnable for Box<R> {
    fn run(&mut self) -> TaskResult {
        (**self).run()
    }

    fn name(&self) -> Cow<'_, str> {
        (**self).name()
    }
}

/// A unit of work handed to a thread.
pub struct Task {
    id: TaskId,
    label: Option<String>,
    body: Box<dyn FnOnce() -> TaskResult + Send + 'static>,
}

impl Task {
    /// Wrap a closure. Anything it captures moves into the task.
    ///
    /// The closure may return `()` or `Result<(), E>`. A closure that only
    /// panics has no return type to infer, so annotate it:
    /// `Task::new(|| -> () { panic!("...") })`.
    pub fn new<F, R>(f: F) -> Self
    where
        F: FnOnce() -> R + Send + 'static,
        R: IntoTaskResult,
    {
        Task {
            id: TaskId::next(),
            label: None,
            body: Box::new(move || f().into_task_result()),
        }
    }

    /// Bind `args` to a plain function, e.g. `Task::with_args(print_n, ("RED", 5))`.
    pub fn with_args<F, A, R>(f: F, args: A) -> Self
    where
        F: FnOnce(A) -> R + Send + 'static,
        A: Send + 'static,
        R: IntoTaskResult,
    {
        Task::new(move || f(args))
    }

    pub fn from_runnable<T: Runnable>(mut runnable: T) -> Self {
        let label = runnable.name().into_owned();
        Task::new(move || runnable.run()).labeled(label)
    }

    pub fn labeled<S: Into<String>>(mut self, label: S) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Execute the task
    pub(crate) fn execute(self) -> TaskResult {
        (self.body)()
    }
}

impl<T: Runnable> From<T> for Task {
    fn from(runnable: T) -> Self {
        Task::from_runnable(runnable)
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish()
    }
}
