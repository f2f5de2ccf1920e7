//! Task execution infrastructure.
//!
//! This module provides the task abstraction, the managed thread that runs
//! one task, and the containment layer that keeps task failures from
//! escaping a thread.

pub mod containment;
pub mod managed;
pub mod report;
pub mod task;

pub use containment::Containment;
pub use managed::{ManagedThread, ThreadState};
pub use report::{CapturingReporter, Failure, FailureReport, Reporter, StderrReporter};
pub use task::{IntoTaskResult, Runnable, Task, TaskError, TaskId, TaskResult};
