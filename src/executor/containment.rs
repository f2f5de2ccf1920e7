use super::report::{Failure, FailureReport, Reporter};
use super::task::{IntoTaskResult, Task};
use crate::telemetry;
use std::cell::Cell;
use std::panic::{self, catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

thread_local! {
    /// Set while a task body runs under containment on this thread.
    static CONTAINED: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: OnceLock<()> = OnceLock::new();

/// Chain a panic hook that stays silent for contained panics.
///
/// A contained panic is reported through the [`Reporter`], so the default
/// hook's message would be a second diagnostic for the same failure. Panics
/// outside containment still reach the previous hook.
fn install_quiet_hook() {
    QUIET_HOOK.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !CONTAINED.try_with(Cell::get).unwrap_or(false) {
                previous(info);
            }
        }));
    });
}

/// Runs task bodies at the top of a thread so that no failure escapes it.
///
/// Errors cannot cross a thread boundary to whoever joins, so every failure
/// is reported here exactly once and then dropped.
#[derive(Debug, Clone)]
pub struct Containment {
    reporter: Arc<dyn Reporter>,
}

impl Containment {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self { reporter }
    }

    pub fn reporter(&self) -> &Arc<dyn Reporter> {
        &self.reporter
    }

    pub fn run_task(&self, thread_name: &str, task: Task) -> Result<(), Failure> {
        let task_id = task.id();
        let label = task.label().map(str::to_owned);
        tracing::trace!(thread = thread_name, task_id = task_id.as_u64(), "running task");

        self.execute(thread_name, label, || task.execute())
    }

    pub fn execute<F, R>(
        &self,
        thread_name: &str,
        task_label: Option<String>,
        f: F,
    ) -> Result<(), Failure>
    where
        F: FnOnce() -> R,
        R: IntoTaskResult,
    {
        install_quiet_hook();
        let metrics = telemetry::global();
        let start = Instant::now();

        let outer = CONTAINED.with(|c| c.replace(true));
        let result = catch_unwind(AssertUnwindSafe(|| f().into_task_result()));
        CONTAINED.with(|c| c.set(outer));
        let duration_ns = start.elapsed().as_nanos() as u64;

        let failure = match result {
            Ok(Ok(())) => {
                metrics.record_task_completed(duration_ns);
                return Ok(());
            }
            Ok(Err(err)) => {
                metrics.record_task_failed(duration_ns);
                Failure::Error {
                    message: err.to_string(),
                }
            }
            Err(payload) => {
                metrics.record_task_panic(duration_ns);
                Failure::from_panic(payload)
            }
        };

        tracing::debug!(thread = thread_name, ?failure, "task failure contained");

        self.reporter.report(&FailureReport {
            thread_name: thread_name.to_string(),
            task_label,
            failure: failure.clone(),
        });

        Err(failure)
    }
}
