pub use crate::config::{Config, ConfigBuilder, UnjoinedPolicy};
pub use crate::error::{Error, Result};
pub use crate::executor::{ManagedThread, Runnable, Task, TaskResult, ThreadState};
pub use crate::scope::{scope, scope_with_config};
pub use crate::sync::{MapMonitor, Monitor, Mutex, ScopedLock};
