//! Critical sections: the raw lock, its RAII guard, and monitors built on it.

pub mod map;
pub mod monitor;
pub mod mutex;

pub use map::{MapMonitor, ProtectedMap};
pub use monitor::Monitor;
pub use mutex::{Mutex, ScopedLock};
