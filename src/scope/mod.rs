//! Scoped threads: contained tasks that may borrow from the caller's stack.

#[allow(clippy::module_inception)]
mod scope;

pub use scope::{scope, scope_with_config, Scope, ScopedThread};
