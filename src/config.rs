use crate::error::{Error, Result};
use crate::executor::report::{Reporter, StderrReporter};
use std::sync::Arc;

/// Smallest stack a managed thread may be configured with.
pub const MIN_STACK_SIZE: usize = 16 * 1024;

/// What happens when a [`ManagedThread`](crate::ManagedThread) that is still
/// running is dropped without having been joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnjoinedPolicy {
    /// Panic with a "must be joined" message. Aborts if already unwinding.
    #[default]
    Panic,
    /// Write a diagnostic line and abort the process.
    Abort,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub thread_name_prefix: String,
    pub stack_size: Option<usize>,
    pub unjoined_policy: UnjoinedPolicy,
    pub reporter: Arc<dyn Reporter>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thread_name_prefix: "managed".to_string(),
            stack_size: Some(2 * 1024 * 1024),
            unjoined_policy: UnjoinedPolicy::default(),
            reporter: Arc::new(StderrReporter),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if self.thread_name_prefix.is_empty() {
            return Err(Error::config("thread_name_prefix must not be empty"));
        }
        if self.thread_name_prefix.contains('\0') {
            return Err(Error::config("thread_name_prefix must not contain NUL"));
        }

        if let Some(size) = self.stack_size {
            if size < MIN_STACK_SIZE {
                return Err(Error::config(format!(
                    "stack_size too small (min {} bytes)",
                    MIN_STACK_SIZE
                )));
            }
        }

        Ok(())
    }

    pub(crate) fn thread_name(&self, id: u64) -> String {
        format!("{}-{}", self.thread_name_prefix, id)
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Use the platform default stack size.
    pub fn default_stack_size(mut self) -> Self {
        self.config.stack_size = None;
        self
    }

    pub fn unjoined_policy(mut self, policy: UnjoinedPolicy) -> Self {
        self.config.unjoined_policy = policy;
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.config.reporter = reporter;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::report::CapturingReporter;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.unjoined_policy, UnjoinedPolicy::Panic);
        assert_eq!(config.thread_name(3), "managed-3");
    }

    #[test]
    fn test_builder_rejects_bad_values() {
        assert!(Config::builder().thread_name_prefix("").build().is_err());
        assert!(Config::builder().thread_name_prefix("a\0b").build().is_err());
        assert!(Config::builder().stack_size(1024).build().is_err());
    }

    #[test]
    fn test_builder_overrides() {
        let reporter = Arc::new(CapturingReporter::new());
        let config = Config::builder()
            .thread_name_prefix("printer")
            .default_stack_size()
            .unjoined_policy(UnjoinedPolicy::Abort)
            .reporter(reporter)
            .build()
            .unwrap();

        assert_eq!(config.thread_name_prefix, "printer");
        assert_eq!(config.stack_size, None);
        assert_eq!(config.unjoined_policy, UnjoinedPolicy::Abort);
    }
}
