pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("thread already started")]
    AlreadyStarted,

    #[error("thread not started")]
    NotStarted,

    #[error("thread already joined")]
    AlreadyJoined,

    #[error("mutex released while not held")]
    NotHeld,

    #[error("mutex released by a thread that does not hold it")]
    NotHolder,

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("spawn failed: {0}")]
    Spawn(#[source] std::io::Error),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn key_not_found<K: std::fmt::Debug + ?Sized>(key: &K) -> Self {
        Error::KeyNotFound(format!("{:?}", key))
    }

    /// Programmer mistakes, as opposed to environment failures.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Error::AlreadyStarted
                | Error::NotStarted
                | Error::AlreadyJoined
                | Error::NotHeld
                | Error::NotHolder
                | Error::KeyNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_classification() {
        assert!(Error::AlreadyJoined.is_usage());
        assert!(Error::NotHolder.is_usage());
        assert!(Error::key_not_found(&7).is_usage());
        assert!(!Error::config("bad").is_usage());

        let io = std::io::Error::new(std::io::ErrorKind::Other, "no threads left");
        assert!(!Error::Spawn(io).is_usage());
    }

    #[test]
    fn test_key_not_found_message() {
        let err = Error::key_not_found("missing");
        assert_eq!(err.to_string(), "key not found: \"missing\"");
    }
}
