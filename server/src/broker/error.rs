//! Broker error taxonomy.

use thiserror::Error;

use crate::domain::CanonicalizeError;

#[derive(Debug, Error)]
pub enum BrokerError {
    /// `GetTask`/`GetTaskAndSetProcessing` hit the claim timeout with nothing
    /// to claim. Not a failure — the dispatcher treats this as an idle tick.
    #[error("no tasks to complete")]
    NoTasksToComplete,

    /// `SetProcessed` found no matching entry on the processing list.
    #[error("no tasks completed")]
    NoTasksCompleted,

    #[error("task serialization failed: {0}")]
    Serialize(#[from] CanonicalizeError),

    #[error("redis error: {0}")]
    Redis(#[from] deadpool_redis::redis::RedisError),

    #[error("redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error("redis pool config error: {0}")]
    PoolConfig(#[from] deadpool_redis::CreatePoolError),

    #[error("broker config error: {0}")]
    Config(String),
}

impl BrokerError {
    /// All errors except [`BrokerError::NoTasksToComplete`] and
    /// [`BrokerError::NoTasksCompleted`] are fatal to the worker loop (spec §4.1, §7).
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            BrokerError::NoTasksToComplete | BrokerError::NoTasksCompleted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_errors_are_not_fatal() {
        assert!(!BrokerError::NoTasksToComplete.is_fatal());
        assert!(!BrokerError::NoTasksCompleted.is_fatal());
    }

    #[test]
    fn test_config_error_is_fatal() {
        assert!(BrokerError::Config("boom".to_string()).is_fatal());
    }
}
