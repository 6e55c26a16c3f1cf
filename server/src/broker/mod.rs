//! Task Broker Client (C1): a durable, at-least-once, multi-topic task queue
//! with explicit pending → processing → done transitions (spec §4.1).

mod error;
mod memory;
mod redis;

use std::time::Duration;

use async_trait::async_trait;

pub use error::BrokerError;
pub use memory::MemoryBroker;
pub use redis::RedisBroker;

use crate::domain::{StoredError, Task, Topic};

/// Broker-agnostic contract; the reference backing (`RedisBroker`) is a list
/// store supporting atomic list ops. `MemoryBroker` backs the same contract
/// for tests.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Append `task`'s canonical form to `topic`.
    async fn create_task(&self, topic: Topic, task: &Task) -> Result<(), BrokerError>;

    /// Atomic variadic append; order preserved.
    async fn create_tasks(&self, topic: Topic, tasks: &[Task]) -> Result<(), BrokerError>;

    /// Block until the head of `topic` is available or `timeout` elapses.
    /// Non-claiming: the task is gone from the broker on return.
    async fn get_task(&self, topic: Topic, timeout: Duration) -> Result<Task, BrokerError>;

    /// Atomically move the tail-most pending task to the head of
    /// `processing_<topic>` and return it. The claim primitive.
    async fn get_task_and_set_processing(
        &self,
        topic: Topic,
        timeout: Duration,
    ) -> Result<Task, BrokerError>;

    /// Remove one occurrence of `task` from `processing_<topic>` by value match.
    async fn set_processed(&self, topic: Topic, task: &Task) -> Result<(), BrokerError>;

    /// Append a [`StoredError`] to the global error log.
    async fn store_error(
        &self,
        topic: Topic,
        task: Option<Task>,
        error: &str,
    ) -> Result<(), BrokerError>;

    async fn num_tasks(&self, topic: Topic) -> Result<i64, BrokerError>;

    async fn num_processing_tasks(&self, topic: Topic) -> Result<i64, BrokerError>;

    /// Read the full error log. `topic` is accepted but unused — see DESIGN.md.
    async fn get_errors(&self, topic: Topic) -> Result<Vec<StoredError>, BrokerError>;
}
