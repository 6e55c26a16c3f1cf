//! Per-stage execution contract shared by the scraper and rag stages.

use async_trait::async_trait;
use thiserror::Error;

use crate::broker::BrokerError;
use crate::domain::Task;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("invalid task params: {0}")]
    InvalidParams(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("store failed: {0}")]
    Store(String),

    #[error("embedder failed: {0}")]
    Embed(String),
}

/// `Execute(task)` for one stage (scraper or rag). `Cleanup` is not part of
/// this trait: both stages' cleanup is `SetProcessed(topic, task)` with no
/// stage-specific behavior, so [`crate::worker::WorkerPool`] performs it
/// directly against the broker (spec §4.2–§4.4).
#[async_trait]
pub trait Stage: Send + Sync {
    async fn execute(&self, task: &Task) -> Result<(), StageError>;
}

/// Fatal errors surfaced by a pool's dispatcher or a worker — always broker
/// communication failures (spec §7: "Broker unavailability ... fatal").
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("dispatcher terminated: {0}")]
    Dispatcher(#[source] BrokerError),

    #[error("worker terminated: {0}")]
    Worker(#[source] BrokerError),
}
