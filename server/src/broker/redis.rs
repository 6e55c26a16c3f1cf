//! Redis-backed [`Broker`] — the reference backing for the task queue.
//!
//! List orientation follows the source system exactly: `CreateTask*` push to
//! the tail (`RPUSH`), `get_task` blocks on the head (`BLPOP`), and the claim
//! primitive moves the tail-most pending entry to the head of the processing
//! list (`BRPOPLPUSH`) — see spec §4.1 and DESIGN.md.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, PoolConfig, Runtime, Timeouts, redis::AsyncCommands};

use super::{Broker, BrokerError};
use crate::domain::{StoredError, Task, Topic};

const ERROR_LOG_KEY: &str = "errors";
const POOL_MAX_SIZE: usize = 16;
const POOL_TIMEOUT_SECS: u64 = 5;

pub struct RedisBroker {
    pool: Pool,
}

impl RedisBroker {
    pub async fn new(url: &str) -> Result<Self, BrokerError> {
        let mut cfg = Config::from_url(url);
        let timeout = Duration::from_secs(POOL_TIMEOUT_SECS);
        cfg.pool = Some(PoolConfig {
            max_size: POOL_MAX_SIZE,
            timeouts: Timeouts {
                wait: Some(timeout),
                create: Some(timeout),
                recycle: Some(timeout),
            },
            ..Default::default()
        });

        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;

        {
            let mut conn = pool.get().await?;
            let _: String = deadpool_redis::redis::cmd("PING")
                .query_async(&mut conn)
                .await?;
        }

        tracing::debug!(address = %sanitize_redis_url(url), "Redis broker connected");
        Ok(Self { pool })
    }
}

/// Mask any embedded password before the URL is logged.
fn sanitize_redis_url(url: &str) -> String {
    match url.rfind('@') {
        Some(at_idx) => match url[..at_idx].rfind(':') {
            Some(colon_idx) if colon_idx > url.find("://").map(|i| i + 2).unwrap_or(0) => {
                format!("{}:***{}", &url[..colon_idx], &url[at_idx..])
            }
            _ => url.to_string(),
        },
        None => url.to_string(),
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn create_task(&self, topic: Topic, task: &Task) -> Result<(), BrokerError> {
        let mut conn = self.pool.get().await?;
        let payload = task.canonical()?;
        let _: i64 = conn.rpush(topic.as_str(), payload).await?;
        Ok(())
    }

    async fn create_tasks(&self, topic: Topic, tasks: &[Task]) -> Result<(), BrokerError> {
        let mut conn = self.pool.get().await?;
        let payloads = tasks
            .iter()
            .map(Task::canonical)
            .collect::<Result<Vec<_>, _>>()?;
        let _: i64 = conn.rpush(topic.as_str(), payloads).await?;
        Ok(())
    }

    async fn get_task(&self, topic: Topic, timeout: Duration) -> Result<Task, BrokerError> {
        let mut conn = self.pool.get().await?;
        let result: Option<(String, String)> = conn.blpop(topic.as_str(), timeout.as_secs_f64()).await?;
        match result {
            Some((_, raw)) => Ok(Task::from_canonical(&raw)?),
            None => Err(BrokerError::NoTasksToComplete),
        }
    }

    async fn get_task_and_set_processing(
        &self,
        topic: Topic,
        timeout: Duration,
    ) -> Result<Task, BrokerError> {
        let mut conn = self.pool.get().await?;
        let processing = topic.processing_key();
        let result: Option<String> = conn
            .brpoplpush(topic.as_str(), &processing, timeout.as_secs_f64())
            .await?;
        match result {
            Some(raw) => Ok(Task::from_canonical(&raw)?),
            None => Err(BrokerError::NoTasksToComplete),
        }
    }

    async fn set_processed(&self, topic: Topic, task: &Task) -> Result<(), BrokerError> {
        let mut conn = self.pool.get().await?;
        let processing = topic.processing_key();
        let payload = task.canonical()?;
        let removed: i64 = conn.lrem(&processing, 1, payload).await?;
        if removed == 0 {
            return Err(BrokerError::NoTasksCompleted);
        }
        Ok(())
    }

    async fn store_error(
        &self,
        topic: Topic,
        task: Option<Task>,
        error: &str,
    ) -> Result<(), BrokerError> {
        let mut conn = self.pool.get().await?;
        let entry = StoredError::new(error, task, topic);
        let payload = serde_json::to_string(&entry).map_err(|e| {
            BrokerError::Config(format!("failed to serialize stored error: {e}"))
        })?;
        let _: i64 = conn.rpush(ERROR_LOG_KEY, payload).await?;
        Ok(())
    }

    async fn num_tasks(&self, topic: Topic) -> Result<i64, BrokerError> {
        let mut conn = self.pool.get().await?;
        Ok(conn.llen(topic.as_str()).await?)
    }

    async fn num_processing_tasks(&self, topic: Topic) -> Result<i64, BrokerError> {
        let mut conn = self.pool.get().await?;
        Ok(conn.llen(topic.processing_key()).await?)
    }

    async fn get_errors(&self, _topic: Topic) -> Result<Vec<StoredError>, BrokerError> {
        let mut conn = self.pool.get().await?;
        let raw: Vec<String> = conn.lrange(ERROR_LOG_KEY, 0, -1).await?;
        raw.into_iter()
            .map(|s| {
                serde_json::from_str(&s)
                    .map_err(|e| BrokerError::Config(format!("corrupt error log entry: {e}")))
            })
            .collect()
    }
}
