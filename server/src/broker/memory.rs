//! In-memory [`Broker`] double, used by tests and by local runs without a
//! live Redis instance. Mirrors [`RedisBroker`]'s list semantics exactly so
//! behavioral tests can run against either backend.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{Broker, BrokerError};
use crate::domain::{StoredError, Task, Topic};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Default)]
struct Lists {
    queues: HashMap<String, VecDeque<String>>,
    errors: Vec<StoredError>,
}

pub struct MemoryBroker {
    inner: Mutex<Lists>,
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Lists::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Lists> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn create_task(&self, topic: Topic, task: &Task) -> Result<(), BrokerError> {
        let payload = task.canonical()?;
        self.lock()
            .queues
            .entry(topic.as_str().to_string())
            .or_default()
            .push_back(payload);
        Ok(())
    }

    async fn create_tasks(&self, topic: Topic, tasks: &[Task]) -> Result<(), BrokerError> {
        let payloads = tasks
            .iter()
            .map(Task::canonical)
            .collect::<Result<Vec<_>, _>>()?;
        let mut guard = self.lock();
        let queue = guard.queues.entry(topic.as_str().to_string()).or_default();
        for payload in payloads {
            queue.push_back(payload);
        }
        Ok(())
    }

    async fn get_task(&self, topic: Topic, timeout: Duration) -> Result<Task, BrokerError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(raw) = self
                .lock()
                .queues
                .entry(topic.as_str().to_string())
                .or_default()
                .pop_front()
            {
                return Ok(Task::from_canonical(&raw)?);
            }
            if Instant::now() >= deadline {
                return Err(BrokerError::NoTasksToComplete);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn get_task_and_set_processing(
        &self,
        topic: Topic,
        timeout: Duration,
    ) -> Result<Task, BrokerError> {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let mut guard = self.lock();
                let popped = guard
                    .queues
                    .entry(topic.as_str().to_string())
                    .or_default()
                    .pop_back();
                if let Some(raw) = popped {
                    guard
                        .queues
                        .entry(topic.processing_key())
                        .or_default()
                        .push_front(raw.clone());
                    return Ok(Task::from_canonical(&raw)?);
                }
            }
            if Instant::now() >= deadline {
                return Err(BrokerError::NoTasksToComplete);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn set_processed(&self, topic: Topic, task: &Task) -> Result<(), BrokerError> {
        let payload = task.canonical()?;
        let mut guard = self.lock();
        let queue = guard
            .queues
            .entry(topic.processing_key())
            .or_default();
        match queue.iter().position(|v| v == &payload) {
            Some(idx) => {
                queue.remove(idx);
                Ok(())
            }
            None => Err(BrokerError::NoTasksCompleted),
        }
    }

    async fn store_error(
        &self,
        topic: Topic,
        task: Option<Task>,
        error: &str,
    ) -> Result<(), BrokerError> {
        self.lock()
            .errors
            .push(StoredError::new(error, task, topic));
        Ok(())
    }

    async fn num_tasks(&self, topic: Topic) -> Result<i64, BrokerError> {
        Ok(self
            .lock()
            .queues
            .get(topic.as_str())
            .map(VecDeque::len)
            .unwrap_or(0) as i64)
    }

    async fn num_processing_tasks(&self, topic: Topic) -> Result<i64, BrokerError> {
        Ok(self
            .lock()
            .queues
            .get(&topic.processing_key())
            .map(VecDeque::len)
            .unwrap_or(0) as i64)
    }

    async fn get_errors(&self, _topic: Topic) -> Result<Vec<StoredError>, BrokerError> {
        Ok(self.lock().errors.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScrapeParams, TaskParams};

    fn task(id: &str) -> Task {
        Task::new(
            id,
            "test",
            TaskParams::Scrape(ScrapeParams {
                url: "https://example.com".to_string(),
            }),
        )
    }

    #[tokio::test]
    async fn test_create_and_claim_round_trip() {
        let broker = MemoryBroker::new();
        broker.create_task(Topic::Urls, &task("1")).await.unwrap();
        assert_eq!(broker.num_tasks(Topic::Urls).await.unwrap(), 1);

        let claimed = broker
            .get_task_and_set_processing(Topic::Urls, Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(claimed.id, "1");
        assert_eq!(broker.num_tasks(Topic::Urls).await.unwrap(), 0);
        assert_eq!(broker.num_processing_tasks(Topic::Urls).await.unwrap(), 1);

        broker.set_processed(Topic::Urls, &claimed).await.unwrap();
        assert_eq!(broker.num_processing_tasks(Topic::Urls).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_set_processed_twice_fails_second_time() {
        let broker = MemoryBroker::new();
        broker.create_task(Topic::Urls, &task("1")).await.unwrap();
        let claimed = broker
            .get_task_and_set_processing(Topic::Urls, Duration::from_millis(50))
            .await
            .unwrap();
        broker.set_processed(Topic::Urls, &claimed).await.unwrap();
        let err = broker
            .set_processed(Topic::Urls, &claimed)
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::NoTasksCompleted));
    }

    #[tokio::test]
    async fn test_set_processed_never_claimed_fails() {
        let broker = MemoryBroker::new();
        let err = broker.set_processed(Topic::Urls, &task("1")).await.unwrap_err();
        assert!(matches!(err, BrokerError::NoTasksCompleted));
    }

    #[tokio::test]
    async fn test_claim_times_out_when_empty() {
        let broker = MemoryBroker::new();
        let err = broker
            .get_task_and_set_processing(Topic::Urls, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::NoTasksToComplete));
    }

    #[tokio::test]
    async fn test_create_tasks_preserves_order() {
        let broker = MemoryBroker::new();
        broker
            .create_tasks(Topic::Urls, &[task("1"), task("2"), task("3")])
            .await
            .unwrap();
        let first = broker
            .get_task(Topic::Urls, Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(first.id, "1");
    }

    #[tokio::test]
    async fn test_store_error_and_get_errors() {
        let broker = MemoryBroker::new();
        broker
            .store_error(Topic::Rag, Some(task("1")), "boom")
            .await
            .unwrap();
        let errors = broker.get_errors(Topic::Urls).await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error, "boom");
        assert_eq!(errors[0].topic, "rag");
    }
}
