//! Worker Pool (C8): one dispatcher + N workers per stage, communicating
//! through a single task channel and a shared stop signal (spec §4.2).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;

use super::stage::{PoolError, Stage};
use crate::broker::{Broker, BrokerError};
use crate::core::constants::CLAIM_TIMEOUT_SECS;
use crate::domain::Topic;

/// `mpsc::channel(1)` approximates the source system's unbuffered channel:
/// the dispatcher's `send` still blocks until a worker is ready to receive,
/// which is the natural-admission-control property spec §4.2 relies on; at
/// most one extra claimed task may sit in the channel ahead of that block,
/// which does not change any documented invariant.
const CHANNEL_CAPACITY: usize = 1;

pub struct WorkerPool {
    topic: Topic,
    broker: Arc<dyn Broker>,
    stage: Arc<dyn Stage>,
    concurrency: usize,
}

impl WorkerPool {
    pub fn new(
        topic: Topic,
        broker: Arc<dyn Broker>,
        stage: Arc<dyn Stage>,
        concurrency: usize,
    ) -> Self {
        Self {
            topic,
            broker,
            stage,
            concurrency,
        }
    }

    /// Spawn the dispatcher and `concurrency` workers. Returns their join
    /// handles (for [`crate::core::ShutdownService::register`]) and a
    /// receiver of fatal pool errors.
    pub fn start(
        self,
        stop: watch::Receiver<bool>,
    ) -> (Vec<JoinHandle<()>>, mpsc::UnboundedReceiver<PoolError>) {
        let (task_tx, task_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (err_tx, err_rx) = mpsc::unbounded_channel();
        let task_rx = Arc::new(Mutex::new(task_rx));

        let mut handles = Vec::with_capacity(self.concurrency + 1);

        handles.push(tokio::spawn(dispatcher_loop(
            self.topic,
            self.broker.clone(),
            task_tx,
            stop,
            err_tx.clone(),
        )));

        for _ in 0..self.concurrency {
            handles.push(tokio::spawn(worker_loop(
                self.topic,
                self.broker.clone(),
                self.stage.clone(),
                task_rx.clone(),
                err_tx.clone(),
            )));
        }

        (handles, err_rx)
    }
}

async fn dispatcher_loop(
    topic: Topic,
    broker: Arc<dyn Broker>,
    task_tx: mpsc::Sender<crate::domain::Task>,
    mut stop: watch::Receiver<bool>,
    err_tx: mpsc::UnboundedSender<PoolError>,
) {
    let timeout = Duration::from_secs(CLAIM_TIMEOUT_SECS);
    loop {
        if *stop.borrow() {
            tracing::debug!(topic = %topic, "Dispatcher stopping");
            return;
        }

        match broker.get_task_and_set_processing(topic, timeout).await {
            Ok(task) => {
                if task_tx.send(task).await.is_err() {
                    return;
                }
            }
            Err(BrokerError::NoTasksToComplete) => continue,
            Err(e) => {
                tracing::error!(topic = %topic, error = %e, "Dispatcher terminating");
                let _ = err_tx.send(PoolError::Dispatcher(e));
                return;
            }
        }
    }
}

async fn worker_loop(
    topic: Topic,
    broker: Arc<dyn Broker>,
    stage: Arc<dyn Stage>,
    task_rx: Arc<Mutex<mpsc::Receiver<crate::domain::Task>>>,
    err_tx: mpsc::UnboundedSender<PoolError>,
) {
    loop {
        let task = {
            let mut rx = task_rx.lock().await;
            rx.recv().await
        };

        let Some(task) = task else {
            return;
        };

        if let Err(exec_err) = stage.execute(&task).await {
            tracing::warn!(topic = %topic, task_id = %task.id, error = %exec_err, "Task execution failed");
            if let Err(store_err) = broker
                .store_error(topic, Some(task.clone()), &exec_err.to_string())
                .await
            {
                tracing::error!(topic = %topic, error = %store_err, "Worker terminating: store_error failed");
                let _ = err_tx.send(PoolError::Worker(store_err));
                return;
            }
        }

        if let Err(cleanup_err) = broker.set_processed(topic, &task).await {
            tracing::error!(topic = %topic, error = %cleanup_err, "Worker terminating: cleanup failed");
            let _ = err_tx.send(PoolError::Worker(cleanup_err));
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::MemoryBroker;
    use crate::domain::{ScrapeParams, Task, TaskParams};
    use crate::worker::stage::StageError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStage {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Stage for CountingStage {
        async fn execute(&self, _task: &Task) -> Result<(), StageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(StageError::InvalidParams("boom".to_string()))
            } else {
                Ok(())
            }
        }
    }

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
    async fn test_pool_drains_tasks_and_acks() {
        let broker: Arc<dyn Broker> = Arc::new(MemoryBroker::new());
        broker.create_task(Topic::Urls, &task("1")).await.unwrap();
        broker.create_task(Topic::Urls, &task("2")).await.unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let stage = Arc::new(CountingStage {
            calls: calls.clone(),
            fail: false,
        });

        let (stop_tx, stop_rx) = watch::channel(false);
        let pool = WorkerPool::new(Topic::Urls, broker.clone(), stage, 2);
        let (handles, _err_rx) = pool.start(stop_rx);

        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if calls.load(Ordering::SeqCst) == 2 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("tasks were not drained in time");

        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if broker.num_processing_tasks(Topic::Urls).await.unwrap() == 0 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("processing list did not drain");

        let _ = stop_tx.send(true);
        for handle in handles {
            let _ = tokio::time::timeout(Duration::from_secs(1), handle).await;
        }
    }

    #[tokio::test]
    async fn test_execute_failure_still_acks_via_cleanup() {
        let broker: Arc<dyn Broker> = Arc::new(MemoryBroker::new());
        broker.create_task(Topic::Rag, &task("1")).await.unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let stage = Arc::new(CountingStage {
            calls: calls.clone(),
            fail: true,
        });

        let (stop_tx, stop_rx) = watch::channel(false);
        let pool = WorkerPool::new(Topic::Rag, broker.clone(), stage, 1);
        let (handles, _err_rx) = pool.start(stop_rx);

        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if broker.num_processing_tasks(Topic::Rag).await.unwrap() == 0 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("processing list did not drain after failure");

        let errors = broker.get_errors(Topic::Rag).await.unwrap();
        assert_eq!(errors.len(), 1);

        let _ = stop_tx.send(true);
        for handle in handles {
            let _ = tokio::time::timeout(Duration::from_secs(1), handle).await;
        }
    }
}
