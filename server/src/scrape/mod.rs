//! Scraper Stage (C8 + C2 + C3): fetch a page's `<main>` subtree, convert it
//! to markdown and plaintext, and enqueue a rag task (spec §4.3).

mod fetcher;
mod markdown;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::broker::Broker;
use crate::core::constants::CREATED_BY_ADMISSION;
use crate::domain::{RagParams, Task, TaskParams, Topic};
use crate::worker::{Stage, StageError};

pub use fetcher::{FetchError, Fetcher};
pub use markdown::{to_markdown, to_plaintext, MarkdownError};

pub struct ScrapeStage {
    broker: Arc<dyn Broker>,
    fetcher: Fetcher,
}

impl ScrapeStage {
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self {
            broker,
            fetcher: Fetcher::new(),
        }
    }
}

#[async_trait]
impl Stage for ScrapeStage {
    async fn execute(&self, task: &Task) -> Result<(), StageError> {
        let params = task
            .params
            .as_scrape()
            .ok_or_else(|| StageError::InvalidParams("task is not a scrape task".to_string()))?;
        if params.url.is_empty() {
            return Err(StageError::InvalidParams("empty url".to_string()));
        }

        let subtree = self
            .fetcher
            .fetch_main_subtree(&params.url)
            .await
            .map_err(|e| StageError::Fetch(e.to_string()))?;

        if subtree.is_empty() {
            info!(url = %params.url, "no <main> element found, skipping downstream rag task");
            return Ok(());
        }

        let md = to_markdown(&subtree).map_err(|e| StageError::Fetch(e.to_string()))?;
        let text = to_plaintext(&subtree);

        let rag_task = Task::new(
            Uuid::new_v4().to_string(),
            CREATED_BY_ADMISSION,
            TaskParams::Rag(RagParams {
                markdown: md,
                url: params.url.clone(),
                text,
            }),
        );

        self.broker
            .create_task(Topic::Rag, &rag_task)
            .await
            .map_err(|e| StageError::Fetch(e.to_string()))?;

        Ok(())
    }
}
