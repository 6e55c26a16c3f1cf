//! `POST /scrape-rag-task` and `GET /tasks-status` (spec §4.9).

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ApiError;
use crate::broker::Broker;
use crate::core::constants::{CREATED_BY_ADMISSION, MAX_URLS_PER_BATCH, MIN_URLS_PER_BATCH};
use crate::domain::{ScrapeParams, Task, TaskParams, Topic};
use crate::utils::format_url;

#[derive(Clone)]
pub struct TasksState {
    pub broker: Arc<dyn Broker>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTasksRequest {
    pub urls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedTaskEntry {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateTasksResponse {
    pub created_tasks: Vec<CreatedTaskEntry>,
}

pub async fn create_tasks(
    State(state): State<TasksState>,
    Json(body): Json<CreateTasksRequest>,
) -> Result<Json<CreateTasksResponse>, ApiError> {
    if body.urls.len() < MIN_URLS_PER_BATCH {
        return Err(ApiError::BadRequest("No URLs provided".to_string()));
    }
    if body.urls.len() > MAX_URLS_PER_BATCH {
        return Err(ApiError::BadRequest(format!(
            "Maximum number of URLs is {MAX_URLS_PER_BATCH}"
        )));
    }

    let mut entries = Vec::with_capacity(body.urls.len());
    let mut valid_tasks = Vec::new();

    for raw_url in body.urls {
        match format_url(&raw_url) {
            Ok(url) => {
                let task = Task::new(
                    Uuid::new_v4().to_string(),
                    CREATED_BY_ADMISSION,
                    TaskParams::Scrape(ScrapeParams { url: url.clone() }),
                );
                entries.push(CreatedTaskEntry {
                    url,
                    id: Some(task.id.clone()),
                    error: None,
                });
                valid_tasks.push(task);
            }
            Err(e) => entries.push(CreatedTaskEntry {
                url: raw_url,
                id: None,
                error: Some(e.to_string()),
            }),
        }
    }

    if !valid_tasks.is_empty() {
        state.broker.create_tasks(Topic::Urls, &valid_tasks).await?;
    }

    Ok(Json(CreateTasksResponse {
        created_tasks: entries,
    }))
}

#[derive(Debug, Serialize)]
pub struct ErrorEntry {
    pub task_id: Option<String>,
    pub error: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub topic: String,
}

#[derive(Debug, Serialize)]
pub struct TasksStatusResponse {
    pub num_urls_tasks: i64,
    pub num_processing_url_tasks: i64,
    pub num_rag_tasks: i64,
    pub num_processing_rag_tasks: i64,
    pub errors: Vec<ErrorEntry>,
}

pub async fn tasks_status(
    State(state): State<TasksState>,
) -> Result<Json<TasksStatusResponse>, ApiError> {
    let broker = &state.broker;

    let num_urls_tasks = broker.num_tasks(Topic::Urls).await?;
    let num_processing_url_tasks = broker.num_processing_tasks(Topic::Urls).await?;
    let num_rag_tasks = broker.num_tasks(Topic::Rag).await?;
    let num_processing_rag_tasks = broker.num_processing_tasks(Topic::Rag).await?;
    let stored_errors = broker.get_errors(Topic::Urls).await?;

    let errors = stored_errors
        .into_iter()
        .map(|e| ErrorEntry {
            task_id: e.task.map(|t| t.id),
            error: e.error,
            created_at: e.created,
            topic: e.topic,
        })
        .collect();

    Ok(Json(TasksStatusResponse {
        num_urls_tasks,
        num_processing_url_tasks,
        num_rag_tasks,
        num_processing_rag_tasks,
        errors,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::MemoryBroker;

    #[tokio::test]
    async fn test_rejects_empty_batch() {
        let state = TasksState {
            broker: Arc::new(MemoryBroker::new()),
        };
        let result = create_tasks(State(state), Json(CreateTasksRequest { urls: vec![] })).await;
        match result {
            Err(ApiError::BadRequest(msg)) => assert_eq!(msg, "No URLs provided"),
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejects_oversize_batch() {
        let state = TasksState {
            broker: Arc::new(MemoryBroker::new()),
        };
        let urls = (0..MAX_URLS_PER_BATCH + 1)
            .map(|i| format!("example{i}.com"))
            .collect();
        let result = create_tasks(State(state), Json(CreateTasksRequest { urls })).await;
        match result {
            Err(ApiError::BadRequest(msg)) => assert_eq!(msg, "Maximum number of URLs is 500"),
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_url_does_not_abort_batch() {
        let state = TasksState {
            broker: Arc::new(MemoryBroker::new()),
        };
        let urls = vec!["https://".to_string(), "example.com".to_string()];
        let Json(response) = create_tasks(State(state), Json(CreateTasksRequest { urls }))
            .await
            .unwrap();

        assert_eq!(response.created_tasks.len(), 2);
        assert!(response.created_tasks[0].error.is_some());
        assert!(response.created_tasks[1].id.is_some());
    }

    #[tokio::test]
    async fn test_status_reflects_created_tasks() {
        let broker = Arc::new(MemoryBroker::new());
        let state = TasksState {
            broker: broker.clone(),
        };
        create_tasks(
            State(state.clone()),
            Json(CreateTasksRequest {
                urls: vec!["example.com".to_string()],
            }),
        )
        .await
        .unwrap();

        let Json(status) = tasks_status(State(state)).await.unwrap();
        assert_eq!(status.num_urls_tasks, 1);
        assert_eq!(status.num_processing_url_tasks, 0);
    }
}
