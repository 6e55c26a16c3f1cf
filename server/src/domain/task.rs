//! `Task`, `Topic`, and `StoredError` — the broker's wire-level data model.
//!
//! The source system bridges a loose `params: map[string]any` to a typed shape
//! via dynamic JSON re-decoding at stage entry. Here `params` is instead a
//! tagged sum over the two known shapes (§9 design note), decoded once at
//! deserialization time. `SetProcessed` matches by full string equality, so
//! every `Task` must serialize identically given identical field values —
//! `#[serde(untagged)]` plus fixed struct field order gives that for free,
//! without needing to hand-sort a map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A logical queue. `urls` (scrape stage) and `rag` (rag stage); each has an
/// implicit companion `processing_<topic>` shadow list (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Urls,
    Rag,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Urls => "urls",
            Topic::Rag => "rag",
        }
    }

    pub fn processing_key(&self) -> String {
        format!("processing_{}", self.as_str())
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Params for a `urls`-topic task.
///
/// `deny_unknown_fields` matters here: `TaskParams` is `#[serde(untagged)]`
/// and tries this variant first, so without it a `RagParams` payload would
/// wrongly deserialize as `Scrape` (its extra fields silently ignored).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScrapeParams {
    pub url: String,
}

/// Params for a `rag`-topic task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagParams {
    pub markdown: String,
    pub url: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskParams {
    Scrape(ScrapeParams),
    Rag(RagParams),
}

impl TaskParams {
    pub fn as_scrape(&self) -> Option<&ScrapeParams> {
        match self {
            TaskParams::Scrape(p) => Some(p),
            TaskParams::Rag(_) => None,
        }
    }

    pub fn as_rag(&self) -> Option<&RagParams> {
        match self {
            TaskParams::Rag(p) => Some(p),
            TaskParams::Scrape(_) => None,
        }
    }
}

/// The unit of work on the queue (spec §3). Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(rename = "created_by")]
    pub created_by: String,
    pub params: TaskParams,
}

#[derive(Debug, Error)]
pub enum CanonicalizeError {
    #[error("failed to serialize task: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Task {
    pub fn new(id: impl Into<String>, created_by: impl Into<String>, params: TaskParams) -> Self {
        Self {
            id: id.into(),
            created_by: created_by.into(),
            params,
        }
    }

    /// The canonical wire form used as both broker payload and ack key.
    /// Byte-identical for byte-identical field values (spec §4.1).
    pub fn canonical(&self) -> Result<String, CanonicalizeError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_canonical(raw: &str) -> Result<Self, CanonicalizeError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Record of a failed task execution, appended to the global error log
/// (spec §3). Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredError {
    pub error: String,
    pub task: Option<Task>,
    pub topic: String,
    pub created: DateTime<Utc>,
}

impl StoredError {
    pub fn new(error: impl Into<String>, task: Option<Task>, topic: Topic) -> Self {
        Self {
            error: error.into(),
            task,
            topic: topic.as_str().to_string(),
            created: Utc::now(),
        }
    }
}
