//! Core data model shared by the broker, worker pools, and stage logic:
//! `Task`, `Topic`, and `StoredError` (spec §3).

mod task;

pub use task::{
    CanonicalizeError, RagParams, ScrapeParams, StoredError, Task, TaskParams, Topic,
};
