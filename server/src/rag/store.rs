//! Record Store (C7): persists rag sources, chunks, and contacts. Two
//! backings share one contract: an in-memory store for tests and local runs,
//! and a PostgreSQL store (`sqlx`) for durable deployments (spec §4.4 steps
//! 2, 6, 7; §3).

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

use crate::rag::contacts::ContactType;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("record {id} not found in {table}")]
    NotFound { table: &'static str, id: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagSource {
    pub id: i64,
    pub url: String,
    #[serde(rename = "type")]
    pub source_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagChunk {
    pub id: i64,
    pub rag_source_id: i64,
    pub pos_in_source: i64,
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagContact {
    pub id: i64,
    pub rag_source_id: i64,
    pub pos_in_source: i64,
    pub contact: String,
    pub context: String,
    pub contact_type: String,
    pub embedding: Vec<f32>,
}

pub const SOURCE_TYPE_WEBSITE: &str = "WEBSITE";

/// Random IDs in `[1, 1_000_000]` for the in-memory backend, mirroring the
/// id-assignment the Postgres backend gets for free from `SERIAL`/`BIGSERIAL`
/// columns.
fn random_id() -> i64 {
    rand::thread_rng().gen_range(1..=1_000_000)
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn store_source(&self, url: String) -> Result<RagSource, StoreError>;
    async fn store_chunks(&self, chunks: Vec<RagChunk>) -> Result<Vec<RagChunk>, StoreError>;
    async fn store_contacts(&self, contacts: Vec<RagContact>) -> Result<Vec<RagContact>, StoreError>;

    /// `Get(rag_sources, id)` from the original's reflective contract.
    async fn get_source(&self, id: i64) -> Result<RagSource, StoreError>;
    /// `GetAll(rag_chunks, rag_source_id = ...)`.
    async fn get_chunks(&self, rag_source_id: i64) -> Result<Vec<RagChunk>, StoreError>;
    /// `GetAll(rag_contacts, rag_source_id = ...)`.
    async fn get_contacts(&self, rag_source_id: i64) -> Result<Vec<RagContact>, StoreError>;
}

#[derive(Default)]
struct Tables {
    sources: HashMap<i64, RagSource>,
    chunks: HashMap<i64, RagChunk>,
    contacts: HashMap<i64, RagContact>,
}

pub struct MemoryStore {
    inner: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Tables::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn store_source(&self, url: String) -> Result<RagSource, StoreError> {
        let source = RagSource {
            id: random_id(),
            url,
            source_type: SOURCE_TYPE_WEBSITE.to_string(),
        };
        let mut tables = self.inner.write().expect("rag store lock poisoned");
        tables.sources.insert(source.id, source.clone());
        Ok(source)
    }

    async fn store_chunks(&self, chunks: Vec<RagChunk>) -> Result<Vec<RagChunk>, StoreError> {
        let mut tables = self.inner.write().expect("rag store lock poisoned");
        let mut stored = Vec::with_capacity(chunks.len());
        for mut chunk in chunks {
            chunk.id = random_id();
            tables.chunks.insert(chunk.id, chunk.clone());
            stored.push(chunk);
        }
        Ok(stored)
    }

    async fn store_contacts(&self, contacts: Vec<RagContact>) -> Result<Vec<RagContact>, StoreError> {
        let mut tables = self.inner.write().expect("rag store lock poisoned");
        let mut stored = Vec::with_capacity(contacts.len());
        for mut contact in contacts {
            contact.id = random_id();
            tables.contacts.insert(contact.id, contact.clone());
            stored.push(contact);
        }
        Ok(stored)
    }

    async fn get_source(&self, id: i64) -> Result<RagSource, StoreError> {
        let tables = self.inner.read().expect("rag store lock poisoned");
        tables
            .sources
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                table: "rag_sources",
                id: id.to_string(),
            })
    }

    async fn get_chunks(&self, rag_source_id: i64) -> Result<Vec<RagChunk>, StoreError> {
        let tables = self.inner.read().expect("rag store lock poisoned");
        Ok(tables
            .chunks
            .values()
            .filter(|c| c.rag_source_id == rag_source_id)
            .cloned()
            .collect())
    }

    async fn get_contacts(&self, rag_source_id: i64) -> Result<Vec<RagContact>, StoreError> {
        let tables = self.inner.read().expect("rag store lock poisoned");
        Ok(tables
            .contacts
            .values()
            .filter(|c| c.rag_source_id == rag_source_id)
            .cloned()
            .collect())
    }
}

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    async fn store_source(&self, url: String) -> Result<RagSource, StoreError> {
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO rag_sources (url, type) VALUES ($1, $2) RETURNING id",
        )
        .bind(&url)
        .bind(SOURCE_TYPE_WEBSITE)
        .fetch_one(&self.pool)
        .await?;

        Ok(RagSource {
            id: row.0,
            url,
            source_type: SOURCE_TYPE_WEBSITE.to_string(),
        })
    }

    async fn store_chunks(&self, chunks: Vec<RagChunk>) -> Result<Vec<RagChunk>, StoreError> {
        let mut stored = Vec::with_capacity(chunks.len());
        for mut chunk in chunks {
            let row: (i64,) = sqlx::query_as(
                r#"INSERT INTO rag_chunks (rag_source_id, pos_in_source, text, embedding)
                   VALUES ($1, $2, $3, $4) RETURNING id"#,
            )
            .bind(chunk.rag_source_id)
            .bind(chunk.pos_in_source)
            .bind(&chunk.text)
            .bind(&chunk.embedding)
            .fetch_one(&self.pool)
            .await?;
            chunk.id = row.0;
            stored.push(chunk);
        }
        Ok(stored)
    }

    async fn get_source(&self, id: i64) -> Result<RagSource, StoreError> {
        sqlx::query_as::<_, (i64, String, String)>(
            "SELECT id, url, type FROM rag_sources WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(|(id, url, source_type)| RagSource { id, url, source_type })
        .ok_or(StoreError::NotFound {
            table: "rag_sources",
            id: id.to_string(),
        })
    }

    async fn get_chunks(&self, rag_source_id: i64) -> Result<Vec<RagChunk>, StoreError> {
        let rows: Vec<(i64, i64, i64, String, Vec<f32>)> = sqlx::query_as(
            r#"SELECT id, rag_source_id, pos_in_source, text, embedding
               FROM rag_chunks WHERE rag_source_id = $1 ORDER BY pos_in_source"#,
        )
        .bind(rag_source_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, rag_source_id, pos_in_source, text, embedding)| RagChunk {
                id,
                rag_source_id,
                pos_in_source,
                text,
                embedding,
            })
            .collect())
    }

    async fn get_contacts(&self, rag_source_id: i64) -> Result<Vec<RagContact>, StoreError> {
        let rows: Vec<(i64, i64, i64, String, String, String, Vec<f32>)> = sqlx::query_as(
            r#"SELECT id, rag_source_id, pos_in_source, contact, context, contact_type, embedding
               FROM rag_contacts WHERE rag_source_id = $1 ORDER BY pos_in_source"#,
        )
        .bind(rag_source_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, rag_source_id, pos_in_source, contact, context, contact_type, embedding)| RagContact {
                    id,
                    rag_source_id,
                    pos_in_source,
                    contact,
                    context,
                    contact_type,
                    embedding,
                },
            )
            .collect())
    }

    async fn store_contacts(&self, contacts: Vec<RagContact>) -> Result<Vec<RagContact>, StoreError> {
        let mut stored = Vec::with_capacity(contacts.len());
        for mut contact in contacts {
            let row: (i64,) = sqlx::query_as(
                r#"INSERT INTO rag_contacts (rag_source_id, pos_in_source, contact, context, contact_type, embedding)
                   VALUES ($1, $2, $3, $4, $5, $6) RETURNING id"#,
            )
            .bind(contact.rag_source_id)
            .bind(contact.pos_in_source)
            .bind(&contact.contact)
            .bind(&contact.context)
            .bind(&contact.contact_type)
            .bind(&contact.embedding)
            .fetch_one(&self.pool)
            .await?;
            contact.id = row.0;
            stored.push(contact);
        }
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_source_assigns_id_and_type() {
        let store = MemoryStore::new();
        let source = store
            .store_source("https://example.com".to_string())
            .await
            .unwrap();
        assert_eq!(source.url, "https://example.com");
        assert_eq!(source.source_type, SOURCE_TYPE_WEBSITE);
        assert!(source.id >= 1 && source.id <= 1_000_000);
    }

    #[tokio::test]
    async fn test_store_chunks_assigns_distinct_ids() {
        let store = MemoryStore::new();
        let chunks = vec![
            RagChunk {
                id: 0,
                rag_source_id: 1,
                pos_in_source: 0,
                text: "first".to_string(),
                embedding: vec![0.0; 384],
            },
            RagChunk {
                id: 0,
                rag_source_id: 1,
                pos_in_source: 1,
                text: "second".to_string(),
                embedding: vec![0.0; 384],
            },
        ];
        let stored = store.store_chunks(chunks).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_ne!(stored[0].id, stored[1].id);
    }

    #[tokio::test]
    async fn test_store_contacts_preserves_fields() {
        let store = MemoryStore::new();
        let contacts = vec![RagContact {
            id: 0,
            rag_source_id: 1,
            pos_in_source: 0,
            contact: "hello@example.com".to_string(),
            context: "reach us at hello@example.com".to_string(),
            contact_type: ContactType::Email.as_str().to_string(),
            embedding: vec![0.0; 384],
        }];
        let stored = store.store_contacts(contacts).await.unwrap();
        assert_eq!(stored[0].contact, "hello@example.com");
        assert_eq!(stored[0].contact_type, "email");
    }

    #[tokio::test]
    async fn test_round_trip_preserves_embedding() {
        let store = MemoryStore::new();
        let source = store
            .store_source("https://example.com".to_string())
            .await
            .unwrap();

        let embedding = vec![0.125_f32, -0.5, 1.0, 0.0];
        let chunks = vec![RagChunk {
            id: 0,
            rag_source_id: source.id,
            pos_in_source: 0,
            text: "a chunk".to_string(),
            embedding: embedding.clone(),
        }];
        let stored = store.store_chunks(chunks).await.unwrap();

        let fetched_source = store.get_source(source.id).await.unwrap();
        assert_eq!(fetched_source.url, source.url);

        let fetched_chunks = store.get_chunks(source.id).await.unwrap();
        assert_eq!(fetched_chunks.len(), 1);
        assert_eq!(fetched_chunks[0].id, stored[0].id);
        assert_eq!(fetched_chunks[0].embedding, embedding);
    }

    #[tokio::test]
    async fn test_get_source_not_found() {
        let store = MemoryStore::new();
        let result = store.get_source(999_999).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }
}
