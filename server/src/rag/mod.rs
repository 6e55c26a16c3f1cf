//! RAG Stage (C8 + C4 + C5 + C6 + C7): chunk and extract contacts from a
//! scraped page, embed everything in one batch, and persist the results
//! (spec §4.4).

mod chunker;
mod contacts;
mod embedder;
mod store;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::info;

use crate::domain::Task;
use crate::utils::clean;
use crate::worker::{Stage, StageError};

pub use chunker::{ChunkError, Chunker};
pub use contacts::{Contact, ContactExtractor, ContactType};
pub use embedder::{EmbedError, Embedder};
pub use store::{MemoryStore, PostgresStore, RagChunk, RagContact, RagSource, RecordStore, StoreError};

pub struct RagStage {
    chunker: Chunker,
    contact_extractor: ContactExtractor,
    embedder: Mutex<Embedder>,
    store: Arc<dyn RecordStore>,
}

impl RagStage {
    pub fn new(
        chunker: Chunker,
        contact_extractor: ContactExtractor,
        embedder: Embedder,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            chunker,
            contact_extractor,
            embedder: Mutex::new(embedder),
            store,
        }
    }
}

#[async_trait]
impl Stage for RagStage {
    async fn execute(&self, task: &Task) -> Result<(), StageError> {
        let params = task
            .params
            .as_rag()
            .ok_or_else(|| StageError::InvalidParams("task is not a rag task".to_string()))?;

        let source = self
            .store
            .store_source(params.url.clone())
            .await
            .map_err(|e| StageError::Store(e.to_string()))?;

        let chunks = self
            .chunker
            .chunk(&clean(&params.text))
            .map_err(|e| StageError::Embed(e.to_string()))?;

        let contacts = self.contact_extractor.extract(&clean(&params.markdown));

        let mut inputs: Vec<String> = chunks.clone();
        inputs.extend(contacts.iter().map(|c| c.context.clone()));

        info!(
            url = %params.url,
            chunks = chunks.len(),
            contacts = contacts.len(),
            "generating embeddings"
        );

        let embeddings = {
            let mut embedder = self.embedder.lock().expect("embedder lock poisoned");
            embedder
                .embed_all(&inputs)
                .map_err(|e| StageError::Embed(e.to_string()))?
        };

        let chunk_rows = chunks
            .into_iter()
            .enumerate()
            .map(|(i, text)| RagChunk {
                id: 0,
                rag_source_id: source.id,
                pos_in_source: i as i64,
                text,
                embedding: embeddings[i].clone(),
            })
            .collect();

        self.store
            .store_chunks(chunk_rows)
            .await
            .map_err(|e| StageError::Store(e.to_string()))?;

        let chunk_count = embeddings.len() - contacts.len();
        let contact_rows = contacts
            .into_iter()
            .enumerate()
            .map(|(i, contact)| RagContact {
                id: 0,
                rag_source_id: source.id,
                pos_in_source: i as i64,
                contact: contact.value,
                context: contact.context,
                contact_type: contact.contact_type.as_str().to_string(),
                embedding: embeddings[chunk_count + i].clone(),
            })
            .collect();

        self.store
            .store_contacts(contact_rows)
            .await
            .map_err(|e| StageError::Store(e.to_string()))?;

        Ok(())
    }
}

// RagStage::execute is exercised by integration tests that load a real ONNX
// model (see demos/); Embedder construction needs a model file the unit-test
// tier doesn't have, so it's not covered here. Chunker, ContactExtractor, and
// the stores are fully unit-tested in their own modules.
