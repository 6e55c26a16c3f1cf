//! Embedder (C6): batch-embeds chunk and contact-context text through a
//! local ONNX sentence-embedding model (spec §4.4 step 5, §4.6).

use std::path::Path;
use std::sync::Arc;

use ndarray::Array2;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use thiserror::Error;
use tokenizers::Tokenizer;

use crate::core::constants::{EMBEDDING_DIM, MODEL_MAX_TOKENS};

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("tokenizer failed: {0}")]
    Tokenize(String),
    #[error("onnx runtime failed: {0}")]
    Runtime(#[from] ort::Error),
    #[error("encoded length {0} exceeds model limit {1}")]
    TooLong(usize, usize),
    #[error("model output had unexpected hidden size {0}, expected {1}")]
    UnexpectedShape(usize, usize),
}

/// Wraps a single ONNX Runtime session and its tokenizer. Construction is
/// expensive (loads the model graph); build one per process and share it via
/// `Arc`.
pub struct Embedder {
    session: Session,
    tokenizer: Arc<Tokenizer>,
}

impl Embedder {
    pub fn new(model_path: impl AsRef<Path>, tokenizer: Arc<Tokenizer>) -> Result<Self, EmbedError> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path)?;
        Ok(Self { session, tokenizer })
    }

    /// Embed a single piece of text. Thin wrapper over [`Self::embed_all`]
    /// for callers with one string and no batch to build.
    pub fn embed(&mut self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vectors = self.embed_all(&[text.to_string()])?;
        Ok(vectors.remove(0))
    }

    /// Embed `texts` as a single batch, returning one `EMBEDDING_DIM`-length
    /// vector per input, in order. Every caller in this codebase concatenates
    /// chunk texts and contact contexts into one call (spec §4.4 step 5) so
    /// the model only runs once per rag task.
    pub fn embed_all(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = texts
            .iter()
            .map(|t| {
                self.tokenizer
                    .encode(t.as_str(), true)
                    .map_err(|e| EmbedError::Tokenize(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
        if max_len > MODEL_MAX_TOKENS {
            return Err(EmbedError::TooLong(max_len, MODEL_MAX_TOKENS));
        }

        let batch = texts.len();
        let mut input_ids = Array2::<i64>::zeros((batch, max_len));
        let mut attention_mask = Array2::<i64>::zeros((batch, max_len));

        for (row, encoding) in encodings.iter().enumerate() {
            for (col, &id) in encoding.get_ids().iter().enumerate() {
                input_ids[[row, col]] = id as i64;
            }
            for (col, &mask) in encoding.get_attention_mask().iter().enumerate() {
                attention_mask[[row, col]] = mask as i64;
            }
        }

        let outputs = self.session.run(ort::inputs![
            "input_ids" => Tensor::from_array(input_ids)?,
            "attention_mask" => Tensor::from_array(attention_mask)?,
        ])?;

        let (shape, data) = outputs["last_hidden_state"].try_extract_tensor::<f32>()?;
        let hidden = *shape.last().unwrap_or(&0) as usize;
        if hidden != EMBEDDING_DIM {
            return Err(EmbedError::UnexpectedShape(hidden, EMBEDDING_DIM));
        }

        // [CLS] sits at position 0 of the sequence dimension for every row.
        let mut result = Vec::with_capacity(batch);
        for row in 0..batch {
            let start = row * max_len * EMBEDDING_DIM;
            result.push(data[start..start + EMBEDDING_DIM].to_vec());
        }

        Ok(result)
    }
}
