//! Chunker (C4): splits cleaned text into medium-sized, overlapping chunks
//! bounded by a model's token budget (spec §4.4 step 3, §4.5).

use std::sync::Arc;

use thiserror::Error;
use tokenizers::Tokenizer;

use crate::core::constants::{CHUNK_MAX_TOKENS, CHUNK_OVERLAP_TOKENS};

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("tokenizer failed: {0}")]
    Tokenize(String),
}

/// Splits text into sentences, then greedily packs sentences into chunks,
/// falling back to word- then rune-level splitting for oversized sentences.
pub struct Chunker {
    tokenizer: Arc<Tokenizer>,
}

impl Chunker {
    pub fn new(tokenizer: Arc<Tokenizer>) -> Self {
        Self { tokenizer }
    }

    pub fn chunk(&self, text: &str) -> Result<Vec<String>, ChunkError> {
        if text.is_empty() {
            return Ok(vec![" ".to_string()]);
        }

        let sentences = split_into_sentences(text);
        let mut chunks = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_token_count = 0usize;

        for sentence in sentences {
            let sentence_token_count = self.token_count(&sentence)?;

            if sentence_token_count > CHUNK_MAX_TOKENS {
                if !current.is_empty() {
                    chunks.push(current.join(" "));
                    current.clear();
                    current_token_count = 0;
                }
                chunks.extend(self.split_long_sentence(&sentence)?);
                continue;
            }

            if current_token_count + sentence_token_count > CHUNK_MAX_TOKENS {
                chunks.push(current.join(" "));
                let (overlap, overlap_count) = self.overlap(&current);
                current = overlap;
                current_token_count = overlap_count;
            }

            current.push(sentence);
            current_token_count += sentence_token_count;
        }

        if !current.is_empty() {
            chunks.push(current.join(" "));
        }

        Ok(chunks)
    }

    fn token_count(&self, text: &str) -> Result<usize, ChunkError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ChunkError::Tokenize(e.to_string()))?;
        Ok(encoding.get_ids().len())
    }

    /// Selects sentences from the tail of `sentences` until at least
    /// `CHUNK_OVERLAP_TOKENS` tokens have been gathered. A sentence whose
    /// token count can't be computed is skipped rather than failing the
    /// whole chunk.
    fn overlap(&self, sentences: &[String]) -> (Vec<String>, usize) {
        let mut picked = Vec::new();
        let mut total = 0usize;
        for sentence in sentences.iter().rev() {
            let Ok(count) = self.token_count(sentence) else {
                continue;
            };
            picked.insert(0, sentence.clone());
            total += count;
            if total >= CHUNK_OVERLAP_TOKENS {
                break;
            }
        }
        (picked, total)
    }

    fn split_long_sentence(&self, sentence: &str) -> Result<Vec<String>, ChunkError> {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        if words.is_empty() {
            return Ok(Vec::new());
        }

        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_count = 0usize;

        for word in words {
            let word_count = self.token_count(word)?;

            if word_count > CHUNK_MAX_TOKENS {
                if !current.is_empty() {
                    chunks.push(current.join(" "));
                    current.clear();
                    current_count = 0;
                }
                let runes: Vec<char> = word.chars().collect();
                for start in (0..runes.len()).step_by(CHUNK_MAX_TOKENS) {
                    let end = (start + CHUNK_MAX_TOKENS).min(runes.len());
                    chunks.push(runes[start..end].iter().collect());
                }
                continue;
            }

            if current_count + word_count > CHUNK_MAX_TOKENS {
                chunks.push(current.join(" "));
                current = vec![word];
                current_count = word_count;
            } else {
                current.push(word);
                current_count += word_count;
            }
        }

        if !current.is_empty() {
            chunks.push(current.join(" "));
        }

        Ok(chunks)
    }
}

fn split_into_sentences(text: &str) -> Vec<String> {
    text.split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("{s}."))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentences_are_split_on_period() {
        assert_eq!(
            split_into_sentences("Hello there. How are you. Goodbye."),
            vec!["Hello there.", "How are you.", "Goodbye."]
        );
    }

    #[test]
    fn test_whitespace_only_sentences_are_dropped() {
        assert_eq!(split_into_sentences("  .  . "), Vec::<String>::new());
    }

    #[test]
    fn test_empty_input_yields_single_space() {
        let chunker = Chunker::new(Arc::new(Tokenizer::new(tokenizers::models::bpe::BPE::default())));
        assert_eq!(chunker.chunk("").unwrap(), vec![" ".to_string()]);
    }
}
