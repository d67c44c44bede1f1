use std::{fs, path::Path};

use tracing::warn;

use common::error::AppError;

use crate::ranking::retrieve;

/// Width of one corpus window, in characters.
pub const CHUNK_MAX_CHARS: usize = 500;

const EMBEDDINGS_FILE: &str = "embeddings.json";

/// A fixed-size slice of the concatenated profile documents, the unit of
/// retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusChunk {
    pub index: usize,
    pub text: String,
}

/// Immutable chunks plus their parallel embedding vectors, produced offline
/// and loaded once per process.
pub struct CorpusStore {
    chunks: Vec<CorpusChunk>,
    vectors: Vec<Vec<f32>>,
}

impl CorpusStore {
    pub fn new(chunks: Vec<String>, vectors: Vec<Vec<f32>>) -> Self {
        if chunks.len() != vectors.len() {
            warn!(
                chunks = chunks.len(),
                vectors = vectors.len(),
                "corpus chunk/vector cardinality mismatch, ranking over the shorter list"
            );
        }

        let chunks = chunks
            .into_iter()
            .enumerate()
            .map(|(index, text)| CorpusChunk { index, text })
            .collect();

        Self { chunks, vectors }
    }

    /// Chunks the combined document text and pairs it with the precomputed
    /// vectors from `embeddings.json` in the data directory.
    pub fn load(data_dir: &Path, combined_text: &str) -> Result<Self, AppError> {
        let embeddings_path = data_dir.join(EMBEDDINGS_FILE);
        let raw = fs::read_to_string(&embeddings_path).map_err(|err| {
            AppError::Corpus(format!(
                "failed to read {}: {err}",
                embeddings_path.display()
            ))
        })?;
        let vectors = parse_embeddings(&raw)?;

        Ok(Self::new(chunk_text(combined_text, CHUNK_MAX_CHARS), vectors))
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[CorpusChunk] {
        &self.chunks
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// Retrieves the `top_k` most similar chunks and joins them with blank
    /// lines into a single prompt context string.
    pub fn context_for(&self, query_vector: &[f32], top_k: usize) -> String {
        retrieve(query_vector, &self.chunks, &self.vectors, top_k).join("\n\n")
    }
}

fn parse_embeddings(raw: &str) -> Result<Vec<Vec<f32>>, AppError> {
    serde_json::from_str(raw)
        .map_err(|err| AppError::Corpus(format!("failed to parse embeddings file: {err}")))
}

/// Splits text into fixed-width character windows, dropping windows that are
/// empty after trimming.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let chars: Vec<char> = text.chars().collect();

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + max_chars).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        let trimmed = window.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        start = end;
    }

    chunks
}
