//! Question-to-passages retrieval.

use crate::error::RetrieveError;
use crate::models::ScoredPassage;

use super::embedding::EmbeddingClient;
use super::vector_index::VectorIndex;

/// Fetches the passages most similar to a question from a session's index.
pub struct Retriever {
    embedder: EmbeddingClient,
}

impl Retriever {
    pub fn new(embedder: EmbeddingClient) -> Self {
        Self { embedder }
    }

    /// Top-k passages for the question, best first.
    ///
    /// An empty index yields an empty result without touching the embedding
    /// provider. Fewer than `k` results come back only when the index holds
    /// fewer than `k` passages (or a score threshold filters some out).
    pub async fn retrieve(
        &self,
        index: &VectorIndex,
        question: &str,
        k: usize,
        min_score: Option<f32>,
    ) -> Result<Vec<ScoredPassage>, RetrieveError> {
        if index.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_query(question).await?;
        let mut results = index.query(&query_vector, k)?;

        if let Some(threshold) = min_score {
            results.retain(|r| r.score >= threshold);
        }

        Ok(results)
    }
}
