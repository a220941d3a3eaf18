//! Embedding client over the configured provider.

use std::sync::Arc;

use crate::error::ProviderError;
use crate::providers::Provider;
use crate::utils::retry::{RetryConfig, with_retry};

/// Batched embedding access with bounded retry. Transport lives behind the
/// [`Provider`] trait; this layer only handles batching and backoff.
#[derive(Clone)]
pub struct EmbeddingClient {
    provider: Arc<dyn Provider>,
    batch_size: usize,
    retry: RetryConfig,
}

impl EmbeddingClient {
    pub fn new(provider: Arc<dyn Provider>, batch_size: usize, retry: RetryConfig) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
            retry,
        }
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    /// Embed passage texts for indexing, one provider call per batch.
    pub async fn embed_passages(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let vectors = with_retry(&self.retry, || self.provider.embed(batch))
                .await
                .into_result()?;
            all_vectors.extend(vectors);
        }

        Ok(all_vectors)
    }

    /// Embed a single question for retrieval.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let inputs = [text.to_string()];
        let vectors = with_retry(&self.retry, || self.provider.embed(&inputs))
            .await
            .into_result()?;

        vectors
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("empty embedding response".to_string()))
    }
}
