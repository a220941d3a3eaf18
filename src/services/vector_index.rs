//! In-memory vector index with top-k similarity lookup.

use std::cmp::Ordering;

use crate::error::IndexError;
use crate::models::{Passage, ScoredPassage};

/// How query and passage vectors are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SimilarityMetric {
    /// Cosine similarity, in [-1.0, 1.0]
    #[default]
    Cosine,
    /// Euclidean distance mapped to 1 / (1 + d), in (0.0, 1.0]
    Euclidean,
}

struct Entry {
    passage: Passage,
    vector: Vec<f32>,
}

/// Session-owned passage index. Holds the passages of exactly one document;
/// a new document gets a freshly built index.
pub struct VectorIndex {
    metric: SimilarityMetric,
    /// Established by the first insert; all later vectors must match.
    dimension: Option<usize>,
    entries: Vec<Entry>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::with_metric(SimilarityMetric::default())
    }

    pub fn with_metric(metric: SimilarityMetric) -> Self {
        Self {
            metric,
            dimension: None,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Insert a passage with its embedding vector.
    pub fn insert(&mut self, passage: Passage, vector: Vec<f32>) -> Result<(), IndexError> {
        match self.dimension {
            None => self.dimension = Some(vector.len()),
            Some(expected) if expected != vector.len() => {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
            Some(_) => {}
        }

        self.entries.push(Entry { passage, vector });
        Ok(())
    }

    /// The `k` most similar passages, best first. Ties keep insertion order.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredPassage>, IndexError> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let expected = self.dimension.unwrap_or(vector.len());
        if vector.len() != expected {
            return Err(IndexError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }

        let mut scored: Vec<ScoredPassage> = self
            .entries
            .iter()
            .map(|entry| ScoredPassage {
                passage: entry.passage.clone(),
                score: self.score(vector, &entry.vector),
            })
            .collect();

        // Stable sort: equal scores stay in insertion order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        Ok(scored)
    }

    fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.metric {
            SimilarityMetric::Cosine => cosine_similarity(a, b),
            SimilarityMetric::Euclidean => {
                let dist = euclidean_distance(a, b);
                1.0 / (1.0 + dist)
            }
        }
    }
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
