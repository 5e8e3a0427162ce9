//! Vector store trait and similarity metrics.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::SearchResult;
use crate::error::Result;

/// How two embedding vectors are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Euclidean (L2) distance, reported as `1 / (1 + distance)`.
    #[default]
    Euclidean,
    /// Cosine of the angle between the vectors.
    Cosine,
    /// Raw dot product.
    InnerProduct,
}

impl DistanceMetric {
    /// Score two vectors of equal length. Higher is more similar.
    pub fn score(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Euclidean => {
                let distance: f32 =
                    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt();
                1.0 / (1.0 + distance)
            }
            Self::Cosine => cosine_similarity(a, b),
            Self::InnerProduct => a.iter().zip(b).map(|(x, y)| x * y).sum(),
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// A read-only collection of embedded chunks supporting similarity search.
///
/// Implementations must allow concurrent searches through a shared reference.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Number of stored chunks.
    fn len(&self) -> usize;

    /// Whether the store holds no chunks.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Search for the `top_k` most similar chunks to the given embedding.
    ///
    /// Returns results ordered by descending similarity score. Returns every
    /// chunk when the store holds fewer than `top_k`.
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;
}
