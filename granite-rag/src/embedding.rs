//! The embedding model seam shared by index building and retrieval.

use async_trait::async_trait;

use crate::error::Result;

/// Turns chunk text and questions into vectors of one fixed width.
///
/// [`IndexBuilder`](crate::IndexBuilder) embeds chunks in groups of
/// `IndexConfig::embedding_batch_size` through `embed_batch` and records
/// [`name`](Self::name) in the saved index. [`Retriever`](crate::Retriever)
/// embeds the question through `embed` and refuses an index whose vectors are
/// not [`dimensions`](Self::dimensions) wide, so queries and chunks always
/// share one vector space.
///
/// ```rust,ignore
/// let question = embedder.embed("Can you tell me about MTV.").await?;
/// assert_eq!(question.len(), embedder.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier, stored in the index as `embedding_model`.
    fn name(&self) -> &str;

    /// Embed one text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a group of chunks; the i-th vector belongs to the i-th text.
    ///
    /// Calls [`embed`](Self::embed) once per text unless overridden.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Width of every vector this provider returns.
    fn dimensions(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Embeds a text as `[byte length, 1.0]`.
    struct Length;

    #[async_trait]
    impl EmbeddingProvider for Length {
        fn name(&self) -> &str {
            "length"
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn default_batch_keeps_input_order() {
        let vectors = Length.embed_batch(&["MTV", "", "Music Television"]).await.unwrap();
        assert_eq!(vectors, vec![vec![3.0, 1.0], vec![0.0, 1.0], vec![16.0, 1.0]]);
    }
}
