//! MistralRsEmbedder - local sentence embeddings implementing `EmbeddingProvider`.

use std::sync::Arc;

use async_trait::async_trait;
use granite_rag::EmbeddingProvider;
use mistralrs::EmbeddingModelBuilder;
use tracing::{info, instrument};

use crate::error::{MistralRsError, Result};

/// mistral.rs embedding model wrapped as an [`EmbeddingProvider`].
///
/// The provider name is the model ID, so an index records which model built
/// it.
pub struct MistralRsEmbedder {
    model: Arc<mistralrs::Model>,
    model_id: String,
    dimensions: usize,
}

impl MistralRsEmbedder {
    /// Load an embedding model that produces `dimensions`-wide vectors.
    #[instrument]
    pub async fn load(model_id: &str, dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(MistralRsError::InvalidConfig(
                "embedding dimensions must be greater than zero".to_string(),
            ));
        }

        info!("Loading mistral.rs embedding model");
        let model = EmbeddingModelBuilder::new(model_id)
            .build()
            .await
            .map_err(|e| MistralRsError::ModelLoad(e.to_string()))?;

        info!("Embedding model loaded successfully");
        Ok(Self { model: Arc::new(model), model_id: model_id.to_string(), dimensions })
    }
}

#[async_trait]
impl EmbeddingProvider for MistralRsEmbedder {
    fn name(&self) -> &str {
        &self.model_id
    }

    async fn embed(&self, text: &str) -> granite_rag::Result<Vec<f32>> {
        let embedding = self
            .model
            .generate_embedding(text.to_string())
            .await
            .map_err(|e| MistralRsError::Embedding(e.to_string()))?;

        if embedding.len() != self.dimensions {
            return Err(MistralRsError::Embedding(format!(
                "model produced {} dimensions, expected {}",
                embedding.len(),
                self.dimensions
            ))
            .into());
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

impl std::fmt::Debug for MistralRsEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MistralRsEmbedder")
            .field("model_id", &self.model_id)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}
