//! Similarity retrieval over a loaded index.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::RetrievalConfig;
use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::flat::FlatIndex;
use crate::vectorstore::VectorStore;

/// Finds the chunks most similar to a free-text query.
///
/// The store is only ever read, so one retriever can serve concurrent queries.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    config: RetrievalConfig,
}

impl Retriever {
    /// Create a retriever over an already loaded store.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `config.top_k == 0`.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        config: RetrievalConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, embedding_provider, config })
    }

    /// Load the index in `dir` and create a retriever over it.
    ///
    /// Loading goes through [`FlatIndex::load_trusted`]; `dir` must hold an
    /// index written by [`IndexBuilder`](crate::IndexBuilder).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] for an invalid config (checked before
    /// reading anything) and propagates load failures.
    pub async fn open(
        dir: impl AsRef<Path>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        config: RetrievalConfig,
    ) -> Result<Self> {
        config.validate()?;
        let index = FlatIndex::load_trusted(dir.as_ref()).await?;
        info!(path = %dir.as_ref().display(), chunk_count = index.len(), "opened index");
        Self::from_index(index, embedding_provider, config)
    }

    /// Create a retriever over an index loaded with
    /// [`FlatIndex::load_trusted`].
    ///
    /// Lets a caller load the index before the embedding model, so a missing
    /// index is reported first.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the index is non-empty and its
    /// vector width differs from the provider's, or if `config.top_k == 0`.
    pub fn from_index(
        index: FlatIndex,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        config: RetrievalConfig,
    ) -> Result<Self> {
        if !index.is_empty() && index.dimensions() != embedding_provider.dimensions() {
            return Err(RagError::ConfigError(format!(
                "index has {}-dimensional vectors but embedding provider '{}' produces {}",
                index.dimensions(),
                embedding_provider.name(),
                embedding_provider.dimensions()
            )));
        }
        if index.embedding_model() != embedding_provider.name() {
            warn!(
                index_model = index.embedding_model(),
                provider = embedding_provider.name(),
                "index was built with a different embedding model"
            );
        }
        Self::new(Arc::new(index), embedding_provider, config)
    }

    /// Return a reference to the retrieval configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Number of chunks available for retrieval.
    pub fn index_len(&self) -> usize {
        self.store.len()
    }

    /// Return the `top_k` chunks most similar to `query`, best first.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if embedding or search fails.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.retrieve_top(query, self.config.top_k).await
    }

    /// Like [`retrieve`](Self::retrieve) with an explicit result count.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `k == 0` and
    /// [`RagError::PipelineError`] if embedding or search fails.
    pub async fn retrieve_top(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(RagError::ConfigError("k must be greater than zero".to_string()));
        }

        let query_embedding = self.embedding_provider.embed(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during retrieval");
            RagError::PipelineError(format!("query embedding failed: {e}"))
        })?;

        let results = self.store.search(&query_embedding, k).await.map_err(|e| {
            error!(error = %e, "vector store search failed");
            RagError::PipelineError(format!("search failed: {e}"))
        })?;

        info!(result_count = results.len(), top_k = k, "retrieval completed");
        Ok(results)
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("index_len", &self.store.len())
            .field("embedding_provider", &self.embedding_provider.name())
            .field("config", &self.config)
            .finish()
    }
}
