//! Index building: read → chunk → embed → save.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::IndexConfig;
use crate::document::{Chunk, Document};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::flat::FlatIndex;

/// What an index build produced.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSummary {
    /// Directory the index was written to.
    pub path: PathBuf,
    /// Number of chunks stored.
    pub chunk_count: usize,
    /// Embedding dimensionality, 0 for an empty index.
    pub dimensions: usize,
    /// Wall-clock time for the whole build.
    pub elapsed: Duration,
}

/// Builds a [`FlatIndex`] from a source document.
///
/// The chunking parameters are validated in [`new`](Self::new), so a bad
/// configuration is reported before any file is read or any embedding is
/// computed.
///
/// # Example
///
/// ```rust,ignore
/// use granite_rag::{IndexBuilder, IndexConfig};
///
/// let builder = IndexBuilder::new(IndexConfig::default(), Arc::new(embedder))?;
/// let summary = builder.build("mtv.md", "vector_index").await?;
/// ```
pub struct IndexBuilder {
    config: IndexConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    chunker: RecursiveChunker,
}

impl IndexBuilder {
    /// Create a builder.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the config fails
    /// [`IndexConfig::validate`].
    pub fn new(config: IndexConfig, embedding_provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        config.validate()?;
        let chunker = RecursiveChunker::new(config.chunking.clone())?;
        Ok(Self { config, embedding_provider, chunker })
    }

    /// Return a reference to the builder configuration.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Read `source`, index it, and save the index to `destination`.
    ///
    /// Any index already at `destination` is overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if the source cannot be read or the destination
    /// cannot be written, and propagates embedding failures.
    pub async fn build(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<IndexSummary> {
        let started = Instant::now();
        let document = Document::load(source.as_ref()).await?;
        self.build_timed(&document, destination.as_ref(), started).await
    }

    /// Index an already loaded document and save the index to `destination`.
    ///
    /// Lets a caller read the source before loading an embedding model.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if the destination cannot be written and
    /// propagates embedding failures.
    pub async fn build_document(
        &self,
        document: &Document,
        destination: impl AsRef<Path>,
    ) -> Result<IndexSummary> {
        self.build_timed(document, destination.as_ref(), Instant::now()).await
    }

    async fn build_timed(
        &self,
        document: &Document,
        destination: &Path,
        started: Instant,
    ) -> Result<IndexSummary> {
        let index = self.build_index(document).await?;
        index.save(destination).await?;

        let summary = IndexSummary {
            path: destination.to_path_buf(),
            chunk_count: index.chunks().len(),
            dimensions: index.dimensions(),
            elapsed: started.elapsed(),
        };
        info!(
            document.id = %document.id,
            chunk_count = summary.chunk_count,
            dimensions = summary.dimensions,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "built index"
        );
        Ok(summary)
    }

    /// Chunk and embed a document without touching disk.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if the embedding provider fails and
    /// [`RagError::EmbeddingError`] if it returns vectors of the wrong shape.
    pub async fn build_index(&self, document: &Document) -> Result<FlatIndex> {
        let mut chunks = self.chunker.chunk(document);
        if chunks.is_empty() {
            warn!(document.id = %document.id, "document has no text; building an empty index");
            return Ok(FlatIndex::empty(self.config.metric, &self.config.embedding_model));
        }

        for batch in chunks.chunks_mut(self.config.embedding_batch_size) {
            self.embed_batch(document, batch).await?;
        }

        FlatIndex::from_chunks(self.config.metric, &self.config.embedding_model, chunks)
    }

    async fn embed_batch(&self, document: &Document, batch: &mut [Chunk]) -> Result<()> {
        let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
            error!(document.id = %document.id, error = %e, "embedding failed during indexing");
            RagError::PipelineError(format!("embedding failed for document '{}': {e}", document.id))
        })?;

        if embeddings.len() != batch.len() {
            return Err(RagError::EmbeddingError {
                provider: self.embedding_provider.name().to_string(),
                message: format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    embeddings.len()
                ),
            });
        }

        let expected = self.embedding_provider.dimensions();
        for (chunk, embedding) in batch.iter_mut().zip(embeddings) {
            if embedding.len() != expected {
                return Err(RagError::EmbeddingError {
                    provider: self.embedding_provider.name().to_string(),
                    message: format!(
                        "chunk '{}' embedded to {} dimensions, expected {expected}",
                        chunk.id,
                        embedding.len()
                    ),
                });
            }
            chunk.embedding = embedding;
        }
        Ok(())
    }
}

impl std::fmt::Debug for IndexBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexBuilder")
            .field("config", &self.config)
            .field("embedding_provider", &self.embedding_provider.name())
            .finish()
    }
}
