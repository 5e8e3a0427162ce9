//! Exhaustive-search vector index persisted as a directory.
//!
//! [`FlatIndex`] keeps every chunk and its embedding in a `Vec` and scores all
//! of them on each query. For the document sizes these pipelines handle (a
//! few hundred chunks) this is exact and fast enough.
//!
//! On disk an index is a directory holding a single `index.json`. Saving
//! overwrites any index already at that location; there is no versioning and
//! no atomic swap, so do not rebuild an index another process is reading.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{DistanceMetric, VectorStore};

/// File name of the serialized index inside the index directory.
pub const INDEX_FILE_NAME: &str = "index.json";

/// On-disk format version written by [`FlatIndex::save`].
pub const INDEX_FORMAT_VERSION: u32 = 1;

const BACKEND: &str = "FlatIndex";

/// An immutable, exhaustively searched collection of embedded chunks.
///
/// # Example
///
/// ```rust,ignore
/// use granite_rag::{DistanceMetric, FlatIndex};
///
/// let index = FlatIndex::from_chunks(DistanceMetric::Euclidean, "granite-embedding", chunks)?;
/// index.save("vector_index").await?;
/// let index = FlatIndex::load_trusted("vector_index").await?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    metric: DistanceMetric,
    embedding_model: String,
    dimensions: usize,
    chunks: Vec<Chunk>,
}

#[derive(Serialize)]
struct IndexFileRef<'a> {
    format_version: u32,
    embedding_model: &'a str,
    metric: DistanceMetric,
    dimensions: usize,
    chunks: &'a [Chunk],
}

#[derive(Deserialize)]
struct IndexFile {
    format_version: u32,
    embedding_model: String,
    metric: DistanceMetric,
    dimensions: usize,
    chunks: Vec<Chunk>,
}

impl FlatIndex {
    /// Create an empty index.
    pub fn empty(metric: DistanceMetric, embedding_model: impl Into<String>) -> Self {
        Self { metric, embedding_model: embedding_model.into(), dimensions: 0, chunks: Vec::new() }
    }

    /// Build an index from chunks that already carry embeddings.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if a chunk has an empty embedding
    /// or the embeddings differ in length.
    pub fn from_chunks(
        metric: DistanceMetric,
        embedding_model: impl Into<String>,
        chunks: Vec<Chunk>,
    ) -> Result<Self> {
        let dimensions = chunks.first().map_or(0, |c| c.embedding.len());
        if let Some(bad) =
            chunks.iter().find(|c| c.embedding.is_empty() || c.embedding.len() != dimensions)
        {
            return Err(RagError::VectorStoreError {
                backend: BACKEND.to_string(),
                message: format!(
                    "chunk '{}' has a {}-dimensional embedding, expected {dimensions}",
                    bad.id,
                    bad.embedding.len()
                ),
            });
        }
        Ok(Self { metric, embedding_model: embedding_model.into(), dimensions, chunks })
    }

    /// The similarity metric used by [`search`](VectorStore::search).
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Identifier of the embedding model the vectors were produced with.
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Vector dimensionality, or 0 for an empty index.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The stored chunks in insertion order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Path of the index file inside an index directory.
    pub fn file_path(dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(INDEX_FILE_NAME)
    }

    /// Write the index to `dir`, replacing any index already there.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if the directory cannot be created or written.
    pub async fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await.map_err(|e| RagError::io(dir, e))?;

        let file = IndexFileRef {
            format_version: INDEX_FORMAT_VERSION,
            embedding_model: &self.embedding_model,
            metric: self.metric,
            dimensions: self.dimensions,
            chunks: &self.chunks,
        };
        let bytes = serde_json::to_vec(&file).map_err(|e| RagError::IndexFormat {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;

        let path = Self::file_path(dir);
        tokio::fs::write(&path, &bytes).await.map_err(|e| RagError::io(&path, e))?;
        info!(path = %path.display(), chunk_count = self.chunks.len(), bytes = bytes.len(), "saved index");
        Ok(())
    }

    /// Load an index previously written by [`save`](Self::save).
    ///
    /// This is a trusted-deserialization path: only point it at directories
    /// produced by this crate's own index builder. The loader checks the format
    /// version and that every vector has the recorded dimensionality, and
    /// nothing more.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if the index file cannot be read and
    /// [`RagError::IndexFormat`] if it cannot be decoded or is inconsistent.
    pub async fn load_trusted(dir: impl AsRef<Path>) -> Result<Self> {
        let path = Self::file_path(dir);
        let bytes = tokio::fs::read(&path).await.map_err(|e| RagError::io(&path, e))?;
        let file: IndexFile = serde_json::from_slice(&bytes).map_err(|e| RagError::IndexFormat {
            path: path.clone(),
            message: e.to_string(),
        })?;

        if file.format_version != INDEX_FORMAT_VERSION {
            return Err(RagError::IndexFormat {
                path,
                message: format!(
                    "unsupported format version {} (expected {INDEX_FORMAT_VERSION})",
                    file.format_version
                ),
            });
        }
        if let Some(bad) = file.chunks.iter().find(|c| c.embedding.len() != file.dimensions) {
            return Err(RagError::IndexFormat {
                path,
                message: format!(
                    "chunk '{}' has {} dimensions, index records {}",
                    bad.id,
                    bad.embedding.len(),
                    file.dimensions
                ),
            });
        }

        debug!(path = %path.display(), chunk_count = file.chunks.len(), "loaded index");
        Ok(Self {
            metric: file.metric,
            embedding_model: file.embedding_model,
            dimensions: file.dimensions,
            chunks: file.chunks,
        })
    }
}

#[async_trait]
impl VectorStore for FlatIndex {
    fn len(&self) -> usize {
        self.chunks.len()
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if self.chunks.is_empty() {
            return Ok(Vec::new());
        }
        if embedding.len() != self.dimensions {
            return Err(RagError::VectorStoreError {
                backend: BACKEND.to_string(),
                message: format!(
                    "query has {} dimensions, index has {}",
                    embedding.len(),
                    self.dimensions
                ),
            });
        }

        let mut scored: Vec<SearchResult> = self
            .chunks
            .iter()
            .map(|chunk| SearchResult {
                chunk: chunk.clone(),
                score: self.metric.score(&chunk.embedding, embedding),
            })
            .collect();

        // Stable sort: equal scores keep document order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }
}
