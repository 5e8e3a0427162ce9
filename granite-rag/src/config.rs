//! Configuration for index building, retrieval and generation.
//!
//! Every tunable the pipelines use lives in one of these structs. Defaults
//! match the stock Granite setup: 1000-character chunks with 50 characters of
//! overlap, top-2 retrieval, 1024 new tokens and seed 42 on CPU.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::generation::GenerationOptions;
use crate::vectorstore::DistanceMetric;

/// Default instruct model used for generation.
pub const DEFAULT_MODEL_ID: &str = "ibm-granite/granite-3.3-2b-instruct";
/// Default embedding model used for chunks and queries.
pub const DEFAULT_EMBEDDING_MODEL_ID: &str = "ibm-granite/granite-embedding-30m-english";
/// Output dimensionality of [`DEFAULT_EMBEDDING_MODEL_ID`].
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;

/// Separators tried in order when looking for a chunk boundary.
pub const DEFAULT_SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", "! ", "? ", " "];

/// How documents are split into chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of characters shared by consecutive chunks.
    pub chunk_overlap: usize,
    /// Boundary separators, most preferred first.
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 50,
            separators: DEFAULT_SEPARATORS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl ChunkingConfig {
    /// Create a chunking config with the default separators.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap, ..Self::default() }
    }

    /// Check that the parameters can make progress through a document.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - a separator is empty
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.separators.iter().any(String::is_empty) {
            return Err(RagError::ConfigError("separators must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Parameters for building a vector index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    /// Identifier of the embedding model, recorded in the persisted index.
    pub embedding_model: String,
    /// Dimensionality the embedding model produces.
    pub embedding_dimensions: usize,
    /// Chunking parameters.
    pub chunking: ChunkingConfig,
    /// Similarity metric used at search time.
    pub metric: DistanceMetric,
    /// Number of chunks sent to the embedding provider per call.
    pub embedding_batch_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            embedding_model: DEFAULT_EMBEDDING_MODEL_ID.to_string(),
            embedding_dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            chunking: ChunkingConfig::default(),
            metric: DistanceMetric::default(),
            embedding_batch_size: 32,
        }
    }
}

impl IndexConfig {
    /// Create a new builder for constructing an [`IndexConfig`].
    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::default()
    }

    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the chunking parameters are invalid,
    /// `embedding_batch_size == 0`, or `embedding_dimensions == 0`.
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.embedding_batch_size == 0 {
            return Err(RagError::ConfigError(
                "embedding_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.embedding_dimensions == 0 {
            return Err(RagError::ConfigError(
                "embedding_dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`IndexConfig`].
#[derive(Debug, Clone, Default)]
pub struct IndexConfigBuilder {
    config: IndexConfig,
}

impl IndexConfigBuilder {
    /// Set the embedding model identifier.
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.config.embedding_model = model.into();
        self
    }

    /// Set the embedding dimensionality.
    pub fn embedding_dimensions(mut self, dimensions: usize) -> Self {
        self.config.embedding_dimensions = dimensions;
        self
    }

    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunking.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunking.chunk_overlap = overlap;
        self
    }

    /// Set the similarity metric.
    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.config.metric = metric;
        self
    }

    /// Set how many chunks are embedded per provider call.
    pub fn embedding_batch_size(mut self, size: usize) -> Self {
        self.config.embedding_batch_size = size;
        self
    }

    /// Build the [`IndexConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`IndexConfig::validate`].
    pub fn build(self) -> Result<IndexConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Parameters for similarity retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks returned per query.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 2 }
    }
}

impl RetrievalConfig {
    /// Create a retrieval config returning `top_k` chunks.
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `top_k == 0`.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Device the language model runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    /// Let the backend pick the best available accelerator.
    Auto,
    /// CPU only.
    #[default]
    Cpu,
    /// CUDA GPU with index.
    Cuda(usize),
    /// Apple Metal.
    Metal,
}

/// What the backend should optimize a loaded model for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceHint {
    /// Lowest latency for a single request.
    #[default]
    Latency,
    /// Highest aggregate throughput across requests.
    Throughput,
}

/// Numeric precision of the loaded model weights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    /// Whatever the checkpoint and device support best.
    #[default]
    Auto,
    F32,
    F16,
    Bf16,
}

/// Parameters for loading a language model and generating text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Identifier of the instruct model.
    pub model_id: String,
    /// Device the model is loaded on.
    pub device: Device,
    /// Latency or throughput tuning.
    pub performance_hint: PerformanceHint,
    /// Weight precision.
    pub precision: Precision,
    /// Forward the backend's own loader logs.
    pub backend_logs: bool,
    /// Upper bound on newly generated tokens.
    pub max_new_tokens: usize,
    /// Sampling seed. `None` leaves sampling non-deterministic.
    pub seed: Option<u64>,
    /// Whether the chat template should request a reasoning section.
    pub enable_thinking: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            device: Device::default(),
            performance_hint: PerformanceHint::default(),
            precision: Precision::default(),
            backend_logs: false,
            max_new_tokens: 1024,
            seed: Some(42),
            enable_thinking: false,
        }
    }
}

impl GenerationConfig {
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `model_id` is empty or
    /// `max_new_tokens == 0`.
    pub fn validate(&self) -> Result<()> {
        if self.model_id.trim().is_empty() {
            return Err(RagError::ConfigError("model_id must not be empty".to_string()));
        }
        if self.max_new_tokens == 0 {
            return Err(RagError::ConfigError(
                "max_new_tokens must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-call options derived from this config.
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            max_new_tokens: self.max_new_tokens,
            seed: self.seed,
            enable_thinking: self.enable_thinking,
        }
    }
}

/// Everything the demo pipelines need, loadable from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagSettings {
    /// Document the index is built from.
    pub source_document: PathBuf,
    /// Directory the index is saved to and loaded from.
    pub index_path: PathBuf,
    /// Question asked by the inference pipelines.
    pub question: String,
    /// Index building parameters.
    pub index: IndexConfig,
    /// Retrieval parameters.
    pub retrieval: RetrievalConfig,
    /// Generation parameters.
    pub generation: GenerationConfig,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            source_document: PathBuf::from("demos/data/mtv.md"),
            index_path: PathBuf::from("vector_index"),
            question: "Can you tell me about MTV.".to_string(),
            index: IndexConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl RagSettings {
    /// Read settings from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if the file cannot be read and
    /// [`RagError::ConfigError`] if it is not valid settings JSON or fails
    /// validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| RagError::io(path, e))?;
        let settings: Self = serde_json::from_str(&raw).map_err(|e| {
            RagError::ConfigError(format!("invalid settings in {}: {e}", path.display()))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Like [`load`](Self::load), but returns the defaults when `path` does not exist.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() { Self::load(path) } else { Ok(Self::default()) }
    }

    /// Validate the nested configs.
    ///
    /// # Errors
    ///
    /// Returns the first [`RagError::ConfigError`] found.
    pub fn validate(&self) -> Result<()> {
        self.index.validate()?;
        self.retrieval.validate()?;
        self.generation.validate()
    }
}
