//! # granite-rag
//!
//! Retrieval-augmented generation for local instruct models.
//!
//! The crate covers three pipelines:
//!
//! - **Index building**: [`IndexBuilder`] reads a document, splits it with
//!   [`RecursiveChunker`], embeds every chunk through an [`EmbeddingProvider`]
//!   and saves a [`FlatIndex`] to disk.
//! - **Direct inference**: [`DirectPipeline`] sends a bare question to a
//!   [`TextGenerator`] through a [`GenerationRunner`], which measures latency
//!   and throughput.
//! - **RAG**: [`RagPipeline`] retrieves the top-K chunks with a [`Retriever`],
//!   prepends them to the question with [`PromptComposer`], and generates.
//!
//! Model backends live in separate crates and plug in through the
//! [`EmbeddingProvider`] and [`TextGenerator`] traits. [`Reporter`] renders the
//! colorized stage output the binaries print.

pub mod builder;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod flat;
pub mod generation;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod retriever;
pub mod telemetry;
pub mod vectorstore;

pub use builder::{IndexBuilder, IndexSummary};
pub use chunking::{Chunker, RecursiveChunker};
pub use config::{
    ChunkingConfig, Device, GenerationConfig, IndexConfig, IndexConfigBuilder, PerformanceHint,
    Precision, RagSettings, RetrievalConfig,
};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{FaultClass, RagError, Result};
pub use flat::FlatIndex;
pub use generation::{
    Completion, GenerationOptions, GenerationResult, GenerationRunner, InferenceStats,
    TextGenerator,
};
pub use pipeline::{
    DirectOutcome, DirectPipeline, PromptStage, RagOutcome, RagPipeline, RagPipelineBuilder,
    RetrievalStage,
};
pub use prompt::{Conversation, PromptComposer, Role, Turn};
pub use report::Reporter;
pub use retriever::Retriever;
pub use vectorstore::{DistanceMetric, VectorStore};
