//! Error types for the `granite-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building an index, retrieving, or generating.
#[derive(Debug, Error)]
pub enum RagError {
    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A file or directory could not be read or written.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A persisted index could not be decoded.
    #[error("Index format error at {}: {message}", path.display())]
    IndexFormat {
        /// The index location.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred while loading a language model or generating text.
    #[error("Generation error ({backend}): {message}")]
    GenerationError {
        /// The generation backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error in the pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

/// Coarse classification of a [`RagError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// Bad paths or invalid parameters. Detectable before any model is loaded.
    Input,
    /// A collaborator failed at runtime: model loading, embedding, generation,
    /// or a corrupt index.
    Runtime,
}

impl RagError {
    /// Wrap an I/O failure with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Return the fault class of this error.
    pub fn class(&self) -> FaultClass {
        match self {
            Self::ConfigError(_) | Self::Io { .. } => FaultClass::Input,
            Self::EmbeddingError { .. }
            | Self::VectorStoreError { .. }
            | Self::IndexFormat { .. }
            | Self::GenerationError { .. }
            | Self::PipelineError(_) => FaultClass::Runtime,
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
