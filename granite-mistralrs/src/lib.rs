//! # granite-mistralrs
//!
//! Native [mistral.rs](https://github.com/EricLBuehler/mistral.rs) backend for
//! `granite-rag`: local Granite text generation and sentence embeddings with
//! no server process.
//!
//! - [`MistralRsGenerator`] implements [`granite_rag::TextGenerator`]
//! - [`MistralRsEmbedder`] implements [`granite_rag::EmbeddingProvider`]
//! - [`ChatTemplate`] renders the model's own chat template for display
//!
//! Build without features for CPU inference; enable `cuda` or `metal` to use
//! an accelerator.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use granite_mistralrs::{MistralRsEmbedder, MistralRsGenerator};
//! use granite_rag::GenerationConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), granite_rag::RagError> {
//!     let generator = MistralRsGenerator::from_generation_config(&GenerationConfig::default()).await?;
//!     let embedder = MistralRsEmbedder::load("ibm-granite/granite-embedding-30m-english", 384).await?;
//!     Ok(())
//! }
//! ```

mod chat_template;
mod client;
mod config;
mod embedding;
mod error;

pub use chat_template::ChatTemplate;
pub use client::MistralRsGenerator;
pub use config::{DataType, MistralRsConfig, MistralRsConfigBuilder};
pub use embedding::MistralRsEmbedder;
pub use error::{MistralRsError, Result};
