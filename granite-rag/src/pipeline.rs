//! Direct and retrieval-augmented inference pipelines.
//!
//! [`RagPipeline`] runs three stages in order, each timed:
//!
//! 1. retrieve the top-K chunks for the question
//! 2. compose the context prompt and render it through the chat template
//! 3. generate
//!
//! The stages are public so callers can report between them; [`RagPipeline::run`]
//! chains all three.
//!
//! # Example
//!
//! ```rust,ignore
//! use granite_rag::{GenerationRunner, RagPipeline, Retriever};
//!
//! let pipeline = RagPipeline::builder()
//!     .retriever(Retriever::open("vector_index", embedder, RetrievalConfig::default()).await?)
//!     .runner(GenerationRunner::new(generator, GenerationOptions::default())?)
//!     .build()?;
//!
//! let outcome = pipeline.run("Can you tell me about MTV.").await?;
//! println!("{}", outcome.generation.text);
//! ```

use std::time::{Duration, Instant};

use tracing::info;

use crate::document::SearchResult;
use crate::error::{RagError, Result};
use crate::generation::{GenerationResult, GenerationRunner};
use crate::prompt::{Conversation, PromptComposer, join_context};
use crate::retriever::Retriever;

/// Output of the retrieval stage.
#[derive(Debug, Clone)]
pub struct RetrievalStage {
    /// Retrieved chunks, best first.
    pub results: Vec<SearchResult>,
    /// Chunk texts joined with newlines.
    pub context: String,
    /// Time spent embedding the question and searching.
    pub elapsed: Duration,
}

/// Output of the prompt-building stage.
#[derive(Debug, Clone)]
pub struct PromptStage {
    /// The conversation sent to the model.
    pub conversation: Conversation,
    /// The conversation rendered through the model's chat template.
    pub rendered: String,
    /// Time spent composing and rendering.
    pub elapsed: Duration,
}

/// Everything one RAG run produced.
#[derive(Debug, Clone)]
pub struct RagOutcome {
    /// Retrieval stage output.
    pub retrieval: RetrievalStage,
    /// Prompt stage output.
    pub prompt: PromptStage,
    /// Generated text and inference stats.
    pub generation: GenerationResult,
    /// Wall-clock time across all three stages.
    pub total_time: Duration,
}

/// Retrieval-augmented generation over a loaded index.
///
/// Construct one via [`RagPipeline::builder()`].
#[derive(Debug)]
pub struct RagPipeline {
    retriever: Retriever,
    runner: GenerationRunner,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the retriever.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Return a reference to the generation runner.
    pub fn runner(&self) -> &GenerationRunner {
        &self.runner
    }

    /// Stage A: fetch context for `question`.
    ///
    /// # Errors
    ///
    /// Propagates retrieval failures.
    pub async fn retrieve(&self, question: &str) -> Result<RetrievalStage> {
        let started = Instant::now();
        let results = self.retriever.retrieve(question).await?;
        let context = join_context(results.iter().map(|r| r.chunk.text.as_str()));
        Ok(RetrievalStage { results, context, elapsed: started.elapsed() })
    }

    /// Stage B: build the context prompt and render it.
    ///
    /// # Errors
    ///
    /// Propagates chat template failures.
    pub fn compose(&self, question: &str, retrieval: &RetrievalStage) -> Result<PromptStage> {
        let started = Instant::now();
        let conversation = PromptComposer::with_context(
            question,
            retrieval.results.iter().map(|r| r.chunk.text.as_str()),
        );
        let rendered = self.runner.render_prompt(&conversation)?;
        Ok(PromptStage { conversation, rendered, elapsed: started.elapsed() })
    }

    /// Stage C: generate from a composed prompt.
    ///
    /// # Errors
    ///
    /// Propagates generation failures.
    pub async fn generate(&self, prompt: &PromptStage) -> Result<GenerationResult> {
        self.runner.run(&prompt.conversation).await
    }

    /// Run all three stages.
    ///
    /// # Errors
    ///
    /// Fails on the first stage that fails; nothing is retried.
    pub async fn run(&self, question: &str) -> Result<RagOutcome> {
        let started = Instant::now();
        let retrieval = self.retrieve(question).await?;
        let prompt = self.compose(question, &retrieval)?;
        let generation = self.generate(&prompt).await?;
        let total_time = started.elapsed();

        info!(
            retrieved = retrieval.results.len(),
            retrieval_ms = retrieval.elapsed.as_millis() as u64,
            prompt_ms = prompt.elapsed.as_millis() as u64,
            inference_ms = generation.stats.inference_time.as_millis() as u64,
            total_ms = total_time.as_millis() as u64,
            "rag pipeline completed"
        );
        Ok(RagOutcome { retrieval, prompt, generation, total_time })
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// Both fields are required.
#[derive(Debug, Default)]
pub struct RagPipelineBuilder {
    retriever: Option<Retriever>,
    runner: Option<GenerationRunner>,
}

impl RagPipelineBuilder {
    /// Set the retriever.
    pub fn retriever(mut self, retriever: Retriever) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Set the generation runner.
    pub fn runner(mut self, runner: GenerationRunner) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let retriever = self
            .retriever
            .ok_or_else(|| RagError::ConfigError("retriever is required".to_string()))?;
        let runner =
            self.runner.ok_or_else(|| RagError::ConfigError("runner is required".to_string()))?;
        Ok(RagPipeline { retriever, runner })
    }
}

/// Output of a direct (no retrieval) run.
#[derive(Debug, Clone)]
pub struct DirectOutcome {
    /// The conversation sent to the model.
    pub conversation: Conversation,
    /// Generated text and inference stats.
    pub generation: GenerationResult,
}

/// Asks the model a question with no retrieved context.
#[derive(Debug, Clone)]
pub struct DirectPipeline {
    runner: GenerationRunner,
}

impl DirectPipeline {
    /// Create a direct pipeline.
    pub fn new(runner: GenerationRunner) -> Self {
        Self { runner }
    }

    /// Return a reference to the generation runner.
    pub fn runner(&self) -> &GenerationRunner {
        &self.runner
    }

    /// Compose the bare-question prompt and generate.
    ///
    /// # Errors
    ///
    /// Propagates generation failures.
    pub async fn run(&self, question: &str) -> Result<DirectOutcome> {
        let conversation = PromptComposer::direct(question);
        let generation = self.runner.run(&conversation).await?;
        Ok(DirectOutcome { conversation, generation })
    }
}
