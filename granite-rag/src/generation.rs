//! Text generation and throughput statistics.
//!
//! A [`TextGenerator`] wraps whatever actually runs the model. The
//! [`GenerationRunner`] times each call and derives [`InferenceStats`] from the
//! token counts the generator reports.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::error::{RagError, Result};
use crate::prompt::Conversation;

/// Per-call generation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Upper bound on newly generated tokens.
    pub max_new_tokens: usize,
    /// Sampling seed. With a seed, identical weights and prompts must give
    /// identical output.
    pub seed: Option<u64>,
    /// Whether the chat template should request a reasoning section.
    pub enable_thinking: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self { max_new_tokens: 1024, seed: Some(42), enable_thinking: false }
    }
}

/// Output of one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Decoded text of the newly generated tokens only, special tokens removed.
    pub text: String,
    /// Number of tokens in the formatted prompt.
    pub prompt_tokens: usize,
    /// Number of tokens generated after the prompt.
    pub completion_tokens: usize,
}

/// A language model that turns a conversation into new text.
///
/// Implementations apply the model's chat template, tokenize, generate and
/// decode. Failures are returned, never retried.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier used in logs and errors.
    fn name(&self) -> &str;

    /// Render the conversation the way the model will see it, for display.
    ///
    /// The default renders one `role: content` line per turn followed by an
    /// open assistant turn and ignores `options`.
    fn render_prompt(
        &self,
        conversation: &Conversation,
        _options: &GenerationOptions,
    ) -> Result<String> {
        let mut rendered = String::new();
        for turn in conversation.turns() {
            rendered.push_str(turn.role.as_str());
            rendered.push_str(": ");
            rendered.push_str(&turn.content);
            rendered.push('\n');
        }
        rendered.push_str("assistant:");
        Ok(rendered)
    }

    /// Generate a reply to the conversation.
    async fn generate(
        &self,
        conversation: &Conversation,
        options: &GenerationOptions,
    ) -> Result<Completion>;
}

/// Latency and throughput of one generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceStats {
    /// Wall-clock time spent in the generator.
    pub inference_time: Duration,
    /// Tokens in the formatted prompt.
    pub input_tokens: usize,
    /// Newly generated tokens.
    pub generated_tokens: usize,
    /// Prompt plus generated tokens.
    pub total_tokens: usize,
    /// `generated_tokens / inference_time` in seconds; 0 when no time elapsed.
    pub tokens_per_second: f64,
}

impl InferenceStats {
    /// Derive the stats for a call that took `inference_time`.
    pub fn new(inference_time: Duration, input_tokens: usize, generated_tokens: usize) -> Self {
        let seconds = inference_time.as_secs_f64();
        let tokens_per_second =
            if seconds > 0.0 { generated_tokens as f64 / seconds } else { 0.0 };
        Self {
            inference_time,
            input_tokens,
            generated_tokens,
            total_tokens: input_tokens + generated_tokens,
            tokens_per_second,
        }
    }
}

/// Generated text and its statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    /// Decoded new text.
    pub text: String,
    /// Timing and token counts.
    pub stats: InferenceStats,
}

/// Runs a [`TextGenerator`] with fixed options and measures each call.
#[derive(Clone)]
pub struct GenerationRunner {
    generator: Arc<dyn TextGenerator>,
    options: GenerationOptions,
}

impl GenerationRunner {
    /// Create a runner.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `options.max_new_tokens == 0`.
    pub fn new(generator: Arc<dyn TextGenerator>, options: GenerationOptions) -> Result<Self> {
        if options.max_new_tokens == 0 {
            return Err(RagError::ConfigError(
                "max_new_tokens must be greater than zero".to_string(),
            ));
        }
        Ok(Self { generator, options })
    }

    /// Return the generator.
    pub fn generator(&self) -> &Arc<dyn TextGenerator> {
        &self.generator
    }

    /// Return the options every call uses.
    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Render a conversation through the generator's chat template.
    ///
    /// # Errors
    ///
    /// Propagates template failures from the generator.
    pub fn render_prompt(&self, conversation: &Conversation) -> Result<String> {
        self.generator.render_prompt(conversation, &self.options)
    }

    /// Generate a reply and time it.
    ///
    /// # Errors
    ///
    /// Propagates generator failures unchanged.
    #[instrument(skip(self, conversation), fields(model = %self.generator.name()))]
    pub async fn run(&self, conversation: &Conversation) -> Result<GenerationResult> {
        let started = Instant::now();
        let completion =
            self.generator.generate(conversation, &self.options).await.inspect_err(|e| {
                error!(error = %e, "generation failed");
            })?;
        let elapsed = started.elapsed();

        let stats =
            InferenceStats::new(elapsed, completion.prompt_tokens, completion.completion_tokens);
        info!(
            input_tokens = stats.input_tokens,
            generated_tokens = stats.generated_tokens,
            elapsed_ms = elapsed.as_millis() as u64,
            tokens_per_second = stats.tokens_per_second,
            "generation completed"
        );
        Ok(GenerationResult { text: completion.text, stats })
    }
}

impl std::fmt::Debug for GenerationRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationRunner")
            .field("generator", &self.generator.name())
            .field("options", &self.options)
            .finish()
    }
}
