//! MistralRsGenerator - local text generation implementing `TextGenerator`.

use std::sync::Arc;

use async_trait::async_trait;
use granite_rag::{
    Completion, Conversation, GenerationConfig, GenerationOptions, Role, TextGenerator,
};
use mistralrs::{PagedAttentionMetaBuilder, RequestBuilder, TextMessageRole, TextModelBuilder};
use tracing::{debug, info, instrument};

use crate::chat_template::ChatTemplate;
use crate::config::MistralRsConfig;
use crate::error::{MistralRsError, Result};

/// mistral.rs text model wrapped as a [`TextGenerator`].
///
/// # Example
///
/// ```rust,ignore
/// use granite_mistralrs::MistralRsGenerator;
///
/// let generator = MistralRsGenerator::from_generation_config(&GenerationConfig::default()).await?;
/// ```
pub struct MistralRsGenerator {
    model: Arc<mistralrs::Model>,
    chat_template: ChatTemplate,
    config: MistralRsConfig,
}

impl MistralRsGenerator {
    /// Load a model and its chat template from configuration.
    ///
    /// The first call for a model ID downloads the weights from the
    /// HuggingFace Hub.
    #[instrument(skip(config), fields(model_id = %config.model_id))]
    pub async fn new(config: MistralRsConfig) -> Result<Self> {
        info!("Loading mistral.rs model");

        let mut builder =
            TextModelBuilder::new(config.model_id.clone()).with_dtype(config.dtype.to_model_dtype());

        if config.force_cpu {
            builder = builder.with_force_cpu();
            debug!("Pinned to CPU");
        }

        if config.paged_attention {
            builder = builder
                .with_paged_attn(|| PagedAttentionMetaBuilder::default().build())
                .map_err(|e| MistralRsError::ModelLoad(e.to_string()))?;
            debug!("PagedAttention enabled");
        }

        if config.logging {
            builder = builder.with_logging();
        }

        let model = builder.build().await.map_err(|e| MistralRsError::ModelLoad(e.to_string()))?;
        let chat_template = ChatTemplate::load(&config.model_id).await?;

        info!("Model loaded successfully");
        Ok(Self { model: Arc::new(model), chat_template, config })
    }

    /// Load the model a [`GenerationConfig`] names, on the device it names.
    pub async fn from_generation_config(config: &GenerationConfig) -> Result<Self> {
        config.validate().map_err(|e| MistralRsError::InvalidConfig(e.to_string()))?;
        Self::new(MistralRsConfig::from_generation(config)?).await
    }

    /// Get the model configuration
    pub fn config(&self) -> &MistralRsConfig {
        &self.config
    }
}

/// Convert a conversation plus options into a mistral.rs request.
pub(crate) fn build_request(
    conversation: &Conversation,
    options: &GenerationOptions,
) -> RequestBuilder {
    let mut request = RequestBuilder::new();
    for turn in conversation.turns() {
        let role = match turn.role {
            Role::System => TextMessageRole::System,
            Role::User => TextMessageRole::User,
            Role::Assistant => TextMessageRole::Assistant,
        };
        request = request.add_message(role, turn.content.clone());
    }

    // Greedy decoding: a fixed seed must reproduce the same text.
    if options.seed.is_some() {
        request = request.set_deterministic_sampler();
    }

    request.set_sampler_max_len(options.max_new_tokens).enable_thinking(options.enable_thinking)
}

#[async_trait]
impl TextGenerator for MistralRsGenerator {
    fn name(&self) -> &str {
        &self.config.model_id
    }

    fn render_prompt(
        &self,
        conversation: &Conversation,
        options: &GenerationOptions,
    ) -> granite_rag::Result<String> {
        Ok(self.chat_template.render(conversation, true, options.enable_thinking)?)
    }

    #[instrument(skip(self, conversation, options), fields(model = %self.config.model_id))]
    async fn generate(
        &self,
        conversation: &Conversation,
        options: &GenerationOptions,
    ) -> granite_rag::Result<Completion> {
        debug!("Generating with {} turns", conversation.turns().len());

        let response = self
            .model
            .send_chat_request(build_request(conversation, options))
            .await
            .map_err(|e| MistralRsError::Inference(e.to_string()))?;

        let text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or(MistralRsError::EmptyResponse)?;

        Ok(Completion {
            text,
            prompt_tokens: response.usage.prompt_tokens,
            completion_tokens: response.usage.completion_tokens,
        })
    }
}

impl std::fmt::Debug for MistralRsGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MistralRsGenerator")
            .field("config", &self.config)
            .field("chat_template", &self.chat_template)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use granite_rag::PromptComposer;

    use super::*;

    #[test]
    fn test_build_request_accepts_every_role() {
        let mut conversation = PromptComposer::direct("Can you tell me about MTV.");
        conversation.push(Role::Assistant, "MTV is a cable channel.");
        conversation.push(Role::System, "Be brief.");

        // RequestBuilder exposes no accessors; building must not panic.
        let _ = build_request(&conversation, &GenerationOptions::default());
        let _ = build_request(&conversation, &GenerationOptions { seed: None, ..Default::default() });
    }
}
