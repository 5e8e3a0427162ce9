//! Hugging Face chat templates rendered with minijinja.
//!
//! The template comes from the model's `tokenizer_config.json`, the same file
//! mistral.rs reads, so the rendered prompt carries the model's default system
//! preamble and role markers exactly as the model sees them.

use std::fmt::Write;
use std::path::Path;

use granite_rag::Conversation;
use minijinja::{Environment, ErrorKind, Value, context};
use minijinja_contrib::pycompat;
use serde_json::Value as Json;
use tracing::{debug, instrument};

use crate::error::{MistralRsError, Result};

pub(crate) const TOKENIZER_CONFIG: &str = "tokenizer_config.json";

const TEMPLATE_NAME: &str = "chat";

/// A compiled chat template plus the special tokens it may reference.
pub struct ChatTemplate {
    environment: Environment<'static>,
    bos_token: String,
    eos_token: String,
}

impl ChatTemplate {
    /// Compile a Jinja chat template.
    ///
    /// # Errors
    ///
    /// Returns [`MistralRsError::ChatTemplate`] if the template does not parse.
    pub fn new(
        source: impl Into<String>,
        bos_token: impl Into<String>,
        eos_token: impl Into<String>,
    ) -> Result<Self> {
        let mut environment = Environment::new();

        // Templates are written against Python's str and dict methods.
        environment.set_unknown_method_callback(pycompat::unknown_method_callback);
        environment.add_function("raise_exception", raise_exception);
        environment.add_function("strftime_now", strftime_now);
        environment.add_template_owned(TEMPLATE_NAME, source.into()).map_err(template_error)?;

        Ok(Self { environment, bos_token: bos_token.into(), eos_token: eos_token.into() })
    }

    /// Read `chat_template`, `bos_token` and `eos_token` from the contents of
    /// a `tokenizer_config.json`.
    ///
    /// # Errors
    ///
    /// Returns [`MistralRsError::ChatTemplate`] if the JSON is malformed or has
    /// no string `chat_template`.
    pub fn from_tokenizer_config(json: &str) -> Result<Self> {
        let config: Json = serde_json::from_str(json)
            .map_err(|e| MistralRsError::ChatTemplate(format!("{TOKENIZER_CONFIG}: {e}")))?;

        let source = config["chat_template"].as_str().ok_or_else(|| {
            MistralRsError::ChatTemplate(format!("{TOKENIZER_CONFIG} has no chat_template"))
        })?;

        Self::new(source, special_token(&config["bos_token"]), special_token(&config["eos_token"]))
    }

    /// Load the template of a local model directory or a Hugging Face Hub
    /// model.
    ///
    /// # Errors
    ///
    /// Returns [`MistralRsError::ChatTemplate`] if the file cannot be fetched,
    /// read or compiled.
    #[instrument]
    pub async fn load(model_id: &str) -> Result<Self> {
        let local = Path::new(model_id).join(TOKENIZER_CONFIG);
        let path = if local.is_file() {
            local
        } else {
            let repo = model_id.to_string();
            tokio::task::spawn_blocking(move || {
                hf_hub::api::sync::Api::new()?.model(repo).get(TOKENIZER_CONFIG)
            })
            .await
            .map_err(|e| MistralRsError::ChatTemplate(e.to_string()))?
            .map_err(|e| MistralRsError::ChatTemplate(format!("{TOKENIZER_CONFIG}: {e}")))?
        };

        debug!(path = %path.display(), "Reading chat template");
        let json = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| MistralRsError::ChatTemplate(format!("{}: {e}", path.display())))?;
        Self::from_tokenizer_config(&json)
    }

    /// Render a conversation.
    ///
    /// `add_generation_prompt` opens an assistant turn after the last message;
    /// `thinking` is passed through for templates with a reasoning mode.
    ///
    /// # Errors
    ///
    /// Returns [`MistralRsError::ChatTemplate`] if rendering fails, including
    /// when the template calls `raise_exception`.
    pub fn render(
        &self,
        conversation: &Conversation,
        add_generation_prompt: bool,
        thinking: bool,
    ) -> Result<String> {
        let messages: Vec<Value> = conversation
            .turns()
            .iter()
            .map(|turn| context! { role => turn.role.as_str(), content => turn.content.as_str() })
            .collect();

        let ctx = context! {
            bos_token => self.bos_token.as_str(),
            eos_token => self.eos_token.as_str(),
            messages,
            add_generation_prompt,
            thinking,
            enable_thinking => thinking,
        };

        self.environment
            .get_template(TEMPLATE_NAME)
            .and_then(|template| template.render(ctx))
            .map_err(template_error)
    }
}

impl std::fmt::Debug for ChatTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatTemplate")
            .field("bos_token", &self.bos_token)
            .field("eos_token", &self.eos_token)
            .finish_non_exhaustive()
    }
}

/// A special token is either a bare string or an added-token object with a
/// `content` field.
fn special_token(value: &Json) -> String {
    value
        .as_str()
        .or_else(|| value["content"].as_str())
        .unwrap_or_default()
        .to_string()
}

fn raise_exception(message: String) -> std::result::Result<String, minijinja::Error> {
    Err(minijinja::Error::new(
        ErrorKind::InvalidOperation,
        format!("The template raised an exception: {message}"),
    ))
}

fn strftime_now(format: String) -> std::result::Result<String, minijinja::Error> {
    let mut out = String::new();
    write!(out, "{}", chrono::Local::now().format(&format)).map_err(|_| {
        minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("invalid strftime format {format:?}"),
        )
    })?;
    Ok(out)
}

fn template_error(err: minijinja::Error) -> MistralRsError {
    MistralRsError::ChatTemplate(err.to_string())
}

#[cfg(test)]
mod tests {
    use granite_rag::{PromptComposer, Role};

    use super::*;

    /// Trimmed Granite 3.x template: a dated default system preamble unless
    /// the conversation brings its own system turn.
    const GRANITE_TEMPLATE: &str = r#"{%- if messages[0]['role'] == 'system' %}
    {%- set system_message = messages[0]['content'] %}
    {%- set loop_messages = messages[1:] %}
{%- else %}
    {%- set system_message = "Knowledge Cutoff Date: April 2024.\nToday's Date: " + strftime_now('%B %d, %Y') + ".\nYou are Granite, developed by IBM." %}
    {%- if thinking %}
        {%- set system_message = system_message + " You are a helpful AI assistant.\nRespond to every user query in a comprehensive and detailed way." %}
    {%- else %}
        {%- set system_message = system_message + " You are a helpful AI assistant." %}
    {%- endif %}
    {%- set loop_messages = messages %}
{%- endif %}
{{- '<|start_of_role|>system<|end_of_role|>' + system_message + '<|end_of_text|>\n' }}
{%- for message in loop_messages %}
    {{- '<|start_of_role|>' + message['role'] + '<|end_of_role|>' + message['content'] + '<|end_of_text|>\n' }}
    {%- if loop.last and add_generation_prompt %}
        {{- '<|start_of_role|>assistant<|end_of_role|>' }}
    {%- endif %}
{%- endfor %}"#;

    fn granite() -> ChatTemplate {
        ChatTemplate::new(GRANITE_TEMPLATE, "<|end_of_text|>", "<|end_of_text|>").unwrap()
    }

    #[test]
    fn default_system_preamble_is_rendered() {
        let rendered = granite()
            .render(&PromptComposer::direct("Can you tell me about MTV."), true, false)
            .unwrap();

        assert!(rendered.starts_with(
            "<|start_of_role|>system<|end_of_role|>Knowledge Cutoff Date: April 2024.\nToday's Date: "
        ));
        assert!(rendered.contains("You are Granite, developed by IBM. You are a helpful AI assistant.<|end_of_text|>\n"));
        assert!(rendered.ends_with(
            "<|start_of_role|>user<|end_of_role|>Can you tell me about MTV.<|end_of_text|>\n\
             <|start_of_role|>assistant<|end_of_role|>"
        ));
    }

    #[test]
    fn thinking_changes_the_preamble() {
        let conversation = PromptComposer::direct("Who founded MTV?");
        let plain = granite().render(&conversation, true, false).unwrap();
        let thinking = granite().render(&conversation, true, true).unwrap();
        assert!(!plain.contains("comprehensive and detailed"));
        assert!(thinking.contains("comprehensive and detailed"));
    }

    #[test]
    fn explicit_system_turn_replaces_the_preamble() {
        let mut conversation = Conversation::default();
        conversation.push(Role::System, "Answer in one sentence.");
        conversation.push(Role::User, "What is MTV?");

        let rendered = granite().render(&conversation, false, false).unwrap();
        assert_eq!(
            rendered,
            "<|start_of_role|>system<|end_of_role|>Answer in one sentence.<|end_of_text|>\n\
             <|start_of_role|>user<|end_of_role|>What is MTV?<|end_of_text|>\n"
        );
    }

    #[test]
    fn tokenizer_config_supplies_template_and_tokens() {
        let json = serde_json::json!({
            "bos_token": { "content": "<s>", "lstrip": false },
            "eos_token": "</s>",
            "chat_template": "{{ bos_token }}{% for m in messages %}{{ m.role }}={{ m.content }}{% endfor %}{{ eos_token }}",
        })
        .to_string();

        let template = ChatTemplate::from_tokenizer_config(&json).unwrap();
        let rendered = template.render(&Conversation::user("hi"), true, false).unwrap();
        assert_eq!(rendered, "<s>user=hi</s>");
    }

    #[test]
    fn missing_chat_template_is_an_error() {
        let err = ChatTemplate::from_tokenizer_config(r#"{ "eos_token": "</s>" }"#).unwrap_err();
        assert!(matches!(err, MistralRsError::ChatTemplate(msg) if msg.contains("chat_template")));
    }

    #[test]
    fn raise_exception_surfaces_as_template_error() {
        let template = ChatTemplate::new(
            "{% if messages[0].role != 'system' %}{{ raise_exception('system turn required') }}{% endif %}",
            "",
            "",
        )
        .unwrap();
        let err = template.render(&Conversation::user("hi"), true, false).unwrap_err();
        assert!(matches!(err, MistralRsError::ChatTemplate(msg) if msg.contains("system turn required")));
    }

    #[tokio::test]
    async fn local_model_directory_is_read_without_the_hub() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(TOKENIZER_CONFIG),
            r#"{ "chat_template": "{% for m in messages %}[{{ m.content }}]{% endfor %}" }"#,
        )
        .unwrap();

        let template = ChatTemplate::load(dir.path().to_str().unwrap()).await.unwrap();
        let rendered = template.render(&Conversation::user("MTV"), true, false).unwrap();
        assert_eq!(rendered, "[MTV]");
    }
}
