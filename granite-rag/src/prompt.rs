//! Conversation types and prompt composition.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model.
    System,
    /// The person asking.
    User,
    /// The model.
    Assistant,
}

impl Role {
    /// Lowercase role name as used by chat templates.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who is speaking.
    pub role: Role,
    /// What is said.
    pub content: String,
}

/// An ordered list of turns handed to a [`TextGenerator`](crate::TextGenerator).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// A conversation holding a single user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self { turns: vec![Turn { role: Role::User, content: content.into() }] }
    }

    /// Append a turn.
    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Turn { role, content: content.into() });
    }

    /// The turns in order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Content of the last user turn, if any.
    pub fn last_user_content(&self) -> Option<&str> {
        self.turns.iter().rev().find(|t| t.role == Role::User).map(|t| t.content.as_str())
    }
}

/// Builds the single-turn conversations the pipelines send to the model.
///
/// ```rust
/// use granite_rag::PromptComposer;
///
/// let conversation = PromptComposer::with_context(
///     "Can you tell me about MTV",
///     ["MTV is a media company. It launched in 1981."],
/// );
/// assert_eq!(
///     conversation.last_user_content(),
///     Some("Context: MTV is a media company. It launched in 1981.\n\nQuestion: Can you tell me about MTV"),
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptComposer;

impl PromptComposer {
    /// The question on its own.
    pub fn direct(question: &str) -> Conversation {
        Conversation::user(question)
    }

    /// The question preceded by retrieved context, one chunk per line.
    pub fn with_context<I, S>(question: &str, chunks: I) -> Conversation
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let context = join_context(chunks);
        Conversation::user(format!("Context: {context}\n\nQuestion: {question}"))
    }
}

/// Join chunk texts with newlines.
pub fn join_context<I, S>(chunks: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    chunks.into_iter().map(|c| c.as_ref().to_owned()).collect::<Vec<_>>().join("\n")
}
