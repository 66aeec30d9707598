/*!
 * Engine providers.
 *
 * This module contains streaming client implementations for the supported
 * engine vendors:
 * - Anthropic: Messages API
 * - OpenAI: Chat Completions API (and compatible servers)
 * - Mock: scripted engine for tests
 *
 * Conversation history is an explicit `Conversation` value. Each call takes
 * one in and hands back the extended one, so nothing is shared or mutated
 * behind the caller's back.
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;

pub mod anthropic;
pub mod mock;
pub mod openai;
pub mod sse;

/// Speaker of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Immutable conversation state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Conversation {
    system: String,
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation with fixed system instructions
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            messages: Vec::new(),
        }
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// A copy of this conversation with one more user turn
    pub fn with_user(&self, content: impl Into<String>) -> Self {
        self.with_message(Role::User, content.into())
    }

    /// A copy of this conversation with one more assistant turn
    pub fn with_assistant(&self, content: impl Into<String>) -> Self {
        self.with_message(Role::Assistant, content.into())
    }

    fn with_message(&self, role: Role, content: String) -> Self {
        let mut messages = self.messages.clone();
        messages.push(Message { role, content });
        Self {
            system: self.system.clone(),
            messages,
        }
    }
}

/// Token usage reported by a provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Input tokens served from the provider's prompt cache
    pub cached_input_tokens: u64,
}

/// Full result of one streamed call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// Receives text chunks as they arrive
pub type ChunkSink<'a> = dyn FnMut(&str) + Send + 'a;

/// Common trait for all engine providers
///
/// Implementations stream the reply chunk by chunk into `sink` and also return
/// the full text once the stream has ended.
#[async_trait]
pub trait Engine: Send + Sync + Debug {
    /// Vendor and model, for logs
    fn describe(&self) -> String;

    /// Complete the conversation, whose last message is a user turn
    async fn stream(
        &self,
        conversation: &Conversation,
        sink: &mut ChunkSink<'_>,
    ) -> Result<Completion, ProviderError>;
}

/// Send `prompt` as the next user turn and return the reply with the
/// extended conversation
pub async fn ask(
    engine: &dyn Engine,
    conversation: Conversation,
    prompt: &str,
    sink: &mut ChunkSink<'_>,
) -> Result<(Completion, Conversation), ProviderError> {
    let conversation = conversation.with_user(prompt);
    let completion = engine.stream(&conversation, sink).await?;
    let conversation = conversation.with_assistant(completion.text.clone());
    Ok((completion, conversation))
}

/// Map a non-success HTTP status to a provider error
pub(crate) fn status_error(status_code: u16, message: String) -> ProviderError {
    match status_code {
        401 | 403 => ProviderError::AuthenticationError(message),
        _ => ProviderError::ApiError { status_code, message },
    }
}
