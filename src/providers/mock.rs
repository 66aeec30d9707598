/*!
 * Mock engine implementations for testing.
 *
 * This module provides a scripted engine that simulates different behaviors:
 * - `MockEngine::replying(text)` - Streams `text` back line by line
 * - `MockEngine::failing(message)` - Always fails with an API error
 * - `MockEngine::failing_mid_stream(text)` - Streams part of `text`, then breaks
 *
 * Every conversation it receives is recorded so tests can inspect prompts
 * and count calls.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use super::{ChunkSink, Completion, Conversation, Engine, TokenUsage};
use crate::errors::ProviderError;

/// Behavior mode for the mock engine
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with this reply
    Reply(String),
    /// Always fails with an error
    Failing(String),
    /// Streams the first half of the reply, then reports a broken stream
    FailMidStream(String),
}

/// Mock engine for testing pipeline behavior
#[derive(Debug, Clone)]
pub struct MockEngine {
    /// Behavior mode
    behavior: MockBehavior,
    /// Conversations received, in call order
    requests: Arc<Mutex<Vec<Conversation>>>,
}

impl MockEngine {
    /// Create a new mock engine with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock engine that always answers with `reply`
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::new(MockBehavior::Reply(reply.into()))
    }

    /// Create a mock engine that always errors
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(MockBehavior::Failing(message.into()))
    }

    /// Create a mock engine whose stream breaks halfway
    pub fn failing_mid_stream(reply: impl Into<String>) -> Self {
        Self::new(MockBehavior::FailMidStream(reply.into()))
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Conversations received so far
    pub fn requests(&self) -> Vec<Conversation> {
        self.requests.lock().clone()
    }

    /// Format a reply the way the engine is asked to answer
    pub fn file_reply(files: &[(&str, &str, &str)]) -> String {
        let mut response = String::new();
        for (path, tag, body) in files {
            response.push_str(&format!("# {}\n\n```{}\n{}\n```\n\n", path, tag, body));
        }
        response
    }
}

#[async_trait]
impl Engine for MockEngine {
    fn describe(&self) -> String {
        "mock".to_string()
    }

    async fn stream(
        &self,
        conversation: &Conversation,
        sink: &mut ChunkSink<'_>,
    ) -> Result<Completion, ProviderError> {
        self.requests.lock().push(conversation.clone());

        match &self.behavior {
            MockBehavior::Reply(reply) => {
                for piece in reply.split_inclusive('\n') {
                    sink(piece);
                }
                Ok(Completion {
                    text: reply.clone(),
                    usage: Some(TokenUsage {
                        input_tokens: conversation.messages().iter().map(|m| m.content.len() as u64).sum(),
                        output_tokens: reply.len() as u64,
                        cached_input_tokens: 0,
                    }),
                })
            }
            MockBehavior::Failing(message) => Err(ProviderError::ApiError {
                status_code: 500,
                message: message.clone(),
            }),
            MockBehavior::FailMidStream(reply) => {
                let half = reply.char_indices().nth(reply.chars().count() / 2).map(|(i, _)| i).unwrap_or(0);
                sink(&reply[..half]);
                Err(ProviderError::StreamError("connection reset".to_string()))
            }
        }
    }
}
