use async_trait::async_trait;
use futures::{Stream, StreamExt};
use log::{debug, error};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use std::time::Duration;

use super::sse::SseDecoder;
use super::{status_error, ChunkSink, Completion, Conversation, Engine, TokenUsage};
use crate::errors::ProviderError;

/// OpenAI client for chat completions (and compatible servers)
#[derive(Debug)]
pub struct OpenAI {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
    stream_options: StreamOptions,
}

#[derive(Debug, Serialize)]
pub struct OpenAIMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct StreamOptions {
    include_usage: bool,
}

impl OpenAIRequest {
    /// Build a streaming request; the system prompt leads the message list
    pub fn from_conversation(conversation: &Conversation, model: &str, max_tokens: u32, temperature: f32) -> Self {
        let mut messages = Vec::with_capacity(conversation.messages().len() + 1);
        if !conversation.system().is_empty() {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: conversation.system().to_string(),
            });
        }
        messages.extend(conversation.messages().iter().map(|m| OpenAIMessage {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
        }));

        Self {
            model: model.to_string(),
            messages,
            temperature,
            max_tokens,
            stream: true,
            stream_options: StreamOptions { include_usage: true },
        }
    }
}

/// What one stream chunk contributes
#[derive(Debug, PartialEq)]
pub enum ChunkEvent {
    Text(String),
    Usage(TokenUsage),
    Done,
    Other,
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            max_tokens,
            temperature: 0.0,
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn api_url(&self) -> String {
        let base = if self.endpoint.is_empty() {
            "https://api.openai.com/v1"
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/chat/completions", base)
    }

    /// Interpret one `data:` payload of the completion stream
    pub fn parse_chunk(payload: &str) -> Result<ChunkEvent, ProviderError> {
        if payload.trim() == "[DONE]" {
            return Ok(ChunkEvent::Done);
        }

        let value: Value = serde_json::from_str(payload)
            .map_err(|e| ProviderError::ParseError(format!("{}: {}", e, payload)))?;

        if let Some(message) = value.pointer("/error/message").and_then(Value::as_str) {
            return Err(ProviderError::StreamError(message.to_string()));
        }

        if value.pointer("/choices/0/finish_reason").and_then(Value::as_str) == Some("length") {
            return Err(ProviderError::StreamError(
                "response truncated at the max_tokens limit".to_string(),
            ));
        }

        if let Some(text) = value.pointer("/choices/0/delta/content").and_then(Value::as_str) {
            return Ok(ChunkEvent::Text(text.to_string()));
        }

        if let Some(usage) = value.get("usage").filter(|u| !u.is_null()) {
            let read = |key: &str| usage.get(key).and_then(Value::as_u64).unwrap_or(0);
            return Ok(ChunkEvent::Usage(TokenUsage {
                input_tokens: read("prompt_tokens"),
                output_tokens: read("completion_tokens"),
                cached_input_tokens: usage
                    .pointer("/prompt_tokens_details/cached_tokens")
                    .and_then(Value::as_u64)
                    .unwrap_or(0),
            }));
        }

        Ok(ChunkEvent::Other)
    }
}

#[async_trait]
impl Engine for OpenAI {
    fn describe(&self) -> String {
        format!("openai/{}", self.model)
    }

    async fn stream(
        &self,
        conversation: &Conversation,
        sink: &mut ChunkSink<'_>,
    ) -> Result<Completion, ProviderError> {
        let request = OpenAIRequest::from_conversation(conversation, &self.model, self.max_tokens, self.temperature);

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to send request to OpenAI API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(status_error(status.as_u16(), error_text));
        }

        Self::read_stream(response.bytes_stream(), sink).await
    }
}

impl OpenAI {
    /// Consume a chat completion stream, which must end with `[DONE]`
    pub async fn read_stream<S, B, E>(mut bytes: S, sink: &mut ChunkSink<'_>) -> Result<Completion, ProviderError>
    where
        S: Stream<Item = Result<B, E>> + Unpin,
        B: AsRef<[u8]>,
        E: Display,
    {
        let mut decoder = SseDecoder::new();
        let mut completion = Completion::default();
        let mut done = false;

        'stream: while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(|e| ProviderError::StreamError(e.to_string()))?;
            for payload in decoder.push(chunk.as_ref()) {
                match Self::parse_chunk(&payload)? {
                    ChunkEvent::Text(text) => {
                        sink(&text);
                        completion.text.push_str(&text);
                    }
                    ChunkEvent::Usage(usage) => completion.usage = Some(usage),
                    ChunkEvent::Done => {
                        done = true;
                        break 'stream;
                    }
                    ChunkEvent::Other => {}
                }
            }
        }

        if !done {
            if let Some(ChunkEvent::Done) = decoder.finish().map(|p| Self::parse_chunk(&p)).transpose()? {
                done = true;
            }
        }
        if !done {
            return Err(ProviderError::StreamError(format!(
                "stream ended before [DONE] after {} chars",
                completion.text.len()
            )));
        }

        debug!("OpenAI usage: {:?}", completion.usage);
        Ok(completion)
    }
}
