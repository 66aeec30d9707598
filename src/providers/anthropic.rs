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

/// Anthropic client for interacting with the Messages API
#[derive(Debug)]
pub struct Anthropic {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to public API)
    endpoint: String,
    /// Model identifier
    model: String,
    /// Maximum number of tokens to generate
    max_tokens: u32,
    /// Temperature for generation
    temperature: f32,
}

/// Anthropic message request
#[derive(Debug, Serialize)]
pub struct AnthropicRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<AnthropicMessage>,

    /// System prompt blocks, marked cacheable
    #[serde(skip_serializing_if = "Vec::is_empty")]
    system: Vec<SystemBlock>,

    /// Temperature for generation
    temperature: f32,

    /// Maximum number of tokens to generate
    max_tokens: u32,

    /// Stream the answer as server-sent events
    stream: bool,
}

/// Anthropic message format
#[derive(Debug, Serialize)]
pub struct AnthropicMessage {
    /// Role of the message sender (user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// System prompt text block
#[derive(Debug, Serialize)]
pub struct SystemBlock {
    #[serde(rename = "type")]
    block_type: &'static str,
    text: String,
    cache_control: CacheControl,
}

#[derive(Debug, Serialize)]
pub struct CacheControl {
    #[serde(rename = "type")]
    control_type: &'static str,
}

impl AnthropicRequest {
    /// Build a streaming request from a conversation
    pub fn from_conversation(conversation: &Conversation, model: &str, max_tokens: u32, temperature: f32) -> Self {
        let system = if conversation.system().is_empty() {
            Vec::new()
        } else {
            vec![SystemBlock {
                block_type: "text",
                text: conversation.system().to_string(),
                cache_control: CacheControl { control_type: "ephemeral" },
            }]
        };

        Self {
            model: model.to_string(),
            messages: conversation
                .messages()
                .iter()
                .map(|m| AnthropicMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            system,
            temperature,
            max_tokens,
            stream: true,
        }
    }
}

/// What one stream event contributes
#[derive(Debug, PartialEq)]
pub enum StreamEvent {
    Text(String),
    Usage(TokenUsage),
    Error(String),
    Stop,
    Other,
}

impl Anthropic {
    /// Create a new Anthropic client
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
        if self.endpoint.is_empty() {
            "https://api.anthropic.com/v1/messages".to_string()
        } else {
            format!("{}/v1/messages", self.endpoint.trim_end_matches('/'))
        }
    }

    /// Interpret one `data:` payload of the Messages stream
    pub fn parse_event(payload: &str) -> Result<StreamEvent, ProviderError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| ProviderError::ParseError(format!("{}: {}", e, payload)))?;

        let event = match value.get("type").and_then(Value::as_str) {
            Some("content_block_delta") => value
                .get("delta")
                .filter(|d| d.get("type").and_then(Value::as_str) == Some("text_delta"))
                .and_then(|d| d.get("text"))
                .and_then(Value::as_str)
                .map(|t| StreamEvent::Text(t.to_string()))
                .unwrap_or(StreamEvent::Other),
            Some("message_start") => {
                let usage = value.pointer("/message/usage");
                StreamEvent::Usage(TokenUsage {
                    input_tokens: read_u64(usage, "input_tokens"),
                    output_tokens: read_u64(usage, "output_tokens"),
                    cached_input_tokens: read_u64(usage, "cache_read_input_tokens"),
                })
            }
            Some("message_delta") => match value.pointer("/delta/stop_reason").and_then(Value::as_str) {
                Some("max_tokens") => StreamEvent::Error(format!(
                    "response truncated at the max_tokens limit ({} output tokens)",
                    read_u64(value.get("usage"), "output_tokens")
                )),
                _ => StreamEvent::Usage(TokenUsage {
                    output_tokens: read_u64(value.get("usage"), "output_tokens"),
                    ..TokenUsage::default()
                }),
            },
            Some("error") => StreamEvent::Error(
                value
                    .pointer("/error/message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown stream error")
                    .to_string(),
            ),
            Some("message_stop") => StreamEvent::Stop,
            _ => StreamEvent::Other,
        };
        Ok(event)
    }
}

#[async_trait]
impl Engine for Anthropic {
    fn describe(&self) -> String {
        format!("anthropic/{}", self.model)
    }

    async fn stream(
        &self,
        conversation: &Conversation,
        sink: &mut ChunkSink<'_>,
    ) -> Result<Completion, ProviderError> {
        let request = AnthropicRequest::from_conversation(conversation, &self.model, self.max_tokens, self.temperature);

        let response = self
            .client
            .post(self.api_url())
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to send request to Anthropic API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Anthropic API error ({}): {}", status, error_text);
            return Err(status_error(status.as_u16(), error_text));
        }

        Self::read_stream(response.bytes_stream(), sink).await
    }
}

impl Anthropic {
    /// Consume a Messages event stream
    ///
    /// Only a stream that ends with `message_stop` counts as complete; a
    /// stream that breaks off earlier or stops on `max_tokens` is an error.
    pub async fn read_stream<S, B, E>(mut bytes: S, sink: &mut ChunkSink<'_>) -> Result<Completion, ProviderError>
    where
        S: Stream<Item = Result<B, E>> + Unpin,
        B: AsRef<[u8]>,
        E: Display,
    {
        let mut decoder = SseDecoder::new();
        let mut completion = Completion::default();
        let mut usage = TokenUsage::default();
        let mut stopped = false;

        'stream: while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(|e| ProviderError::StreamError(e.to_string()))?;
            for payload in decoder.push(chunk.as_ref()) {
                match Self::parse_event(&payload)? {
                    StreamEvent::Text(text) => {
                        sink(&text);
                        completion.text.push_str(&text);
                    }
                    StreamEvent::Usage(delta) => {
                        usage.input_tokens += delta.input_tokens;
                        usage.output_tokens = usage.output_tokens.max(delta.output_tokens);
                        usage.cached_input_tokens += delta.cached_input_tokens;
                    }
                    StreamEvent::Error(message) => return Err(ProviderError::StreamError(message)),
                    StreamEvent::Stop => {
                        stopped = true;
                        break 'stream;
                    }
                    StreamEvent::Other => {}
                }
            }
        }

        if !stopped {
            if let Some(StreamEvent::Stop) = decoder.finish().map(|p| Self::parse_event(&p)).transpose()? {
                stopped = true;
            }
        }
        if !stopped {
            return Err(ProviderError::StreamError(format!(
                "stream ended before message_stop after {} chars",
                completion.text.len()
            )));
        }

        debug!("Anthropic usage: {:?}", usage);
        completion.usage = Some(usage);
        Ok(completion)
    }
}

fn read_u64(value: Option<&Value>, key: &str) -> u64 {
    value.and_then(|v| v.get(key)).and_then(Value::as_u64).unwrap_or(0)
}
