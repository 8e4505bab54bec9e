//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, llama.cpp, Groq, Together
//! AI, DeepSeek and any endpoint exposing `/v1/chat/completions`.
//!
//! Supports chat completions, non-streaming and streaming (SSE).
//!
//! `timeout` bounds a whole non-streaming exchange. For streams it bounds
//! the wait for the response head and then each gap between reads, so a
//! long answer that keeps producing text is never cut off.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use simplechat_core::error::ProviderError;
use simplechat_core::message::{Message, Role};
use simplechat_core::provider::*;
use tracing::{debug, trace, warn};

/// An OpenAI-compatible chat-completion provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
            client,
        })
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new("openai", "https://api.openai.com/v1", api_key, Duration::from_secs(120))
    }

    /// Create an Ollama provider (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Result<Self, ProviderError> {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "", // Ollama doesn't need a key
            Duration::from_secs(120),
        )
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::System => "system".into(),
                },
                content: Some(m.content.clone()),
            })
            .collect()
    }

    /// Build the JSON body for `/chat/completions`.
    fn request_body(
        request: &ProviderRequest,
        stream: bool,
    ) -> Result<serde_json::Value, ProviderError> {
        let opts = &request.options;
        let model = opts
            .model
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("no model selected".into()))?;

        let mut body = serde_json::json!({
            "model": model,
            "messages": Self::to_api_messages(&request.messages),
            "stream": stream,
        });

        if stream {
            body["stream_options"] = serde_json::json!({ "include_usage": true });
        }
        if let Some(temperature) = opts.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        if let Some(max_tokens) = opts.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        if let Some(top_p) = opts.top_p {
            body["top_p"] = serde_json::json!(top_p);
        }
        if let Some(penalty) = opts.frequency_penalty {
            body["frequency_penalty"] = serde_json::json!(penalty);
        }
        if let Some(penalty) = opts.presence_penalty {
            body["presence_penalty"] = serde_json::json!(penalty);
        }
        if !opts.stop_sequences.is_empty() {
            body["stop"] = serde_json::json!(opts.stop_sequences);
        }
        if opts.top_k.is_some() {
            trace!("top_k is not part of the OpenAI API, dropping it");
        }

        Ok(body)
    }

    /// POST to `/chat/completions` and map error statuses.
    ///
    /// Streaming requests only bound the wait for the response head here;
    /// the body is bounded per read by the caller.
    async fn post_completions(
        &self,
        body: &serde_json::Value,
        stream: bool,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let accept = if stream { "text/event-stream" } else { "application/json" };

        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Accept", accept)
            .json(body);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let sent = if stream {
            tokio::time::timeout(self.timeout, builder.send())
                .await
                .map_err(|_| ProviderError::Timeout(format!("no response within {:?}", self.timeout)))?
        } else {
            builder.timeout(self.timeout).send().await
        };
        let response = sent.map_err(map_transport_error)?;
        let status = response.status().as_u16();

        match status {
            200 => Ok(response),
            429 => Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            }),
            401 | 403 => Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            )),
            _ => {
                let error_body = response.text().await.unwrap_or_default();
                warn!(provider = %self.name, status, body = %error_body, "Provider returned error");
                Err(ProviderError::ApiError {
                    status_code: status,
                    message: error_body,
                })
            }
        }
    }
}

fn map_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ChatResponse, ProviderError> {
        let body = Self::request_body(&request, false)?;
        debug!(provider = %self.name, model = %body["model"], "Sending completion request");

        let response = self.post_completions(&body, false).await?;

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice =
            api_response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::ApiError {
                    status_code: 200,
                    message: "No choices in response".into(),
                })?;

        Ok(ChatResponse {
            id: api_response.id,
            model: api_response.model,
            message: Message::assistant(choice.message.content.unwrap_or_default()),
            finish_reason: choice.finish_reason,
            usage: api_response.usage.map(Usage::from),
        })
    }

    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ChunkReceiver, ProviderError> {
        let body = Self::request_body(&request, true)?;
        debug!(provider = %self.name, model = %body["model"], "Sending streaming request");

        let response = self.post_completions(&body, true).await?;

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let provider_name = self.name.clone();
        let idle = self.timeout;

        // Read the SSE byte stream; dropping `response` closes the connection.
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut lines = SseLines::default();
            let mut finished = false;

            loop {
                let next = tokio::select! {
                    _ = tx.closed() => {
                        debug!(provider = %provider_name, "Stream receiver dropped, closing upstream");
                        return;
                    }
                    next = tokio::time::timeout(idle, byte_stream.next()) => next,
                };
                let bytes = match next {
                    Ok(Some(Ok(b))) => b,
                    Ok(Some(Err(e))) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                    Ok(None) => break,
                    Err(_) => {
                        warn!(provider = %provider_name, idle = ?idle, "Provider stream went idle");
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(format!(
                                "no data from provider for {idle:?}"
                            ))))
                            .await;
                        return;
                    }
                };

                for data in lines.push(&bytes) {
                    if data == "[DONE]" {
                        let _ = tx.send(Ok(StreamChunk { done: true, ..StreamChunk::default() })).await;
                        return;
                    }

                    match serde_json::from_str::<StreamResponse>(&data) {
                        Ok(event) => {
                            let Some(chunk) = event.into_chunk() else {
                                continue;
                            };
                            finished |= chunk.finish_reason.is_some();
                            if tx.send(Ok(chunk)).await.is_err() {
                                debug!(provider = %provider_name, "Stream receiver dropped, closing upstream");
                                return;
                            }
                        }
                        Err(e) => {
                            trace!(
                                provider = %provider_name,
                                data = %data,
                                error = %e,
                                "Ignoring unparseable SSE chunk"
                            );
                        }
                    }
                }
            }

            // Connection closed without [DONE]: fine after a finish_reason,
            // truncated otherwise.
            let last = if finished {
                Ok(StreamChunk { done: true, ..StreamChunk::default() })
            } else {
                Err(ProviderError::StreamInterrupted(
                    "connection closed before the response finished".into(),
                ))
            };
            let _ = tx.send(last).await;
        });

        Ok(rx)
    }
}

/// Splits an SSE byte stream into `data:` payloads.
///
/// Bytes are buffered until a full line is available so multi-byte UTF-8
/// sequences split across network reads survive intact.
#[derive(Default)]
struct SseLines {
    buffer: Vec<u8>,
}

impl SseLines {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(end) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=end).collect();
            let text = String::from_utf8_lossy(&raw);
            let line = text.trim_end_matches(&['\r', '\n'][..]);

            // Skip blank separators and SSE comments
            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            if let Some(data) = line.strip_prefix("data:") {
                payloads.push(data.trim().to_string());
            }
        }
        payloads
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    id: String,
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl From<ApiUsage> for Usage {
    fn from(u: ApiUsage) -> Self {
        Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

// --- Streaming SSE types ---

/// A single SSE `data: {...}` chunk from a streaming response.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

impl StreamResponse {
    /// Keep only events carrying text, a finish reason, or usage.
    fn into_chunk(self) -> Option<StreamChunk> {
        let (content, finish_reason) = match self.choices.into_iter().next() {
            Some(choice) => (
                choice.delta.content.filter(|c| !c.is_empty()),
                choice.finish_reason,
            ),
            None => (None, None),
        };
        let usage = self.usage.map(Usage::from);

        if content.is_none() && finish_reason.is_none() && usage.is_none() {
            return None;
        }

        Some(StreamChunk {
            content,
            done: false,
            finish_reason,
            usage,
        })
    }
}
