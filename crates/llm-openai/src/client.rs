//! Streaming client for the chat-completions endpoint.

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::OpenAiConfig;
use crate::error::{OpenAiError, Result};

/// Buffered stream events between the reader task and the consumer.
const STREAM_CHANNEL_CAPACITY: usize = 256;

// ── Wire types ──────────────────────────────────────────────────────────────

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One role-tagged message of a conversation, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Optional author name, billed separately by the token accounting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: i64,
    stream: bool,
}

// ── Stream events ───────────────────────────────────────────────────────────

/// One unit of a streamed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// An incremental piece of response text.
    Delta(String),
    /// The model finished with `finish_reason == "stop"`.
    Stop,
}

// ── Client ──────────────────────────────────────────────────────────────────

/// Async client that turns one POST into a stream of [`StreamEvent`]s.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
}

impl OpenAiClient {
    /// `api_url` is the full chat-completions endpoint; exposed so tests
    /// can point the client at a local mock server.
    pub fn new(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            api_url: api_url.into(),
        }
    }

    pub fn from_config(config: &OpenAiConfig) -> Self {
        Self::new(config.api_key.clone(), config.api_url.clone())
    }

    /// Start a streaming completion for `messages` on `model`.
    ///
    /// Returns a receiver fed one [`StreamEvent`] per server-sent delta and
    /// a handle that resolves once the response body is drained. The
    /// receiver closes when the server sends its `[DONE]` sentinel, the body
    /// ends, or reading fails; read failures surface through the handle.
    ///
    /// `max_tokens` is forwarded untouched, negative budgets included. The
    /// API's rejection is the caller's error path.
    pub async fn stream_chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        max_tokens: i64,
    ) -> Result<(mpsc::Receiver<StreamEvent>, JoinHandle<Result<()>>)> {
        let request = ChatCompletionRequest {
            model,
            messages,
            max_tokens,
            stream: true,
        };
        let body = serde_json::to_vec(&request)?;

        let resp = self
            .client
            .post(&self.api_url)
            .header("authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OpenAiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let (tx, rx) = mpsc::channel::<StreamEvent>(STREAM_CHANNEL_CAPACITY);

        let handle = tokio::spawn(async move {
            let mut stream = resp.bytes_stream();
            let mut line_buf = String::new();

            while let Some(chunk) = stream.next().await {
                let bytes = chunk.map_err(|e| OpenAiError::Stream(e.to_string()))?;
                line_buf.push_str(&String::from_utf8_lossy(&bytes));

                // Drain every complete line; a partial line stays buffered
                // until the next chunk completes it.
                while let Some(pos) = line_buf.find('\n') {
                    let line = line_buf[..pos].trim_end_matches('\r').to_string();
                    line_buf.drain(..=pos);

                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    if data == "[DONE]" {
                        return Ok(());
                    }
                    if let Ok(ev) = serde_json::from_str::<serde_json::Value>(data) {
                        if let Some(text) = ev["choices"][0]["delta"]["content"]
                            .as_str()
                            .filter(|s| !s.is_empty())
                        {
                            if tx.send(StreamEvent::Delta(text.to_string())).await.is_err() {
                                // Receiver dropped; nothing left to stream to.
                                return Ok(());
                            }
                        } else if ev["choices"][0]["finish_reason"].as_str() == Some("stop")
                            && tx.send(StreamEvent::Stop).await.is_err()
                        {
                            return Ok(());
                        }
                    }
                }
            }

            // Body ended without [DONE]; the consumer sees the channel close.
            Ok(())
        });

        Ok((rx, handle))
    }
}
