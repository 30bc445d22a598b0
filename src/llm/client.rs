// src/llm/client.rs
// Completion service client (OpenAI-compatible chat completions endpoint)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::config::LlmConfig;
use crate::error::{Result, VegaError};

/// Message in a conversation, as sent to the completion API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String, // "system" | "user" | "assistant"
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

impl From<&crate::session::ChatMessage> for Message {
    fn from(msg: &crate::session::ChatMessage) -> Self {
        match msg.role {
            crate::session::ChatRole::Human => Message::user(msg.content.as_str()),
            crate::session::ChatRole::Ai => Message::assistant(msg.content.as_str()),
        }
    }
}

/// A single request to the completion service: a system/human message
/// sequence plus an optional response-format hint for structured output.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub response_format: Option<Value>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            response_format: None,
        }
    }

    pub fn with_response_format(mut self, format: Value) -> Self {
        self.response_format = Some(format);
        self
    }
}

/// Seam for the remote completion service. Production uses [`OpenAiClient`];
/// tests substitute a scripted stub.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send one completion request and return the raw text of the reply.
    ///
    /// Must map the upstream rate-limit condition to
    /// [`VegaError::RateLimited`] so the retry wrapper can distinguish it.
    /// No internal retry: retrying is the invoker's job.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// Client for an OpenAI-compatible chat completions endpoint
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(client: Client, config: &LlmConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_payload(&self, request: &CompletionRequest) -> Value {
        let mut payload = json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });
        if let Some(format) = &request.response_format {
            payload["response_format"] = format.clone();
        }
        payload
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    #[instrument(skip(self, request), fields(request_id, message_count = request.messages.len()))]
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let payload = self.build_payload(&request);

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(VegaError::RateLimited);
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(VegaError::Llm(format!("API error {}: {}", status, error_body)));
        }

        let body: Value = response.json().await?;
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| VegaError::Llm("completion response had no message content".to_string()))?
            .to_string();

        debug!(request_id = %request_id, chars = content.len(), "completion received");
        Ok(content)
    }
}
