//! Access to the hosted model.
//!
//! [`ModelClient`] is the seam the relay talks through; [`AnthropicClient`]
//! is the production implementation over the Anthropic Messages API.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::timeout;

use crate::config::ModelConfig;
use crate::logutil::log_preview;

/// One completion request: a system prompt plus a single user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub system: String,
    pub prompt: String,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("model API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model reply contained no text")]
    EmptyReply,

    #[error("unexpected model response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send `request` and return the raw text of the reply.
    async fn complete(&self, request: ModelRequest) -> Result<String, ModelError>;

    /// Whether credentials are present. The relay refuses to call an
    /// unconfigured client.
    fn is_configured(&self) -> bool {
        true
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: [TextBlock<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextBlock<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Client for the Anthropic Messages API (`POST {base_url}/v1/messages`).
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    config: ModelConfig,
}

impl AnthropicClient {
    pub fn new(config: &ModelConfig) -> Self {
        let client = Client::builder()
            .user_agent(concat!("escaperoom/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());
        let mut config = config.clone();
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn complete(&self, request: ModelRequest) -> Result<String, ModelError> {
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            system: &request.system,
            messages: [UserMessage {
                role: "user",
                content: [TextBlock {
                    kind: "text",
                    text: &request.prompt,
                }],
            }],
        };
        debug!(
            "POST {} model={} prompt_chars={}",
            self.endpoint(),
            self.config.model,
            request.prompt.chars().count()
        );

        let send = self
            .client
            .post(self.endpoint())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&body)
            .send();
        let secs = self.config.timeout_seconds;
        let response = timeout(Duration::from_secs(secs), send)
            .await
            .map_err(|_| ModelError::Timeout(secs))??;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("model API returned {}: {}", status, log_preview(&body, 200));
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;
        if parsed.stop_reason.as_deref() == Some("max_tokens") {
            warn!("model reply was cut off at max_tokens={}", self.config.max_tokens);
        }
        first_text(parsed.content).ok_or(ModelError::EmptyReply)
    }

    fn is_configured(&self) -> bool {
        self.config.has_api_key()
    }
}

fn first_text(blocks: Vec<ContentBlock>) -> Option<String> {
    blocks
        .into_iter()
        .filter(|b| b.kind == "text")
        .find_map(|b| b.text)
        .filter(|t| !t.trim().is_empty())
}
