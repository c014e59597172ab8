//! Chat-completion backend implementation
//!
//! Talks to any OpenAI-compatible chat-completion endpoint with bearer
//! auth. One round trip per reply, bounded by a 30s timeout.

use super::{MediatorError, MediatorService};
use crate::prompt;
use crate::store::{Party, PartyNames};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.aimlapi.com/chat/completions";
const DEFAULT_MODEL: &str = "google/gemma-2-27b-it";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 1024;

/// Configuration for the mediator backend
#[derive(Debug, Clone, Default)]
pub struct MediatorConfig {
    pub api_key: Option<String>,
    /// Full chat-completion endpoint URL
    pub base_url: Option<String>,
    pub model: Option<String>,
}

impl MediatorConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("MEDIATOR_API_KEY").ok(),
            base_url: std::env::var("MEDIATOR_BASE_URL").ok(),
            model: std::env::var("MEDIATOR_MODEL").ok(),
        }
    }
}

/// Mediator backed by a chat-completion endpoint
pub struct ChatCompletionMediator {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ChatCompletionMediator {
    pub fn new(config: &MediatorConfig) -> Result<Self, MediatorError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MediatorError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone().unwrap_or_default(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    fn build_request(&self, message: &str, speaker: Party, names: &PartyNames) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompt::system_prompt(speaker, names),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: message.to_string(),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    fn extract_reply(resp: ChatResponse) -> Result<String, MediatorError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| MediatorError::malformed("No choices in response"))?;

        if choice.message.content.is_empty() {
            return Err(MediatorError::malformed("Empty reply content"));
        }

        Ok(choice.message.content)
    }
}

#[async_trait]
impl MediatorService for ChatCompletionMediator {
    async fn generate_reply(
        &self,
        message: &str,
        speaker: Party,
        names: &PartyNames,
    ) -> Result<String, MediatorError> {
        let request = self.build_request(message, speaker, names);

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MediatorError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    MediatorError::network(format!("Connection failed: {e}"))
                } else {
                    MediatorError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MediatorError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            if let Ok(error_resp) = serde_json::from_str::<ChatErrorResponse>(&body) {
                let message = error_resp.error.message;
                return Err(match status.as_u16() {
                    401 | 403 => MediatorError::auth(format!("Authentication failed: {message}")),
                    429 => MediatorError::rate_limit(format!("Rate limit exceeded: {message}")),
                    400 => MediatorError::invalid_request(format!("Invalid request: {message}")),
                    500..=599 => MediatorError::server_error(format!("Server error: {message}")),
                    _ => MediatorError::unknown(format!("HTTP {status}: {message}")),
                });
            }
            return Err(MediatorError::unknown(format!("HTTP {status} error: {body}")));
        }

        let chat_response: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| MediatorError::malformed(format!("Failed to parse response: {e}")))?;

        Self::extract_reply(chat_response)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// ============================================================
// Wire types
// ============================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatErrorResponse {
    error: ChatErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ChatErrorDetail {
    message: String,
}
