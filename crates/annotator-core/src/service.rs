//! Text-generation service seam
//!
//! [`TextGenerator`] is the boundary the dispatcher calls once per record.
//! [`ChatCompletionsClient`] implements it against an OpenAI-compatible
//! chat-completions endpoint.

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Generates text for one rendered prompt
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate content for `prompt`
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// Chat-completions request body
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    /// Model identifier
    pub model: &'a str,
    /// Conversation, a single user turn here
    pub messages: Vec<ChatMessage<'a>>,
}

/// One chat message
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage<'a> {
    /// Speaker role
    pub role: &'a str,
    /// Message text
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Extract `choices[0].message.content` from a response body
///
/// # Errors
/// - `ServiceError::MalformedResponse` if the body is not JSON of the
///   expected shape or carries no content
pub fn parse_completion(body: &str) -> Result<String, ServiceError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::MalformedResponse(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| ServiceError::MalformedResponse("no content in first choice".to_string()))
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    config: ServiceConfig,
}

impl ChatCompletionsClient {
    /// Create client with the configured timeout
    ///
    /// # Errors
    /// - `ServiceError::Transport` if the HTTP client cannot be built
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    /// Service descriptor in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut request = self.http.post(&self.config.endpoint).json(&body);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ServiceError::Service {
                status: status.as_u16(),
                body: text,
            });
        }
        parse_completion(&text)
    }
}
