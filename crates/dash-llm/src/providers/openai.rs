//! OpenAI provider implementation
//!
//! This module implements the LLMProvider trait for OpenAI's chat models.
//! See: https://platform.openai.com/docs/api-reference/chat
//!
//! # Examples
//!
//! ```no_run
//! use dash_llm::{CompletionRequest, Message, LLMProvider};
//! use dash_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OpenAIConfig::new("sk-...").with_timeout(60);
//!     let provider = OpenAIProvider::with_config(config)?;
//!
//!     let request = CompletionRequest::builder("gpt-4o")
//!         .add_message(Message::user("Hello!"))
//!         .max_tokens(100)
//!         .build();
//!
//!     let response = provider.complete(request).await?;
//!     println!("{}", response.text().unwrap_or_default());
//!     Ok(())
//! }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, MessageContent, Result,
    Role, StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for OpenAI provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL for the OpenAI API (default: "https://api.openai.com/v1")
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// OpenAI provider
///
/// Works with the chat-completions models (gpt-4o, gpt-4.1, o-series) and
/// with OpenAI-compatible APIs through a custom `api_base`.
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a new OpenAI provider with API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to OpenAI API at {}", self.config.api_base);

        let model = request.model.clone();
        let openai_request = OpenAIRequest::from(request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(LLMError::from_status(status, error_text, &model));
        }

        let openai_response: OpenAIResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        openai_response.into_completion()
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ============================================================================
// OpenAI-specific request types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_completion_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

impl From<CompletionRequest> for OpenAIRequest {
    fn from(request: CompletionRequest) -> Self {
        let reasoning = is_reasoning_model(&request.model);
        if reasoning && request.temperature.is_some() {
            debug!(model = %request.model, "Dropping temperature for reasoning model");
        }

        Self {
            messages: build_openai_messages(request.system, request.messages, reasoning),
            max_completion_tokens: request.max_tokens,
            // o-series models only accept the default temperature
            temperature: request.temperature.filter(|_| !reasoning),
            model: request.model,
        }
    }
}

/// o1, o3, o3-mini, o4-mini, ... (as opposed to the gpt-* chat models)
fn is_reasoning_model(model: &str) -> bool {
    let mut chars = model.chars();
    chars.next() == Some('o') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

// ============================================================================
// OpenAI-specific response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

impl OpenAIResponse {
    fn into_completion(self) -> Result<CompletionResponse> {
        // OpenAI can return multiple choices; only the first is used
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

        let content = choice.message.content.ok_or_else(|| {
            LLMError::UnexpectedResponse("Response message has no content".to_string())
        })?;

        let usage = self
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        let finish_reason = choice.finish_reason.unwrap_or_default();
        debug!(
            "Received response - stop_reason: {}, tokens: {}/{}",
            finish_reason, usage.input_tokens, usage.output_tokens
        );

        Ok(CompletionResponse {
            message: Message {
                role: Role::Assistant,
                content: Some(MessageContent::Text(content)),
            },
            stop_reason: map_stop_reason(&finish_reason),
            usage,
        })
    }
}

// ============================================================================
// Conversion functions
// ============================================================================

/// Build OpenAI messages from our generic format
///
/// Unlike Anthropic, the system prompt goes into the messages array. Reasoning
/// models take it under the `developer` role instead.
fn build_openai_messages(
    system: Option<String>,
    messages: Vec<Message>,
    reasoning: bool,
) -> Vec<OpenAIMessage> {
    let mut result = Vec::with_capacity(messages.len() + 1);

    if let Some(content) = system {
        let role = if reasoning {
            "developer"
        } else {
            Role::System.as_str()
        };
        result.push(OpenAIMessage { role, content });
    }

    result.extend(messages.into_iter().filter_map(|msg| {
        let content = msg.text()?.to_string();
        Some(OpenAIMessage {
            role: msg.role.as_str(),
            content,
        })
    }));

    result
}

/// Map OpenAI stop reason to our format
fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "stop" => StopReason::EndTurn,
        "length" => StopReason::MaxTokens,
        "content_filter" => {
            debug!("Content filtered by OpenAI safety systems");
            StopReason::EndTurn
        }
        _ => {
            debug!("Unknown stop reason: {}", reason);
            StopReason::EndTurn
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_provider_creation() {
        let provider = assert_ok!(OpenAIProvider::new("test-key"));
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.config().api_key, "test-key");
        assert_eq!(provider.config().api_base, "https://api.openai.com/v1");
        assert_eq!(provider.config().timeout_secs, 120);
    }

    #[test]
    fn test_config_builder() {
        let config = OpenAIConfig::new("test-key")
            .with_api_base("https://custom.api.com/v1")
            .with_timeout(60);

        let provider = OpenAIProvider::with_config(config).unwrap();
        assert_eq!(provider.config().api_base, "https://custom.api.com/v1");
        assert_eq!(provider.config().timeout_secs, 60);
    }

    #[test]
    fn test_system_message_goes_first() {
        let messages = build_openai_messages(
            Some("You are a skilled financial analyst".to_string()),
            vec![Message::user("Analyze MSFT")],
            false,
        );

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "Analyze MSFT");
    }

    #[test]
    fn test_request_wire_format() {
        let request = CompletionRequest::builder("gpt-4.1")
            .system("sys")
            .add_message(Message::user("hi"))
            .max_tokens(4000)
            .temperature(0.5)
            .build();

        let json = serde_json::to_value(OpenAIRequest::from(request)).unwrap();
        assert_eq!(
            json,
            json!({
                "model": "gpt-4.1",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hi"}
                ],
                "max_completion_tokens": 4000,
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn test_reasoning_model_wire_format() {
        let request = CompletionRequest::builder("o4-mini")
            .system("sys")
            .add_message(Message::user("hi"))
            .max_tokens(4000)
            .temperature(0.2)
            .build();

        let json = serde_json::to_value(OpenAIRequest::from(request)).unwrap();
        assert_eq!(json["messages"][0]["role"], "developer");
        assert!(json.get("temperature").is_none());
        assert_eq!(json["max_completion_tokens"], 4000);
    }

    #[test]
    fn test_is_reasoning_model() {
        for model in ["o1", "o3", "o3-mini", "o4-mini"] {
            assert!(is_reasoning_model(model), "{model}");
        }
        for model in ["gpt-4o", "gpt-4.1", "gpt-4.1-nano", "omni-moderation"] {
            assert!(!is_reasoning_model(model), "{model}");
        }
    }

    #[test]
    fn test_response_parsing() {
        let body = json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Recommendation: Buy"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
        });

        let response: OpenAIResponse = serde_json::from_value(body).unwrap();
        let completion = assert_ok!(response.into_completion());
        assert_eq!(completion.text(), Some("Recommendation: Buy"));
        assert_eq!(completion.stop_reason, StopReason::EndTurn);
        assert_eq!(completion.usage.total(), 17);
    }

    #[test]
    fn test_response_without_choices() {
        let response: OpenAIResponse =
            serde_json::from_value(json!({"choices": [], "usage": null})).unwrap();
        let err = assert_err!(response.into_completion());
        assert!(matches!(err, LLMError::UnexpectedResponse(_)));
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason("stop"), StopReason::EndTurn);
        assert_eq!(map_stop_reason("length"), StopReason::MaxTokens);
        assert_eq!(map_stop_reason("content_filter"), StopReason::EndTurn);
        assert_eq!(map_stop_reason("whatever"), StopReason::EndTurn);
    }
}
