//! Narrative analyzer: one LLM call per user-triggered analysis

use crate::config::DashConfig;
use crate::model::{StockSnapshot, Ticker};
use crate::prompts::{AnalysisPrompt, PromptError, ANALYST_SYSTEM_PROMPT};
use chrono::{DateTime, Utc};
use dash_llm::providers::{AnthropicProvider, OpenAIConfig, OpenAIProvider};
use dash_llm::{CompletionRequest, LLMError, LLMProvider, Message, TokenUsage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};

const CLAUDE_MODELS: &[&str] = &["claude-3-7-sonnet-latest", "claude-3-5-sonnet-latest"];

const OPENAI_MODELS: &[&str] = &[
    "o4-mini",
    "o3",
    "o3-mini",
    "o1",
    "gpt-4.1",
    "gpt-4o",
    "gpt-4.1-mini",
    "gpt-4.1-nano",
];

/// LLM backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Anthropic Messages API
    Claude,
    /// OpenAI Chat Completions API
    OpenAI,
}

impl Backend {
    /// Models offered for this backend; the first is the default
    pub fn models(&self) -> &'static [&'static str] {
        match self {
            Backend::Claude => CLAUDE_MODELS,
            Backend::OpenAI => OPENAI_MODELS,
        }
    }

    pub fn default_model(&self) -> &'static str {
        self.models()[0]
    }

    /// System message sent ahead of the prompt, if the backend gets one
    pub fn system_prompt(&self) -> Option<&'static str> {
        match self {
            Backend::Claude => None,
            Backend::OpenAI => Some(ANALYST_SYSTEM_PROMPT),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude" | "anthropic" => Ok(Backend::Claude),
            "openai" | "gpt" => Ok(Backend::OpenAI),
            other => Err(format!("Unknown provider '{other}' (expected claude or openai)")),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Claude => f.write_str("Claude"),
            Backend::OpenAI => f.write_str("OpenAI"),
        }
    }
}

/// Backend plus the model identifier to send it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendChoice {
    pub backend: Backend,
    pub model: String,
}

impl BackendChoice {
    /// Backend with its default model
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            model: backend.default_model().to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn is_known_model(&self) -> bool {
        self.backend.models().contains(&self.model.as_str())
    }
}

/// Analysis failures, all recoverable
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Please enter an API key (/key <credential>) to use AI analysis.")]
    MissingCredential,

    #[error("Unknown model '{model}' for {backend}")]
    UnknownModel { backend: Backend, model: String },

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Provider(#[from] LLMError),

    #[error("Provider returned an empty response")]
    EmptyResponse,
}

/// Text produced by one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub text: String,
    pub backend: Backend,
    pub model: String,
    pub ticker: Ticker,
    pub created_at: DateTime<Utc>,
    pub usage: TokenUsage,
}

/// Builds an LLM provider for a backend and credential
#[cfg_attr(test, mockall::automock)]
pub trait ProviderFactory: Send + Sync {
    fn create(&self, backend: Backend, credential: &str) -> dash_llm::Result<Arc<dyn LLMProvider>>;
}

/// Factory for the real Anthropic and OpenAI clients
pub struct DefaultProviderFactory {
    timeout: Duration,
}

impl DefaultProviderFactory {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ProviderFactory for DefaultProviderFactory {
    fn create(&self, backend: Backend, credential: &str) -> dash_llm::Result<Arc<dyn LLMProvider>> {
        let provider: Arc<dyn LLMProvider> = match backend {
            Backend::Claude => Arc::new(AnthropicProvider::with_timeout(credential, self.timeout)?),
            Backend::OpenAI => Arc::new(OpenAIProvider::with_config(
                OpenAIConfig::new(credential).with_timeout(self.timeout.as_secs()),
            )?),
        };
        Ok(provider)
    }
}

/// Sends the analysis prompt for a snapshot to the selected backend
pub struct NarrativeAnalyzer {
    factory: Arc<dyn ProviderFactory>,
    prompt: AnalysisPrompt,
    max_tokens: usize,
    temperature: f32,
    strict_models: bool,
}

impl NarrativeAnalyzer {
    /// Analyzer backed by the real provider clients
    pub fn new(config: &DashConfig) -> Result<Self, AnalysisError> {
        Self::with_factory(
            Arc::new(DefaultProviderFactory::new(config.llm_timeout)),
            config,
        )
    }

    pub fn with_factory(
        factory: Arc<dyn ProviderFactory>,
        config: &DashConfig,
    ) -> Result<Self, AnalysisError> {
        Ok(Self {
            factory,
            prompt: AnalysisPrompt::new()?,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            strict_models: config.strict_models,
        })
    }

    /// Run one analysis
    ///
    /// A blank credential fails before any provider is built. Everything else
    /// that can go wrong comes back as an [`AnalysisError`].
    #[instrument(skip(self, credential, snapshot), fields(symbol = %snapshot.ticker, backend = %choice.backend, model = %choice.model))]
    pub async fn analyze(
        &self,
        credential: &str,
        choice: &BackendChoice,
        snapshot: &StockSnapshot,
    ) -> Result<AnalysisResult, AnalysisError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(AnalysisError::MissingCredential);
        }

        if !choice.is_known_model() {
            if self.strict_models {
                return Err(AnalysisError::UnknownModel {
                    backend: choice.backend,
                    model: choice.model.clone(),
                });
            }
            warn!("Model is not in the {} list; sending it anyway", choice.backend);
        }

        let prompt = self.prompt.render(snapshot)?;
        let request = CompletionRequest::builder(choice.model.as_str())
            .add_message(Message::user(prompt))
            .maybe_system(choice.backend.system_prompt().map(str::to_string))
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build();

        let provider = self.factory.create(choice.backend, credential)?;
        let response = provider.complete(request).await?;

        let text = response
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AnalysisError::EmptyResponse)?
            .to_string();

        info!(tokens = response.usage.total(), "Analysis complete");

        Ok(AnalysisResult {
            text,
            backend: choice.backend,
            model: choice.model.clone(),
            ticker: snapshot.ticker.clone(),
            created_at: Utc::now(),
            usage: response.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CompanyProfile, StatementData};
    use async_trait::async_trait;
    use dash_llm::{CompletionResponse, StopReason};
    use std::sync::Mutex;
    use tokio_test::{assert_err, assert_ok};

    /// Records every request and answers with a canned reply
    struct RecordingProvider {
        reply: Option<String>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl RecordingProvider {
        fn replying(text: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                reply: text.map(str::to_string),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn last_request(&self) -> CompletionRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl LLMProvider for RecordingProvider {
        async fn complete(&self, request: CompletionRequest) -> dash_llm::Result<CompletionResponse> {
            self.requests.lock().unwrap().push(request);
            match &self.reply {
                Some(text) => Ok(CompletionResponse {
                    message: Message::assistant(text.clone()),
                    stop_reason: StopReason::EndTurn,
                    usage: TokenUsage {
                        input_tokens: 250,
                        output_tokens: 900,
                    },
                }),
                None => Err(LLMError::AuthenticationFailed),
            }
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn factory_for(provider: &Arc<RecordingProvider>, calls: usize) -> Arc<MockProviderFactory> {
        let provider = Arc::clone(provider);
        let mut factory = MockProviderFactory::new();
        factory
            .expect_create()
            .times(calls)
            .returning(move |_, _| Ok(Arc::clone(&provider) as Arc<dyn LLMProvider>));
        Arc::new(factory)
    }

    fn snapshot() -> StockSnapshot {
        StockSnapshot {
            ticker: Ticker::parse("AAPL").unwrap(),
            profile: CompanyProfile {
                name: Some("Apple Inc.".to_string()),
                symbol: Some("AAPL".to_string()),
                ..CompanyProfile::default()
            },
            history: Vec::new(),
            balance_sheet: StatementData::Empty,
            income_statement: StatementData::Empty,
            cash_flow: StatementData::Empty,
            fetched_at: Utc::now(),
        }
    }

    fn analyzer(factory: Arc<MockProviderFactory>) -> NarrativeAnalyzer {
        NarrativeAnalyzer::with_factory(factory, &DashConfig::default()).unwrap()
    }

    #[test]
    fn test_backend_models() {
        assert_eq!(Backend::Claude.default_model(), "claude-3-7-sonnet-latest");
        assert_eq!(Backend::OpenAI.default_model(), "o4-mini");
        assert_eq!(Backend::OpenAI.models().len(), 8);
        assert_eq!("Anthropic".parse::<Backend>().unwrap(), Backend::Claude);
        assert!("gemini".parse::<Backend>().is_err());
    }

    #[test]
    fn test_backend_choice() {
        let choice = BackendChoice::new(Backend::OpenAI);
        assert_eq!(choice.model, "o4-mini");
        assert!(choice.is_known_model());
        assert!(!choice.with_model("gpt-5-turbo").is_known_model());
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_calls() {
        let mut factory = MockProviderFactory::new();
        factory.expect_create().never();
        let analyzer = analyzer(Arc::new(factory));

        for credential in ["", "   "] {
            let result = analyzer
                .analyze(credential, &BackendChoice::new(Backend::Claude), &snapshot())
                .await;
            let err = assert_err!(result);
            assert!(matches!(err, AnalysisError::MissingCredential));
            assert_eq!(
                err.to_string(),
                "Please enter an API key (/key <credential>) to use AI analysis."
            );
        }
    }

    #[tokio::test]
    async fn test_claude_request_shape() {
        let provider = RecordingProvider::replying(Some("## Overview\nApple designs..."));
        let analyzer = analyzer(factory_for(&provider, 1));

        let result = assert_ok!(
            analyzer
                .analyze("sk-ant-test", &BackendChoice::new(Backend::Claude), &snapshot())
                .await
        );
        assert!(result.text.starts_with("## Overview"));
        assert_eq!(result.backend, Backend::Claude);
        assert_eq!(result.ticker.as_str(), "AAPL");
        assert_eq!(result.usage.total(), 1150);

        let request = provider.last_request();
        assert_eq!(request.model, "claude-3-7-sonnet-latest");
        assert_eq!(request.max_tokens, 4000);
        assert_eq!(request.temperature, Some(0.2));
        assert!(request.system.is_none());
        assert_eq!(request.messages.len(), 1);
        assert!(request.messages[0].text().unwrap().contains("Apple Inc. (AAPL)"));
    }

    #[tokio::test]
    async fn test_openai_request_has_system_prompt() {
        let provider = RecordingProvider::replying(Some("Buy."));
        let analyzer = analyzer(factory_for(&provider, 1));
        let choice = BackendChoice::new(Backend::OpenAI).with_model("gpt-4o");

        assert_ok!(analyzer.analyze("sk-test", &choice, &snapshot()).await);

        let request = provider.last_request();
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.system.as_deref(), Some(ANALYST_SYSTEM_PROMPT));
    }

    #[tokio::test]
    async fn test_unknown_model_passes_through_by_default() {
        let provider = RecordingProvider::replying(Some("ok"));
        let analyzer = analyzer(factory_for(&provider, 1));
        let choice = BackendChoice::new(Backend::OpenAI).with_model("gpt-5-preview");

        assert_ok!(analyzer.analyze("sk-test", &choice, &snapshot()).await);
        assert_eq!(provider.last_request().model, "gpt-5-preview");
    }

    #[tokio::test]
    async fn test_unknown_model_rejected_when_strict() {
        let mut factory = MockProviderFactory::new();
        factory.expect_create().never();
        let config = DashConfig::builder().strict_models(true).build().unwrap();
        let analyzer = NarrativeAnalyzer::with_factory(Arc::new(factory), &config).unwrap();
        let choice = BackendChoice::new(Backend::Claude).with_model("claude-2");

        let err = assert_err!(analyzer.analyze("sk-ant-test", &choice, &snapshot()).await);
        assert!(matches!(err, AnalysisError::UnknownModel { .. }));
    }

    #[tokio::test]
    async fn test_provider_error_is_returned() {
        let provider = RecordingProvider::replying(None);
        let analyzer = analyzer(factory_for(&provider, 1));

        let err = assert_err!(
            analyzer
                .analyze("bad-key", &BackendChoice::new(Backend::Claude), &snapshot())
                .await
        );
        assert!(matches!(
            err,
            AnalysisError::Provider(LLMError::AuthenticationFailed)
        ));
    }

    #[tokio::test]
    async fn test_blank_response_is_an_error() {
        let provider = RecordingProvider::replying(Some("  \n"));
        let analyzer = analyzer(factory_for(&provider, 1));

        let err = assert_err!(
            analyzer
                .analyze("sk-test", &BackendChoice::new(Backend::OpenAI), &snapshot())
                .await
        );
        assert!(matches!(err, AnalysisError::EmptyResponse));
    }
}
