//! Configuration for the stock dashboard

use crate::analyzer::Backend;
use crate::error::{Result, StockError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Smallest canvas `textplots` can draw
const MIN_CHART_WIDTH: u32 = 32;
const MIN_CHART_HEIGHT: u32 = 3;

/// Configuration for the dashboard session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashConfig {
    /// How long a fetched snapshot stays valid
    pub cache_ttl: Duration,

    /// Trailing window of price history, in days
    pub history_days: u32,

    /// Timeout for market-data requests
    pub request_timeout: Duration,

    /// Timeout for LLM requests
    pub llm_timeout: Duration,

    /// Response-length cap sent to the LLM
    pub max_tokens: usize,

    /// Sampling temperature sent to the LLM
    pub temperature: f32,

    /// Backend selected at startup
    pub default_backend: Backend,

    /// Reject model identifiers outside the backend's enumerated list
    pub strict_models: bool,

    /// Chart canvas width (textplots dots)
    pub chart_width: u32,

    /// Chart canvas height (textplots dots)
    pub chart_height: u32,

    /// Anthropic API key (optional, can be entered in the session)
    #[serde(skip_serializing)]
    pub anthropic_api_key: Option<String>,

    /// OpenAI API key (optional, can be entered in the session)
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(3600), // 1 hour
            history_days: 90,
            request_timeout: Duration::from_secs(30),
            llm_timeout: Duration::from_secs(120),
            max_tokens: 4000,
            temperature: 0.2,
            default_backend: Backend::Claude,
            strict_models: false,
            chart_width: 100,
            chart_height: 30,
            anthropic_api_key: None,
            openai_api_key: None,
        }
    }
}

impl DashConfig {
    /// Create a new configuration builder
    pub fn builder() -> DashConfigBuilder {
        DashConfigBuilder::default()
    }

    /// Credential configured for a backend, if any
    pub fn api_key_for(&self, backend: Backend) -> Option<&str> {
        match backend {
            Backend::Claude => self.anthropic_api_key.as_deref(),
            Backend::OpenAI => self.openai_api_key.as_deref(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl.is_zero() {
            return Err(StockError::ConfigError(
                "cache_ttl must be greater than 0".to_string(),
            ));
        }

        if self.history_days == 0 {
            return Err(StockError::ConfigError(
                "history_days must be greater than 0".to_string(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(StockError::ConfigError(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(StockError::ConfigError(format!(
                "temperature must be within 0.0..=1.0, got {}",
                self.temperature
            )));
        }

        if self.chart_width < MIN_CHART_WIDTH || self.chart_height < MIN_CHART_HEIGHT {
            return Err(StockError::ConfigError(format!(
                "chart must be at least {MIN_CHART_WIDTH}x{MIN_CHART_HEIGHT}, got {}x{}",
                self.chart_width, self.chart_height
            )));
        }

        Ok(())
    }
}

/// Builder for DashConfig
#[derive(Debug, Default)]
pub struct DashConfigBuilder {
    cache_ttl: Option<Duration>,
    history_days: Option<u32>,
    request_timeout: Option<Duration>,
    llm_timeout: Option<Duration>,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
    default_backend: Option<Backend>,
    strict_models: Option<bool>,
    chart_width: Option<u32>,
    chart_height: Option<u32>,
    anthropic_api_key: Option<String>,
    openai_api_key: Option<String>,
}

impl DashConfigBuilder {
    /// Set snapshot cache TTL
    pub fn cache_ttl(mut self, duration: Duration) -> Self {
        self.cache_ttl = Some(duration);
        self
    }

    /// Set the price-history window in days
    pub fn history_days(mut self, days: u32) -> Self {
        self.history_days = Some(days);
        self
    }

    /// Set market-data request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set LLM request timeout
    pub fn llm_timeout(mut self, duration: Duration) -> Self {
        self.llm_timeout = Some(duration);
        self
    }

    /// Set LLM response-length cap
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set LLM sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the backend selected at startup
    pub fn default_backend(mut self, backend: Backend) -> Self {
        self.default_backend = Some(backend);
        self
    }

    /// Validate model identifiers against the enumerated lists
    pub fn strict_models(mut self, strict: bool) -> Self {
        self.strict_models = Some(strict);
        self
    }

    /// Set chart canvas size
    pub fn chart_size(mut self, width: u32, height: u32) -> Self {
        self.chart_width = Some(width);
        self.chart_height = Some(height);
        self
    }

    /// Set Anthropic API key
    pub fn anthropic_api_key(mut self, key: impl Into<String>) -> Self {
        self.anthropic_api_key = Some(key.into());
        self
    }

    /// Set OpenAI API key
    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    /// Load `ANTHROPIC_API_KEY` and `OPENAI_API_KEY` from the environment
    pub fn with_env_api_keys(mut self) -> Self {
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            self.anthropic_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<DashConfig> {
        let defaults = DashConfig::default();

        let config = DashConfig {
            cache_ttl: self.cache_ttl.unwrap_or(defaults.cache_ttl),
            history_days: self.history_days.unwrap_or(defaults.history_days),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            llm_timeout: self.llm_timeout.unwrap_or(defaults.llm_timeout),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            default_backend: self.default_backend.unwrap_or(defaults.default_backend),
            strict_models: self.strict_models.unwrap_or(defaults.strict_models),
            chart_width: self.chart_width.unwrap_or(defaults.chart_width),
            chart_height: self.chart_height.unwrap_or(defaults.chart_height),
            anthropic_api_key: self.anthropic_api_key.filter(|k| !k.trim().is_empty()),
            openai_api_key: self.openai_api_key.filter(|k| !k.trim().is_empty()),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DashConfig::default();
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.history_days, 90);
        assert_eq!(config.max_tokens, 4000);
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.default_backend, Backend::Claude);
        assert!(!config.strict_models);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = DashConfig::builder()
            .history_days(30)
            .default_backend(Backend::OpenAI)
            .openai_api_key("sk-test")
            .chart_size(60, 20)
            .build()
            .unwrap();

        assert_eq!(config.history_days, 30);
        assert_eq!(config.default_backend, Backend::OpenAI);
        assert_eq!(config.api_key_for(Backend::OpenAI), Some("sk-test"));
        assert_eq!(config.api_key_for(Backend::Claude), None);
        assert_eq!((config.chart_width, config.chart_height), (60, 20));
    }

    #[test]
    fn test_blank_api_key_is_dropped() {
        let config = DashConfig::builder().anthropic_api_key("  ").build().unwrap();
        assert!(config.anthropic_api_key.is_none());
    }

    #[test]
    fn test_validation_rejects_zero_window() {
        let config = DashConfig {
            history_days: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DashConfig {
            cache_ttl: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_tiny_chart() {
        let result = DashConfig::builder().chart_size(10, 2).build();
        assert!(matches!(result, Err(StockError::ConfigError(_))));
    }

    #[test]
    fn test_validation_rejects_temperature() {
        assert!(DashConfig::builder().temperature(1.5).build().is_err());
    }

    #[test]
    fn test_api_keys_not_serialized() {
        let config = DashConfig::builder().anthropic_api_key("secret").build().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
