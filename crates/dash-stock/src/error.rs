//! Error types for stock dashboard operations

use thiserror::Error;

/// Stock dashboard errors
#[derive(Debug, Error)]
pub enum StockError {
    /// Ticker input rejected before any network call
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Market data could not be retrieved for a ticker
    #[error("Error retrieving data for {symbol}: {reason}")]
    FetchFailed {
        symbol: String,
        reason: String,
    },

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// REPL command could not be parsed
    #[error("Command error: {0}")]
    CommandError(String),
}

impl StockError {
    /// Wrap any provider failure as a fetch failure for `symbol`
    pub fn fetch_failed(symbol: impl Into<String>, source: &StockError) -> Self {
        StockError::FetchFailed {
            symbol: symbol.into(),
            reason: source.to_string(),
        }
    }
}

/// Result type alias for stock operations
pub type Result<T> = std::result::Result<T, StockError>;
