//! Market data providers

pub mod yahoo;

pub use yahoo::YahooFinanceClient;

use crate::error::Result;
use crate::model::{CompanyProfile, FinancialStatement, PriceBar, StatementKind, Ticker};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Read-only source of market data keyed by ticker
///
/// Each method is one request/response round trip; implementations do not
/// retry or cache.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Company profile and headline valuation fields
    async fn profile(&self, ticker: &Ticker) -> Result<CompanyProfile>;

    /// Daily bars between `start` and `end`, oldest first
    async fn price_history(
        &self,
        ticker: &Ticker,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceBar>>;

    /// Annual financial statement; an unpublished statement comes back empty
    async fn statement(&self, ticker: &Ticker, kind: StatementKind) -> Result<FinancialStatement>;
}
