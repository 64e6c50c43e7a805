//! Market data fetcher: one cached snapshot per ticker

use crate::api::MarketDataProvider;
use crate::cache::SnapshotCache;
use crate::config::DashConfig;
use crate::error::{Result, StockError};
use crate::model::{StatementData, StatementKind, StockSnapshot, Ticker};
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Fetches and caches [`StockSnapshot`]s
pub struct MarketDataFetcher {
    provider: Arc<dyn MarketDataProvider>,
    cache: SnapshotCache,
    history_days: u32,
}

impl MarketDataFetcher {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: &DashConfig) -> Self {
        Self {
            provider,
            cache: SnapshotCache::new(config.cache_ttl),
            history_days: config.history_days,
        }
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Snapshot for `ticker`, served from cache while fresh
    ///
    /// Blank input is rejected before any provider call. Any provider error
    /// aborts the whole fetch and nothing is cached.
    #[instrument(skip(self))]
    pub async fn fetch(&self, ticker: &str) -> Result<Arc<StockSnapshot>> {
        let ticker = Ticker::parse(ticker)?;

        self.cache
            .get_or_fetch(ticker.as_str(), || self.load(&ticker))
            .await
            .inspect_err(|e| warn!(error = %e, "Fetch failed"))
    }

    async fn load(&self, ticker: &Ticker) -> Result<StockSnapshot> {
        let profile = self
            .provider
            .profile(ticker)
            .await
            .map_err(|e| StockError::fetch_failed(ticker.as_str(), &e))?;

        let end = Utc::now();
        let start = end - ChronoDuration::days(i64::from(self.history_days));
        let history = self
            .provider
            .price_history(ticker, start, end)
            .await
            .map_err(|e| StockError::fetch_failed(ticker.as_str(), &e))?;

        let balance_sheet = self.statement(ticker, StatementKind::BalanceSheet).await?;
        let income_statement = self.statement(ticker, StatementKind::IncomeStatement).await?;
        let cash_flow = self.statement(ticker, StatementKind::CashFlow).await?;

        info!(symbol = %ticker, bars = history.len(), "Fetched snapshot");

        Ok(StockSnapshot {
            ticker: ticker.clone(),
            profile,
            history,
            balance_sheet,
            income_statement,
            cash_flow,
            fetched_at: Utc::now(),
        })
    }

    async fn statement(&self, ticker: &Ticker, kind: StatementKind) -> Result<StatementData> {
        let statement = self
            .provider
            .statement(ticker, kind)
            .await
            .map_err(|e| StockError::fetch_failed(ticker.as_str(), &e))?;

        if statement.is_empty() {
            info!(symbol = %ticker, statement = %kind, "Statement not published");
        }
        Ok(StatementData::from(statement))
    }
}
