//! Terminal stock dashboard
//!
//! This crate loads market data for one ticker at a time and renders it as a
//! text dashboard. It includes:
//!
//! - A market-data fetcher backed by Yahoo Finance, with a one-hour snapshot cache
//! - Header metrics, Braille price/volume charts and financial statement tables
//! - A narrative analyzer that sends the company profile to Claude or OpenAI
//! - An interactive session that drives all of the above from typed commands
//!
//! # Example
//!
//! ```rust,ignore
//! use dash_stock::{DashConfig, MarketDataFetcher, YahooFinanceClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = DashConfig::default();
//!     let client = YahooFinanceClient::new(config.request_timeout)?;
//!     let fetcher = MarketDataFetcher::new(Arc::new(client), &config);
//!
//!     let snapshot = fetcher.fetch("AAPL").await?;
//!     println!("{}", dash_stock::present::render_header(&snapshot.profile));
//!
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod present;
pub mod prompts;
pub mod session;

pub use analyzer::{
    AnalysisError, AnalysisResult, Backend, BackendChoice, DefaultProviderFactory,
    NarrativeAnalyzer, ProviderFactory,
};
pub use api::{MarketDataProvider, YahooFinanceClient};
pub use cache::SnapshotCache;
pub use config::{DashConfig, DashConfigBuilder};
pub use error::{Result, StockError};
pub use fetcher::MarketDataFetcher;
pub use model::{
    CompanyProfile, FinancialStatement, LineItem, PriceBar, StatementData, StatementKind,
    StockSnapshot, Ticker,
};
pub use present::Tab;
pub use session::{Command, Outcome, Session};
