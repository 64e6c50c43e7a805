//! Yahoo Finance API client
//!
//! Price history goes through the `yahoo_finance_api` crate. Profile fields
//! come from the `quoteSummary` endpoint and annual statements from the
//! fundamentals-timeseries endpoint; both need the session cookie and crumb
//! that Yahoo hands out to browsers.

use crate::api::MarketDataProvider;
use crate::error::{Result, StockError};
use crate::model::{CompanyProfile, FinancialStatement, PriceBar, StatementKind, Ticker};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use yahoo_finance_api as yahoo;

const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const TIMESERIES_URL: &str =
    "https://query2.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const PROFILE_MODULES: &str = "price,summaryProfile,summaryDetail,financialData";
/// 2016-12-31T00:00:00Z; Yahoo publishes roughly five fiscal years
const STATEMENTS_FROM: i64 = 1_483_142_400;

const BALANCE_SHEET_KEYS: &[&str] = &[
    "TotalAssets",
    "CurrentAssets",
    "CashAndCashEquivalents",
    "AccountsReceivable",
    "Inventory",
    "TotalNonCurrentAssets",
    "NetPPE",
    "Goodwill",
    "TotalLiabilitiesNetMinorityInterest",
    "CurrentLiabilities",
    "AccountsPayable",
    "LongTermDebt",
    "TotalDebt",
    "NetDebt",
    "StockholdersEquity",
    "RetainedEarnings",
    "WorkingCapital",
    "TangibleBookValue",
    "OrdinarySharesNumber",
];

const INCOME_STATEMENT_KEYS: &[&str] = &[
    "TotalRevenue",
    "CostOfRevenue",
    "GrossProfit",
    "ResearchAndDevelopment",
    "SellingGeneralAndAdministration",
    "OperatingExpense",
    "OperatingIncome",
    "InterestExpense",
    "PretaxIncome",
    "TaxProvision",
    "NetIncome",
    "EBIT",
    "EBITDA",
    "BasicEPS",
    "DilutedEPS",
    "DilutedAverageShares",
];

const CASH_FLOW_KEYS: &[&str] = &[
    "OperatingCashFlow",
    "NetIncomeFromContinuingOperations",
    "DepreciationAndAmortization",
    "StockBasedCompensation",
    "ChangeInWorkingCapital",
    "InvestingCashFlow",
    "CapitalExpenditure",
    "FinancingCashFlow",
    "IssuanceOfDebt",
    "RepaymentOfDebt",
    "RepurchaseOfCapitalStock",
    "CashDividendsPaid",
    "ChangesInCash",
    "EndCashPosition",
    "FreeCashFlow",
];

/// Yahoo Finance API client
pub struct YahooFinanceClient {
    http: Client,
    connector: yahoo::YahooConnector,
    crumb: Mutex<Option<String>>,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        let connector = yahoo::YahooConnector::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        Ok(Self {
            http,
            connector,
            crumb: Mutex::new(None),
        })
    }

    /// Session crumb, fetched once and reused until Yahoo rejects it
    async fn crumb(&self) -> Result<String> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        // Only the Set-Cookie header matters here; fc.yahoo.com answers 404
        let _ = self
            .http
            .get(COOKIE_URL)
            .header("referer", "https://finance.yahoo.com/")
            .send()
            .await;

        let crumb = self
            .http
            .get(CRUMB_URL)
            .header("referer", "https://finance.yahoo.com/")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let crumb = crumb.trim().to_string();

        if crumb.is_empty() || crumb.contains('<') || crumb.len() > 64 {
            return Err(StockError::YahooFinanceError(
                "failed to obtain Yahoo crumb".to_string(),
            ));
        }

        debug!("Obtained Yahoo crumb");
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    /// Drops the cached crumb on 401 so the next request performs a fresh
    /// handshake. The current request still fails.
    async fn check_crumb_accepted(&self, status: StatusCode) -> Result<()> {
        if status != StatusCode::UNAUTHORIZED {
            return Ok(());
        }

        self.crumb.lock().await.take();
        warn!("Yahoo rejected the session crumb");
        Err(StockError::YahooFinanceError(format!(
            "HTTP {status}: session crumb rejected"
        )))
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    #[instrument(skip(self), fields(symbol = %ticker))]
    async fn profile(&self, ticker: &Ticker) -> Result<CompanyProfile> {
        let crumb = self.crumb().await?;

        let response = self
            .http
            .get(format!("{QUOTE_SUMMARY_URL}/{ticker}"))
            .query(&[("modules", PROFILE_MODULES), ("crumb", crumb.as_str())])
            .send()
            .await?;

        let status = response.status();
        self.check_crumb_accepted(status).await?;
        let envelope: QuoteSummaryEnvelope = response.json().await.map_err(|e| {
            StockError::YahooFinanceError(format!("HTTP {status}: unreadable quote summary: {e}"))
        })?;

        parse_profile(envelope)
    }

    #[instrument(skip(self), fields(symbol = %ticker))]
    async fn price_history(
        &self,
        ticker: &Ticker,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceBar>> {
        // Convert chrono DateTime to time OffsetDateTime
        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp()).map_err(|e| {
            StockError::YahooFinanceError(format!("Invalid start timestamp: {e}"))
        })?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| StockError::YahooFinanceError(format!("Invalid end timestamp: {e}")))?;

        let response = self
            .connector
            .get_quote_history(ticker.as_str(), start_odt, end_odt)
            .await
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        let quotes = quotes_or_empty(response.quotes())?;

        let bars: Vec<PriceBar> = quotes
            .iter()
            .filter_map(|q| {
                let date = DateTime::from_timestamp(q.timestamp as i64, 0)?.date_naive();
                Some(PriceBar {
                    date,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    volume: q.volume,
                })
            })
            .collect();

        debug!(bars = bars.len(), "Fetched price history");
        Ok(bars)
    }

    #[instrument(skip(self), fields(symbol = %ticker, statement = %kind))]
    async fn statement(&self, ticker: &Ticker, kind: StatementKind) -> Result<FinancialStatement> {
        let keys = statement_keys(kind);
        let types = keys
            .iter()
            .map(|key| format!("annual{key}"))
            .collect::<Vec<_>>()
            .join(",");
        let period1 = STATEMENTS_FROM.to_string();
        let period2 = Utc::now().timestamp().to_string();
        let crumb = self.crumb().await?;

        let response = self
            .http
            .get(format!("{TIMESERIES_URL}/{ticker}"))
            .query(&[
                ("symbol", ticker.as_str()),
                ("type", types.as_str()),
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("crumb", crumb.as_str()),
            ])
            .send()
            .await?;
        self.check_crumb_accepted(response.status()).await?;
        let envelope: TimeseriesEnvelope = response.error_for_status()?.json().await?;

        let statement = parse_statement(kind, keys, envelope)?;
        debug!(line_items = statement.line_items.len(), "Fetched statement");
        Ok(statement)
    }
}

/// A window without trading days is an empty history, not a failure.
fn quotes_or_empty(
    quotes: std::result::Result<Vec<yahoo::Quote>, yahoo::YahooError>,
) -> Result<Vec<yahoo::Quote>> {
    match quotes {
        Ok(quotes) => Ok(quotes),
        Err(yahoo::YahooError::NoQuotes) => Ok(Vec::new()),
        Err(e) => Err(StockError::YahooFinanceError(e.to_string())),
    }
}

fn statement_keys(kind: StatementKind) -> &'static [&'static str] {
    match kind {
        StatementKind::BalanceSheet => BALANCE_SHEET_KEYS,
        StatementKind::IncomeStatement => INCOME_STATEMENT_KEYS,
        StatementKind::CashFlow => CASH_FLOW_KEYS,
    }
}

/// "TotalLiabilitiesNetMinorityInterest" -> "Total Liabilities Net Minority Interest",
/// keeping acronyms together ("DilutedEPS" -> "Diluted EPS")
fn humanize_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 8);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                out.push(' ');
            }
        }
        out.push(c);
    }

    out
}

// ============================================================================
// quoteSummary wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<QuoteSummaryResult>>,
    error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
struct YahooApiError {
    code: Option<String>,
    description: Option<String>,
}

impl YahooApiError {
    fn message(self) -> String {
        self.description
            .or(self.code)
            .unwrap_or_else(|| "unknown Yahoo error".to_string())
    }
}

/// `{"raw": 123.4, "fmt": "123.40"}`; Yahoo sends `{}` for missing values
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

fn raw(value: Option<RawValue>) -> Option<f64> {
    value.and_then(|v| v.raw).filter(|v| v.is_finite())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    price: Option<PriceModule>,
    summary_profile: Option<SummaryProfileModule>,
    summary_detail: Option<SummaryDetailModule>,
    financial_data: Option<FinancialDataModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    short_name: Option<String>,
    long_name: Option<String>,
    symbol: Option<String>,
    regular_market_price: Option<RawValue>,
    /// Fraction (-0.0123 means -1.23%)
    regular_market_change_percent: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryProfileModule {
    sector: Option<String>,
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetailModule {
    market_cap: Option<RawValue>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    fifty_two_week_low: Option<RawValue>,
    fifty_two_week_high: Option<RawValue>,
    dividend_yield: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialDataModule {
    current_price: Option<RawValue>,
}

impl QuoteSummaryResult {
    fn into_profile(self) -> CompanyProfile {
        let price = self.price.unwrap_or_default();
        let profile = self.summary_profile.unwrap_or_default();
        let detail = self.summary_detail.unwrap_or_default();
        let financial = self.financial_data.unwrap_or_default();

        CompanyProfile {
            name: price.short_name.or(price.long_name),
            symbol: price.symbol,
            sector: profile.sector,
            industry: profile.industry,
            current_price: raw(financial.current_price).or(raw(price.regular_market_price)),
            change_percent: raw(price.regular_market_change_percent).map(|f| f * 100.0),
            market_cap: raw(detail.market_cap)
                .filter(|v| *v >= 0.0)
                .map(|v| v.round() as u64),
            trailing_pe: raw(detail.trailing_pe),
            fifty_two_week_low: raw(detail.fifty_two_week_low),
            fifty_two_week_high: raw(detail.fifty_two_week_high),
            dividend_yield: raw(detail.dividend_yield),
        }
    }
}

fn parse_profile(envelope: QuoteSummaryEnvelope) -> Result<CompanyProfile> {
    let summary = envelope.quote_summary;

    if let Some(error) = summary.error {
        return Err(StockError::YahooFinanceError(error.message()));
    }

    summary
        .result
        .and_then(|results| results.into_iter().next())
        .map(QuoteSummaryResult::into_profile)
        .ok_or_else(|| StockError::YahooFinanceError("empty quote summary".to_string()))
}

// ============================================================================
// fundamentals-timeseries wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TimeseriesEnvelope {
    timeseries: Timeseries,
}

#[derive(Debug, Deserialize)]
struct Timeseries {
    result: Option<Vec<TimeseriesResult>>,
    error: Option<YahooApiError>,
}

/// One series per requested type; the points sit under a key named after it
#[derive(Debug, Deserialize)]
struct TimeseriesResult {
    meta: TimeseriesMeta,
    #[serde(flatten)]
    series: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesMeta {
    #[serde(rename = "type", default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeseriesPoint {
    as_of_date: String,
    reported_value: Option<RawValue>,
}

fn parse_statement(
    kind: StatementKind,
    keys: &[&str],
    envelope: TimeseriesEnvelope,
) -> Result<FinancialStatement> {
    let timeseries = envelope.timeseries;
    if let Some(error) = timeseries.error {
        return Err(StockError::YahooFinanceError(error.message()));
    }

    let mut by_type: HashMap<String, serde_json::Value> = HashMap::new();
    for mut result in timeseries.result.unwrap_or_default() {
        for series_type in result.meta.types {
            if let Some(points) = result.series.remove(&series_type) {
                by_type.insert(series_type, points);
            }
        }
    }

    let mut statement = FinancialStatement::new(kind);
    for key in keys {
        let Some(points) = by_type.remove(&format!("annual{key}")) else {
            continue;
        };

        let points: Vec<Option<TimeseriesPoint>> = serde_json::from_value(points)?;
        let values: BTreeMap<NaiveDate, f64> = points
            .into_iter()
            .flatten()
            .filter_map(|point| {
                let date = NaiveDate::parse_from_str(&point.as_of_date, "%Y-%m-%d").ok()?;
                Some((date, raw(point.reported_value)?))
            })
            .collect();

        statement.push(humanize_key(key), values);
    }

    Ok(statement)
}
