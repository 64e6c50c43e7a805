//! Market data model: tickers, profiles, price bars and financial statements

use crate::error::{Result, StockError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Exchange-assigned ticker symbol, trimmed and uppercased
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ticker(String);

impl Ticker {
    /// Normalize user input into a ticker
    ///
    /// The only check is non-emptiness; unknown symbols fail later at fetch time.
    pub fn parse(input: &str) -> Result<Self> {
        let symbol = input.trim();
        if symbol.is_empty() {
            return Err(StockError::InvalidSymbol(input.to_string()));
        }
        Ok(Self(symbol.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Ticker {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Company profile and headline valuation fields
///
/// Every field is optional; providers leave out whatever they do not publish.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub current_price: Option<f64>,
    /// Day change in percent (1.25 means +1.25%)
    pub change_percent: Option<f64>,
    pub market_cap: Option<u64>,
    pub trailing_pe: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    /// Dividend yield as a fraction (0.0044 means 0.44%)
    pub dividend_yield: Option<f64>,
}

/// One daily OHLCV row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// The three standard financial statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    BalanceSheet,
    IncomeStatement,
    CashFlow,
}

impl StatementKind {
    /// Section title
    pub fn title(&self) -> &'static str {
        match self {
            StatementKind::BalanceSheet => "Balance Sheet",
            StatementKind::IncomeStatement => "Income Statement",
            StatementKind::CashFlow => "Cash Flow Statement",
        }
    }

    /// Notice shown in place of a table when the statement is empty
    pub fn unavailable_notice(&self) -> &'static str {
        match self {
            StatementKind::BalanceSheet => "Balance sheet data not available for this stock.",
            StatementKind::IncomeStatement => {
                "Income statement data not available for this stock."
            }
            StatementKind::CashFlow => "Cash flow data not available for this stock.",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// One statement row: values keyed by fiscal period end date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub values: BTreeMap<NaiveDate, f64>,
}

/// A financial statement: line-item name -> (fiscal period -> value)
///
/// Line items keep the order the provider reported them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatement {
    pub kind: StatementKind,
    pub line_items: Vec<LineItem>,
}

impl FinancialStatement {
    pub fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            line_items: Vec::new(),
        }
    }

    /// Append a line item; items without any values are dropped
    pub fn push(&mut self, name: impl Into<String>, values: BTreeMap<NaiveDate, f64>) {
        if !values.is_empty() {
            self.line_items.push(LineItem {
                name: name.into(),
                values,
            });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    /// Values for one line item
    pub fn get(&self, name: &str) -> Option<&BTreeMap<NaiveDate, f64>> {
        self.line_items
            .iter()
            .find(|item| item.name == name)
            .map(|item| &item.values)
    }

    /// Every fiscal period present in any line item, newest first
    pub fn periods(&self) -> Vec<NaiveDate> {
        let periods: BTreeSet<NaiveDate> = self
            .line_items
            .iter()
            .flat_map(|item| item.values.keys().copied())
            .collect();
        periods.into_iter().rev().collect()
    }
}

/// A statement slot in a snapshot: data, or an explicit "not published" marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementData {
    Available(FinancialStatement),
    Empty,
}

impl StatementData {
    pub fn is_empty(&self) -> bool {
        matches!(self, StatementData::Empty)
    }

    pub fn as_statement(&self) -> Option<&FinancialStatement> {
        match self {
            StatementData::Available(statement) => Some(statement),
            StatementData::Empty => None,
        }
    }
}

impl From<FinancialStatement> for StatementData {
    fn from(statement: FinancialStatement) -> Self {
        if statement.is_empty() {
            StatementData::Empty
        } else {
            StatementData::Available(statement)
        }
    }
}

/// Everything fetched for one ticker at one point in time
///
/// Snapshots are only built once every part has been fetched, so a snapshot
/// is never partially populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub ticker: Ticker,
    pub profile: CompanyProfile,
    pub history: Vec<PriceBar>,
    pub balance_sheet: StatementData,
    pub income_statement: StatementData,
    pub cash_flow: StatementData,
    pub fetched_at: DateTime<Utc>,
}

impl StockSnapshot {
    pub fn statement(&self, kind: StatementKind) -> &StatementData {
        match kind {
            StatementKind::BalanceSheet => &self.balance_sheet,
            StatementKind::IncomeStatement => &self.income_statement,
            StatementKind::CashFlow => &self.cash_flow,
        }
    }

    /// Company name, falling back to the ticker
    pub fn display_name(&self) -> &str {
        self.profile.name.as_deref().unwrap_or(self.ticker.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_ticker_normalization() {
        assert_eq!(Ticker::parse(" aapl ").unwrap().as_str(), "AAPL");
        assert_eq!("brk-b".parse::<Ticker>().unwrap().to_string(), "BRK-B");
    }

    #[test]
    fn test_ticker_rejects_blank() {
        assert!(matches!(Ticker::parse(""), Err(StockError::InvalidSymbol(_))));
        assert!(Ticker::parse("   ").is_err());
    }

    #[test]
    fn test_statement_periods_newest_first() {
        let mut statement = FinancialStatement::new(StatementKind::IncomeStatement);
        statement.push(
            "Total Revenue",
            BTreeMap::from([(date(2022, 9, 30), 1.0), (date(2023, 9, 30), 2.0)]),
        );
        statement.push("Net Income", BTreeMap::from([(date(2021, 9, 30), 3.0)]));

        assert_eq!(
            statement.periods(),
            vec![date(2023, 9, 30), date(2022, 9, 30), date(2021, 9, 30)]
        );
        assert_eq!(
            statement.get("Net Income").and_then(|v| v.get(&date(2021, 9, 30))),
            Some(&3.0)
        );
    }

    #[test]
    fn test_empty_line_items_are_dropped() {
        let mut statement = FinancialStatement::new(StatementKind::CashFlow);
        statement.push("Free Cash Flow", BTreeMap::new());
        assert!(statement.is_empty());
        assert_eq!(StatementData::from(statement), StatementData::Empty);
    }

    #[test]
    fn test_display_name_fallback() {
        let snapshot = StockSnapshot {
            ticker: Ticker::parse("XYZ").unwrap(),
            profile: CompanyProfile::default(),
            history: Vec::new(),
            balance_sheet: StatementData::Empty,
            income_statement: StatementData::Empty,
            cash_flow: StatementData::Empty,
            fetched_at: Utc::now(),
        };
        assert_eq!(snapshot.display_name(), "XYZ");
        assert!(snapshot.statement(StatementKind::CashFlow).is_empty());
    }
}
