//! Text rendering of a [`StockSnapshot`]
//!
//! Every function here is pure: it reads the snapshot and returns a `String`.

pub mod chart;
pub mod header;
pub mod statements;

pub use chart::{render_price_history, ChartSize};
pub use header::{render_header, NOT_AVAILABLE};
pub use statements::render_statement;

use crate::model::{StatementKind, StockSnapshot};
use std::fmt;
use std::str::FromStr;

pub const PAGE_TITLE: &str = "Stock Analysis Dashboard";
pub const ANALYSIS_SECTION_TITLE: &str = "AI Stock Analysis";
const RULE: &str = "----------------------------------------";

/// Dashboard sections shown below the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    PriceHistory,
    BalanceSheet,
    IncomeStatement,
    CashFlow,
    Analysis,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::PriceHistory,
        Tab::BalanceSheet,
        Tab::IncomeStatement,
        Tab::CashFlow,
        Tab::Analysis,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Tab::PriceHistory => "Price History",
            Tab::BalanceSheet => "Balance Sheet",
            Tab::IncomeStatement => "Income Statement",
            Tab::CashFlow => "Cash Flow",
            Tab::Analysis => "AI Analysis",
        }
    }

    /// Short name accepted by `/tab`
    pub fn key(&self) -> &'static str {
        match self {
            Tab::PriceHistory => "price",
            Tab::BalanceSheet => "balance",
            Tab::IncomeStatement => "income",
            Tab::CashFlow => "cashflow",
            Tab::Analysis => "ai",
        }
    }

    pub fn statement_kind(&self) -> Option<StatementKind> {
        match self {
            Tab::BalanceSheet => Some(StatementKind::BalanceSheet),
            Tab::IncomeStatement => Some(StatementKind::IncomeStatement),
            Tab::CashFlow => Some(StatementKind::CashFlow),
            Tab::PriceHistory | Tab::Analysis => None,
        }
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "price" | "history" | "p" => Ok(Tab::PriceHistory),
            "balance" | "b" => Ok(Tab::BalanceSheet),
            "income" | "i" => Ok(Tab::IncomeStatement),
            "cashflow" | "cash" | "c" => Ok(Tab::CashFlow),
            "ai" | "analysis" => Ok(Tab::Analysis),
            other => Err(format!(
                "Unknown tab '{other}' (expected price, balance, income, cashflow or ai)"
            )),
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `[Price History] | Balance Sheet | ...` with the active tab bracketed
pub fn render_tab_bar(active: Tab) -> String {
    Tab::ALL
        .iter()
        .map(|tab| {
            if *tab == active {
                format!("[{}]", tab.label())
            } else {
                tab.label().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Body of a data tab
///
/// The analysis tab only shows its title here; its content belongs to the
/// session, which owns the credential and the last analysis result.
pub fn render_tab(snapshot: &StockSnapshot, tab: Tab, size: ChartSize) -> String {
    match tab {
        Tab::PriceHistory => render_price_history(snapshot, size),
        Tab::Analysis => ANALYSIS_SECTION_TITLE.to_string(),
        statement => match statement.statement_kind() {
            Some(kind) => render_statement(kind, snapshot.statement(kind)),
            None => String::new(),
        },
    }
}

/// Page title, header, tab bar and the selected tab
pub fn render_dashboard(snapshot: &StockSnapshot, tab: Tab, size: ChartSize) -> String {
    format!(
        "{PAGE_TITLE}\n\n{}\n{RULE}\n{}\n\n{}",
        render_header(&snapshot.profile),
        render_tab_bar(tab),
        render_tab(snapshot, tab, size)
    )
}
