//! Analysis prompt template
//!
//! The prompt is a fixed MiniJinja template filled from the company profile.
//! Every field is always present in the output; absent values render as `N/A`.

use crate::model::StockSnapshot;
use crate::present::header::{format_market_cap, format_price, format_ratio, NOT_AVAILABLE};
use minijinja::Environment;
use serde::Serialize;
use thiserror::Error;

/// System message for backends that take one
pub const ANALYST_SYSTEM_PROMPT: &str =
    "You are a skilled financial analyst who provides concise, accurate stock analyses.";

const TEMPLATE_NAME: &str = "stock_analysis";

const STOCK_ANALYSIS_TEMPLATE: &str = "\
You are a financial analyst expert. I'd like you to analyze this stock and provide investment insights.

Company: {{ name }} ({{ symbol }})
Sector: {{ sector }}
Industry: {{ industry }}
Current Price: {{ price }}
Market Cap: {{ market_cap }}
P/E Ratio: {{ pe_ratio }}
52-Week Range: {{ week_low }} - {{ week_high }}

Please analyze this stock and provide:
{% for section in sections -%}
{{ loop.index }}. {{ section }}
{% endfor %}";

/// Sections the analysis is asked to cover, in order
pub const ANALYSIS_SECTIONS: [&str; 6] = [
    "A brief overview of the company",
    "Analysis on Income Statement based on last 5 years",
    "Analysis on Balance Sheet based on last 5 years",
    "Analysis on Cash Flow Statement based on last 5 years",
    "Potential risks and opportunities",
    "Final recommendation (Buy or Sell) with rationale for value investing",
];

/// Errors from building or rendering prompts
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Failed to parse template '{name}': {detail}")]
    TemplateParseFailed { name: String, detail: String },

    #[error("Failed to render template '{name}': {detail}")]
    RenderError { name: String, detail: String },
}

#[derive(Debug, Serialize)]
struct PromptVars<'a> {
    name: &'a str,
    symbol: &'a str,
    sector: &'a str,
    industry: &'a str,
    price: String,
    market_cap: String,
    pe_ratio: String,
    week_low: String,
    week_high: String,
    sections: &'a [&'a str],
}

fn or_na(value: Option<&str>) -> &str {
    value.filter(|s| !s.trim().is_empty()).unwrap_or(NOT_AVAILABLE)
}

/// Compiled stock-analysis prompt
pub struct AnalysisPrompt {
    env: Environment<'static>,
}

impl AnalysisPrompt {
    pub fn new() -> Result<Self, PromptError> {
        let mut env = Environment::new();
        env.add_template(TEMPLATE_NAME, STOCK_ANALYSIS_TEMPLATE)
            .map_err(|e| PromptError::TemplateParseFailed {
                name: TEMPLATE_NAME.to_string(),
                detail: e.to_string(),
            })?;
        Ok(Self { env })
    }

    /// User prompt for `snapshot`
    pub fn render(&self, snapshot: &StockSnapshot) -> Result<String, PromptError> {
        let profile = &snapshot.profile;
        let vars = PromptVars {
            name: or_na(profile.name.as_deref()),
            symbol: profile.symbol.as_deref().unwrap_or(snapshot.ticker.as_str()),
            sector: or_na(profile.sector.as_deref()),
            industry: or_na(profile.industry.as_deref()),
            price: format_price(profile.current_price),
            market_cap: format_market_cap(profile.market_cap),
            pe_ratio: format_ratio(profile.trailing_pe),
            week_low: format_price(profile.fifty_two_week_low),
            week_high: format_price(profile.fifty_two_week_high),
            sections: &ANALYSIS_SECTIONS,
        };

        let render_error = |e: minijinja::Error| PromptError::RenderError {
            name: TEMPLATE_NAME.to_string(),
            detail: e.to_string(),
        };

        self.env
            .get_template(TEMPLATE_NAME)
            .map_err(render_error)?
            .render(&vars)
            .map_err(render_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CompanyProfile, StatementData, Ticker};
    use chrono::Utc;

    fn snapshot(profile: CompanyProfile) -> StockSnapshot {
        StockSnapshot {
            ticker: Ticker::parse("MSFT").unwrap(),
            profile,
            history: Vec::new(),
            balance_sheet: StatementData::Empty,
            income_statement: StatementData::Empty,
            cash_flow: StatementData::Empty,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_prompt_with_full_profile() {
        let prompt = AnalysisPrompt::new().unwrap();
        let text = prompt
            .render(&snapshot(CompanyProfile {
                name: Some("Microsoft Corporation".to_string()),
                symbol: Some("MSFT".to_string()),
                sector: Some("Technology".to_string()),
                industry: Some("Software - Infrastructure".to_string()),
                current_price: Some(415.5),
                market_cap: Some(3_090_000_000_000),
                trailing_pe: Some(36.123),
                fifty_two_week_low: Some(309.45),
                fifty_two_week_high: Some(430.82),
                ..CompanyProfile::default()
            }))
            .unwrap();

        assert!(text.contains("Company: Microsoft Corporation (MSFT)"));
        assert!(text.contains("Current Price: $415.50"));
        assert!(text.contains("Market Cap: $3,090,000,000,000"));
        assert!(text.contains("P/E Ratio: 36.12"));
        assert!(text.contains("52-Week Range: $309.45 - $430.82"));
    }

    #[test]
    fn test_prompt_lists_all_sections() {
        let prompt = AnalysisPrompt::new().unwrap();
        let text = prompt.render(&snapshot(CompanyProfile::default())).unwrap();

        for (i, section) in ANALYSIS_SECTIONS.iter().enumerate() {
            assert!(text.contains(&format!("{}. {section}", i + 1)), "missing: {section}");
        }
        assert!(text.contains("Buy or Sell"));
    }

    #[test]
    fn test_prompt_absent_fields_render_placeholder() {
        let prompt = AnalysisPrompt::new().unwrap();
        let text = prompt.render(&snapshot(CompanyProfile::default())).unwrap();

        assert!(text.contains("Company: N/A (MSFT)"));
        assert!(text.contains("Sector: N/A"));
        assert!(text.contains("Industry: N/A"));
        assert!(text.contains("Current Price: N/A"));
        assert!(text.contains("Market Cap: N/A"));
        assert!(text.contains("P/E Ratio: N/A"));
        assert!(text.contains("52-Week Range: N/A - N/A"));
    }
}
