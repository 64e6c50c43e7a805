//! Company header and number formatting

use crate::model::CompanyProfile;
use std::fmt::Write;

/// Placeholder for any field the provider did not publish
pub const NOT_AVAILABLE: &str = "N/A";

/// `2500000000000` -> `2,500,000,000,000`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Statement cell: whole numbers grouped, small magnitudes (per-share figures) to 2 decimals
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }

    if value.abs() < 1000.0 && value.fract() != 0.0 {
        return format!("{value:.2}");
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{}", group_thousands(value.abs().round() as u64))
}

/// `$189.84`, or `N/A`
pub fn format_price(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("${v:.2}"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// `+1.23%` / `-0.40%`, or `N/A`; input is already in percent units
pub fn format_change(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:+.2}%"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

pub fn format_market_cap(value: Option<u64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("${}", group_thousands(v)))
}

pub fn format_ratio(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.2}"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Yield is stored as a fraction and shown in percent
pub fn format_yield(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}%", v * 100.0),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn text(value: Option<&str>) -> &str {
    value.filter(|s| !s.trim().is_empty()).unwrap_or(NOT_AVAILABLE)
}

/// Header block shown above every tab
pub fn render_header(profile: &CompanyProfile) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} ({})",
        text(profile.name.as_deref()),
        text(profile.symbol.as_deref())
    );
    let _ = writeln!(out, "Sector: {}", text(profile.sector.as_deref()));
    let _ = writeln!(out, "Industry: {}", text(profile.industry.as_deref()));
    let _ = writeln!(
        out,
        "Current Price: {} ({})",
        format_price(profile.current_price),
        format_change(profile.change_percent)
    );
    let _ = writeln!(
        out,
        "52-Week Range: {} - {}",
        format_price(profile.fifty_two_week_low),
        format_price(profile.fifty_two_week_high)
    );
    let _ = writeln!(out, "Market Cap: {}", format_market_cap(profile.market_cap));
    let _ = writeln!(out, "P/E Ratio: {}", format_ratio(profile.trailing_pe));
    let _ = write!(out, "Dividend Yield: {}", format_yield(profile.dividend_yield));

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apple() -> CompanyProfile {
        CompanyProfile {
            name: Some("Apple Inc.".to_string()),
            symbol: Some("AAPL".to_string()),
            sector: Some("Technology".to_string()),
            industry: Some("Consumer Electronics".to_string()),
            current_price: Some(189.84),
            change_percent: Some(1.2345),
            market_cap: Some(2_500_000_000_000),
            trailing_pe: Some(29.456),
            fifty_two_week_low: Some(164.08),
            fifty_two_week_high: Some(199.62),
            dividend_yield: Some(0.0044),
        }
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(2_500_000_000_000), "2,500,000,000,000");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(383_285_000_000.0), "383,285,000,000");
        assert_eq!(format_amount(-10_959_000_000.0), "-10,959,000,000");
        assert_eq!(format_amount(6.13), "6.13");
        assert_eq!(format_amount(f64::NAN), NOT_AVAILABLE);
    }

    #[test]
    fn test_render_header_full_profile() {
        let header = render_header(&apple());
        assert!(header.starts_with("Apple Inc. (AAPL)\n"));
        assert!(header.contains("Sector: Technology"));
        assert!(header.contains("Current Price: $189.84 (+1.23%)"));
        assert!(header.contains("52-Week Range: $164.08 - $199.62"));
        assert!(header.contains("Market Cap: $2,500,000,000,000"));
        assert!(header.contains("P/E Ratio: 29.46"));
        assert!(header.contains("Dividend Yield: 0.44%"));
    }

    #[test]
    fn test_render_header_missing_fields() {
        let profile = CompanyProfile {
            current_price: None,
            fifty_two_week_high: None,
            trailing_pe: None,
            dividend_yield: None,
            market_cap: None,
            sector: None,
            ..apple()
        };

        let header = render_header(&profile);
        assert!(header.contains("Current Price: N/A (+1.23%)"));
        assert!(header.contains("52-Week Range: $164.08 - N/A"));
        assert!(header.contains("Market Cap: N/A"));
        assert!(header.contains("P/E Ratio: N/A"));
        assert!(header.contains("Dividend Yield: N/A"));
        assert!(header.contains("Sector: N/A"));
    }

    #[test]
    fn test_render_header_empty_profile() {
        let header = render_header(&CompanyProfile::default());
        assert!(header.starts_with("N/A (N/A)"));
        assert!(header.contains("Current Price: N/A (N/A)"));
    }
}
