//! Braille price and volume charts

use crate::model::{PriceBar, StockSnapshot};
use textplots::{Chart, Plot, Shape};

pub const PRICE_SECTION_TITLE: &str = "Historical Price Chart (Last 90 Days)";
pub const PRICE_AXIS_LABEL: &str = "Price (USD)";
pub const VOLUME_TITLE: &str = "Trading Volume";
pub const NO_HISTORY_NOTICE: &str = "Price history not available for this stock.";

/// Chart canvas size in textplots dots
#[derive(Debug, Clone, Copy)]
pub struct ChartSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartSize {
    fn default() -> Self {
        Self {
            width: 100,
            height: 30,
        }
    }
}

/// (days since first bar, value) pairs
fn series(history: &[PriceBar], value: impl Fn(&PriceBar) -> f32) -> Vec<(f32, f32)> {
    let Some(first) = history.first() else {
        return Vec::new();
    };
    history
        .iter()
        .map(|bar| ((bar.date - first.date).num_days() as f32, value(bar)))
        .collect()
}

fn x_range(points: &[(f32, f32)]) -> (f32, f32) {
    let xmax = points.last().map_or(0.0, |(x, _)| *x);
    // textplots needs a non-empty domain
    (0.0, xmax.max(1.0))
}

fn draw(size: ChartSize, points: &[(f32, f32)], ymin: f32, ymax: f32, bars: bool) -> String {
    let (xmin, xmax) = x_range(points);
    let shape = if bars {
        Shape::Bars(points)
    } else {
        Shape::Lines(points)
    };

    let mut chart = Chart::new_with_y_range(size.width, size.height, xmin, xmax, ymin, ymax);
    let plotted = chart.lineplot(&shape);
    plotted.axis();
    plotted.figures();
    plotted.to_string()
}

fn date_axis(history: &[PriceBar]) -> String {
    match (history.first(), history.last()) {
        (Some(first), Some(last)) => format!("Date: {} .. {}", first.date, last.date),
        _ => "Date".to_string(),
    }
}

/// Closing-price line chart
pub fn render_price_chart(snapshot: &StockSnapshot, size: ChartSize) -> String {
    let points = series(&snapshot.history, |bar| bar.close as f32);
    let (low, high) = points
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), (_, y)| {
            (lo.min(*y), hi.max(*y))
        });
    let pad = ((high - low) * 0.05).max(0.5);

    format!(
        "{} Stock Price\n{PRICE_AXIS_LABEL}\n{}\n{}",
        snapshot.display_name(),
        draw(size, &points, low - pad, high + pad, false),
        date_axis(&snapshot.history)
    )
}

/// Daily volume bar chart
pub fn render_volume_chart(snapshot: &StockSnapshot, size: ChartSize) -> String {
    let points = series(&snapshot.history, |bar| bar.volume as f32);
    let peak = points.iter().map(|(_, y)| *y).fold(0.0_f32, f32::max);
    // A third of the price chart's height keeps the pair on one screen
    let size = ChartSize {
        width: size.width,
        height: (size.height / 3).max(12),
    };

    format!(
        "{VOLUME_TITLE}\nVolume\n{}\n{}",
        draw(size, &points, 0.0, (peak * 1.05).max(1.0), true),
        date_axis(&snapshot.history)
    )
}

/// Price History tab body
pub fn render_price_history(snapshot: &StockSnapshot, size: ChartSize) -> String {
    if snapshot.history.is_empty() {
        return format!("{PRICE_SECTION_TITLE}\n\n{NO_HISTORY_NOTICE}");
    }

    format!(
        "{PRICE_SECTION_TITLE}\n\n{}\n\n{}",
        render_price_chart(snapshot, size),
        render_volume_chart(snapshot, size)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CompanyProfile, StatementData, Ticker};
    use chrono::{Duration, NaiveDate, Utc};

    fn snapshot(days: usize) -> StockSnapshot {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let history = (0..days)
            .map(|i| {
                let close = 180.0 + (i as f64 * 0.7).sin() * 5.0;
                PriceBar {
                    date: start + Duration::days(i as i64),
                    open: close - 1.0,
                    high: close + 1.5,
                    low: close - 2.0,
                    close,
                    volume: 40_000_000 + (i as u64 % 7) * 3_000_000,
                }
            })
            .collect();

        StockSnapshot {
            ticker: Ticker::parse("AAPL").unwrap(),
            profile: CompanyProfile {
                name: Some("Apple Inc.".to_string()),
                ..CompanyProfile::default()
            },
            history,
            balance_sheet: StatementData::Empty,
            income_statement: StatementData::Empty,
            cash_flow: StatementData::Empty,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_price_history_renders_both_charts() {
        let out = render_price_history(&snapshot(60), ChartSize::default());
        assert!(out.starts_with(PRICE_SECTION_TITLE));
        assert!(out.contains("Apple Inc. Stock Price"));
        assert!(out.contains(PRICE_AXIS_LABEL));
        assert!(out.contains(VOLUME_TITLE));
        assert!(out.contains("Date: 2024-02-01 .. 2024-03-31"));
        // Braille block
        assert!(out.chars().any(|c| ('\u{2800}'..='\u{28FF}').contains(&c)));
    }

    #[test]
    fn test_single_bar_and_flat_series_render() {
        let out = render_price_history(&snapshot(1), ChartSize::default());
        assert!(out.contains(VOLUME_TITLE));
    }

    #[test]
    fn test_empty_history_notice() {
        let out = render_price_history(&snapshot(0), ChartSize::default());
        assert!(out.contains(NO_HISTORY_NOTICE));
        assert!(!out.contains(VOLUME_TITLE));
    }

    #[test]
    fn test_chart_title_falls_back_to_ticker() {
        let mut snapshot = snapshot(10);
        snapshot.profile.name = None;
        let out = render_price_chart(&snapshot, ChartSize::default());
        assert!(out.starts_with("AAPL Stock Price"));
    }
}
