use log::debug;

use crate::{
    data::{AnalysisProfile, MergedAnalysis},
    financial::{OverviewFields, QuoteFields, live_text},
};

/// Overlay live overview/quote fields onto a baseline profile.
///
/// Every live field that is present, not a sentinel and parseable replaces the
/// baseline value; anything else keeps the baseline value untouched. Only the
/// identity fields and four fundamentals are ever overridden.
pub fn merge(baseline: AnalysisProfile, overview: &OverviewFields, quote: &QuoteFields) -> MergedAnalysis {
    let mut merged = MergedAnalysis::from(baseline);

    let stock = &mut merged.stock;
    stock.symbol = stock.symbol.to_uppercase();
    overlay(&mut stock.current_price, "current_price", live_number(quote.price.as_deref()));
    overlay(
        &mut stock.market_cap,
        "market_cap",
        live_number(overview.market_capitalization.as_deref()).map(f64::trunc),
    );
    overlay_text(&mut stock.name, "name", overview.name.as_deref());
    overlay_text(&mut stock.sector, "sector", overview.sector.as_deref());

    let fundamental = &mut merged.fundamental;
    overlay(
        &mut fundamental.revenue_growth,
        "revenue_growth",
        live_percentage(overview.quarterly_revenue_growth_yoy.as_deref()),
    );
    overlay(
        &mut fundamental.profit_margin,
        "profit_margin",
        live_percentage(overview.profit_margin.as_deref()),
    );
    overlay(
        &mut fundamental.roe,
        "roe",
        live_percentage(overview.return_on_equity_ttm.as_deref()),
    );
    overlay(
        &mut fundamental.debt_equity,
        "debt_equity",
        live_number(overview.debt_to_equity.as_deref()),
    );

    merged
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn live_number(value: Option<&str>) -> Option<f64> {
    live_text(value)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Provider fractions (0.125) on percentage scale (12.5)
fn live_percentage(value: Option<&str>) -> Option<f64> {
    live_number(value).map(|v| v * 100.0)
}

fn overlay(target: &mut f64, field: &str, live: Option<f64>) {
    // scaling and rounding may overflow a finite live value
    match live.map(round2).filter(|v| v.is_finite()) {
        Some(value) => *target = value,
        None => debug!("[Merge] '{field}' falls back to baseline value {target}"),
    }
}

fn overlay_text(target: &mut String, field: &str, live: Option<&str>) {
    match live_text(live) {
        Some(value) => *target = value.to_string(),
        None => debug!("[Merge] '{field}' falls back to baseline value '{target}'"),
    }
}
