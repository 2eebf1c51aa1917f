use serde_json::Value;

use crate::error::PtoolResult;

pub mod alpha_vantage;
pub mod merge;

/// Sentinels the provider uses in place of a value
static NO_DATA_SENTINELS: [&str; 3] = ["None", "-", ""];

/// Company overview fields consumed by the merge, raw as the provider sent them
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverviewFields {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub market_capitalization: Option<String>,
    pub quarterly_revenue_growth_yoy: Option<String>,
    pub profit_margin: Option<String>,
    pub return_on_equity_ttm: Option<String>,
    pub debt_to_equity: Option<String>,
}

/// Quote fields consumed by the merge, raw as the provider sent them
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuoteFields {
    pub price: Option<String>,
}

pub trait QuoteSource {
    /// Fetch overview and quote for `symbol`, both requests issued concurrently
    fn fetch_overview_and_quote(
        &self,
        symbol: &str,
    ) -> impl std::future::Future<Output = PtoolResult<(OverviewFields, QuoteFields)>> + Send;
}

/// Provider-side symbol, e.g. `RELIANCE.NS` -> `RELIANCE`
pub fn api_symbol(symbol: &str) -> String {
    symbol
        .trim()
        .split('.')
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

/// Trimmed text of a live value, `None` for absent values and no-data sentinels
pub fn live_text(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !NO_DATA_SENTINELS.contains(v))
}

impl OverviewFields {
    pub fn from_json(json: &Value) -> Self {
        Self {
            name: json_text(&json["Name"]),
            sector: json_text(&json["Sector"]),
            market_capitalization: json_text(&json["MarketCapitalization"]),
            quarterly_revenue_growth_yoy: json_text(&json["QuarterlyRevenueGrowthYOY"]),
            profit_margin: json_text(&json["ProfitMargin"]),
            return_on_equity_ttm: json_text(&json["ReturnOnEquityTTM"]),
            debt_to_equity: json_text(&json["DebtToEquity"]),
        }
    }
}

impl QuoteFields {
    pub fn from_json(json: &Value) -> Self {
        Self {
            price: json_text(&json["Global Quote"]["05. price"]),
        }
    }
}

fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
