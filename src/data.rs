use std::fmt;

use serde::Serialize;

pub mod catalog;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StockIdentity {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub market_cap: f64,
    pub current_price: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PToolData {
    pub score: f64,
    pub rating: PToolRating,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FundamentalData {
    pub revenue_growth: f64,
    pub profit_margin: f64,
    pub roe: f64,
    pub debt_equity: f64,
    pub is_sustainable: Sustainability,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TechnicalData {
    pub rsi: f64,
    pub macd_signal: MacdSignal,
    pub trend: PriceTrend,
    pub technical_signal: TechnicalSignal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ForensicData {
    pub risk_level: RiskLevel,
    pub red_flags_count: u32,
    pub issues_list: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SentimentData {
    pub sentiment: Sentiment,
    pub news_count: u32,
    pub fraud_alerts: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PeerData {
    pub peer_growth_diff: f64,
    pub valuation_premium: f64,
    pub growth_real: Genuineness,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EconomicIndicator {
    pub value: IndicatorValue,
    pub trend: IndicatorTrend,
    pub impact: Outlook,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EconomicIndicators {
    pub gdp_growth: EconomicIndicator,
    pub inflation_rate: EconomicIndicator,
    pub manufacturing_pmi: EconomicIndicator,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarketConditions {
    pub trend: MarketTrend,
    pub volatility: Volatility,
    pub sentiment: MarketSentiment,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SectorOutlook {
    pub trend: SectorTrend,
    pub outlook: SectorOutlookLevel,
    pub drivers: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MacroData {
    pub macro_outlook: Outlook,
    pub economic_indicators: EconomicIndicators,
    pub market_conditions: MarketConditions,
    pub sector_outlook: SectorOutlook,
}

/// Baseline analysis record for one symbol, the fallback for every live field
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisProfile {
    pub stock: StockIdentity,
    pub p_tool: PToolData,
    pub fundamental: FundamentalData,
    pub technical: TechnicalData,
    pub forensic: ForensicData,
    pub sentiment: SentimentData,
    pub peer: PeerData,
    #[serde(rename = "macro")]
    pub macro_data: MacroData,
}

/// A baseline profile with the live quote/overview fields overlaid on it
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MergedAnalysis {
    pub stock: StockIdentity,
    pub p_tool: PToolData,
    pub fundamental: FundamentalData,
    pub technical: TechnicalData,
    pub forensic: ForensicData,
    pub sentiment: SentimentData,
    pub peer: PeerData,
    #[serde(rename = "macro")]
    pub macro_data: MacroData,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TopPick {
    #[serde(flatten)]
    pub stock: StockIdentity,
    pub ptool_score: f64,
    pub recommendation: crate::recommend::Recommendation,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardStats {
    pub stocks_analyzed: u32,
    pub buy_signals: u32,
    pub avg_ptool_score: f64,
    pub red_flags: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum IndicatorValue {
    Text(String),
    Number(f64),
}

#[derive(Clone, Copy, Debug, PartialEq, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum PToolRating {
    #[strum(serialize = "EXCELLENT")]
    Excellent,
    #[strum(serialize = "GOOD")]
    Good,
    #[strum(serialize = "AVERAGE")]
    Average,
    #[strum(serialize = "POOR")]
    Poor,
}

#[derive(Clone, Copy, Debug, PartialEq, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum Sustainability {
    Yes,
    No,
    Partial,
}

#[derive(Clone, Copy, Debug, PartialEq, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum MacdSignal {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Clone, Copy, Debug, PartialEq, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum PriceTrend {
    Uptrend,
    Downtrend,
    Sideways,
}

#[derive(Clone, Copy, Debug, PartialEq, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum TechnicalSignal {
    #[strum(serialize = "STRONG BUY")]
    StrongBuy,
    #[strum(serialize = "BUY")]
    Buy,
    #[strum(serialize = "HOLD")]
    Hold,
    #[strum(serialize = "SELL")]
    Sell,
    #[strum(serialize = "STRONG SELL")]
    StrongSell,
}

#[derive(Clone, Copy, Debug, PartialEq, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum RiskLevel {
    #[strum(serialize = "LOW")]
    Low,
    #[strum(serialize = "MODERATE")]
    Moderate,
    #[strum(serialize = "HIGH")]
    High,
    #[strum(serialize = "CRITICAL")]
    Critical,
}

#[derive(Clone, Copy, Debug, PartialEq, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

#[derive(Clone, Copy, Debug, PartialEq, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum Genuineness {
    Yes,
    No,
}

#[derive(Clone, Copy, Debug, PartialEq, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum Outlook {
    #[strum(serialize = "POSITIVE")]
    Positive,
    #[strum(serialize = "NEUTRAL")]
    Neutral,
    #[strum(serialize = "NEGATIVE")]
    Negative,
}

#[derive(Clone, Copy, Debug, PartialEq, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum IndicatorTrend {
    #[strum(serialize = "IMPROVING")]
    Improving,
    #[strum(serialize = "DECLINING")]
    Declining,
    #[strum(serialize = "STABLE")]
    Stable,
}

#[derive(Clone, Copy, Debug, PartialEq, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum MarketTrend {
    #[strum(serialize = "BULLISH")]
    Bullish,
    #[strum(serialize = "BEARISH")]
    Bearish,
    #[strum(serialize = "NEUTRAL")]
    Neutral,
}

#[derive(Clone, Copy, Debug, PartialEq, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum Volatility {
    #[strum(serialize = "LOW")]
    Low,
    #[strum(serialize = "MODERATE")]
    Moderate,
    #[strum(serialize = "HIGH")]
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum MarketSentiment {
    #[strum(serialize = "RISK-ON")]
    RiskOn,
    #[strum(serialize = "RISK-OFF")]
    RiskOff,
    #[strum(serialize = "NEUTRAL")]
    Neutral,
}

#[derive(Clone, Copy, Debug, PartialEq, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum SectorTrend {
    #[strum(serialize = "STRONG")]
    Strong,
    #[strum(serialize = "MODERATE")]
    Moderate,
    #[strum(serialize = "STABLE")]
    Stable,
    #[strum(serialize = "RECOVERY")]
    Recovery,
    #[strum(serialize = "TRANSITION")]
    Transition,
    #[strum(serialize = "BOOMING")]
    Booming,
}

#[derive(Clone, Copy, Debug, PartialEq, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum SectorOutlookLevel {
    #[strum(serialize = "VERY POSITIVE")]
    VeryPositive,
    #[strum(serialize = "POSITIVE")]
    Positive,
    #[strum(serialize = "NEUTRAL")]
    Neutral,
    #[strum(serialize = "NEGATIVE")]
    Negative,
}

impl From<AnalysisProfile> for MergedAnalysis {
    fn from(profile: AnalysisProfile) -> Self {
        Self {
            stock: profile.stock,
            p_tool: profile.p_tool,
            fundamental: profile.fundamental,
            technical: profile.technical,
            forensic: profile.forensic,
            sentiment: profile.sentiment,
            peer: profile.peer,
            macro_data: profile.macro_data,
        }
    }
}

impl fmt::Display for IndicatorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorValue::Text(text) => write!(f, "{text}"),
            IndicatorValue::Number(number) => write!(f, "{number}"),
        }
    }
}

impl Serialize for IndicatorValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            IndicatorValue::Text(text) => serializer.serialize_str(text),
            IndicatorValue::Number(number) => serializer.serialize_f64(*number),
        }
    }
}

// Enumerated labels serialize as their display text, e.g. "STRONG BUY"
macro_rules! serialize_as_display {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Serialize for $ty {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: serde::Serializer,
                {
                    serializer.collect_str(self)
                }
            }
        )+
    };
}

pub(crate) use serialize_as_display;

serialize_as_display!(
    PToolRating,
    Sustainability,
    MacdSignal,
    PriceTrend,
    TechnicalSignal,
    RiskLevel,
    Sentiment,
    Genuineness,
    Outlook,
    IndicatorTrend,
    MarketTrend,
    Volatility,
    MarketSentiment,
    SectorTrend,
    SectorOutlookLevel,
);

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_enum_labels() {
        assert_eq!(TechnicalSignal::StrongBuy.to_string(), "STRONG BUY");
        assert_eq!(MarketSentiment::from_str("RISK-OFF"), Ok(MarketSentiment::RiskOff));
        assert_eq!(
            SectorOutlookLevel::from_str("VERY POSITIVE"),
            Ok(SectorOutlookLevel::VeryPositive)
        );
        assert!(RiskLevel::from_str("SEVERE").is_err());
    }

    #[test]
    fn test_serialize_labels() {
        let indicator = EconomicIndicator {
            value: IndicatorValue::Number(57.2),
            trend: IndicatorTrend::Improving,
            impact: Outlook::Positive,
        };

        let json = serde_json::to_value(&indicator).unwrap();
        assert_eq!(json["value"], 57.2);
        assert_eq!(json["trend"], "IMPROVING");
        assert_eq!(json["impact"], "POSITIVE");
    }
}
