use std::{cmp::Ordering, str::FromStr};

use log::{debug, info};
use serde::Serialize;
use serde_json::{Map, Value, json};
use strum::IntoEnumIterator;

use crate::{
    LLM_CHAT_TEMPERATURE_DEFAULT,
    data::{MergedAnalysis, serialize_as_display},
    error::{PtoolError, PtoolResult},
    llm,
    llm::{ChatCompletionOptions, ChatMessage, Role},
    utils,
};

/// Recommendation labels, iterated from the most to the least bullish
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum Recommendation {
    #[strum(serialize = "STRONG BUY")]
    StrongBuy,
    #[strum(serialize = "BUY")]
    Buy,
    #[strum(serialize = "HOLD")]
    Hold,
    #[strum(serialize = "SELL")]
    Sell,
    #[strum(serialize = "REJECT")]
    Reject,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum InvestmentHorizon {
    #[strum(serialize = "Short Term (3-6mo)")]
    ShortTerm,
    #[strum(serialize = "Medium Term (6-12mo)")]
    MediumTerm,
    #[strum(serialize = "Long Term (12+ mo)")]
    LongTerm,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum PositionSize {
    #[strum(serialize = "Conservative (1-3%)")]
    Conservative,
    #[strum(serialize = "Moderate (3-5%)")]
    Moderate,
    #[strum(serialize = "Aggressive (5-10%)")]
    Aggressive,
}

serialize_as_display!(Recommendation, InvestmentHorizon, PositionSize);

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecommendationResult {
    pub recommendation: Recommendation,
    pub confidence_score: f64,
    pub key_reasoning: Vec<String>,
    pub strengths: Vec<String>,
    pub risks: Vec<String>,
    pub target_price: String,
    pub stop_loss: String,
    pub investment_horizon: InvestmentHorizon,
    pub position_size: PositionSize,
}

pub trait Recommender {
    fn request_recommendation(
        &self,
        merged: &MergedAnalysis,
    ) -> impl std::future::Future<Output = PtoolResult<RecommendationResult>> + Send;
}

/// Requests recommendations from the configured chat model
#[derive(Clone, Debug)]
pub struct LlmRecommender {
    config: llm::Config,
    temperature: f64,
}

static RESPONSE_SCHEMA_NAME: &str = "investment_recommendation";

static REQUIRED_FIELDS: [&str; 9] = [
    "recommendation",
    "confidence_score",
    "key_reasoning",
    "strengths",
    "risks",
    "target_price",
    "stop_loss",
    "investment_horizon",
    "position_size",
];

static LLM_SYSTEM: &str = "You are an expert stock analyst for the Indian stock market (NSE/BSE) \
with 20 years of experience. Your analysis is sharp, data-driven and conclusive.";

impl Recommendation {
    /// 4 for STRONG BUY down to 0 for REJECT
    pub fn bullishness(&self) -> u8 {
        match self {
            Recommendation::StrongBuy => 4,
            Recommendation::Buy => 3,
            Recommendation::Hold => 2,
            Recommendation::Sell => 1,
            Recommendation::Reject => 0,
        }
    }
}

impl Ord for Recommendation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bullishness().cmp(&other.bullishness())
    }
}

impl PartialOrd for Recommendation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl RecommendationResult {
    /// Parse a model reply, rejecting anything that does not satisfy the response schema
    pub fn from_json(json_str: &str) -> PtoolResult<Self> {
        let json: Value = serde_json::from_str(json_str).map_err(|err| {
            PtoolError::MalformedRecommendation(format!("Response is not valid JSON: {err}"))
        })?;

        let obj = json.as_object().ok_or(PtoolError::MalformedRecommendation(
            "Response is not a JSON object".to_string(),
        ))?;

        if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !obj.contains_key(**f)) {
            return Err(PtoolError::MalformedRecommendation(format!(
                "Missing required field '{missing}'"
            )));
        }

        let confidence_score = obj["confidence_score"].as_f64().ok_or(
            PtoolError::MalformedRecommendation("Field 'confidence_score' is not a number".to_string()),
        )?;
        if !(0.0..=100.0).contains(&confidence_score) {
            return Err(PtoolError::MalformedRecommendation(format!(
                "Field 'confidence_score' {confidence_score} is outside 0..=100"
            )));
        }

        Ok(Self {
            recommendation: enum_field(obj, "recommendation")?,
            confidence_score,
            key_reasoning: string_list_field(obj, "key_reasoning")?,
            strengths: string_list_field(obj, "strengths")?,
            risks: string_list_field(obj, "risks")?,
            target_price: string_field(obj, "target_price")?,
            stop_loss: string_field(obj, "stop_loss")?,
            investment_horizon: enum_field(obj, "investment_horizon")?,
            position_size: enum_field(obj, "position_size")?,
        })
    }
}

impl LlmRecommender {
    pub fn new(config: llm::Config) -> Self {
        Self {
            config,
            temperature: LLM_CHAT_TEMPERATURE_DEFAULT,
        }
    }

    pub fn from_config() -> PtoolResult<Self> {
        Ok(Self::new(llm::load_config()?))
    }
}

impl Recommender for LlmRecommender {
    async fn request_recommendation(
        &self,
        merged: &MergedAnalysis,
    ) -> PtoolResult<RecommendationResult> {
        let messages = vec![
            ChatMessage::new(Role::System, LLM_SYSTEM),
            ChatMessage::new(Role::User, &generate_prompt(merged)),
        ];

        let options = ChatCompletionOptions::default()
            .with_temperature(self.temperature)
            .with_response_schema(RESPONSE_SCHEMA_NAME, response_schema());

        info!(
            "[Recommend] '{}' via {} model '{}'",
            merged.stock.symbol, self.config.protocol, self.config.model
        );

        let bot_message = llm::chat_completion(&self.config, &messages, &options)
            .await
            .map_err(|err| match err {
                PtoolError::AuthenticationFailed(_) => err,
                _ => PtoolError::RecommendationUnavailable(err.to_string()),
            })?;
        debug!("[Recommend LLM] {bot_message:?}");

        let json_str = utils::markdown::extract_json_block(&bot_message.content);
        RecommendationResult::from_json(&json_str)
    }
}

/// Deterministic summary of a merged record, sections always in the same order
pub fn generate_prompt(merged: &MergedAnalysis) -> String {
    let MergedAnalysis {
        stock,
        p_tool,
        fundamental,
        technical,
        forensic,
        sentiment,
        peer,
        macro_data,
    } = merged;

    let peer_growth_diff = if peer.peer_growth_diff > 0.0 {
        format!("+{}", peer.peer_growth_diff)
    } else {
        peer.peer_growth_diff.to_string()
    };

    let issues = forensic.issues_list.join(", ");
    let drivers = macro_data.sector_outlook.drivers.join(", ");

    format!(
        r#"Stock: {symbol}
Company: {name}
Sector: {sector}
Current Price: {price}
Market Cap: {market_cap}

ANALYSIS SUMMARY:
==================

P-Tool Score: {score}/100 ({rating})
A proprietary score blending multiple factors, higher is better.

Fundamental Analysis:
- Revenue Growth: {revenue_growth}%
- Profit Margin: {profit_margin}%
- ROE: {roe}%
- Debt/Equity: {debt_equity}
- Sustainability of Growth: {is_sustainable}

Technical Analysis:
- RSI (14-day): {rsi}
- MACD Signal: {macd_signal}
- Current Trend: {trend}
- Overall Technical Signal: {technical_signal}

Forensic Analysis (Corporate Governance & Accounting):
- Risk Level: {risk_level}
- Red Flags Count: {red_flags_count}
- Key Issues: {issues}

Sentiment Analysis:
- Market Sentiment: {sentiment}
- Recent News Volume: {news_count} articles
- Fraud Alerts: {fraud_alerts}

Peer Comparison:
- Revenue Growth vs Peers: {peer_growth_diff}%
- Valuation Premium vs Peers: {valuation_premium}%
- Is Growth Genuine (vs Peers): {growth_real}

Macro Analysis:
- Overall Macro Outlook: {macro_outlook}
- Sector Trend: {sector_trend}
- Key Sector Drivers: {drivers}

TASK:
Based on this multi-faceted analysis, give your final investment recommendation. Be direct, analytical and actionable, and synthesize all data points into one coherent investment thesis. Reply with a single JSON object matching the declared schema only; "key_reasoning" holds the concise core of the thesis."#,
        symbol = stock.symbol,
        name = stock.name,
        sector = stock.sector,
        price = stock.current_price,
        market_cap = stock.market_cap,
        score = p_tool.score,
        rating = p_tool.rating,
        revenue_growth = fundamental.revenue_growth,
        profit_margin = fundamental.profit_margin,
        roe = fundamental.roe,
        debt_equity = fundamental.debt_equity,
        is_sustainable = fundamental.is_sustainable,
        rsi = technical.rsi,
        macd_signal = technical.macd_signal,
        trend = technical.trend,
        technical_signal = technical.technical_signal,
        risk_level = forensic.risk_level,
        red_flags_count = forensic.red_flags_count,
        sentiment = sentiment.sentiment,
        news_count = sentiment.news_count,
        fraud_alerts = sentiment.fraud_alerts,
        valuation_premium = peer.valuation_premium,
        growth_real = peer.growth_real,
        macro_outlook = macro_data.macro_outlook,
        sector_trend = macro_data.sector_outlook.trend,
    )
}

/// Output contract declared to the model
pub fn response_schema() -> Value {
    let labels = |values: Vec<String>| Value::from(values);

    json!({
        "type": "object",
        "properties": {
            "recommendation": {
                "type": "string",
                "enum": labels(Recommendation::iter().map(|v| v.to_string()).collect()),
            },
            "confidence_score": {
                "type": "number",
                "description": "A score from 0 to 100 representing your confidence in the recommendation.",
            },
            "key_reasoning": {
                "type": "array",
                "items": { "type": "string" },
                "description": "A few bullet points summarizing the core investment thesis.",
            },
            "strengths": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Key positive factors and strengths of the company.",
            },
            "risks": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Key risks and potential negative factors.",
            },
            "target_price": {
                "type": "string",
                "description": "A realistic target price based on the analysis.",
            },
            "stop_loss": {
                "type": "string",
                "description": "A suggested stop-loss price to manage risk.",
            },
            "investment_horizon": {
                "type": "string",
                "enum": labels(InvestmentHorizon::iter().map(|v| v.to_string()).collect()),
                "description": "The suggested timeframe for this investment.",
            },
            "position_size": {
                "type": "string",
                "enum": labels(PositionSize::iter().map(|v| v.to_string()).collect()),
                "description": "Recommended allocation size within a portfolio.",
            },
        },
        "required": REQUIRED_FIELDS,
        "additionalProperties": false,
    })
}

fn enum_field<T: FromStr>(obj: &Map<String, Value>, name: &str) -> PtoolResult<T> {
    let text = obj[name].as_str().ok_or(PtoolError::MalformedRecommendation(format!(
        "Field '{name}' is not a string"
    )))?;

    T::from_str(text).map_err(|_| {
        PtoolError::MalformedRecommendation(format!("Field '{name}' has unknown value '{text}'"))
    })
}

fn string_field(obj: &Map<String, Value>, name: &str) -> PtoolResult<String> {
    obj[name]
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(PtoolError::MalformedRecommendation(format!(
            "Field '{name}' is not a non-empty string"
        )))
}

fn string_list_field(obj: &Map<String, Value>, name: &str) -> PtoolResult<Vec<String>> {
    let malformed = || {
        PtoolError::MalformedRecommendation(format!(
            "Field '{name}' is not a non-empty list of strings"
        ))
    };

    let items = obj[name].as_array().ok_or_else(malformed)?;
    if items.is_empty() {
        return Err(malformed());
    }

    items
        .iter()
        .map(|item| item.as_str().map(|s| s.to_string()).ok_or_else(malformed))
        .collect()
}

#[cfg(test)]
mod tests {
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers::method};

    use super::*;
    use crate::{
        data::catalog,
        llm::{Config, Protocol},
    };

    fn merged(symbol: &str) -> MergedAnalysis {
        MergedAnalysis::from(catalog::lookup(symbol).unwrap())
    }

    fn reply() -> Value {
        json!({
            "recommendation": "BUY",
            "confidence_score": 78,
            "key_reasoning": ["Consistent margins", "Low leverage"],
            "strengths": ["Market leader"],
            "risks": ["Rich valuation"],
            "target_price": "₹4,250",
            "stop_loss": "₹3,600",
            "investment_horizon": "Long Term (12+ mo)",
            "position_size": "Moderate (3-5%)"
        })
    }

    #[test]
    fn test_recommendation_order() {
        assert!(Recommendation::StrongBuy > Recommendation::Buy);
        assert!(Recommendation::Buy > Recommendation::Hold);
        assert!(Recommendation::Hold > Recommendation::Sell);
        assert!(Recommendation::Sell > Recommendation::Reject);

        let labels: Vec<_> = Recommendation::iter().map(|r| r.to_string()).collect();
        assert_eq!(labels, vec!["STRONG BUY", "BUY", "HOLD", "SELL", "REJECT"]);
    }

    #[test]
    fn test_from_json() {
        let result = RecommendationResult::from_json(&reply().to_string()).unwrap();
        assert_eq!(result.recommendation, Recommendation::Buy);
        assert_eq!(result.confidence_score, 78.0);
        assert_eq!(result.key_reasoning.len(), 2);
        assert_eq!(result.target_price, "₹4,250");
        assert_eq!(result.investment_horizon, InvestmentHorizon::LongTerm);
        assert_eq!(result.position_size, PositionSize::Moderate);
    }

    #[test]
    fn test_from_json_missing_field() {
        let mut json = reply();
        json.as_object_mut().unwrap().remove("stop_loss");

        match RecommendationResult::from_json(&json.to_string()) {
            Err(PtoolError::MalformedRecommendation(message)) => {
                assert!(message.contains("stop_loss"));
            }
            other => panic!("Unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_from_json_rejects_invalid_values() {
        let cases = [
            ("recommendation", json!("ACCUMULATE")),
            ("recommendation", json!("buy")),
            ("confidence_score", json!(120)),
            ("confidence_score", json!("80")),
            ("risks", json!([])),
            ("strengths", json!(["ok", 3])),
            ("target_price", json!(4250)),
            ("investment_horizon", json!("Forever")),
            ("position_size", json!(null)),
        ];

        for (field, value) in cases {
            let mut json = reply();
            json[field] = value;
            let result = RecommendationResult::from_json(&json.to_string());
            assert!(
                matches!(result, Err(PtoolError::MalformedRecommendation(_))),
                "{field} should be rejected"
            );
        }

        assert!(matches!(
            RecommendationResult::from_json("not json"),
            Err(PtoolError::MalformedRecommendation(_))
        ));
        assert!(matches!(
            RecommendationResult::from_json("[1, 2]"),
            Err(PtoolError::MalformedRecommendation(_))
        ));
    }

    #[test]
    fn test_generate_prompt() {
        let prompt = generate_prompt(&merged("BAJFINANCE.NS"));
        assert_eq!(prompt, generate_prompt(&merged("BAJFINANCE.NS")));

        assert!(prompt.contains("Stock: BAJFINANCE.NS"));
        assert!(prompt.contains("P-Tool Score: 78.5/100 (GOOD)"));
        assert!(prompt.contains("- Key Issues: High debt levels, Aggressive loan provisioning"));
        assert!(prompt.contains("- Revenue Growth vs Peers: +10.2%"));
        assert!(prompt.contains("- Key Sector Drivers: Rising consumer demand, Fintech competition"));

        let sections = [
            "Fundamental Analysis:",
            "Technical Analysis:",
            "Forensic Analysis",
            "Sentiment Analysis:",
            "Peer Comparison:",
            "Macro Analysis:",
        ];
        let positions: Vec<_> = sections.iter().map(|s| prompt.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_response_schema() {
        let schema = response_schema();
        assert_eq!(schema["required"].as_array().map(|a| a.len()), Some(9));
        assert_eq!(schema["properties"]["recommendation"]["enum"][0], "STRONG BUY");
        assert_eq!(schema["properties"]["position_size"]["enum"][2], "Aggressive (5-10%)");
    }

    fn recommender(server: &MockServer) -> LlmRecommender {
        LlmRecommender::new(Config {
            protocol: Protocol::Gemini,
            base_url: server.uri(),
            api_key: "key".to_string(),
            model: "gemini-2.5-pro".to_string(),
        })
    }

    fn gemini_reply(text: &str) -> Value {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
    }

    #[tokio::test]
    async fn test_request_recommendation() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(gemini_reply(&reply().to_string())),
            )
            .mount(&server)
            .await;

        let result = recommender(&server)
            .request_recommendation(&merged("TCS.NS"))
            .await
            .unwrap();
        assert_eq!(result.recommendation, Recommendation::Buy);
    }

    #[tokio::test]
    async fn test_request_recommendation_failures() {
        let server = MockServer::start().await;

        let mut json = reply();
        json.as_object_mut().unwrap().remove("stop_loss");
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(&json.to_string())))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let recommender = recommender(&server);
        let merged = merged("TCS.NS");

        let result = recommender.request_recommendation(&merged).await;
        assert!(matches!(result, Err(PtoolError::MalformedRecommendation(_))));

        let result = recommender.request_recommendation(&merged).await;
        assert!(matches!(result, Err(PtoolError::RecommendationUnavailable(_))));

        let result = recommender.request_recommendation(&merged).await;
        assert!(matches!(result, Err(PtoolError::AuthenticationFailed(_))));
    }
}
