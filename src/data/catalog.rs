use std::{collections::HashMap, sync::LazyLock};

use log::debug;

use crate::{
    data::*,
    error::{PtoolError, PtoolResult},
    recommend::Recommendation,
};

pub static TOP_PICK_SCORE_RANGE: std::ops::RangeInclusive<f64> = 70.0..=100.0;
pub static TOP_PICK_SCORE_DEFAULT: f64 = 85.0;

#[derive(Clone, Debug)]
pub struct TopPickFilter {
    pub min_score: f64,
    pub sector: Option<String>,
    pub recommendation: Option<Recommendation>,
}

/// Baseline profile for `symbol`, matched on its uppercase form
pub fn lookup(symbol: &str) -> PtoolResult<AnalysisProfile> {
    let key = symbol.trim().to_uppercase();
    debug!("[Catalog] lookup '{key}'");

    PROFILES
        .get(&key)
        .cloned()
        .ok_or(PtoolError::ProfileNotFound(key))
}

pub fn stocks() -> Vec<StockIdentity> {
    STOCKS.clone()
}

pub fn top_picks(filter: &TopPickFilter) -> PtoolResult<Vec<TopPick>> {
    if !TOP_PICK_SCORE_RANGE.contains(&filter.min_score) {
        return Err(PtoolError::Invalid(
            "SCORE_OUT_OF_RANGE",
            format!(
                "Minimum P-Tool score {} is outside {}..={}",
                filter.min_score,
                TOP_PICK_SCORE_RANGE.start(),
                TOP_PICK_SCORE_RANGE.end()
            ),
        ));
    }

    let sector = filter
        .sector
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.eq_ignore_ascii_case("all"));

    Ok(TOP_PICKS
        .iter()
        .filter(|pick| pick.ptool_score >= filter.min_score)
        .filter(|pick| sector.is_none_or(|s| pick.stock.sector.eq_ignore_ascii_case(s)))
        .filter(|pick| {
            filter
                .recommendation
                .is_none_or(|recommendation| pick.recommendation == recommendation)
        })
        .cloned()
        .collect())
}

pub fn sectors() -> Vec<String> {
    let mut sectors: Vec<String> = vec![];
    for stock in STOCKS.iter() {
        if !sectors.contains(&stock.sector) {
            sectors.push(stock.sector.clone());
        }
    }

    sectors
}

pub fn dashboard_stats() -> DashboardStats {
    DashboardStats {
        stocks_analyzed: 5248,
        buy_signals: 89,
        avg_ptool_score: 67.8,
        red_flags: 23,
    }
}

impl Default for TopPickFilter {
    fn default() -> Self {
        Self {
            min_score: TOP_PICK_SCORE_DEFAULT,
            sector: None,
            recommendation: None,
        }
    }
}

fn stock(symbol: &str, name: &str, sector: &str, market_cap: f64, current_price: f64) -> StockIdentity {
    StockIdentity {
        symbol: symbol.to_string(),
        name: name.to_string(),
        sector: sector.to_string(),
        market_cap,
        current_price,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn economic_indicators() -> EconomicIndicators {
    EconomicIndicators {
        gdp_growth: EconomicIndicator {
            value: IndicatorValue::Text("6.8%".to_string()),
            trend: IndicatorTrend::Improving,
            impact: Outlook::Positive,
        },
        inflation_rate: EconomicIndicator {
            value: IndicatorValue::Text("4.9%".to_string()),
            trend: IndicatorTrend::Declining,
            impact: Outlook::Positive,
        },
        manufacturing_pmi: EconomicIndicator {
            value: IndicatorValue::Number(57.2),
            trend: IndicatorTrend::Improving,
            impact: Outlook::Positive,
        },
    }
}

fn macro_energy() -> MacroData {
    MacroData {
        macro_outlook: Outlook::Positive,
        economic_indicators: economic_indicators(),
        market_conditions: MarketConditions {
            trend: MarketTrend::Bullish,
            volatility: Volatility::Moderate,
            sentiment: MarketSentiment::RiskOn,
        },
        sector_outlook: SectorOutlook {
            trend: SectorTrend::Transition,
            outlook: SectorOutlookLevel::Positive,
            drivers: strings(&[
                "Renewable energy push",
                "Energy security focus",
                "Grid modernization",
            ]),
        },
    }
}

fn macro_it() -> MacroData {
    MacroData {
        macro_outlook: Outlook::Neutral,
        economic_indicators: economic_indicators(),
        market_conditions: MarketConditions {
            trend: MarketTrend::Neutral,
            volatility: Volatility::Moderate,
            sentiment: MarketSentiment::Neutral,
        },
        sector_outlook: SectorOutlook {
            trend: SectorTrend::Strong,
            outlook: SectorOutlookLevel::Positive,
            drivers: strings(&["Digital transformation", "Cloud adoption", "AI/ML demand"]),
        },
    }
}

fn macro_banking() -> MacroData {
    MacroData {
        macro_outlook: Outlook::Positive,
        economic_indicators: economic_indicators(),
        market_conditions: MarketConditions {
            trend: MarketTrend::Bullish,
            volatility: Volatility::Low,
            sentiment: MarketSentiment::RiskOn,
        },
        sector_outlook: SectorOutlook {
            trend: SectorTrend::Strong,
            outlook: SectorOutlookLevel::VeryPositive,
            drivers: strings(&[
                "Strong credit growth",
                "Improving asset quality",
                "Digital banking adoption",
            ]),
        },
    }
}

fn macro_finance() -> MacroData {
    MacroData {
        macro_outlook: Outlook::Neutral,
        economic_indicators: economic_indicators(),
        market_conditions: MarketConditions {
            trend: MarketTrend::Neutral,
            volatility: Volatility::High,
            sentiment: MarketSentiment::Neutral,
        },
        sector_outlook: SectorOutlook {
            trend: SectorTrend::Moderate,
            outlook: SectorOutlookLevel::Neutral,
            drivers: strings(&[
                "Rising consumer demand",
                "Fintech competition",
                "Regulatory scrutiny",
            ]),
        },
    }
}

#[allow(clippy::too_many_arguments)]
fn profile(
    stock: &StockIdentity,
    p_tool: (f64, PToolRating),
    fundamental: (f64, f64, f64, f64, Sustainability),
    technical: (f64, MacdSignal, PriceTrend, TechnicalSignal),
    forensic: (RiskLevel, u32, &[&str]),
    sentiment: (Sentiment, u32, u32),
    peer: (f64, f64, Genuineness),
    macro_data: MacroData,
) -> AnalysisProfile {
    AnalysisProfile {
        stock: stock.clone(),
        p_tool: PToolData {
            score: p_tool.0,
            rating: p_tool.1,
        },
        fundamental: FundamentalData {
            revenue_growth: fundamental.0,
            profit_margin: fundamental.1,
            roe: fundamental.2,
            debt_equity: fundamental.3,
            is_sustainable: fundamental.4,
        },
        technical: TechnicalData {
            rsi: technical.0,
            macd_signal: technical.1,
            trend: technical.2,
            technical_signal: technical.3,
        },
        forensic: ForensicData {
            risk_level: forensic.0,
            red_flags_count: forensic.1,
            issues_list: strings(forensic.2),
        },
        sentiment: SentimentData {
            sentiment: sentiment.0,
            news_count: sentiment.1,
            fraud_alerts: sentiment.2,
        },
        peer: PeerData {
            peer_growth_diff: peer.0,
            valuation_premium: peer.1,
            growth_real: peer.2,
        },
        macro_data,
    }
}

static STOCKS: LazyLock<Vec<StockIdentity>> = LazyLock::new(|| {
    vec![
        stock("RELIANCE.NS", "Reliance Industries Ltd", "Oil & Gas", 1925000.0, 2845.0),
        stock("TCS.NS", "Tata Consultancy Services", "IT", 1380000.0, 3850.0),
        stock("INFY.NS", "Infosys Ltd", "IT", 650000.0, 1550.0),
        stock("HDFCBANK.NS", "HDFC Bank Ltd", "Banking", 1250000.0, 1650.0),
        stock("ICICIBANK.NS", "ICICI Bank Ltd", "Banking", 780000.0, 1100.0),
        stock("BAJFINANCE.NS", "Bajaj Finance Ltd", "Finance", 450000.0, 7200.0),
    ]
});

static PROFILES: LazyLock<HashMap<String, AnalysisProfile>> = LazyLock::new(|| {
    let profiles = vec![
        profile(
            &STOCKS[0],
            (92.5, PToolRating::Excellent),
            (18.2, 15.1, 12.5, 0.45, Sustainability::Yes),
            (68.0, MacdSignal::Bullish, PriceTrend::Uptrend, TechnicalSignal::StrongBuy),
            (RiskLevel::Low, 0, &["None"]),
            (Sentiment::Positive, 45, 0),
            (5.5, 15.0, Genuineness::Yes),
            macro_energy(),
        ),
        profile(
            &STOCKS[1],
            (89.3, PToolRating::Excellent),
            (12.5, 24.1, 45.8, 0.1, Sustainability::Yes),
            (62.0, MacdSignal::Bullish, PriceTrend::Uptrend, TechnicalSignal::Buy),
            (RiskLevel::Low, 0, &["None"]),
            (Sentiment::Neutral, 38, 0),
            (2.1, 25.0, Genuineness::Yes),
            macro_it(),
        ),
        profile(
            &STOCKS[2],
            (87.1, PToolRating::Excellent),
            (11.8, 21.5, 31.2, 0.08, Sustainability::Yes),
            (58.0, MacdSignal::Neutral, PriceTrend::Sideways, TechnicalSignal::Hold),
            (RiskLevel::Low, 0, &["None"]),
            (Sentiment::Neutral, 35, 0),
            (1.5, 18.0, Genuineness::Yes),
            macro_it(),
        ),
        profile(
            &STOCKS[3],
            (85.8, PToolRating::Excellent),
            (22.0, 20.3, 17.5, 1.1, Sustainability::Yes),
            (55.0, MacdSignal::Neutral, PriceTrend::Sideways, TechnicalSignal::Buy),
            (RiskLevel::Low, 1, &["Slight increase in NPAs"]),
            (Sentiment::Positive, 52, 0),
            (3.2, 10.0, Genuineness::Yes),
            macro_banking(),
        ),
        profile(
            &STOCKS[4],
            (84.2, PToolRating::Good),
            (25.0, 22.1, 18.2, 1.2, Sustainability::Yes),
            (65.0, MacdSignal::Bullish, PriceTrend::Uptrend, TechnicalSignal::Buy),
            (RiskLevel::Low, 0, &["None"]),
            (Sentiment::Positive, 48, 0),
            (4.5, 5.0, Genuineness::Yes),
            macro_banking(),
        ),
        profile(
            &STOCKS[5],
            (78.5, PToolRating::Good),
            (30.1, 19.8, 23.5, 3.5, Sustainability::Partial),
            (45.0, MacdSignal::Bearish, PriceTrend::Downtrend, TechnicalSignal::Sell),
            (
                RiskLevel::Moderate,
                2,
                &["High debt levels", "Aggressive loan provisioning"],
            ),
            (Sentiment::Negative, 60, 1),
            (10.2, 40.0, Genuineness::No),
            macro_finance(),
        ),
    ];

    profiles
        .into_iter()
        .map(|profile| (profile.stock.symbol.clone(), profile))
        .collect()
});

static TOP_PICKS: LazyLock<Vec<TopPick>> = LazyLock::new(|| {
    [
        ("RELIANCE.NS", Recommendation::StrongBuy),
        ("TCS.NS", Recommendation::Buy),
        ("INFY.NS", Recommendation::Buy),
        ("HDFCBANK.NS", Recommendation::Buy),
        ("ICICIBANK.NS", Recommendation::Buy),
    ]
    .into_iter()
    .filter_map(|(symbol, recommendation)| {
        PROFILES.get(symbol).map(|profile| TopPick {
            stock: profile.stock.clone(),
            ptool_score: profile.p_tool.score,
            recommendation,
        })
    })
    .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let profile = lookup("tcs.ns").unwrap();
        assert_eq!(profile.stock.symbol, "TCS.NS");
        assert_eq!(profile.fundamental.revenue_growth, 12.5);

        let profile = lookup("RELIANCE.NS").unwrap();
        assert_eq!(profile.stock.market_cap, 1925000.0);
        assert_eq!(profile.macro_data.sector_outlook.trend, SectorTrend::Transition);
    }

    #[test]
    fn test_lookup_not_found() {
        match lookup("WIPRO.NS") {
            Err(PtoolError::ProfileNotFound(symbol)) => assert_eq!(symbol, "WIPRO.NS"),
            other => panic!("Unexpected lookup result: {other:?}"),
        }
    }

    #[test]
    fn test_every_stock_has_profile() {
        for stock in stocks() {
            assert!(lookup(&stock.symbol).is_ok());
        }
    }

    #[test]
    fn test_top_picks_filter() {
        let picks = top_picks(&TopPickFilter::default()).unwrap();
        assert_eq!(picks.len(), 4);

        let picks = top_picks(&TopPickFilter {
            min_score: 70.0,
            sector: Some("banking".to_string()),
            recommendation: None,
        })
        .unwrap();
        let symbols: Vec<_> = picks.iter().map(|p| p.stock.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["HDFCBANK.NS", "ICICIBANK.NS"]);

        let picks = top_picks(&TopPickFilter {
            min_score: 70.0,
            sector: Some("All".to_string()),
            recommendation: Some(Recommendation::StrongBuy),
        })
        .unwrap();
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].stock.symbol, "RELIANCE.NS");
    }

    #[test]
    fn test_top_picks_score_range() {
        let result = top_picks(&TopPickFilter {
            min_score: 50.0,
            ..Default::default()
        });
        assert!(matches!(result, Err(PtoolError::Invalid("SCORE_OUT_OF_RANGE", _))));
    }

    #[test]
    fn test_sectors() {
        assert_eq!(sectors(), vec!["Oil & Gas", "IT", "Banking", "Finance"]);
    }
}
