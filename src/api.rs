use std::collections::HashMap;

use crate::{
    analysis::{self, Analyzer, session},
    data::{self, catalog},
    error::PtoolResult,
    financial::alpha_vantage::{self, AlphaVantageClient},
    llm::{self, ChatMessage, Role},
    recommend::{self, LlmRecommender},
};

pub type AnalysisEvent = analysis::AnalysisEvent;
pub type AnalysisReport = analysis::AnalysisReport;
pub type AnalysisSession = session::AnalysisSession<AlphaVantageClient, LlmRecommender>;
pub type AnalysisView = session::AnalysisView;
pub type AnalyzeOptions = analysis::AnalyzeOptions;
pub type ChatCompletionEvent = llm::ChatCompletionEvent;
pub type ChatCompletionOptions = llm::ChatCompletionOptions;
pub type ChatCompletionStream = llm::ChatCompletionStream;
pub type DashboardStats = data::DashboardStats;
pub type MergedAnalysis = data::MergedAnalysis;
pub type Recommendation = recommend::Recommendation;
pub type RecommendationResult = recommend::RecommendationResult;
pub type Stage = analysis::Stage;
pub type StageStatus = analysis::StageStatus;
pub type StockIdentity = data::StockIdentity;
pub type TopPick = data::TopPick;
pub type TopPickFilter = catalog::TopPickFilter;
pub type ViewStatus = session::ViewStatus;

pub static LLM_SUPPORTED_PROTOCOLS: &[&str] = &["openai", "gemini"];
pub static TOP_PICK_SCORE_DEFAULT: f64 = catalog::TOP_PICK_SCORE_DEFAULT;

/// Session wired to the configured quote provider and LLM
pub fn analysis_session(options: &AnalyzeOptions) -> PtoolResult<AnalysisSession> {
    Ok(session::AnalysisSession::new(live_analyzer(options)?))
}

pub async fn analyze(symbol: &str, options: &AnalyzeOptions) -> PtoolResult<AnalysisReport> {
    live_analyzer(options)?.analyze(symbol).await
}

pub fn stocks() -> Vec<StockIdentity> {
    catalog::stocks()
}

pub fn top_picks(filter: &TopPickFilter) -> PtoolResult<Vec<TopPick>> {
    catalog::top_picks(filter)
}

pub fn sectors() -> Vec<String> {
    catalog::sectors()
}

pub fn dashboard_stats() -> DashboardStats {
    catalog::dashboard_stats()
}

pub async fn llm_chat_completion_stream(
    prompt: &str,
    system: Option<&str>,
    options: &ChatCompletionOptions,
) -> PtoolResult<ChatCompletionStream> {
    let cfg = llm::load_config()?;

    let mut messages = vec![];
    if let Some(system) = system {
        messages.push(ChatMessage::new(Role::System, system));
    }
    messages.push(ChatMessage::new(Role::User, prompt));

    llm::chat_completion_stream(&cfg, &messages, options).await
}

pub async fn llm_config(protocol: &str, options: &HashMap<String, String>) -> PtoolResult<()> {
    llm::config_chat(protocol, options).await
}

pub async fn quote_config(options: &HashMap<String, String>) -> PtoolResult<()> {
    alpha_vantage::config(options).await
}

fn live_analyzer(
    options: &AnalyzeOptions,
) -> PtoolResult<Analyzer<AlphaVantageClient, LlmRecommender>> {
    Ok(Analyzer::new(
        AlphaVantageClient::from_config()?,
        LlmRecommender::from_config()?,
        options.clone(),
    ))
}
