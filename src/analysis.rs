use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Local};
use log::{debug, info};
use serde::Serialize;
use strum::IntoEnumIterator;
use tokio::sync::mpsc::Sender;

use crate::{
    STAGE_DELAY_DEFAULT,
    data::{MergedAnalysis, catalog},
    error::{PtoolError, PtoolResult},
    financial::{QuoteSource, merge::merge},
    recommend::{RecommendationResult, Recommender},
};

pub mod session;

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    PartialEq,
    strum::Display,
    strum::EnumCount,
    strum::EnumIter,
)]
pub enum Stage {
    #[strum(serialize = "P-Tool Score")]
    PToolScore,
    #[strum(serialize = "Fundamental Analysis")]
    Fundamental,
    #[strum(serialize = "Technical Analysis")]
    Technical,
    #[strum(serialize = "Forensic Checks")]
    Forensic,
    #[strum(serialize = "News & Sentiment")]
    Sentiment,
    #[strum(serialize = "Peer Comparison")]
    Peer,
    #[strum(serialize = "Macro Analysis")]
    Macro,
    #[strum(serialize = "AI Recommendation")]
    AiRecommendation,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, strum::Display)]
pub enum StageStatus {
    #[default]
    Pending,
    Active,
    Complete,
}

/// Status of every stage; transitions only go forward and one stage at a time
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StageProgress {
    statuses: [StageStatus; <Stage as strum::EnumCount>::COUNT],
}

#[derive(Clone, Debug, Serialize)]
pub struct AnalysisReport {
    pub analysis: MergedAnalysis,
    pub recommendation: RecommendationResult,
    pub generated_at: DateTime<Local>,
}

#[derive(Clone, Debug)]
pub enum AnalysisEvent {
    StageStarted(Stage),
    StageCompleted(Stage),
    DataReady(Box<MergedAnalysis>),
    Completed(Box<AnalysisReport>),
    Failed(Arc<PtoolError>),
}

#[derive(Clone, Debug)]
pub struct AnalyzeOptions {
    /// Presentation delay of the cosmetic stages, zero completes them immediately
    pub stage_delay: Duration,
}

/// Identity of one analysis request
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RequestToken(pub u64);

#[derive(Clone, Debug)]
pub struct AnalysisUpdate {
    pub token: RequestToken,
    pub event: AnalysisEvent,
}

pub struct Analyzer<Q, R> {
    quote_source: Q,
    recommender: R,
    options: AnalyzeOptions,
}

impl Stage {
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl StageProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, stage: Stage) -> StageStatus {
        self.statuses[stage.index()]
    }

    pub fn active(&self) -> Option<Stage> {
        Stage::iter().find(|s| self.status(*s) == StageStatus::Active)
    }

    pub fn completed_count(&self) -> usize {
        self.statuses
            .iter()
            .filter(|s| **s == StageStatus::Complete)
            .count()
    }

    pub fn is_finished(&self) -> bool {
        self.completed_count() == self.statuses.len()
    }

    /// pending -> active, only once every earlier stage is complete
    pub fn activate(&mut self, stage: Stage) -> PtoolResult<()> {
        if self.status(stage) != StageStatus::Pending {
            return Err(transition_error(stage, self.status(stage), StageStatus::Active));
        }

        if let Some(blocking) = Stage::iter()
            .take(stage.index())
            .find(|s| self.status(*s) != StageStatus::Complete)
        {
            return Err(PtoolError::Invalid(
                "STAGE_OUT_OF_ORDER",
                format!("Stage '{stage}' can not start before '{blocking}' is complete"),
            ));
        }

        self.statuses[stage.index()] = StageStatus::Active;
        Ok(())
    }

    /// Return the active stage to pending once its request has failed
    pub fn halt(&mut self) {
        for status in self.statuses.iter_mut() {
            if *status == StageStatus::Active {
                *status = StageStatus::Pending;
            }
        }
    }

    /// active -> complete
    pub fn complete(&mut self, stage: Stage) -> PtoolResult<()> {
        if self.status(stage) != StageStatus::Active {
            return Err(transition_error(stage, self.status(stage), StageStatus::Complete));
        }

        self.statuses[stage.index()] = StageStatus::Complete;
        Ok(())
    }
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            stage_delay: STAGE_DELAY_DEFAULT,
        }
    }
}

impl<Q, R> Analyzer<Q, R>
where
    Q: QuoteSource + Sync,
    R: Recommender + Sync,
{
    pub fn new(quote_source: Q, recommender: R, options: AnalyzeOptions) -> Self {
        Self {
            quote_source,
            recommender,
            options,
        }
    }

    /// Run one request to the end, reporting every transition to `sender`.
    ///
    /// The final event is either `Completed` or `Failed`; after a failure no
    /// further stage is started.
    pub async fn run(&self, symbol: &str, token: RequestToken, sender: &Sender<AnalysisUpdate>) {
        let emit = move |event: AnalysisEvent| async move {
            let _ = sender.send(AnalysisUpdate { token, event }).await;
        };

        match self.execute(symbol, &emit).await {
            Ok(report) => {
                info!("[Analysis {}] '{symbol}' completed", token.0);
                emit(AnalysisEvent::Completed(Box::new(report))).await;
            }
            Err(err) => {
                info!("[Analysis {}] '{symbol}' failed: {err}", token.0);
                emit(AnalysisEvent::Failed(Arc::new(err))).await;
            }
        }
    }

    /// Same sequence as `run`, returning the outcome instead of reporting events
    pub async fn analyze(&self, symbol: &str) -> PtoolResult<AnalysisReport> {
        self.execute(symbol, &|_| async {}).await
    }

    async fn execute<F, Fut>(&self, symbol: &str, emit: &F) -> PtoolResult<AnalysisReport>
    where
        F: Fn(AnalysisEvent) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        let baseline = catalog::lookup(symbol)?;
        let mut progress = StageProgress::new();

        for stage in [Stage::PToolScore, Stage::Fundamental, Stage::Technical] {
            self.cosmetic_stage(stage, &mut progress, emit).await?;
        }

        let (overview, quote) = self
            .quote_source
            .fetch_overview_and_quote(&baseline.stock.symbol)
            .await?;
        let analysis = merge(baseline, &overview, &quote);
        debug!("[Analysis] merged {analysis:?}");
        emit(AnalysisEvent::DataReady(Box::new(analysis.clone()))).await;

        for stage in [Stage::Forensic, Stage::Sentiment, Stage::Peer, Stage::Macro] {
            self.cosmetic_stage(stage, &mut progress, emit).await?;
        }

        let stage = Stage::AiRecommendation;
        progress.activate(stage)?;
        emit(AnalysisEvent::StageStarted(stage)).await;
        let recommendation = self.recommender.request_recommendation(&analysis).await?;
        progress.complete(stage)?;
        emit(AnalysisEvent::StageCompleted(stage)).await;

        Ok(AnalysisReport {
            analysis,
            recommendation,
            generated_at: Local::now(),
        })
    }

    async fn cosmetic_stage<F, Fut>(
        &self,
        stage: Stage,
        progress: &mut StageProgress,
        emit: &F,
    ) -> PtoolResult<()>
    where
        F: Fn(AnalysisEvent) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        progress.activate(stage)?;
        emit(AnalysisEvent::StageStarted(stage)).await;

        if !self.options.stage_delay.is_zero() {
            tokio::time::sleep(self.options.stage_delay).await;
        }

        progress.complete(stage)?;
        emit(AnalysisEvent::StageCompleted(stage)).await;
        debug!("[Analysis] stage '{stage}' complete");

        Ok(())
    }
}

fn transition_error(stage: Stage, from: StageStatus, to: StageStatus) -> PtoolError {
    PtoolError::Invalid(
        "STAGE_TRANSITION",
        format!("Stage '{stage}' can not go from {from} to {to}"),
    )
}
