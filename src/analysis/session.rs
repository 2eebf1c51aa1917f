use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use log::debug;
use tokio::{
    sync::mpsc::{self, Receiver, Sender},
    task::JoinHandle,
};

use crate::{
    CHANNEL_BUFFER_DEFAULT,
    analysis::{AnalysisEvent, AnalysisUpdate, Analyzer, RequestToken, StageProgress},
    data::MergedAnalysis,
    error::PtoolError,
    financial::QuoteSource,
    recommend::{RecommendationResult, Recommender},
};

/// Hands out request tokens; only the latest one is current
#[derive(Clone, Debug, Default)]
pub struct RequestTracker {
    current: Arc<AtomicU64>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, strum::Display)]
pub enum ViewStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// What a consumer renders for the current request
#[derive(Clone, Debug, Default)]
pub struct AnalysisView {
    pub status: ViewStatus,
    pub symbol: Option<String>,
    pub progress: StageProgress,
    pub analysis: Option<MergedAnalysis>,
    pub recommendation: Option<RecommendationResult>,
    pub error: Option<Arc<PtoolError>>,
}

/// Drives one request at a time. Starting a new request supersedes the
/// previous one, whose late events are dropped instead of reaching the view.
pub struct AnalysisSession<Q, R> {
    analyzer: Arc<Analyzer<Q, R>>,
    tracker: RequestTracker,
    sender: Sender<AnalysisUpdate>,
    receiver: Receiver<AnalysisUpdate>,
    task: Option<JoinHandle<()>>,
    view: AnalysisView,
}

impl RequestTracker {
    pub fn begin(&self) -> RequestToken {
        RequestToken(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.current.load(Ordering::SeqCst) == token.0
    }
}

impl AnalysisView {
    fn begin(&mut self, symbol: &str) {
        *self = Self {
            status: ViewStatus::Loading,
            symbol: Some(symbol.to_string()),
            ..Default::default()
        };
    }

    fn apply(&mut self, event: &AnalysisEvent) {
        let transition = match event {
            AnalysisEvent::StageStarted(stage) => self.progress.activate(*stage),
            AnalysisEvent::StageCompleted(stage) => self.progress.complete(*stage),
            AnalysisEvent::DataReady(analysis) => {
                self.analysis = Some(analysis.as_ref().clone());
                Ok(())
            }
            AnalysisEvent::Completed(report) => {
                self.status = ViewStatus::Success;
                self.analysis = Some(report.analysis.clone());
                self.recommendation = Some(report.recommendation.clone());
                Ok(())
            }
            AnalysisEvent::Failed(err) => {
                self.status = ViewStatus::Error;
                self.progress.halt();
                self.analysis = None;
                self.recommendation = None;
                self.error = Some(err.clone());
                Ok(())
            }
        };

        if let Err(err) = transition {
            debug!("[Analysis View] {err}");
        }
    }
}

impl<Q, R> AnalysisSession<Q, R>
where
    Q: QuoteSource + Send + Sync + 'static,
    R: Recommender + Send + Sync + 'static,
{
    pub fn new(analyzer: Analyzer<Q, R>) -> Self {
        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_DEFAULT);

        Self {
            analyzer: Arc::new(analyzer),
            tracker: RequestTracker::default(),
            sender,
            receiver,
            task: None,
            view: AnalysisView::default(),
        }
    }

    /// Start analyzing `symbol`, superseding any request still in flight
    pub fn start(&mut self, symbol: &str) -> RequestToken {
        if let Some(task) = self.task.take() {
            task.abort();
        }

        let token = self.tracker.begin();
        self.view.begin(symbol);
        debug!("[Analysis Session] request {} for '{symbol}'", token.0);

        let analyzer = self.analyzer.clone();
        let sender = self.sender.clone();
        let symbol = symbol.to_string();
        self.task = Some(tokio::spawn(async move {
            analyzer.run(&symbol, token, &sender).await;
        }));

        token
    }

    /// Next event of the current request, already applied to the view.
    ///
    /// Waits while no request is running.
    pub async fn next(&mut self) -> Option<AnalysisEvent> {
        loop {
            let update = self.receiver.recv().await?;

            if !self.tracker.is_current(update.token) {
                debug!(
                    "[Analysis Session] dropped stale event of request {}",
                    update.token.0
                );
                continue;
            }

            self.view.apply(&update.event);
            return Some(update.event);
        }
    }

    pub fn view(&self) -> &AnalysisView {
        &self.view
    }

    pub fn is_running(&self) -> bool {
        self.view.status == ViewStatus::Loading
    }
}

impl<Q, R> Drop for AnalysisSession<Q, R> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        analysis::{
            AnalyzeOptions, Stage,
            tests::{FakeRecommender, buy, live_quotes},
        },
        error::PtoolResult,
        financial::{OverviewFields, QuoteFields},
    };

    /// Never answers for TCS, answers with live quotes otherwise
    struct GatedQuotes;

    impl QuoteSource for GatedQuotes {
        async fn fetch_overview_and_quote(
            &self,
            symbol: &str,
        ) -> PtoolResult<(OverviewFields, QuoteFields)> {
            if symbol.starts_with("TCS") {
                std::future::pending::<()>().await;
            }
            live_quotes()
        }
    }

    fn session() -> AnalysisSession<GatedQuotes, FakeRecommender> {
        AnalysisSession::new(Analyzer::new(
            GatedQuotes,
            FakeRecommender { result: buy },
            AnalyzeOptions {
                stage_delay: Duration::ZERO,
            },
        ))
    }

    async fn finish(session: &mut AnalysisSession<GatedQuotes, FakeRecommender>) -> AnalysisEvent {
        loop {
            match session.next().await {
                Some(event @ (AnalysisEvent::Completed(_) | AnalysisEvent::Failed(_))) => {
                    return event;
                }
                Some(_) => {}
                None => panic!("Session closed"),
            }
        }
    }

    #[test]
    fn test_request_tracker() {
        let tracker = RequestTracker::default();
        let first = tracker.begin();
        assert!(tracker.is_current(first));

        let second = tracker.begin();
        assert_ne!(first, second);
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
    }

    #[tokio::test]
    async fn test_session_success() {
        let mut session = session();
        assert_eq!(session.view().status, ViewStatus::Idle);

        session.start("INFY.NS");
        assert!(session.is_running());

        assert!(matches!(finish(&mut session).await, AnalysisEvent::Completed(_)));

        let view = session.view();
        assert_eq!(view.status, ViewStatus::Success);
        assert!(view.progress.is_finished());
        assert_eq!(
            view.analysis.as_ref().map(|a| a.stock.symbol.as_str()),
            Some("INFY.NS")
        );
        assert!(view.recommendation.is_some());
        assert!(view.error.is_none());
    }

    #[tokio::test]
    async fn test_session_failure() {
        let mut session = session();
        session.start("UNKNOWN.NS");

        assert!(matches!(finish(&mut session).await, AnalysisEvent::Failed(_)));

        let view = session.view();
        assert_eq!(view.status, ViewStatus::Error);
        assert_eq!(view.progress.completed_count(), 0);
        assert!(view.analysis.is_none());
        assert!(matches!(
            view.error.as_deref(),
            Some(PtoolError::ProfileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_session_failure_after_data_ready() {
        let mut session = AnalysisSession::new(Analyzer::new(
            GatedQuotes,
            FakeRecommender {
                result: || {
                    Err(PtoolError::MalformedRecommendation(
                        "missing 'stop_loss'".to_string(),
                    ))
                },
            },
            AnalyzeOptions {
                stage_delay: Duration::ZERO,
            },
        ));
        session.start("INFY.NS");

        let mut data_ready = false;
        loop {
            match session.next().await {
                Some(AnalysisEvent::DataReady(_)) => {
                    data_ready = true;
                    assert!(session.view().analysis.is_some());
                }
                Some(AnalysisEvent::Failed(_)) => break,
                Some(_) => {}
                None => panic!("Session closed"),
            }
        }
        assert!(data_ready);

        let view = session.view();
        assert_eq!(view.status, ViewStatus::Error);
        assert!(view.analysis.is_none());
        assert!(view.recommendation.is_none());
        assert_eq!(view.progress.active(), None);
        assert_eq!(view.progress.completed_count(), 7);
        assert_eq!(
            view.progress.status(Stage::AiRecommendation),
            crate::analysis::StageStatus::Pending
        );
        assert!(matches!(
            view.error.as_deref(),
            Some(PtoolError::MalformedRecommendation(_))
        ));
    }

    #[tokio::test]
    async fn test_session_supersedes_stale_request() {
        let mut session = session();

        let stale = session.start("TCS.NS");
        assert!(matches!(
            session.next().await,
            Some(AnalysisEvent::StageStarted(Stage::PToolScore))
        ));

        let current = session.start("INFY.NS");
        assert_ne!(stale, current);
        assert_eq!(session.view().progress.completed_count(), 0);

        session
            .sender
            .send(AnalysisUpdate {
                token: stale,
                event: AnalysisEvent::Failed(Arc::new(PtoolError::ApiUnavailable(
                    "late".to_string(),
                ))),
            })
            .await
            .unwrap();

        assert!(matches!(finish(&mut session).await, AnalysisEvent::Completed(_)));

        let view = session.view();
        assert_eq!(view.status, ViewStatus::Success);
        assert_eq!(view.symbol.as_deref(), Some("INFY.NS"));
        assert!(view.error.is_none());
        assert_eq!(
            view.analysis.as_ref().map(|a| a.stock.symbol.as_str()),
            Some("INFY.NS")
        );
    }
}
