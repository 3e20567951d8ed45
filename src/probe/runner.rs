use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::error::JobError;

use super::progress::ProgressSink;
use super::prober::Prober;
use super::strategy::{ExecutionStrategy, Job, JobFuture};
use super::types::{ProbeOutcome, RouteConfig, RouteResult};

/// Per-route knobs shared by every route of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSettings {
    pub test_count: usize,
    pub max_concurrent: usize,
    pub delay_between_probes: Duration,
}

/// Drives `test_count` probes against one route.
///
/// Finished outcomes are sent over a channel to a single collector that owns
/// the route's [`RouteResult`]; probe jobs never touch the aggregate.
pub struct RouteRunner<S> {
    prober: Arc<dyn Prober>,
    strategy: S,
    settings: RouteSettings,
    progress: Arc<dyn ProgressSink>,
}

impl<S: Clone> Clone for RouteRunner<S> {
    fn clone(&self) -> Self {
        Self {
            prober: Arc::clone(&self.prober),
            strategy: self.strategy.clone(),
            settings: self.settings,
            progress: Arc::clone(&self.progress),
        }
    }
}

impl<S> RouteRunner<S>
where
    S: ExecutionStrategy,
{
    #[must_use]
    pub fn new(
        prober: Arc<dyn Prober>,
        strategy: S,
        settings: RouteSettings,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            prober,
            strategy,
            settings,
            progress,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &RouteSettings {
        &self.settings
    }

    /// Issues exactly `test_count` probes and returns the settled result.
    ///
    /// Failed probes are recorded, never retried or replaced.
    pub async fn run(&self, route: RouteConfig) -> RouteResult {
        let test_count = self.settings.test_count;
        info!(
            "Probing route '{}' ({} probes, {} at a time)",
            route.name, test_count, self.settings.max_concurrent
        );

        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel::<ProbeOutcome>();
        let jobs: Vec<Job<()>> = (0..test_count)
            .map(|_| self.probe_job(&route, outcome_tx.clone()))
            .collect();
        drop(outcome_tx);

        let collector = collect_outcomes(
            RouteResult::new(route, test_count),
            outcome_rx,
            self.progress.as_ref(),
        );
        let (completions, mut result) = tokio::join!(
            self.strategy
                .run_bounded(jobs, self.settings.max_concurrent),
            collector
        );

        for completion in completions {
            match completion.result {
                Ok(()) => {}
                // A cancelled job may already have reported; settle() counts it otherwise.
                Err(JobError::Cancelled) => {
                    debug!(
                        "Probe job {} on '{}' cancelled",
                        completion.index,
                        result.name()
                    );
                }
                Err(fault) => {
                    debug!(
                        "Probe job {} on '{}' faulted: {}",
                        completion.index,
                        result.name(),
                        fault
                    );
                    result.record_fault(&fault);
                }
            }
        }
        result.settle();

        info!(
            "Route '{}' finished: {} ok, {} failed",
            result.name(),
            result.success_count(),
            result.fail_count()
        );
        self.progress.route_finished(&result);
        result
    }

    fn probe_job(
        &self,
        route: &RouteConfig,
        outcome_tx: mpsc::UnboundedSender<ProbeOutcome>,
    ) -> Job<()> {
        let prober = Arc::clone(&self.prober);
        let url = route.url.clone();
        let delay = self.settings.delay_between_probes;
        Box::new(move |worker| -> JobFuture<()> {
            Box::pin(async move {
                let result = prober.probe(&url).await;
                if outcome_tx.send(ProbeOutcome { worker, result }).is_err() {
                    debug!("Outcome collector for {} already closed", url);
                }
                // The slot stays occupied for the delay; other slots keep running.
                if !delay.is_zero() {
                    sleep(delay).await;
                }
            })
        })
    }
}

async fn collect_outcomes(
    mut result: RouteResult,
    mut outcome_rx: mpsc::UnboundedReceiver<ProbeOutcome>,
    progress: &dyn ProgressSink,
) -> RouteResult {
    while let Some(outcome) = outcome_rx.recv().await {
        if let Some(err) = outcome.error() {
            debug!("Probe on '{}' failed: {}", result.name(), err);
        }
        progress.probe_finished(result.name(), &outcome);
        result.record(outcome);
    }
    result
}
