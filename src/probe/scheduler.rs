use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};
use crate::shutdown::ShutdownReceiver;

use super::progress::ProgressSink;
use super::runner::RouteRunner;
use super::strategy::{ExecutionStrategy, Job, JobFuture, panic_message};
use super::types::{RouteConfig, RouteResult};

/// Fans routes out to [`RouteRunner`]s under the cross-route cap.
///
/// Uses the same strategy as the runners, so the two caps nest: at most
/// `max_concurrent_routes * max_concurrent` probes are ever in flight.
pub struct Scheduler<S> {
    runner: RouteRunner<S>,
    strategy: S,
    max_concurrent_routes: usize,
    progress: Arc<dyn ProgressSink>,
}

impl<S> Scheduler<S>
where
    S: ExecutionStrategy + Clone + 'static,
{
    #[must_use]
    pub fn new(
        runner: RouteRunner<S>,
        strategy: S,
        max_concurrent_routes: usize,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            runner,
            strategy,
            max_concurrent_routes,
            progress,
        }
    }

    /// Runs every route to completion.
    ///
    /// The returned list follows the order of `routes`, whatever order the
    /// routes finished in. A route whose runner faults is reported as fully
    /// failed instead of aborting its siblings.
    pub async fn run_all(&self, routes: &[RouteConfig]) -> Vec<RouteResult> {
        info!(
            "Scheduling {} route(s), {} at a time ({:?})",
            routes.len(),
            self.max_concurrent_routes,
            self.strategy.kind()
        );

        let jobs: Vec<Job<RouteResult>> = routes
            .iter()
            .map(|route| {
                let runner = self.runner.clone();
                let route = route.clone();
                Box::new(move |_worker| -> JobFuture<RouteResult> {
                    Box::pin(async move { runner.run(route).await })
                }) as Job<RouteResult>
            })
            .collect();

        let completions = self
            .strategy
            .run_bounded(jobs, self.max_concurrent_routes)
            .await;

        let test_count = self.runner.settings().test_count;
        let mut results: Vec<Option<RouteResult>> = routes.iter().map(|_| None).collect();
        for completion in completions {
            let Some(route) = routes.get(completion.index) else {
                continue;
            };
            let result = match completion.result {
                Ok(result) => result,
                Err(fault) => {
                    error!("Route '{}' aborted: {}", route.name, fault);
                    let failed = RouteResult::all_failed(
                        route.clone(),
                        test_count,
                        format!("Route run failed: {}", fault),
                    );
                    self.notify_route_failed(&failed);
                    failed
                }
            };
            if let Some(slot) = results.get_mut(completion.index) {
                *slot = Some(result);
            }
        }

        routes
            .iter()
            .zip(results)
            .map(|(route, result)| {
                result.unwrap_or_else(|| {
                    RouteResult::all_failed(
                        route.clone(),
                        test_count,
                        "Route did not report a result".to_owned(),
                    )
                })
            })
            .collect()
    }

    /// The fault may have come from the sink itself, so a second panic is
    /// contained here instead of unwinding through the sibling routes.
    fn notify_route_failed(&self, failed: &RouteResult) {
        let notified = panic::catch_unwind(AssertUnwindSafe(|| {
            self.progress.route_finished(failed);
        }));
        if let Err(payload) = notified {
            warn!(
                "Progress sink panicked on route '{}': {}",
                failed.name(),
                panic_message(payload.as_ref())
            );
        }
    }

    /// Like [`Scheduler::run_all`], but gives up as soon as the shutdown
    /// channel fires. In-flight cooperative probes are dropped with the run.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Interrupted`] when shutdown was requested before
    /// every route finished.
    pub async fn run_all_until_shutdown(
        &self,
        routes: &[RouteConfig],
        shutdown_rx: &mut ShutdownReceiver,
    ) -> AppResult<Vec<RouteResult>> {
        tokio::select! {
            results = self.run_all(routes) => Ok(results),
            signal = shutdown_rx.recv() => {
                warn!("Shutdown requested ({:?}); abandoning run", signal.err());
                Err(AppError::Interrupted)
            }
        }
    }
}
