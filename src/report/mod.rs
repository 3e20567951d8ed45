//! Console and JSON rendering of a run: pre-run plan, live progress, per-route
//! lines, and the final ranking.
mod format;
mod json;
mod plan;
mod progress;
mod summary;


use std::time::Duration;

use crate::args::StrategyKind;
use crate::config::RunConfig;
use crate::probe::RouteResult;
use crate::stats::{Ranking, rank};

pub use json::{print_json, report_json};
pub use plan::{confirm, estimated_runtime, plan_lines};
pub use progress::ConsoleProgress;
pub use summary::{print_report, report_lines, route_line};

/// Everything the final report needs, ranked once.
#[derive(Debug)]
pub struct RunReport<'run> {
    pub results: &'run [RouteResult],
    pub ranking: Ranking<'run>,
    pub strategy: StrategyKind,
    pub max_concurrent_routes: usize,
    pub max_concurrent_per_route: usize,
    pub elapsed: Duration,
}

impl<'run> RunReport<'run> {
    #[must_use]
    pub fn new(results: &'run [RouteResult], run: &RunConfig, elapsed: Duration) -> Self {
        Self {
            results,
            ranking: rank(results),
            strategy: run.strategy,
            max_concurrent_routes: run.max_concurrent_routes,
            max_concurrent_per_route: run.max_concurrent_per_route,
            elapsed,
        }
    }
}
