use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::args::StrategyKind;
use crate::error::ProbeError;

use super::progress::ProgressSink;
use super::prober::Prober;
use super::strategy::{Completion, CooperativeStrategy, ExecutionStrategy, Job};
use super::types::{ProbeOutcome, ProbeTiming, RouteConfig, RouteResult};

/// Deterministic prober with fixed timings and an in-flight high-water mark.
pub(crate) struct FakeProber {
    hold: Duration,
    timing: ProbeTiming,
    failing_urls: BTreeSet<String>,
    panicking_urls: BTreeSet<String>,
    fail_every: Option<usize>,
    calls: AtomicUsize,
    calls_by_url: Mutex<BTreeMap<String, usize>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeProber {
    pub(crate) fn new(hold: Duration, timing: ProbeTiming) -> Self {
        Self {
            hold,
            timing,
            failing_urls: BTreeSet::new(),
            panicking_urls: BTreeSet::new(),
            fail_every: None,
            calls: AtomicUsize::new(0),
            calls_by_url: Mutex::new(BTreeMap::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing(mut self, url: &str) -> Self {
        self.failing_urls.insert(url.to_owned());
        self
    }

    pub(crate) fn panicking(mut self, url: &str) -> Self {
        self.panicking_urls.insert(url.to_owned());
        self
    }

    /// Every `n`-th call (1-based, counted per URL) times out.
    pub(crate) fn fail_every(mut self, n: usize) -> Self {
        self.fail_every = Some(n);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for FakeProber {
    async fn probe(&self, url: &str) -> Result<ProbeTiming, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let call = {
            let mut calls = self
                .calls_by_url
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let count = calls.entry(url.to_owned()).or_insert(0);
            *count = count.saturating_add(1);
            *count
        };
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.hold).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panicking_urls.contains(url) {
            std::panic::resume_unwind(Box::new("fake prober exploded"));
        }
        if self.failing_urls.contains(url) {
            return Err(ProbeError::HttpStatus(503));
        }
        if let Some(n) = self.fail_every
            && n > 0
            && call % n == 0
        {
            return Err(ProbeError::Timeout);
        }
        Ok(self.timing)
    }
}

/// Records every progress signal it receives.
#[derive(Default)]
pub(crate) struct RecordingProgress {
    probes: Mutex<Vec<String>>,
    routes: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub(crate) fn probe_count(&self, route: &str) -> usize {
        self.probes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|name| name.as_str() == route)
            .count()
    }

    pub(crate) fn finished_routes(&self) -> Vec<String> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn probe_finished(&self, route: &str, _outcome: &ProbeOutcome) {
        self.probes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_owned());
    }

    fn route_finished(&self, result: &RouteResult) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result.name().to_owned());
    }
}

/// Records like [`RecordingProgress`] but blows up when `route` finishes.
pub(crate) struct ExplodingProgress {
    route: String,
    inner: RecordingProgress,
}

impl ExplodingProgress {
    pub(crate) fn on_route(route: &str) -> Self {
        Self {
            route: route.to_owned(),
            inner: RecordingProgress::default(),
        }
    }

    pub(crate) fn finished_routes(&self) -> Vec<String> {
        self.inner.finished_routes()
    }
}

impl ProgressSink for ExplodingProgress {
    fn probe_finished(&self, route: &str, outcome: &ProbeOutcome) {
        self.inner.probe_finished(route, outcome);
    }

    fn route_finished(&self, result: &RouteResult) {
        if result.name() == self.route {
            std::panic::resume_unwind(Box::new("progress sink exploded"));
        }
        self.inner.route_finished(result);
    }
}

/// Runs jobs cooperatively but reports none of them back.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SilentStrategy;

#[async_trait]
impl ExecutionStrategy for SilentStrategy {
    async fn run_bounded<T>(&self, jobs: Vec<Job<T>>, width: usize) -> Vec<Completion<T>>
    where
        T: Send + 'static,
    {
        drop(CooperativeStrategy.run_bounded(jobs, width).await);
        Vec::new()
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Cooperative
    }
}

pub(crate) fn route(name: &str) -> RouteConfig {
    RouteConfig {
        name: name.to_owned(),
        url: format!("http://{}.test/v1/messages", name),
        description: format!("{} route", name),
    }
}

pub(crate) const fn timing_ms(first_byte: u64, total: u64) -> ProbeTiming {
    ProbeTiming {
        first_byte: Duration::from_millis(first_byte),
        total: Duration::from_millis(total),
    }
}

pub(crate) fn run_current_thread<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

pub(crate) fn run_multi_thread<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}
