use std::collections::BTreeSet;
use std::time::Duration;

use serde::Serialize;

use crate::error::{JobError, ProbeError};

/// Message recorded for slots that never reported an outcome.
const MISSING_OUTCOME: &str = "Probe did not report an outcome";

/// One configured endpoint under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteConfig {
    pub name: String,
    pub url: String,
    pub description: String,
}

/// Execution context a probe ran on.
///
/// Only used to count distinct contexts; carries no ordering meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTiming {
    pub first_byte: Duration,
    pub total: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub worker: WorkerId,
    pub result: Result<ProbeTiming, ProbeError>,
}

impl ProbeOutcome {
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    #[must_use]
    pub const fn error(&self) -> Option<&ProbeError> {
        match &self.result {
            Ok(_) => None,
            Err(err) => Some(err),
        }
    }
}

/// Per-route aggregate of raw probe outcomes.
///
/// `success_count + fail_count` never exceeds `test_count`, and equals it once
/// the route has been settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteResult {
    route: RouteConfig,
    test_count: usize,
    success_count: usize,
    fail_count: usize,
    total_times: Vec<Duration>,
    first_byte_times: Vec<Duration>,
    errors: Vec<String>,
    workers: BTreeSet<WorkerId>,
}

impl RouteResult {
    #[must_use]
    pub const fn new(route: RouteConfig, test_count: usize) -> Self {
        Self {
            route,
            test_count,
            success_count: 0,
            fail_count: 0,
            total_times: Vec::new(),
            first_byte_times: Vec::new(),
            errors: Vec::new(),
            workers: BTreeSet::new(),
        }
    }

    /// Builds a result in which every probe of the route failed with `message`.
    #[must_use]
    pub fn all_failed(route: RouteConfig, test_count: usize, message: String) -> Self {
        let mut result = Self::new(route, test_count);
        result.fail_count = test_count;
        result.errors.push(message);
        result
    }

    /// Folds one probe outcome in. Outcomes beyond `test_count` are ignored.
    pub fn record(&mut self, outcome: ProbeOutcome) {
        if self.is_complete() {
            return;
        }
        self.workers.insert(outcome.worker);
        match outcome.result {
            Ok(timing) => {
                self.success_count = self.success_count.saturating_add(1);
                self.total_times.push(timing.total);
                self.first_byte_times.push(timing.first_byte);
            }
            Err(err) => {
                self.fail_count = self.fail_count.saturating_add(1);
                self.errors.push(err.to_string());
            }
        }
    }

    /// Counts a probe job that faulted before it could report an outcome.
    pub fn record_fault(&mut self, fault: &JobError) {
        if self.is_complete() {
            return;
        }
        self.fail_count = self.fail_count.saturating_add(1);
        self.errors.push(fault.to_string());
    }

    /// Marks every slot that never reported as failed.
    pub fn settle(&mut self) {
        let missing = self.test_count.saturating_sub(self.recorded());
        if missing == 0 {
            return;
        }
        self.fail_count = self.fail_count.saturating_add(missing);
        self.errors
            .extend(std::iter::repeat_n(MISSING_OUTCOME.to_owned(), missing));
    }

    #[must_use]
    pub const fn recorded(&self) -> usize {
        self.success_count.saturating_add(self.fail_count)
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.recorded() >= self.test_count
    }

    #[must_use]
    pub const fn route(&self) -> &RouteConfig {
        &self.route
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.route.name
    }

    #[must_use]
    pub const fn test_count(&self) -> usize {
        self.test_count
    }

    #[must_use]
    pub const fn success_count(&self) -> usize {
        self.success_count
    }

    #[must_use]
    pub const fn fail_count(&self) -> usize {
        self.fail_count
    }

    #[must_use]
    pub fn total_times(&self) -> &[Duration] {
        &self.total_times
    }

    #[must_use]
    pub fn first_byte_times(&self) -> &[Duration] {
        &self.first_byte_times
    }

    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    #[must_use]
    pub const fn workers(&self) -> &BTreeSet<WorkerId> {
        &self.workers
    }
}
