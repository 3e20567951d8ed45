use super::types::{ProbeOutcome, RouteResult};

/// Receives run progress as it happens.
///
/// Called from whichever context finished the work, so implementations must
/// be cheap and thread-safe.
pub trait ProgressSink: Send + Sync {
    fn probe_finished(&self, route: &str, outcome: &ProbeOutcome);

    fn route_finished(&self, result: &RouteResult);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn probe_finished(&self, _route: &str, _outcome: &ProbeOutcome) {}

    fn route_finished(&self, _result: &RouteResult) {}
}
