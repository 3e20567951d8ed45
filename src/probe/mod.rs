//! Concurrent probing engine: single-request prober, per-route runner,
//! cross-route scheduler and the two execution strategies they share.
mod payload;
mod prober;
mod progress;
mod runner;
mod scheduler;
pub mod strategy;
mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use payload::{ChatMessage, ChatPayload};
pub use prober::{HttpProber, Prober, build_client, probe_once};
pub use progress::{NoProgress, ProgressSink};
pub use runner::{RouteRunner, RouteSettings};
pub use scheduler::Scheduler;
pub use strategy::{
    Completion, CooperativeStrategy, ExecutionModel, ExecutionStrategy, Job, JobFuture,
    ThreadedStrategy,
};
pub use types::{ProbeOutcome, ProbeTiming, RouteConfig, RouteResult, WorkerId};
