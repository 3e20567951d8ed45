//! Interchangeable bounded-concurrency backends.
//!
//! Both the per-route runner and the cross-route scheduler hand a batch of
//! jobs to an [`ExecutionStrategy`] and get one [`Completion`] back per job,
//! in completion order. At most `width` jobs run at any instant.
mod cooperative;
mod gate;
mod threaded;

use std::any::Any;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::args::StrategyKind;
use crate::error::JobError;
use crate::shutdown::ShutdownSender;

use super::types::WorkerId;

pub use cooperative::CooperativeStrategy;
pub use threaded::ThreadedStrategy;

pub type JobFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Deferred unit of work; receives the execution slot it was admitted to.
pub type Job<T> = Box<dyn FnOnce(WorkerId) -> JobFuture<T> + Send + 'static>;

/// Settled job. `index` is the job's position in the submitted batch.
#[derive(Debug)]
pub struct Completion<T> {
    pub index: usize,
    pub result: Result<T, JobError>,
}

#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    /// Runs every job with at most `width` in flight and waits for all of
    /// them to settle.
    ///
    /// Always returns exactly one completion per submitted job.
    async fn run_bounded<T>(&self, jobs: Vec<Job<T>>, width: usize) -> Vec<Completion<T>>
    where
        T: Send + 'static;

    fn kind(&self) -> StrategyKind;
}

/// Strategy selected once per run and shared by the scheduler and runners.
#[derive(Debug, Clone)]
pub enum ExecutionModel {
    Cooperative(CooperativeStrategy),
    Threaded(ThreadedStrategy),
}

impl ExecutionModel {
    #[must_use]
    pub fn new(kind: StrategyKind, shutdown_tx: &ShutdownSender) -> Self {
        match kind {
            StrategyKind::Cooperative => Self::Cooperative(CooperativeStrategy),
            StrategyKind::Threaded => Self::Threaded(ThreadedStrategy::new(shutdown_tx)),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for ExecutionModel {
    async fn run_bounded<T>(&self, jobs: Vec<Job<T>>, width: usize) -> Vec<Completion<T>>
    where
        T: Send + 'static,
    {
        match self {
            Self::Cooperative(strategy) => strategy.run_bounded(jobs, width).await,
            Self::Threaded(strategy) => strategy.run_bounded(jobs, width).await,
        }
    }

    fn kind(&self) -> StrategyKind {
        match self {
            Self::Cooperative(strategy) => strategy.kind(),
            Self::Threaded(strategy) => strategy.kind(),
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        return (*message).to_owned();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic payload".to_owned()
}
