use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures_util::{FutureExt, StreamExt, stream::FuturesUnordered};

use crate::args::StrategyKind;
use crate::error::JobError;

use super::gate::SlotGate;
use super::{Completion, ExecutionStrategy, Job, panic_message};

/// Runs every job inside the calling task.
///
/// All jobs are submitted up front and wait on a shared admission gate;
/// the only suspension points are the gate and the jobs' own I/O. Dropping
/// the returned future cancels every job still in flight.
#[derive(Debug, Default, Clone, Copy)]
pub struct CooperativeStrategy;

#[async_trait]
impl ExecutionStrategy for CooperativeStrategy {
    async fn run_bounded<T>(&self, jobs: Vec<Job<T>>, width: usize) -> Vec<Completion<T>>
    where
        T: Send + 'static,
    {
        let gate = SlotGate::new(width);
        let gate = &gate;
        let mut completions = Vec::with_capacity(jobs.len());

        let mut pending: FuturesUnordered<_> = jobs
            .into_iter()
            .enumerate()
            .map(|(index, job)| async move {
                let result = match gate.acquire().await {
                    Ok(slot) => {
                        let settled = AssertUnwindSafe(job(slot.worker()))
                            .catch_unwind()
                            .await
                            .map_err(|payload| JobError::Panicked {
                                message: panic_message(payload.as_ref()),
                            });
                        drop(slot);
                        settled
                    }
                    Err(err) => Err(err),
                };
                Completion { index, result }
            })
            .collect();

        while let Some(completion) = pending.next().await {
            completions.push(completion);
        }
        completions
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Cooperative
    }
}
