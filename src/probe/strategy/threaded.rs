use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::args::StrategyKind;
use crate::error::JobError;
use crate::probe::types::WorkerId;
use crate::shutdown::{ShutdownReceiver, ShutdownSender};

use super::{Completion, ExecutionStrategy, Job, JobFuture, panic_message};

type JobQueue<T> = Mutex<VecDeque<(usize, Job<T>)>>;

/// Runs jobs on a bounded pool of dedicated OS threads.
///
/// Workers pull from a shared queue and drive each job to completion on the
/// current tokio runtime, which must be a multi-threaded one. Workers watch
/// the shutdown channel and abandon their job when it fires.
#[derive(Debug, Clone)]
pub struct ThreadedStrategy {
    shutdown_tx: ShutdownSender,
}

impl ThreadedStrategy {
    #[must_use]
    pub fn new(shutdown_tx: &ShutdownSender) -> Self {
        Self {
            shutdown_tx: shutdown_tx.clone(),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for ThreadedStrategy {
    async fn run_bounded<T>(&self, jobs: Vec<Job<T>>, width: usize) -> Vec<Completion<T>>
    where
        T: Send + 'static,
    {
        let total = jobs.len();
        if total == 0 {
            return Vec::new();
        }

        let handle = Handle::current();
        let queue: Arc<JobQueue<T>> = Arc::new(Mutex::new(jobs.into_iter().enumerate().collect()));
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion<T>>();
        let pool_size = width.max(1).min(total);
        let mut threads = Vec::with_capacity(pool_size);
        let mut spawn_failure = None;

        for slot in 0..pool_size {
            let queue = Arc::clone(&queue);
            let done_tx = done_tx.clone();
            let handle = handle.clone();
            let shutdown_rx = self.shutdown_tx.subscribe();
            let spawned = thread::Builder::new()
                .name(format!("probe-worker-{}", slot))
                .spawn(move || {
                    worker_loop(WorkerId(slot), &queue, &done_tx, &handle, shutdown_rx);
                });
            match spawned {
                Ok(thread) => threads.push(thread),
                Err(err) => {
                    warn!("Failed to spawn worker thread {}: {}", slot, err);
                    spawn_failure = Some(err.to_string());
                    break;
                }
            }
        }
        drop(done_tx);

        let mut completions = Vec::with_capacity(total);
        while let Some(completion) = done_rx.recv().await {
            completions.push(completion);
        }

        let reaped = tokio::task::spawn_blocking(move || {
            threads
                .into_iter()
                .map(thread::JoinHandle::join)
                .filter(Result::is_err)
                .count()
        })
        .await;
        if let Ok(crashed) = reaped
            && crashed > 0
        {
            warn!("{} worker thread(s) exited abnormally", crashed);
        }

        let reason = spawn_failure.unwrap_or_else(|| "worker pool stopped early".to_owned());
        let leftovers: Vec<(usize, Job<T>)> = queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for (index, job) in leftovers {
            drop(job);
            completions.push(Completion {
                index,
                result: Err(JobError::NotStarted {
                    reason: reason.clone(),
                }),
            });
        }
        completions
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Threaded
    }
}

fn worker_loop<T: Send + 'static>(
    worker: WorkerId,
    queue: &JobQueue<T>,
    done_tx: &mpsc::UnboundedSender<Completion<T>>,
    handle: &Handle,
    mut shutdown_rx: ShutdownReceiver,
) {
    loop {
        let next = queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let Some((index, job)) = next else {
            break;
        };

        let settled = panic::catch_unwind(AssertUnwindSafe(|| {
            handle.block_on(run_until_shutdown(job(worker), &mut shutdown_rx))
        }));
        let result = match settled {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(JobError::Cancelled),
            Err(payload) => Err(JobError::Panicked {
                message: panic_message(payload.as_ref()),
            }),
        };
        let cancelled = matches!(result, Err(JobError::Cancelled));
        if done_tx.send(Completion { index, result }).is_err() || cancelled {
            debug!("Worker {:?} stopping", worker);
            break;
        }
    }
}

async fn run_until_shutdown<T>(job: JobFuture<T>, shutdown_rx: &mut ShutdownReceiver) -> Option<T> {
    tokio::select! {
        value = job => Some(value),
        () = shutdown_signal(shutdown_rx) => None,
    }
}

async fn shutdown_signal(shutdown_rx: &mut ShutdownReceiver) {
    match shutdown_rx.recv().await {
        Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
        Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
    }
}
