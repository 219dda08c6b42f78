use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::{Result, SeqPoolError};
use crate::scheduler::JobRegistry;
use crate::worker::executor::{ExecutionOutcome, JobExecutor};
use crate::worker::reaper::{ReaperHandle, RetentionReaper};

/// Fixed-size pool of worker loops plus the retention reaper.
///
/// All spawned tasks observe one shutdown token. [`WorkerPool::stop`] cancels
/// it and waits for every task, bounded by the configured grace period.
pub struct WorkerPool {
    registry: Arc<JobRegistry>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    shutdown_grace: Duration,
    started: AtomicBool,
}

impl WorkerPool {
    pub fn new(registry: Arc<JobRegistry>, shutdown_grace: Duration) -> Self {
        Self::with_shutdown(registry, shutdown_grace, CancellationToken::new())
    }

    /// Build a pool that also stops when `shutdown` is cancelled elsewhere,
    /// e.g. by the signal handler.
    pub fn with_shutdown(
        registry: Arc<JobRegistry>,
        shutdown_grace: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry,
            shutdown,
            tracker: TaskTracker::new(),
            shutdown_grace,
            started: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Spawn `max_parallel` worker loops and the reaper. Must be called from
    /// within a tokio runtime, at most once.
    pub fn start(&self, max_parallel: usize) -> Result<()> {
        if max_parallel == 0 {
            return Err(SeqPoolError::InvalidConfig(
                "max_parallel must be at least 1".to_string(),
            ));
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SeqPoolError::AlreadyStarted);
        }

        let (reaper, reaper_handle) = RetentionReaper::new(self.registry.clone());
        self.tracker.spawn(reaper.run(self.shutdown.clone()));

        let executor = JobExecutor::new(self.registry.clone());
        for worker_id in 0..max_parallel {
            self.tracker.spawn(worker_loop(
                worker_id,
                self.registry.clone(),
                executor.clone(),
                reaper_handle.clone(),
                self.shutdown.clone(),
            ));
        }

        tracing::info!(max_parallel, "Worker pool started");
        Ok(())
    }

    /// Cancel every worker and the reaper, then wait for them to exit.
    ///
    /// # Errors
    ///
    /// `NotStarted` if `start` never succeeded, `ShutdownTimeout` if the tasks
    /// are still running once the grace period is over.
    pub async fn stop(&self) -> Result<()> {
        self.shutdown.cancel();
        if !self.started.load(Ordering::SeqCst) {
            return Err(SeqPoolError::NotStarted);
        }

        self.tracker.close();
        match tokio::time::timeout(self.shutdown_grace, self.tracker.wait()).await {
            Ok(()) => {
                tracing::info!("Worker pool stopped");
                Ok(())
            }
            Err(_) => {
                tracing::warn!(
                    remaining = self.tracker.len(),
                    "Worker pool did not stop within grace period"
                );
                Err(SeqPoolError::ShutdownTimeout(self.shutdown_grace))
            }
        }
    }
}

/// One worker: claim, execute, hand off to the reaper, repeat.
///
/// With nothing to claim the worker parks on the registry's wake-up signal
/// instead of polling.
async fn worker_loop(
    worker_id: usize,
    registry: Arc<JobRegistry>,
    executor: JobExecutor,
    reaper: ReaperHandle,
    shutdown: CancellationToken,
) {
    tracing::info!(worker_id, "Worker started");

    loop {
        if shutdown.is_cancelled() {
            break;
        }

        // Registered before claiming so a submit racing an empty claim is not lost
        let work_ready = registry.work_ready();
        tokio::pin!(work_ready);
        work_ready.as_mut().enable();

        let job = match registry.claim_next().await {
            Some(job) => job,
            None => {
                tokio::select! {
                    biased;

                    _ = shutdown.cancelled() => break,
                    _ = &mut work_ready => {}
                }
                continue;
            }
        };

        tracing::debug!(worker_id, job_id = job.id, "Job claimed");
        match executor.execute(&job, &shutdown).await {
            ExecutionOutcome::Completed { job, expires_at } => match expires_at {
                Some(at) => reaper.schedule(job.id, at),
                None => tracing::warn!(job_id = job.id, "TTL out of range, job is kept"),
            },
            ExecutionOutcome::Cancelled { .. } => break,
            ExecutionOutcome::Missing { .. } => {}
        }
    }

    tracing::info!(worker_id, "Worker stopped");
}
