use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::scheduler::{Job, JobId, JobRegistry};

/// Result of running a claimed job
#[derive(Debug)]
pub enum ExecutionOutcome {
    /// All iterations ran. `expires_at` is `None` when the TTL is too large to
    /// be represented, in which case the result is kept forever.
    Completed {
        job: Job,
        expires_at: Option<Instant>,
    },
    /// Shutdown interrupted the job. It stays `Working` with the iterations
    /// it managed to finish.
    Cancelled { job_id: JobId, iterations: u64 },
    /// The record disappeared from the registry while the job was running.
    Missing { job_id: JobId },
}

/// Runs the iterations of claimed jobs against the shared registry.
#[derive(Debug, Clone)]
pub struct JobExecutor {
    registry: Arc<JobRegistry>,
}

impl JobExecutor {
    pub fn new(registry: Arc<JobRegistry>) -> Self {
        Self { registry }
    }

    /// Execute a job that was claimed by the calling worker.
    ///
    /// Each of the `n` iterations races the job's interval against `shutdown`.
    /// Losing a race aborts the job where it stands.
    pub async fn execute(&self, job: &Job, shutdown: &CancellationToken) -> ExecutionOutcome {
        let interval = job.task.interval_duration();
        tracing::info!(
            job_id = job.id,
            iterations = job.task.n,
            interval_ms = interval.as_millis() as u64,
            "Executing job"
        );

        for done in 0..job.task.n {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    tracing::info!(job_id = job.id, iterations = done, "Job interrupted by shutdown");
                    return ExecutionOutcome::Cancelled { job_id: job.id, iterations: done };
                }
                _ = tokio::time::sleep(interval) => {
                    if !self.registry.advance(job.id).await {
                        tracing::warn!(job_id = job.id, "Running job vanished from registry");
                        return ExecutionOutcome::Missing { job_id: job.id };
                    }
                }
            }
        }

        match self.registry.complete(job.id).await {
            Some(job) => {
                let expires_at = Instant::now().checked_add(job.task.ttl_duration());
                tracing::info!(job_id = job.id, value = job.value(), "Job completed");
                ExecutionOutcome::Completed { job, expires_at }
            }
            None => {
                tracing::warn!(job_id = job.id, "Running job vanished from registry");
                ExecutionOutcome::Missing { job_id: job.id }
            }
        }
    }
}
