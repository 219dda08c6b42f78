use tokio::sync::futures::Notified;
use tokio::sync::{Notify, RwLock};

use crate::scheduler::job::{Job, JobId, Task};
use crate::scheduler::queue::JobQueue;

/// Concurrency-safe job store shared by the transport layer, the worker pool
/// and the reaper.
///
/// Mutations take the write lock, reads take the read lock. Each submit wakes
/// one idle worker.
#[derive(Debug, Default)]
pub struct JobRegistry {
    queue: RwLock<JobQueue>,
    work_ready: Notify,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a task. The caller is expected to have validated it.
    pub async fn submit(&self, task: Task) -> Job {
        let job = self.queue.write().await.submit(task);
        self.work_ready.notify_one();
        tracing::debug!(job_id = job.id, num_in_queue = job.num_in_queue, "Job scheduled");
        job
    }

    /// Point-in-time snapshot of every live job, ascending by id.
    pub async fn list(&self) -> Vec<Job> {
        let queue = self.queue.read().await;
        queue.all_jobs().into_iter().cloned().collect()
    }

    pub async fn get(&self, id: JobId) -> Option<Job> {
        self.queue.read().await.get_job(id).cloned()
    }

    pub async fn scheduled_count(&self) -> usize {
        self.queue.read().await.scheduled_count()
    }

    pub async fn len(&self) -> usize {
        self.queue.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.queue.read().await.is_empty()
    }

    pub(crate) async fn claim_next(&self) -> Option<Job> {
        self.queue.write().await.claim_next()
    }

    pub(crate) async fn advance(&self, id: JobId) -> bool {
        self.queue.write().await.advance(id)
    }

    pub(crate) async fn complete(&self, id: JobId) -> Option<Job> {
        self.queue.write().await.complete(id)
    }

    pub(crate) async fn remove(&self, id: JobId) -> Option<Job> {
        self.queue.write().await.remove(id)
    }

    /// Future that resolves on the next submit.
    ///
    /// Workers must `enable` it before looking for work: an enabled waiter
    /// is counted by `notify_one`, so a submit landing between an empty
    /// claim and the wait still wakes this worker. A notified waiter that
    /// is dropped unused hands its wake-up to the next waiter.
    pub(crate) fn work_ready(&self) -> Notified<'_> {
        self.work_ready.notified()
    }
}
