use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::scheduler::{JobId, JobRegistry};

/// Sender side used by workers to hand finished jobs to the reaper.
#[derive(Debug, Clone)]
pub struct ReaperHandle {
    tx: mpsc::UnboundedSender<(Instant, JobId)>,
}

impl ReaperHandle {
    /// Delete `job_id` from the registry once `expires_at` is reached.
    pub fn schedule(&self, job_id: JobId, expires_at: Instant) {
        if self.tx.send((expires_at, job_id)).is_err() {
            tracing::debug!(job_id, "Reaper stopped, job will not expire");
        }
    }
}

/// Deletes finished jobs once their retention period is over.
///
/// A single task serves every pending expiry from a min-heap keyed by
/// deadline. Shutdown stops it without deleting anything still pending.
pub struct RetentionReaper {
    registry: Arc<JobRegistry>,
    rx: mpsc::UnboundedReceiver<(Instant, JobId)>,
    expiries: BinaryHeap<Reverse<(Instant, JobId)>>,
}

impl RetentionReaper {
    pub fn new(registry: Arc<JobRegistry>) -> (Self, ReaperHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let reaper = Self {
            registry,
            rx,
            expiries: BinaryHeap::new(),
        };
        (reaper, ReaperHandle { tx })
    }

    /// Run until `shutdown` fires, or until every handle is dropped and no
    /// expiry is left.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut senders_open = true;

        loop {
            let next = self.expiries.peek().map(|Reverse((at, _))| *at);
            if next.is_none() && !senders_open {
                break;
            }

            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    tracing::debug!(pending = self.expiries.len(), "Reaper cancelled");
                    break;
                }
                _ = tokio::time::sleep_until(next.unwrap_or_else(Instant::now)), if next.is_some() => {
                    self.reap_due().await;
                }
                msg = self.rx.recv(), if senders_open => match msg {
                    Some((at, job_id)) => self.expiries.push(Reverse((at, job_id))),
                    None => senders_open = false,
                },
            }
        }
    }

    async fn reap_due(&mut self) {
        let now = Instant::now();
        while let Some(Reverse((at, job_id))) = self.expiries.peek().copied() {
            if at > now {
                break;
            }
            self.expiries.pop();
            if self.registry.remove(job_id).await.is_some() {
                tracing::debug!(job_id, "Expired job removed");
            }
        }
    }
}
