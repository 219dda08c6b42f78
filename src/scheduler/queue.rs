use std::collections::{BTreeMap, VecDeque};

use chrono::Utc;

use crate::scheduler::job::{Job, JobId, JobStatus, Task};

/// Job records plus the FIFO of jobs still waiting for a worker.
///
/// Not synchronized on its own; [`JobRegistry`](crate::scheduler::JobRegistry)
/// wraps it in a lock.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: BTreeMap<JobId, Job>,
    pending: VecDeque<JobId>,
    next_id: JobId,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new scheduled job and return a copy of it.
    ///
    /// The job is placed behind every job still waiting, so its position is
    /// the number of scheduled jobs including itself.
    pub fn submit(&mut self, task: Task) -> Job {
        let id = self.next_id;
        self.next_id += 1;

        let job = Job::new(id, task, self.pending.len() as u64 + 1);
        self.jobs.insert(id, job.clone());
        self.pending.push_back(id);
        job
    }

    /// Get a job by ID
    pub fn get_job(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    /// All live jobs in ascending id order
    pub fn all_jobs(&self) -> Vec<&Job> {
        self.jobs.values().collect()
    }

    /// Claim the earliest-submitted scheduled job.
    ///
    /// The claimed job's position drops to zero and it becomes `Working`.
    /// Every job still waiting moves one turn closer.
    pub fn claim_next(&mut self) -> Option<Job> {
        let id = self.pending.pop_front()?;

        for waiting in &self.pending {
            if let Some(job) = self.jobs.get_mut(waiting) {
                job.num_in_queue = job.num_in_queue.saturating_sub(1);
            }
        }

        let job = self.jobs.get_mut(&id)?;
        job.num_in_queue = 0;
        job.status = JobStatus::Working;
        job.started_at = Some(Utc::now());
        Some(job.clone())
    }

    /// Record one finished iteration of a running job.
    pub fn advance(&mut self, id: JobId) -> bool {
        match self.jobs.get_mut(&id) {
            Some(job) if job.status == JobStatus::Working => {
                job.task.n1 += job.task.d;
                job.curr_iteration += 1;
                true
            }
            _ => false,
        }
    }

    /// Mark a running job as done and return a copy of its final state.
    pub fn complete(&mut self, id: JobId) -> Option<Job> {
        let job = self.jobs.get_mut(&id)?;
        if job.status != JobStatus::Working {
            return None;
        }
        job.status = JobStatus::Done;
        job.ended_at = Some(Utc::now());
        job.curr_iteration = 0;
        Some(job.clone())
    }

    /// Delete a job record. Returns the removed job, if it was present.
    pub fn remove(&mut self, id: JobId) -> Option<Job> {
        let job = self.jobs.remove(&id)?;
        if job.status == JobStatus::Scheduled {
            self.pending.retain(|pending| *pending != id);
        }
        Some(job)
    }

    /// Number of jobs waiting for a worker
    pub fn scheduled_count(&self) -> usize {
        self.pending.len()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
