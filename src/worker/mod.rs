//! Worker pool that runs scheduled jobs.
//!
//! - **Pool**: spawns a fixed number of worker loops and owns shutdown
//! - **Execution**: runs the iterations of one claimed job
//! - **Retention**: deletes finished jobs once their TTL is over
//!
//! # Components
//!
//! - [`WorkerPool`]: `start` / `stop` lifecycle around the worker loops
//! - [`JobExecutor`]: advances a job's sequence value once per interval
//! - [`RetentionReaper`]: single task holding every pending expiry
//!
//! # Worker Flow
//!
//! 1. Claim the earliest scheduled job from the [`JobRegistry`](crate::scheduler::JobRegistry)
//! 2. If none is waiting, park until a submit wakes the worker
//! 3. Run `n` iterations, each racing the interval against shutdown
//! 4. Mark the job done and hand its expiry deadline to the reaper
//!
//! # Shutdown
//!
//! Cancelling the shared token stops workers between jobs or mid-iteration.
//! An interrupted job stays `working` with its partial iteration count.
//! Pending expiries are dropped without deleting their jobs.

pub mod executor;
pub mod pool;
pub mod reaper;

pub use executor::{ExecutionOutcome, JobExecutor};
pub use pool::WorkerPool;
pub use reaper::{ReaperHandle, RetentionReaper};
