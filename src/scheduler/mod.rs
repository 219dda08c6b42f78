pub mod job;
pub mod queue;
pub mod registry;

pub use job::{Job, JobId, JobStatus, Task};
pub use queue::JobQueue;
pub use registry::JobRegistry;
