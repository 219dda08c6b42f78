use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Monotonic job identifier. Never reused, even after the job is reaped.
pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Scheduled,
    Working,
    Done,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Scheduled => write!(f, "scheduled"),
            JobStatus::Working => write!(f, "working"),
            JobStatus::Done => write!(f, "done"),
        }
    }
}

/// An arithmetic sequence submitted by a client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Number of elements in the sequence
    pub n: u64,
    /// Delta between two consecutive elements
    pub d: f64,
    /// First element; advanced by `d` on every iteration while the job runs
    pub n1: f64,
    /// Interval between iterations, in seconds
    #[serde(rename = "I")]
    pub interval: f64,
    /// How long the finished result stays queryable, in seconds
    #[serde(rename = "TTL")]
    pub ttl: f64,
}

impl Task {
    pub fn new(n: u64, d: f64, n1: f64, interval: f64, ttl: f64) -> Self {
        Self {
            n,
            d,
            n1,
            interval,
            ttl,
        }
    }

    /// Check the constraints the scheduler relies on.
    ///
    /// `n` is unsigned so it cannot be negative once deserialized. The
    /// remaining fields must be finite, and the two durations non-negative.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.d.is_finite() {
            return Err(ValidationError::NotFinite("d"));
        }
        if !self.n1.is_finite() {
            return Err(ValidationError::NotFinite("n1"));
        }
        check_duration("I", self.interval)?;
        check_duration("TTL", self.ttl)?;
        Ok(())
    }

    pub fn interval_duration(&self) -> std::time::Duration {
        seconds(self.interval)
    }

    pub fn ttl_duration(&self) -> std::time::Duration {
        seconds(self.ttl)
    }
}

fn check_duration(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite(field));
    }
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}

// Unvalidated input saturates instead of panicking in `from_secs_f64`.
fn seconds(value: f64) -> std::time::Duration {
    std::time::Duration::try_from_secs_f64(value).unwrap_or(if value > 0.0 {
        std::time::Duration::MAX
    } else {
        std::time::Duration::ZERO
    })
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(flatten)]
    pub task: Task,
    /// Estimated number of claims left before this job runs; zero once claimed
    #[serde(rename = "numInQueue", default, skip_serializing_if = "is_zero")]
    pub num_in_queue: u64,
    #[serde(rename = "currIteration", default, skip_serializing_if = "is_zero")]
    pub curr_iteration: u64,
    #[serde(rename = "scheduledTime")]
    pub scheduled_at: DateTime<Utc>,
    #[serde(rename = "startTime", default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "endTime", default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub status: JobStatus,
}

impl Job {
    pub fn new(id: JobId, task: Task, num_in_queue: u64) -> Self {
        Self {
            id,
            task,
            num_in_queue,
            curr_iteration: 0,
            scheduled_at: Utc::now(),
            started_at: None,
            ended_at: None,
            status: JobStatus::Scheduled,
        }
    }

    /// Current value of the sequence.
    pub fn value(&self) -> f64 {
        self.task.n1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_uses_wire_field_names() {
        let task: Task =
            serde_json::from_value(json!({"n": 10, "d": 1.5, "n1": 0, "I": 2, "TTL": 5})).unwrap();
        assert_eq!(task, Task::new(10, 1.5, 0.0, 2.0, 5.0));
    }

    #[test]
    fn task_rejects_negative_count() {
        let res: Result<Task, _> =
            serde_json::from_value(json!({"n": -1, "d": 1, "n1": 0, "I": 2, "TTL": 5}));
        assert!(res.is_err());
    }

    #[test]
    fn validate_accepts_zero_durations() {
        assert!(Task::new(0, -3.0, -7.5, 0.0, 0.0).validate().is_ok());
    }

    #[test]
    fn validate_rejects_negative_interval() {
        let err = Task::new(1, 1.0, 0.0, -0.5, 1.0).validate().unwrap_err();
        assert!(matches!(err, ValidationError::Negative { field: "I", .. }));
    }

    #[test]
    fn validate_rejects_negative_ttl() {
        let err = Task::new(1, 1.0, 0.0, 1.0, -1.0).validate().unwrap_err();
        assert!(matches!(err, ValidationError::Negative { field: "TTL", .. }));
    }

    #[test]
    fn validate_rejects_non_finite_values() {
        let err = Task::new(1, f64::NAN, 0.0, 1.0, 1.0).validate().unwrap_err();
        assert!(matches!(err, ValidationError::NotFinite("d")));
        let err = Task::new(1, 1.0, 0.0, f64::INFINITY, 1.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ValidationError::NotFinite("I")));
    }

    #[test]
    fn durations_convert_from_seconds() {
        let task = Task::new(1, 1.0, 0.0, 0.25, 2.0);
        assert_eq!(task.interval_duration().as_millis(), 250);
        assert_eq!(task.ttl_duration().as_secs(), 2);
    }

    #[test]
    fn new_job_serializes_without_runtime_fields() {
        let job = Job::new(7, Task::new(3, 2.0, 0.0, 0.01, 0.05), 1);
        let value = serde_json::to_value(&job).unwrap();

        assert_eq!(value["id"], 7);
        assert_eq!(value["n"], 3);
        assert_eq!(value["I"], 0.01);
        assert_eq!(value["TTL"], 0.05);
        assert_eq!(value["numInQueue"], 1);
        assert_eq!(value["status"], "scheduled");
        assert!(value["scheduledTime"].is_string());
        assert!(value.get("currIteration").is_none());
        assert!(value.get("startTime").is_none());
        assert!(value.get("endTime").is_none());
    }

    #[test]
    fn claimed_job_omits_queue_position() {
        let mut job = Job::new(1, Task::new(1, 1.0, 0.0, 0.0, 0.0), 1);
        job.num_in_queue = 0;
        job.status = JobStatus::Working;
        job.started_at = Some(Utc::now());
        let value = serde_json::to_value(&job).unwrap();

        assert!(value.get("numInQueue").is_none());
        assert_eq!(value["status"], "working");
        assert!(value["startTime"].is_string());
    }

    #[test]
    fn status_display_matches_wire_format() {
        for status in [JobStatus::Scheduled, JobStatus::Working, JobStatus::Done] {
            let wire = serde_json::to_value(status).unwrap();
            assert_eq!(wire, status.to_string());
        }
    }
}
