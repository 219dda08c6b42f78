use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeqPoolError {
    #[error("Worker pool is already running")]
    AlreadyStarted,

    #[error("Worker pool is not running")]
    NotStarted,

    #[error("Shutdown did not finish within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Rejected task input. Produced by the transport layer before a task
/// reaches the registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{0} must be a finite number")]
    NotFinite(&'static str),
}

pub type Result<T> = std::result::Result<T, SeqPoolError>;
