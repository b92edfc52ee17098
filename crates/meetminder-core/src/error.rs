//! Core error types for meetminder-core.
//!
//! Planning errors are always scoped to a single event: the scheduler
//! catches them per event, logs, and keeps planning the rest.
//! [`CoreError`] is the crate-level umbrella for callers outside the
//! engine -- the CLI folds its IO, serialization and scheduler failures
//! into it.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Core error type for meetminder-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Alert-planning errors
    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    /// Scheduler handle errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Errors produced while planning alerts for a single event.
#[derive(Error, Debug)]
pub enum PlanError {
    /// Event data is malformed.
    #[error("Invalid time range for event '{event_id}': end ({end}) is before start ({start})")]
    InvalidTimeRange {
        event_id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Errors from the scheduler command channel.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The engine worker task has exited; commands can no longer be delivered.
    #[error("Scheduler worker is no longer running")]
    WorkerGone,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
