//! Error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Returned by `receive` when the queue is empty and no value can ever arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecvError {
    /// Every sender is gone or the queue was closed, and the backlog is drained.
    #[error("receiving on an empty and disconnected queue")]
    Disconnected,
}

/// Returned by `try_receive` when no value is available right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryRecvError {
    /// The queue is empty but may still receive values.
    #[error("receiving on an empty queue")]
    Empty,
    /// The queue is empty and disconnected.
    #[error("receiving on an empty and disconnected queue")]
    Disconnected,
}

/// Errors reported by a `TrafficLight`.
#[derive(Debug, Error)]
pub enum LightError {
    /// `start` was called on a light whose cycle is already running.
    #[error("traffic light cycle already started")]
    AlreadyStarted,
    /// The light was stopped while the caller waited for a phase change.
    #[error("traffic light stopped")]
    Stopped,
    /// The light's configuration cannot drive a cycle.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The cycle thread could not be spawned.
    #[error("failed to spawn cycle thread: {0}")]
    Spawn(#[source] io::Error),
}

impl From<RecvError> for LightError {
    fn from(_: RecvError) -> Self {
        LightError::Stopped
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path to the configuration file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The configuration is not valid JSON or has unknown fields.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The shortest cycle is longer than the longest one.
    #[error("invalid cycle range: {min_ms}ms > {max_ms}ms")]
    InvalidRange {
        /// Shortest cycle in milliseconds
        min_ms: u64,
        /// Longest cycle in milliseconds
        max_ms: u64,
    },

    /// A duration that must be positive is zero.
    #[error("'{field}' must be greater than zero")]
    ZeroDuration {
        /// Name of the offending field
        field: &'static str,
    },

    /// The cycle range cannot be split into whole steps.
    #[error("cycle range {min_ms}..={max_ms}ms is not a multiple of the {step_ms}ms step")]
    MisalignedStep {
        /// Shortest cycle in milliseconds
        min_ms: u64,
        /// Longest cycle in milliseconds
        max_ms: u64,
        /// Step between possible cycles in milliseconds
        step_ms: u64,
    },
}
