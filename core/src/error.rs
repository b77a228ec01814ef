use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::measure::Operation;

/// Errors raised by strategies and recorded by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BenchError {
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("strategy '{strategy}' failed to initialise: {reason}")]
    StrategyInitFailed { strategy: String, reason: String },

    #[error("strategy '{strategy}' does not support {operation}")]
    UnsupportedOperation { strategy: String, operation: Operation },

    /// The collection length after an operation contradicts the workload invariant.
    #[error("{operation} left {actual} items, expected {expected}")]
    InvariantViolated {
        operation: Operation,
        expected: usize,
        actual: usize,
    },

    #[error("snapshot serialization failed: {reason}")]
    SnapshotFailed { reason: String },
}

impl BenchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            BenchError::IndexOutOfRange { .. } => FailureKind::IndexOutOfRange,
            BenchError::StrategyInitFailed { .. } => FailureKind::StrategyInitFailed,
            BenchError::UnsupportedOperation { .. } => FailureKind::UnsupportedOperation,
            BenchError::InvariantViolated { .. } => FailureKind::InvariantViolated,
            BenchError::SnapshotFailed { .. } => FailureKind::SnapshotFailed,
        }
    }

    pub(crate) fn out_of_range(index: usize, len: usize) -> Self {
        BenchError::IndexOutOfRange { index, len }
    }
}

/// Error tag attached to a failed measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    IndexOutOfRange,
    StrategyInitFailed,
    UnsupportedOperation,
    InvariantViolated,
    SnapshotFailed,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::IndexOutOfRange => "IndexOutOfRange",
            FailureKind::StrategyInitFailed => "StrategyInitFailed",
            FailureKind::UnsupportedOperation => "UnsupportedOperation",
            FailureKind::InvariantViolated => "InvariantViolated",
            FailureKind::SnapshotFailed => "SnapshotFailed",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
