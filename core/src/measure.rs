use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, FailureKind};
use crate::timer::as_millis_f64;

/// Timed operation, declared in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    BulkSet,
    Append,
    Remove,
}

impl Operation {
    /// Phase order used by the runner and the reporter.
    pub const PHASES: [Operation; 3] = [Operation::BulkSet, Operation::Append, Operation::Remove];

    pub fn label(self) -> &'static str {
        match self {
            Operation::BulkSet => "BULK_SET",
            Operation::Append => "APPEND",
            Operation::Remove => "REMOVE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One timed invocation, or the failure that replaced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub strategy: String,
    pub operation: Operation,
    pub iteration: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub duration_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<FailureKind>,
}

impl Measurement {
    pub fn ok(strategy: impl Into<String>, operation: Operation, iteration: usize, elapsed: Duration) -> Self {
        Self {
            strategy: strategy.into(),
            operation,
            iteration,
            duration_ms: Some(as_millis_f64(elapsed)),
            error: None,
        }
    }

    pub fn failed(strategy: impl Into<String>, operation: Operation, iteration: usize, err: &BenchError) -> Self {
        Self {
            strategy: strategy.into(),
            operation,
            iteration,
            duration_ms: None,
            error: Some(err.kind()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.duration_ms.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_follow_declared_order() {
        let labels: Vec<_> = Operation::PHASES.iter().map(|op| op.label()).collect();
        assert_eq!(labels, ["BULK_SET", "APPEND", "REMOVE"]);
    }

    #[test]
    fn failed_measurement_serializes_without_duration() {
        let err = BenchError::out_of_range(4, 2);
        let m = Measurement::failed("mutable", Operation::Remove, 0, &err);
        assert!(!m.is_ok());
        let json = serde_json::to_value(&m).expect("serialize measurement");
        assert_eq!(json["operation"], "REMOVE");
        assert_eq!(json["error"], "IndexOutOfRange");
        assert!(json.get("duration_ms").is_none());
    }

    #[test]
    fn ok_measurement_records_millis() {
        let m = Measurement::ok("mutable", Operation::Append, 1, Duration::from_micros(1500));
        assert!(m.is_ok());
        let ms = m.duration_ms.expect("duration recorded");
        assert!((ms - 1.5).abs() < 1e-9);
    }
}
