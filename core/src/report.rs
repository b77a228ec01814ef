//! Turns measurements into text. Everything here is pure: callers decide where
//! the output goes.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::FailureKind;
use crate::measure::{Measurement, Operation};
use crate::runner::{RunConfig, RunReport};

/// Aggregated samples for one (strategy, operation) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub strategy: String,
    pub operation: Operation,
    pub samples: usize,
    pub min_ms: f64,
    pub median_ms: f64,
    pub mean_ms: f64,
    pub p95_ms: f64,
    pub max_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl Summary {
    fn from_samples(strategy: &str, operation: Operation, mut samples: Vec<f64>, failure: Option<FailureKind>) -> Self {
        samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let count = samples.len();
        let mean = if count == 0 {
            0.0
        } else {
            samples.iter().sum::<f64>() / count as f64
        };
        Self {
            strategy: strategy.to_string(),
            operation,
            samples: count,
            min_ms: samples.first().copied().unwrap_or(0.0),
            median_ms: quantile(&samples, 0.5),
            mean_ms: mean,
            p95_ms: quantile(&samples, 0.95),
            max_ms: samples.last().copied().unwrap_or(0.0),
            failure,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Linear interpolation between the closest ranks of an ascending slice.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = pos - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

#[derive(Default)]
struct Bucket {
    samples: Vec<f64>,
    failure: Option<FailureKind>,
}

/// Groups by operation in phase order. Within a group, successful pairs sort
/// ascending by median and failed pairs follow; ties keep execution order.
pub fn summarize(measurements: &[Measurement]) -> Vec<Summary> {
    let mut order: Vec<(&str, Operation)> = Vec::new();
    let mut buckets: FxHashMap<(&str, Operation), Bucket> = FxHashMap::default();
    for m in measurements {
        let key = (m.strategy.as_str(), m.operation);
        let bucket = buckets.entry(key).or_insert_with(|| {
            order.push(key);
            Bucket::default()
        });
        match (m.duration_ms, m.error) {
            (_, Some(kind)) => {
                bucket.failure.get_or_insert(kind);
            }
            (Some(ms), None) => bucket.samples.push(ms),
            (None, None) => {}
        }
    }

    let mut out = Vec::with_capacity(order.len());
    for op in Operation::PHASES {
        let mut group: Vec<Summary> = order
            .iter()
            .filter(|(_, o)| *o == op)
            .filter_map(|key| {
                let bucket = buckets.remove(key)?;
                Some(Summary::from_samples(key.0, op, bucket.samples, bucket.failure))
            })
            .collect();
        group.sort_by(|a, b| {
            a.is_failed().cmp(&b.is_failed()).then_with(|| {
                a.median_ms
                    .partial_cmp(&b.median_ms)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        });
        out.extend(group);
    }
    out
}

/// Human-readable table, one block per operation.
pub fn report(measurements: &[Measurement]) -> String {
    render_table(&summarize(measurements))
}

pub fn render_table(summaries: &[Summary]) -> String {
    let width = summaries.iter().map(|s| s.strategy.len()).max().unwrap_or(0).max(8);
    let mut out = String::new();
    for op in Operation::PHASES {
        let _ = writeln!(out, "{}", op.label());
        let mut rows = summaries.iter().filter(|s| s.operation == op).peekable();
        if rows.peek().is_none() {
            let _ = writeln!(out, "  (no measurements)");
        }
        for s in rows {
            match s.failure {
                Some(kind) => {
                    let _ = writeln!(out, "  {:<width$}  FAILED: {}", s.strategy, kind);
                }
                None if s.samples > 1 => {
                    let _ = writeln!(
                        out,
                        "  {:<width$}  {:>10.3} ms  (min {:.3}, p95 {:.3}, n={})",
                        s.strategy, s.median_ms, s.min_ms, s.p95_ms, s.samples
                    );
                }
                None => {
                    let _ = writeln!(out, "  {:<width$}  {:>10.3} ms", s.strategy, s.median_ms);
                }
            }
        }
    }
    out
}

pub fn render_csv(summaries: &[Summary]) -> String {
    let mut out = String::from("strategy,operation,samples,min_ms,median_ms,mean_ms,p95_ms,max_ms,error\n");
    for s in summaries {
        let _ = writeln!(
            out,
            "{},{},{},{:.6},{:.6},{:.6},{:.6},{:.6},{}",
            s.strategy,
            s.operation.label(),
            s.samples,
            s.min_ms,
            s.median_ms,
            s.mean_ms,
            s.p95_ms,
            s.max_ms,
            s.failure.map(FailureKind::as_str).unwrap_or("")
        );
    }
    out
}

/// Serializable record of a whole run.
#[derive(Debug, Serialize)]
pub struct RunRecord {
    pub generated_at: String,
    pub config: RunConfig,
    pub completed: Vec<String>,
    pub summaries: Vec<Summary>,
    pub measurements: Vec<Measurement>,
}

impl RunRecord {
    pub fn new(report: &RunReport, generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at: generated_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            config: report.config.clone(),
            completed: report.completed_strategies().into_iter().map(str::to_string).collect(),
            summaries: summarize(&report.measurements),
            measurements: report.measurements.clone(),
        }
    }
}

pub fn render_json(record: &RunRecord) -> Result<String> {
    serde_json::to_string_pretty(record).context("serialize run record")
}
