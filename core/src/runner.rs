//! Runs every strategy through INIT → BULK_SET → APPEND → REMOVE.

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{BenchError, FailureKind};
use crate::measure::{Measurement, Operation};
use crate::strategy::{Strategy, StrategyEntry, StrategyKind};
use crate::timer::measure_with;
use crate::workload::{DEFAULT_APPEND_ITEM, DEFAULT_SIZE, Workload};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    pub size: usize,
    pub strategies: Vec<StrategyKind>,
    pub append_item: String,
    /// Defaults to `size / 2`.
    pub remove_index: Option<usize>,
    pub repeat: usize,
    pub warmup: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            strategies: StrategyKind::ALL.to_vec(),
            append_item: DEFAULT_APPEND_ITEM.to_string(),
            remove_index: None,
            repeat: 1,
            warmup: 0,
        }
    }
}

impl RunConfig {
    pub fn with_size(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn remove_index(&self) -> usize {
        self.remove_index.unwrap_or(self.size / 2)
    }
}

/// Output of a run: every measurement in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub config: RunConfig,
    pub strategies: Vec<String>,
    pub measurements: Vec<Measurement>,
}

impl RunReport {
    /// Strategies whose every phase succeeded in every iteration, in declared
    /// order. Empty when nothing was measured.
    pub fn completed_strategies(&self) -> Vec<&str> {
        let expected = Operation::PHASES.len() * self.config.repeat;
        if expected == 0 {
            return Vec::new();
        }
        let mut ok: FxHashMap<&str, usize> = FxHashMap::default();
        let mut failed: FxHashMap<&str, bool> = FxHashMap::default();
        for m in &self.measurements {
            if m.is_ok() {
                *ok.entry(m.strategy.as_str()).or_default() += 1;
            } else {
                failed.insert(m.strategy.as_str(), true);
            }
        }
        self.strategies
            .iter()
            .map(String::as_str)
            .filter(|name| !failed.contains_key(name) && ok.get(name).copied().unwrap_or(0) == expected)
            .collect()
    }

    /// True when no strategy could be constructed in any iteration.
    pub fn all_init_failed(&self) -> bool {
        !self.measurements.is_empty()
            && self
                .measurements
                .iter()
                .all(|m| m.error == Some(FailureKind::StrategyInitFailed))
    }
}

struct Slot {
    name: String,
    strategy: Option<Box<dyn Strategy>>,
}

pub struct Runner {
    config: RunConfig,
    workload: Workload,
}

impl Runner {
    /// `repeat` is raised to 1 when zero.
    pub fn new(config: RunConfig) -> Self {
        let workload = Workload::generate(config.size);
        Self::with_workload(config, workload)
    }

    /// Runs against an explicit workload; `config.size` is overwritten with
    /// its length.
    pub fn with_workload(mut config: RunConfig, workload: Workload) -> Self {
        config.size = workload.len();
        config.repeat = config.repeat.max(1);
        Self { config, workload }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn workload(&self) -> &Workload {
        &self.workload
    }

    /// Runs the configured built-in strategies.
    pub fn run(&self) -> RunReport {
        let entries: Vec<StrategyEntry> = self.config.strategies.iter().map(|k| k.entry()).collect();
        self.run_entries(&entries)
    }

    pub fn run_entries(&self, entries: &[StrategyEntry]) -> RunReport {
        info!(
            size = self.workload.len(),
            strategies = entries.len(),
            repeat = self.config.repeat,
            warmup = self.config.warmup,
            remove_index = self.config.remove_index(),
            "starting benchmark run"
        );

        let mut discarded = Vec::new();
        for iteration in 0..self.config.warmup {
            self.run_iteration(entries, iteration, &mut discarded);
            discarded.clear();
        }

        let mut measurements = Vec::with_capacity(entries.len() * Operation::PHASES.len() * self.config.repeat);
        for iteration in 0..self.config.repeat {
            self.run_iteration(entries, iteration, &mut measurements);
        }

        let report = RunReport {
            config: self.config.clone(),
            strategies: entries.iter().map(|e| e.name.clone()).collect(),
            measurements,
        };
        info!(
            measurements = report.measurements.len(),
            completed = report.completed_strategies().len(),
            "benchmark run finished"
        );
        report
    }

    fn run_iteration(&self, entries: &[StrategyEntry], iteration: usize, sink: &mut Vec<Measurement>) {
        let mut slots: Vec<Slot> = entries
            .iter()
            .map(|entry| {
                let strategy = match (entry.build)(&self.workload) {
                    Ok(strategy) => Some(strategy),
                    Err(err) => {
                        let err = match err {
                            e @ BenchError::StrategyInitFailed { .. } => e,
                            other => BenchError::StrategyInitFailed {
                                strategy: entry.name.clone(),
                                reason: other.to_string(),
                            },
                        };
                        warn!(strategy = %entry.name, error = %err, "strategy init failed");
                        sink.push(Measurement::failed(&entry.name, Operation::BulkSet, iteration, &err));
                        None
                    }
                };
                Slot {
                    name: entry.name.clone(),
                    strategy,
                }
            })
            .collect();

        for op in Operation::PHASES {
            for slot in slots.iter_mut() {
                let Some(strategy) = slot.strategy.as_deref_mut() else {
                    continue;
                };
                match self.execute(strategy, op) {
                    Ok(elapsed) => {
                        debug!(strategy = %slot.name, operation = %op, iteration, ?elapsed, "measured");
                        sink.push(Measurement::ok(&slot.name, op, iteration, elapsed));
                    }
                    Err(err) => {
                        warn!(strategy = %slot.name, operation = %op, iteration, error = %err, "strategy aborted");
                        sink.push(Measurement::failed(&slot.name, op, iteration, &err));
                        slot.strategy = None;
                    }
                }
            }
        }
    }

    /// Times one operation, then settles the strategy and checks the length
    /// invariant outside the timed interval.
    fn execute(&self, strategy: &mut dyn Strategy, op: Operation) -> Result<std::time::Duration, BenchError> {
        if !strategy.supports(op) {
            return Err(BenchError::UnsupportedOperation {
                strategy: strategy.name().to_string(),
                operation: op,
            });
        }

        let before = strategy.len();
        let timed = match op {
            Operation::BulkSet => {
                let items = self.workload.items();
                measure_with(|| strategy.bulk_set(items))
            }
            Operation::Append => {
                let item = self.config.append_item.clone();
                measure_with(|| strategy.append(item))
            }
            Operation::Remove => {
                let index = self.config.remove_index();
                measure_with(|| strategy.remove_at(index))
            }
        };
        timed.value?;
        strategy.settle();

        let expected = match op {
            Operation::BulkSet => self.workload.len(),
            Operation::Append => before + 1,
            Operation::Remove => before.saturating_sub(1),
        };
        let actual = strategy.len();
        if actual != expected {
            return Err(BenchError::InvariantViolated {
                operation: op,
                expected,
                actual,
            });
        }
        Ok(timed.elapsed)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::strategy::MutableStrategy;

    /// Mutable list that refuses appends.
    struct NoAppend(MutableStrategy);

    impl Strategy for NoAppend {
        fn name(&self) -> &str {
            "no-append"
        }
        fn bulk_set(&mut self, items: &[String]) -> Result<(), BenchError> {
            self.0.bulk_set(items)
        }
        fn append(&mut self, _item: String) -> Result<(), BenchError> {
            unreachable!("runner must not call unsupported operations")
        }
        fn remove_at(&mut self, index: usize) -> Result<(), BenchError> {
            self.0.remove_at(index)
        }
        fn len(&self) -> usize {
            self.0.len()
        }
        fn to_vec(&self) -> Vec<String> {
            self.0.to_vec()
        }
        fn supports(&self, op: Operation) -> bool {
            op != Operation::Append
        }
    }

    /// Claims success but drops appended items.
    struct LossyAppend(MutableStrategy);

    impl Strategy for LossyAppend {
        fn name(&self) -> &str {
            "lossy"
        }
        fn bulk_set(&mut self, items: &[String]) -> Result<(), BenchError> {
            self.0.bulk_set(items)
        }
        fn append(&mut self, _item: String) -> Result<(), BenchError> {
            Ok(())
        }
        fn remove_at(&mut self, index: usize) -> Result<(), BenchError> {
            self.0.remove_at(index)
        }
        fn len(&self) -> usize {
            self.0.len()
        }
        fn to_vec(&self) -> Vec<String> {
            self.0.to_vec()
        }
    }

    /// Mutable list whose settle step sleeps.
    struct SlowSettle(MutableStrategy);

    const SETTLE_DELAY: Duration = Duration::from_millis(30);

    impl Strategy for SlowSettle {
        fn name(&self) -> &str {
            "slow-settle"
        }
        fn bulk_set(&mut self, items: &[String]) -> Result<(), BenchError> {
            self.0.bulk_set(items)
        }
        fn append(&mut self, item: String) -> Result<(), BenchError> {
            self.0.append(item)
        }
        fn remove_at(&mut self, index: usize) -> Result<(), BenchError> {
            self.0.remove_at(index)
        }
        fn len(&self) -> usize {
            self.0.len()
        }
        fn to_vec(&self) -> Vec<String> {
            self.0.to_vec()
        }
        fn settle(&mut self) {
            std::thread::sleep(SETTLE_DELAY);
        }
    }

    fn failing_init() -> StrategyEntry {
        StrategyEntry::new("broken", |_| {
            Err(BenchError::StrategyInitFailed {
                strategy: "broken".to_string(),
                reason: "no backing store".to_string(),
            })
        })
    }

    fn ops_for(report: &RunReport, name: &str) -> Vec<(Operation, Option<FailureKind>)> {
        report
            .measurements
            .iter()
            .filter(|m| m.strategy == name)
            .map(|m| (m.operation, m.error))
            .collect()
    }

    #[test]
    fn phases_run_in_order_for_every_strategy() {
        let report = Runner::new(RunConfig::with_size(100)).run();
        let order: Vec<_> = report
            .measurements
            .iter()
            .map(|m| (m.operation, m.strategy.as_str()))
            .collect();
        let mut expected = Vec::new();
        for op in Operation::PHASES {
            for kind in StrategyKind::ALL {
                expected.push((op, kind.name()));
            }
        }
        assert_eq!(order, expected);
        assert!(report.measurements.iter().all(Measurement::is_ok));
        assert_eq!(report.completed_strategies().len(), StrategyKind::ALL.len());
    }

    #[test]
    fn out_of_range_removal_is_isolated() {
        let config = RunConfig {
            size: 10,
            remove_index: Some(11),
            strategies: vec![StrategyKind::Mutable, StrategyKind::Persistent],
            ..RunConfig::default()
        };
        let report = Runner::new(config).run();
        for name in ["mutable", "persistent"] {
            assert_eq!(
                ops_for(&report, name),
                vec![
                    (Operation::BulkSet, None),
                    (Operation::Append, None),
                    (Operation::Remove, Some(FailureKind::IndexOutOfRange)),
                ]
            );
        }
        assert!(report.completed_strategies().is_empty());
        assert!(!report.all_init_failed());
    }

    #[test]
    fn init_failure_does_not_stop_other_strategies() {
        let entries = vec![failing_init(), StrategyKind::Reducer.entry()];
        let report = Runner::new(RunConfig::with_size(5)).run_entries(&entries);
        assert_eq!(
            ops_for(&report, "broken"),
            vec![(Operation::BulkSet, Some(FailureKind::StrategyInitFailed))]
        );
        assert_eq!(ops_for(&report, "reducer").len(), 3);
        assert_eq!(report.completed_strategies(), vec!["reducer"]);
    }

    #[test]
    fn all_init_failed_detected() {
        let report = Runner::new(RunConfig::with_size(5)).run_entries(&[failing_init()]);
        assert!(report.all_init_failed());
        assert!(report.completed_strategies().is_empty());
    }

    #[test]
    fn unsupported_operation_aborts_remaining_phases() {
        let entries = vec![StrategyEntry::new("no-append", |w| {
            Ok(Box::new(NoAppend(MutableStrategy::new(w))) as Box<dyn Strategy>)
        })];
        let report = Runner::new(RunConfig::with_size(5)).run_entries(&entries);
        assert_eq!(
            ops_for(&report, "no-append"),
            vec![
                (Operation::BulkSet, None),
                (Operation::Append, Some(FailureKind::UnsupportedOperation)),
            ]
        );
    }

    #[test]
    fn length_invariant_violation_is_recorded() {
        let entries = vec![
            StrategyEntry::new("lossy", |w| Ok(Box::new(LossyAppend(MutableStrategy::new(w))) as Box<dyn Strategy>)),
            StrategyKind::Mutable.entry(),
        ];
        let report = Runner::new(RunConfig::with_size(5)).run_entries(&entries);
        assert_eq!(
            ops_for(&report, "lossy"),
            vec![
                (Operation::BulkSet, None),
                (Operation::Append, Some(FailureKind::InvariantViolated)),
            ]
        );
        assert_eq!(report.completed_strategies(), vec!["mutable"]);
    }

    #[test]
    fn repeat_builds_fresh_strategies_each_iteration() {
        let config = RunConfig {
            size: 20,
            repeat: 3,
            warmup: 2,
            strategies: vec![StrategyKind::CopyOnWrite],
            ..RunConfig::default()
        };
        let report = Runner::new(config).run();
        assert_eq!(report.measurements.len(), 9);
        let iterations: Vec<_> = report.measurements.iter().map(|m| m.iteration).collect();
        assert_eq!(iterations, vec![0, 0, 0, 1, 1, 1, 2, 2, 2]);
        assert_eq!(report.completed_strategies(), vec!["copy-on-write"]);
    }

    #[test]
    fn explicit_workload_overrides_size() {
        let runner = Runner::with_workload(RunConfig::with_size(999), Workload::generate(4));
        assert_eq!(runner.config().size, 4);
        assert_eq!(runner.config().remove_index(), 2);
        assert_eq!(runner.workload().len(), 4);
    }

    #[test]
    fn zero_repeat_runs_once() {
        let config = RunConfig {
            size: 5,
            repeat: 0,
            strategies: vec![StrategyKind::Mutable],
            ..RunConfig::default()
        };
        let runner = Runner::new(config);
        assert_eq!(runner.config().repeat, 1);
        let report = runner.run();
        assert_eq!(report.measurements.len(), 3);
        assert_eq!(report.completed_strategies(), vec!["mutable"]);
    }

    #[test]
    fn empty_report_has_no_completed_strategies() {
        let report = RunReport {
            config: RunConfig {
                repeat: 0,
                ..RunConfig::default()
            },
            strategies: vec!["mutable".to_string()],
            measurements: Vec::new(),
        };
        assert!(report.completed_strategies().is_empty());
    }

    #[test]
    fn remove_at_appended_tail_is_in_range() {
        let config = RunConfig {
            size: 5,
            remove_index: Some(5),
            ..RunConfig::default()
        };
        let report = Runner::new(config).run();
        assert_eq!(report.completed_strategies().len(), StrategyKind::ALL.len());
    }

    #[test]
    fn settle_is_excluded_from_timing() {
        let entries = vec![StrategyEntry::new("slow-settle", |w| {
            Ok(Box::new(SlowSettle(MutableStrategy::new(w))) as Box<dyn Strategy>)
        })];
        let report = Runner::new(RunConfig::with_size(10)).run_entries(&entries);
        assert_eq!(report.completed_strategies(), vec!["slow-settle"]);
        let limit = SETTLE_DELAY.as_secs_f64() * 1000.0;
        for m in &report.measurements {
            let ms = m.duration_ms.expect("measured");
            assert!(ms < limit, "{} took {ms}ms, settle leaked into timing", m.operation);
        }
    }
}
