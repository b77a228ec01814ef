//! Update strategies under comparison.
//!
//! Every strategy owns exactly one collection and exposes the same three
//! operations; they differ only in how a mutation is carried out.

mod cow;
mod mutable;
mod observable;
mod persistent;
mod reducer;
mod snapshot;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BenchError;
use crate::measure::Operation;
use crate::workload::Workload;

pub use cow::{CowStrategy, ListMutation};
pub use mutable::MutableStrategy;
pub use observable::{Change, ObservableList, ObservableStrategy};
pub use persistent::PersistentStrategy;
pub use reducer::{Action, ListState, Reducer, ReducerStrategy, Store, list_reducer};
pub use snapshot::{SnapshotStrategy, TodoList, TodoStore};

/// Collection under test, driven by the runner one operation at a time.
pub trait Strategy {
    fn name(&self) -> &str;

    /// Replaces the whole collection with `items`.
    fn bulk_set(&mut self, items: &[String]) -> Result<(), BenchError>;

    fn append(&mut self, item: String) -> Result<(), BenchError>;

    /// Removes the item at `index`. Out-of-range indexes fail and leave the
    /// collection untouched.
    fn remove_at(&mut self, index: usize) -> Result<(), BenchError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materializes the current collection.
    fn to_vec(&self) -> Vec<String>;

    fn supports(&self, _op: Operation) -> bool {
        true
    }

    /// Runs deferred side effects. Called outside the timed interval.
    fn settle(&mut self) {}
}

pub type BuildFn = Box<dyn Fn(&Workload) -> Result<Box<dyn Strategy>, BenchError>>;

/// Named constructor the runner invokes once per iteration.
pub struct StrategyEntry {
    pub name: String,
    pub build: BuildFn,
}

impl StrategyEntry {
    pub fn new<F>(name: impl Into<String>, build: F) -> Self
    where
        F: Fn(&Workload) -> Result<Box<dyn Strategy>, BenchError> + 'static,
    {
        Self {
            name: name.into(),
            build: Box::new(build),
        }
    }
}

impl fmt::Debug for StrategyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyEntry").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Mutable,
    CopyOnWrite,
    Persistent,
    TreeSnapshot,
    Observable,
    Reducer,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 6] = [
        StrategyKind::Mutable,
        StrategyKind::CopyOnWrite,
        StrategyKind::Persistent,
        StrategyKind::TreeSnapshot,
        StrategyKind::Observable,
        StrategyKind::Reducer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Mutable => "mutable",
            StrategyKind::CopyOnWrite => "copy-on-write",
            StrategyKind::Persistent => "persistent",
            StrategyKind::TreeSnapshot => "tree-snapshot",
            StrategyKind::Observable => "observable",
            StrategyKind::Reducer => "reducer",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StrategyKind::Mutable => "single Vec mutated in place",
            StrategyKind::CopyOnWrite => "new slice of shared Arc<str> items per operation, old value dropped",
            StrategyKind::Persistent => "structurally shared AVL list, O(log n) updates",
            StrategyKind::TreeSnapshot => "list inside a store tree, JSON snapshot after every mutation (timed)",
            StrategyKind::Observable => "change records queued per mutation, observers run untimed on settle",
            StrategyKind::Reducer => "actions dispatched through a pure reducer into a new state of shared items",
        }
    }

    pub fn build(self, workload: &Workload) -> Result<Box<dyn Strategy>, BenchError> {
        let strategy: Box<dyn Strategy> = match self {
            StrategyKind::Mutable => Box::new(MutableStrategy::new(workload)),
            StrategyKind::CopyOnWrite => Box::new(CowStrategy::new(workload)),
            StrategyKind::Persistent => Box::new(PersistentStrategy::new(workload)),
            StrategyKind::TreeSnapshot => Box::new(SnapshotStrategy::new(workload)?),
            StrategyKind::Observable => Box::new(ObservableStrategy::new(workload)),
            StrategyKind::Reducer => Box::new(ReducerStrategy::new(workload)),
        };
        Ok(strategy)
    }

    pub fn entry(self) -> StrategyEntry {
        StrategyEntry::new(self.name(), move |workload| self.build(workload))
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "mutable" | "in-place" => StrategyKind::Mutable,
            "copy-on-write" | "cow" | "spread" => StrategyKind::CopyOnWrite,
            "persistent" => StrategyKind::Persistent,
            "tree-snapshot" | "snapshot" => StrategyKind::TreeSnapshot,
            "observable" => StrategyKind::Observable,
            "reducer" | "redux" => StrategyKind::Reducer,
            other => {
                let known: Vec<_> = StrategyKind::ALL.iter().map(|k| k.name()).collect();
                return Err(format!("unknown strategy '{}' (expected one of: {})", other, known.join(", ")));
            }
        };
        Ok(kind)
    }
}

pub(crate) fn check_index(index: usize, len: usize) -> Result<(), BenchError> {
    if index < len {
        Ok(())
    } else {
        Err(BenchError::out_of_range(index, len))
    }
}
