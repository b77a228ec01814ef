use serde::Serialize;
use serde_json::Value;

use super::{Strategy, check_index};
use crate::error::BenchError;
use crate::workload::Workload;

#[derive(Debug, Default, Clone, Serialize)]
pub struct TodoList {
    pub items: Vec<String>,
}

/// Store tree the list lives in.
#[derive(Debug, Default, Clone, Serialize)]
pub struct TodoStore {
    pub todos: TodoList,
    pub revision: u64,
}

type SnapshotListener = Box<dyn FnMut(&Value)>;

/// Collection nested inside [`TodoStore`]. Every mutation bumps the revision,
/// serializes the whole tree to JSON and hands the snapshot to each listener.
/// Snapshotting is part of the mutation, so it is inside the timed interval.
pub struct SnapshotStrategy {
    store: TodoStore,
    listeners: Vec<SnapshotListener>,
    last_snapshot: Value,
    snapshots: u64,
}

impl SnapshotStrategy {
    pub fn new(workload: &Workload) -> Result<Self, BenchError> {
        let store = TodoStore {
            todos: TodoList {
                items: Vec::with_capacity(workload.len() + 1),
            },
            revision: 0,
        };
        let initial = serde_json::to_value(&store).map_err(|e| BenchError::StrategyInitFailed {
            strategy: "tree-snapshot".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            store,
            listeners: Vec::new(),
            last_snapshot: initial,
            snapshots: 0,
        })
    }

    pub fn on_snapshot<F>(&mut self, listener: F)
    where
        F: FnMut(&Value) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn store(&self) -> &TodoStore {
        &self.store
    }

    pub fn last_snapshot(&self) -> &Value {
        &self.last_snapshot
    }

    /// Snapshots emitted since construction.
    pub fn snapshots(&self) -> u64 {
        self.snapshots
    }

    fn emit_snapshot(&mut self) -> Result<(), BenchError> {
        self.store.revision += 1;
        let snapshot = serde_json::to_value(&self.store).map_err(|e| BenchError::SnapshotFailed {
            reason: e.to_string(),
        })?;
        for listener in self.listeners.iter_mut() {
            listener(&snapshot);
        }
        self.last_snapshot = snapshot;
        self.snapshots += 1;
        Ok(())
    }
}

impl Strategy for SnapshotStrategy {
    fn name(&self) -> &str {
        "tree-snapshot"
    }

    fn bulk_set(&mut self, items: &[String]) -> Result<(), BenchError> {
        let todos = &mut self.store.todos.items;
        todos.clear();
        todos.extend_from_slice(items);
        self.emit_snapshot()
    }

    fn append(&mut self, item: String) -> Result<(), BenchError> {
        self.store.todos.items.push(item);
        self.emit_snapshot()
    }

    fn remove_at(&mut self, index: usize) -> Result<(), BenchError> {
        check_index(index, self.store.todos.items.len())?;
        self.store.todos.items.remove(index);
        self.emit_snapshot()
    }

    fn len(&self) -> usize {
        self.store.todos.items.len()
    }

    fn to_vec(&self) -> Vec<String> {
        self.store.todos.items.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn every_mutation_emits_one_snapshot() {
        let w = Workload::generate(3);
        let mut s = SnapshotStrategy::new(&w).expect("build snapshot strategy");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        s.on_snapshot(move |snap| sink.borrow_mut().push(snap["revision"].as_u64()));

        s.bulk_set(w.items()).unwrap();
        s.append("Item NNN".to_string()).unwrap();
        s.remove_at(0).unwrap();

        assert_eq!(s.snapshots(), 3);
        assert_eq!(*seen.borrow(), vec![Some(1), Some(2), Some(3)]);
        assert_eq!(s.last_snapshot()["todos"]["items"][0], "Item 1");
        assert_eq!(s.store().revision, 3);
    }

    #[test]
    fn failed_removal_emits_nothing() {
        let w = Workload::generate(1);
        let mut s = SnapshotStrategy::new(&w).unwrap();
        s.bulk_set(w.items()).unwrap();
        let err = s.remove_at(1).unwrap_err();
        assert_eq!(err, BenchError::IndexOutOfRange { index: 1, len: 1 });
        assert_eq!(s.snapshots(), 1);
        assert_eq!(s.last_snapshot()["revision"], 1);
    }
}
