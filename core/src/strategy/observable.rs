use super::{Strategy, check_index};
use crate::error::BenchError;
use crate::workload::Workload;

/// Change record queued by an [`ObservableList`] mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Replaced { len: usize },
    Appended { index: usize },
    Removed { index: usize },
}

type Observer = Box<dyn FnMut(&Change, &[String])>;

/// List that records a [`Change`] per mutation and delivers the backlog to its
/// observers on [`ObservableList::flush`].
#[derive(Default)]
pub struct ObservableList {
    items: Vec<String>,
    observers: Vec<Observer>,
    pending: Vec<Change>,
}

impl ObservableList {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub fn observe<F>(&mut self, observer: F)
    where
        F: FnMut(&Change, &[String]) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn pending(&self) -> &[Change] {
        &self.pending
    }

    pub fn replace(&mut self, items: &[String]) {
        self.items.clear();
        self.items.extend_from_slice(items);
        self.pending.push(Change::Replaced { len: items.len() });
    }

    pub fn push(&mut self, item: String) {
        self.items.push(item);
        self.pending.push(Change::Appended {
            index: self.items.len() - 1,
        });
    }

    pub fn remove(&mut self, index: usize) -> Result<String, BenchError> {
        check_index(index, self.items.len())?;
        let removed = self.items.remove(index);
        self.pending.push(Change::Removed { index });
        Ok(removed)
    }

    /// Delivers every pending change to every observer, returning how many
    /// changes were delivered.
    pub fn flush(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        for change in &pending {
            for observer in self.observers.iter_mut() {
                observer(change, &self.items);
            }
        }
        pending.len()
    }
}

/// Strategy over an [`ObservableList`]. Only the mutation and its change
/// record are timed; observers run in `settle`, outside the timed interval.
pub struct ObservableStrategy {
    list: ObservableList,
    delivered: usize,
}

impl ObservableStrategy {
    pub fn new(workload: &Workload) -> Self {
        Self {
            list: ObservableList::with_capacity(workload.len() + 1),
            delivered: 0,
        }
    }

    pub fn list_mut(&mut self) -> &mut ObservableList {
        &mut self.list
    }

    /// Changes delivered to observers so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }
}

impl Strategy for ObservableStrategy {
    fn name(&self) -> &str {
        "observable"
    }

    fn bulk_set(&mut self, items: &[String]) -> Result<(), BenchError> {
        self.list.replace(items);
        Ok(())
    }

    fn append(&mut self, item: String) -> Result<(), BenchError> {
        self.list.push(item);
        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> Result<(), BenchError> {
        self.list.remove(index).map(drop)
    }

    fn len(&self) -> usize {
        self.list.items().len()
    }

    fn to_vec(&self) -> Vec<String> {
        self.list.items().to_vec()
    }

    fn settle(&mut self) {
        self.delivered += self.list.flush();
    }
}
