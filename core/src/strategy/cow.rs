use std::sync::Arc;

use super::{Strategy, check_index};
use crate::error::BenchError;
use crate::workload::Workload;

/// Copy-on-write mutation guard over a shared slice.
///
/// The original slice is reused untouched when nothing was mutated; the first
/// write clones it into a scratch buffer that `finish` freezes into a new
/// `Arc`.
pub struct ListMutation<T> {
    original: Arc<[T]>,
    scratch: Option<Vec<T>>,
    reserve: usize,
}

impl<T: Clone> ListMutation<T> {
    pub fn new(list: Arc<[T]>) -> Self {
        Self {
            original: list,
            scratch: None,
            reserve: 0,
        }
    }

    /// Extra capacity to allocate when the scratch buffer is created.
    pub fn with_reserve(mut self, additional: usize) -> Self {
        self.reserve = additional;
        self
    }

    pub fn len(&self) -> usize {
        self.scratch
            .as_ref()
            .map(|v| v.len())
            .unwrap_or_else(|| self.original.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True while no write has forced a copy.
    pub fn is_pristine(&self) -> bool {
        self.scratch.is_none()
    }

    fn ensure_owned(&mut self) -> &mut Vec<T> {
        let original = &self.original;
        let reserve = self.reserve;
        self.scratch.get_or_insert_with(|| {
            let mut owned = Vec::with_capacity(original.len() + reserve);
            owned.extend(original.iter().cloned());
            owned
        })
    }

    pub fn push(&mut self, value: T) {
        self.ensure_owned().push(value);
    }

    pub fn remove(&mut self, index: usize) -> Result<T, BenchError> {
        check_index(index, self.len())?;
        Ok(self.ensure_owned().remove(index))
    }

    pub fn finish(self) -> Arc<[T]> {
        match self.scratch {
            Some(vec) => Arc::from(vec),
            None => self.original,
        }
    }
}

/// Every operation produces a fresh slice; the previous value is dropped.
/// Items are `Arc<str>`, so a copy clones handles rather than strings.
pub struct CowStrategy {
    list: Arc<[Arc<str>]>,
}

impl CowStrategy {
    pub fn new(_workload: &Workload) -> Self {
        Self {
            list: Arc::from(Vec::new()),
        }
    }
}

impl Strategy for CowStrategy {
    fn name(&self) -> &str {
        "copy-on-write"
    }

    fn bulk_set(&mut self, items: &[String]) -> Result<(), BenchError> {
        self.list = items.iter().map(|item| Arc::from(item.as_str())).collect();
        Ok(())
    }

    fn append(&mut self, item: String) -> Result<(), BenchError> {
        let mut guard = ListMutation::new(self.list.clone()).with_reserve(1);
        guard.push(Arc::from(item));
        self.list = guard.finish();
        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> Result<(), BenchError> {
        let mut guard = ListMutation::new(self.list.clone());
        guard.remove(index)?;
        self.list = guard.finish();
        Ok(())
    }

    fn len(&self) -> usize {
        self.list.len()
    }

    fn to_vec(&self) -> Vec<String> {
        self.list.iter().map(|item| item.to_string()).collect()
    }
}
