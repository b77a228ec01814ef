use super::{Strategy, check_index};
use crate::error::BenchError;
use crate::workload::Workload;

/// Plain `Vec`, mutated in place.
#[derive(Debug, Default)]
pub struct MutableStrategy {
    items: Vec<String>,
}

impl MutableStrategy {
    pub fn new(workload: &Workload) -> Self {
        Self {
            items: Vec::with_capacity(workload.len() + 1),
        }
    }
}

impl Strategy for MutableStrategy {
    fn name(&self) -> &str {
        "mutable"
    }

    fn bulk_set(&mut self, items: &[String]) -> Result<(), BenchError> {
        self.items.clear();
        self.items.extend_from_slice(items);
        Ok(())
    }

    fn append(&mut self, item: String) -> Result<(), BenchError> {
        self.items.push(item);
        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> Result<(), BenchError> {
        check_index(index, self.items.len())?;
        self.items.remove(index);
        Ok(())
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn to_vec(&self) -> Vec<String> {
        self.items.clone()
    }
}
