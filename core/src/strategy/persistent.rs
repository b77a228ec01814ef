use super::Strategy;
use crate::error::BenchError;
use crate::plist::PList;
use crate::workload::Workload;

/// Versioned list on top of [`PList`]. The version replaced by the latest
/// operation is kept alive so it can be inspected after the fact.
#[derive(Debug, Default)]
pub struct PersistentStrategy {
    current: PList<String>,
    previous: Option<PList<String>>,
    versions: usize,
}

impl PersistentStrategy {
    pub fn new(_workload: &Workload) -> Self {
        Self::default()
    }

    pub fn current(&self) -> &PList<String> {
        &self.current
    }

    pub fn previous(&self) -> Option<&PList<String>> {
        self.previous.as_ref()
    }

    /// Number of versions produced so far.
    pub fn versions(&self) -> usize {
        self.versions
    }

    fn commit(&mut self, next: PList<String>) {
        self.previous = Some(std::mem::replace(&mut self.current, next));
        self.versions += 1;
    }
}

impl Strategy for PersistentStrategy {
    fn name(&self) -> &str {
        "persistent"
    }

    fn bulk_set(&mut self, items: &[String]) -> Result<(), BenchError> {
        self.commit(PList::from_slice(items));
        Ok(())
    }

    fn append(&mut self, item: String) -> Result<(), BenchError> {
        let next = self.current.push_back(item);
        self.commit(next);
        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> Result<(), BenchError> {
        let next = self.current.remove(index)?;
        self.commit(next);
        Ok(())
    }

    fn len(&self) -> usize {
        self.current.len()
    }

    fn to_vec(&self) -> Vec<String> {
        self.current.to_vec()
    }
}
