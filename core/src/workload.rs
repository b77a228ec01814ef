use std::sync::Arc;

pub const DEFAULT_SIZE: usize = 10_000;
pub const DEFAULT_APPEND_ITEM: &str = "Item NNN";

/// Read-only item sequence every strategy is built and bulk-set from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    items: Arc<[String]>,
}

impl Workload {
    /// `Item 0` .. `Item {size - 1}`.
    pub fn generate(size: usize) -> Self {
        Self::from_items((0..size).map(|i| format!("Item {i}")))
    }

    pub fn from_items<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Workload {
    fn default() -> Self {
        Self::generate(DEFAULT_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_is_deterministic() {
        let w = Workload::generate(3);
        assert_eq!(w.items(), ["Item 0", "Item 1", "Item 2"]);
        assert_eq!(w, Workload::generate(3));
    }

    #[test]
    fn default_uses_ten_thousand_items() {
        let w = Workload::default();
        assert_eq!(w.len(), DEFAULT_SIZE);
        assert_eq!(w.items().last().map(String::as_str), Some("Item 9999"));
    }

    #[test]
    fn empty_workload() {
        let w = Workload::generate(0);
        assert!(w.is_empty());
    }
}
