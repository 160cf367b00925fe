//! Node Directory
//!
//! Normalizes raw node records into typed [`Node`]s and applies scope
//! filters.

mod filter;
mod node;
mod record;

use std::sync::Arc;

use tracing::debug;

pub use filter::NodeFilter;
pub use node::{DirectoryConfig, Node};
pub use record::RawNodeRecord;
pub(crate) use record::{value_as_f64, value_as_string};

/// Normalizes and filters node records for one planning run.
#[derive(Debug, Clone, Default)]
pub struct NodeDirectory {
    config: DirectoryConfig,
}

impl NodeDirectory {
    pub fn new(config: DirectoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Normalize every record, then keep the nodes the filter accepts.
    ///
    /// Declaration order is preserved; it is the final tie-breaker of
    /// every ordering in the planner.
    pub fn select(&self, records: &[RawNodeRecord], filter: &NodeFilter) -> Vec<Arc<Node>> {
        let selected: Vec<Arc<Node>> = records
            .iter()
            .map(|record| Node::from_record(record, &self.config))
            .filter(|node| filter.matches(node))
            .map(Arc::new)
            .collect();

        debug!(
            total = records.len(),
            selected = selected.len(),
            warehouses = selected.iter().filter(|n| n.is_warehouse()).count(),
            farms = selected.iter().filter(|n| n.is_farm()).count(),
            "Normalized node records"
        );

        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_preserves_order_and_filters() {
        let records = vec![
            RawNodeRecord::new("wh-b", "warehouse").with_state("Goa"),
            RawNodeRecord::new("f-a", "farm").with_state("Kerala"),
            RawNodeRecord::new("wh-a", "warehouse").with_state("Kerala"),
        ];
        let directory = NodeDirectory::default();

        let all = directory.select(&records, &NodeFilter::new());
        let ids: Vec<&str> = all.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["wh-b", "f-a", "wh-a"]);

        let kerala = directory.select(&records, &NodeFilter::new().with_states(["kerala"]));
        let ids: Vec<&str> = kerala.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["f-a", "wh-a"]);
    }

    #[test]
    fn test_select_empty_input() {
        assert!(NodeDirectory::default()
            .select(&[], &NodeFilter::new())
            .is_empty());
    }
}
