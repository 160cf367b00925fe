//! In-memory record source.

use async_trait::async_trait;

use crate::directory::RawNodeRecord;
use crate::domain::ports::RecordSource;
use crate::error::Result;
use crate::inventory::RawBatchRecord;

/// Record source over owned vectors, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    nodes: Vec<RawNodeRecord>,
    batches: Vec<RawBatchRecord>,
}

impl InMemorySource {
    pub fn new(nodes: Vec<RawNodeRecord>, batches: Vec<RawBatchRecord>) -> Self {
        Self { nodes, batches }
    }

    pub fn with_node(mut self, node: RawNodeRecord) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_batch(mut self, batch: RawBatchRecord) -> Self {
        self.batches.push(batch);
        self
    }
}

#[async_trait]
impl RecordSource for InMemorySource {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn fetch_nodes(&self) -> Result<Vec<RawNodeRecord>> {
        Ok(self.nodes.clone())
    }

    async fn fetch_batches(&self) -> Result<Vec<RawBatchRecord>> {
        Ok(self.batches.clone())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
