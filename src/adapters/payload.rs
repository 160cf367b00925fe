//! JSON Payload Source
//!
//! Implements the `RecordSource` port over a single request document of the
//! form `{"nodes": [...], "batches": [...], "filters": {...}}`.

use std::io::Read;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::directory::{NodeFilter, RawNodeRecord};
use crate::domain::ports::RecordSource;
use crate::error::Result;
use crate::inventory::RawBatchRecord;

/// Record source backed by a parsed request payload.
///
/// Parsing is lenient: an empty or malformed document becomes an empty
/// payload, and records that are not objects are skipped.
#[derive(Debug, Clone, Default)]
pub struct PayloadSource {
    nodes: Vec<RawNodeRecord>,
    batches: Vec<RawBatchRecord>,
    filter: NodeFilter,
}

impl PayloadSource {
    /// Parse a payload from text.
    pub fn parse(text: &str) -> Self {
        if text.trim().is_empty() {
            warn!("Empty payload, planning over no records");
            return Self::default();
        }
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                warn!(error = %e, "Payload is not valid JSON, planning over no records");
                Self::default()
            }
        }
    }

    /// Read the whole of `reader` and parse it.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(Self::parse(&text))
    }

    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            warn!("Payload is not a JSON object, planning over no records");
            return Self::default();
        };

        let nodes: Vec<RawNodeRecord> = records(object, "nodes");
        let batches: Vec<RawBatchRecord> = records(object, "batches");
        let filter = object
            .get("filters")
            .map(NodeFilter::from_value)
            .unwrap_or_default();

        debug!(
            nodes = nodes.len(),
            batches = batches.len(),
            "Parsed request payload"
        );

        Self {
            nodes,
            batches,
            filter,
        }
    }

    /// Filters carried by the payload.
    pub fn filter(&self) -> &NodeFilter {
        &self.filter
    }

    pub fn nodes(&self) -> &[RawNodeRecord] {
        &self.nodes
    }

    pub fn batches(&self) -> &[RawBatchRecord] {
        &self.batches
    }
}

fn records<T: DeserializeOwned>(object: &Map<String, Value>, key: &str) -> Vec<T> {
    let items = match object.get(key) {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => return Vec::new(),
        Some(_) => {
            warn!(key, "Payload field is not a list, treating as empty");
            return Vec::new();
        }
    };

    items
        .iter()
        .filter(|item| item.is_object())
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(key, error = %e, "Skipping unreadable record");
                None
            }
        })
        .collect()
}

#[async_trait]
impl RecordSource for PayloadSource {
    fn name(&self) -> &str {
        "payload"
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
