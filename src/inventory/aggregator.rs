//! Inventory Aggregator
//!
//! Folds batch / consignment records into per-node inventory and per-farm
//! unshipped supply.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::directory::{value_as_f64, value_as_string};
use crate::domain::NodeId;

// =============================================================================
// Configuration
// =============================================================================

/// Which batch statuses count toward inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Lowercase statuses that hold physical stock
    pub active_statuses: BTreeSet<String>,

    /// Status assumed for records that carry none
    pub assumed_status: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            active_statuses: BTreeSet::from(["stored".to_string(), "reserved".to_string()]),
            assumed_status: "stored".to_string(),
        }
    }
}

impl InventoryConfig {
    pub fn is_active(&self, status: &str) -> bool {
        self.active_statuses.contains(status)
    }
}

// =============================================================================
// Records
// =============================================================================

/// Batch record as delivered by the data-access collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBatchRecord {
    #[serde(rename = "batchId", default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<Value>,

    #[serde(rename = "originNode", default, skip_serializing_if = "Option::is_none")]
    pub origin_node: Option<Value>,

    #[serde(rename = "currentNode", default, skip_serializing_if = "Option::is_none")]
    pub current_node: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_quantity_kg: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_kg: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

impl RawBatchRecord {
    /// Batch sitting at `node` where it was produced.
    pub fn at_origin(node: &str, quantity_kg: f64, status: &str) -> Self {
        Self::moved(node, node, quantity_kg, status)
    }

    /// Batch produced at `origin` and now held at `current`.
    pub fn moved(origin: &str, current: &str, quantity_kg: f64, status: &str) -> Self {
        Self {
            origin_node: Some(Value::String(origin.to_string())),
            current_node: Some(Value::String(current.to_string())),
            quantity_kg: Some(Value::from(quantity_kg)),
            status: Some(Value::String(status.to_string())),
            ..Default::default()
        }
    }

    /// Node currently holding the batch, if the record names one.
    pub fn current(&self) -> Option<NodeId> {
        value_as_string(self.current_node.as_ref()).map(NodeId::new)
    }

    pub fn origin(&self) -> Option<NodeId> {
        value_as_string(self.origin_node.as_ref()).map(NodeId::new)
    }

    /// Quantity in kilograms; missing or non-numeric reads as zero.
    pub fn quantity(&self) -> f64 {
        let current = self.current_quantity_kg.as_ref().filter(|v| !v.is_null());
        let parsed = match current {
            Some(value) => value_as_f64(Some(value)),
            None => value_as_f64(self.quantity_kg.as_ref()),
        };
        parsed.unwrap_or(0.0)
    }

    /// Lowercased status, if the record carries one.
    pub fn status(&self) -> Option<String> {
        match self.status.as_ref() {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.trim().to_lowercase()),
            Some(other) => Some(other.to_string().to_lowercase()),
        }
    }
}

// =============================================================================
// Aggregation
// =============================================================================

/// Initial per-node quantities for one planning run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryMaps {
    /// Stock currently held, keyed by holding node
    pub inventory: BTreeMap<NodeId, f64>,

    /// Unshipped production, keyed by origin node
    pub supply: BTreeMap<NodeId, f64>,
}

impl InventoryMaps {
    pub fn inventory_of(&self, node: &NodeId) -> f64 {
        self.inventory.get(node).copied().unwrap_or(0.0)
    }

    pub fn supply_of(&self, node: &NodeId) -> f64 {
        self.supply.get(node).copied().unwrap_or(0.0)
    }
}

/// Optional batch fields carried by at least one record of a set.
///
/// Fallbacks are decided once per set: `originNode` stands in for the
/// holder, and the assumed status for the status, only when no record
/// carries the field at all. Otherwise a record lacking it is unheld or
/// inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldPresence {
    current_node: bool,
    status: bool,
}

impl FieldPresence {
    fn scan(batches: &[RawBatchRecord]) -> Self {
        Self {
            current_node: batches.iter().any(|b| b.current().is_some()),
            status: batches.iter().any(|b| b.status().is_some()),
        }
    }
}

/// Computes [`InventoryMaps`] from batch records.
#[derive(Debug, Clone, Default)]
pub struct InventoryAggregator {
    config: InventoryConfig,
}

impl InventoryAggregator {
    pub fn new(config: InventoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    #[instrument(skip_all, fields(batches = batches.len()))]
    pub fn aggregate(&self, batches: &[RawBatchRecord]) -> InventoryMaps {
        let presence = FieldPresence::scan(batches);
        let mut maps = InventoryMaps::default();
        let mut skipped = 0usize;

        for batch in batches {
            let status = if presence.status {
                batch.status()
            } else {
                Some(self.config.assumed_status.clone())
            };
            if !status.is_some_and(|s| self.config.is_active(&s)) {
                skipped += 1;
                continue;
            }

            let holder = if presence.current_node {
                batch.current()
            } else {
                batch.origin()
            };
            let Some(holder) = holder else {
                skipped += 1;
                continue;
            };
            let quantity = batch.quantity();

            if batch.origin().as_ref() == Some(&holder) {
                *maps.supply.entry(holder.clone()).or_insert(0.0) += quantity;
            }
            *maps.inventory.entry(holder).or_insert(0.0) += quantity;
        }

        debug!(
            holders = maps.inventory.len(),
            producers = maps.supply.len(),
            skipped,
            "Aggregated batch records"
        );

        maps
    }
}
