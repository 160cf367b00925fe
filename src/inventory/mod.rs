//! Inventory module
//!
//! Derives the starting per-node quantities of a planning run from batch
//! records.

mod aggregator;

pub use aggregator::{InventoryAggregator, InventoryConfig, InventoryMaps, RawBatchRecord};
