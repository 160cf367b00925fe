//! FreshFlow - Perishable Goods Transfer Planner
//!
//! Recommends physical transfers of stored produce across a network of
//! warehouses and farms: overstocked warehouses shed stock to understocked
//! ones, and unshipped farm supply is routed to warehouses below target.
//! Both passes prefer the geographically nearest counterpart.
//!
//! # Architecture
//!
//! ```text
//! RecordSource ─▶ NodeDirectory + InventoryAggregator ─▶ Rebalancer / Router ─▶ PlanReport
//!                                                                                  │
//!                                                          EventPublisher ◀────────┘
//! ```
//!
//! # Modules
//!
//! - [`adapters`] - Record sources and event publishers implementing domain ports
//! - [`directory`] - Node normalization and filtering
//! - [`domain`] - Domain layer with ports and events
//! - [`error`] - Error types
//! - [`geo`] - Great-circle distance
//! - [`inventory`] - Batch aggregation into per-node inventory and supply
//! - [`metrics`] - Prometheus run metrics
//! - [`planner`] - Matching passes, report assembly and the planning service

pub mod adapters;
pub mod directory;
pub mod domain;
pub mod error;
pub mod geo;
pub mod inventory;
pub mod metrics;
pub mod planner;

// Re-export commonly used types
pub use directory::{Node, NodeDirectory, NodeFilter, RawNodeRecord};
pub use error::{Error, Result};
pub use inventory::{InventoryAggregator, RawBatchRecord};
pub use metrics::PlannerMetrics;
pub use planner::{
    PlanMode, PlanParameters, PlanReport, PlannerConfig, PlanningService, TransferKind,
    TransferPlanner, TransferRecommendation,
};
