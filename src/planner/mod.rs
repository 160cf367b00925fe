//! Transfer Planner
//!
//! Turns node and batch records into transfer recommendations.
//!
//! # Architecture
//!
//! ```text
//!  RawNodeRecord ──▶ NodeDirectory ──┐
//!                                    ├──▶ WarehouseState ──▶ WarehouseRebalancer ──┐
//!  RawBatchRecord ─▶ Aggregator ─────┤         │ clone                             ├──▶ PlanReport
//!                                    │         └──────────▶ FarmRouter ────────────┘
//!                                    └──▶ FarmState ─────────────▲
//! ```
//!
//! The two passes never observe each other's provisional transfers: the
//! router works on its own clone of the warehouse states.

mod params;
mod rebalancer;
mod report;
mod router;
mod service;
mod state;

#[cfg(test)]
mod proptest;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::directory::{DirectoryConfig, Node, NodeDirectory, NodeFilter, RawNodeRecord};
use crate::error::{Error, Result};
use crate::inventory::{InventoryAggregator, InventoryConfig, RawBatchRecord};

pub use params::{PlanMode, PlanParameters};
pub use rebalancer::{Classification, Imbalance, RebalanceOutcome, WarehouseRebalancer};
pub use report::{NodeSnapshot, PlanCounts, PlanReport, TransferKind, TransferRecommendation};
pub use router::{FarmRouter, RoutingOutcome};
pub use service::PlanningService;
pub use state::{FarmState, WarehouseState};

// =============================================================================
// Configuration
// =============================================================================

/// Everything a planning run is parameterized by
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Which passes to run
    pub mode: PlanMode,

    /// Matching thresholds
    pub parameters: PlanParameters,

    /// Node normalization defaults
    pub directory: DirectoryConfig,

    /// Batch status handling
    pub inventory: InventoryConfig,
}

impl PlannerConfig {
    /// Parse a YAML document; missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        self.parameters.validate()?;
        if self.directory.default_warehouse_capacity_kg <= 0.0
            || self.directory.default_farm_capacity_kg <= 0.0
        {
            return Err(Error::Config(
                "default capacities must be positive".to_string(),
            ));
        }
        if self.inventory.active_statuses.is_empty() {
            return Err(Error::Config(
                "at least one active batch status is required".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Planner
// =============================================================================

/// Synchronous planning core.
///
/// Construction validates the configuration, so a planner that exists can
/// always produce a report.
#[derive(Debug, Clone)]
pub struct TransferPlanner {
    config: PlannerConfig,
    directory: NodeDirectory,
    aggregator: InventoryAggregator,
}

impl TransferPlanner {
    pub fn new(config: PlannerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            directory: NodeDirectory::new(config.directory.clone()),
            aggregator: InventoryAggregator::new(config.inventory.clone()),
            config,
        })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Build the initial per-run states for the nodes in scope.
    pub fn build_states(
        &self,
        nodes: &[RawNodeRecord],
        batches: &[RawBatchRecord],
        filter: &NodeFilter,
    ) -> (Vec<WarehouseState>, Vec<FarmState>) {
        let selected: Vec<Arc<Node>> = self.directory.select(nodes, filter);
        let maps = self.aggregator.aggregate(batches);

        let warehouses = selected
            .iter()
            .filter(|node| node.is_warehouse())
            .map(|node| WarehouseState::new(node.clone(), maps.inventory_of(&node.id)))
            .collect();
        let farms = selected
            .iter()
            .filter(|node| node.is_farm())
            .map(|node| FarmState::new(node.clone(), maps.supply_of(&node.id)))
            .collect();

        (warehouses, farms)
    }

    /// Plan with a freshly generated run id.
    pub fn plan(
        &self,
        nodes: &[RawNodeRecord],
        batches: &[RawBatchRecord],
        filter: &NodeFilter,
    ) -> PlanReport {
        self.plan_run(uuid::Uuid::new_v4().to_string(), nodes, batches, filter)
    }

    /// Plan under a caller-supplied run id.
    #[instrument(skip(self, nodes, batches, filter), fields(mode = %self.config.mode))]
    pub fn plan_run(
        &self,
        run_id: String,
        nodes: &[RawNodeRecord],
        batches: &[RawBatchRecord],
        filter: &NodeFilter,
    ) -> PlanReport {
        let (warehouses, farms) = self.build_states(nodes, batches, filter);
        let mode = self.config.mode;
        let params = &self.config.parameters;

        // Independent copy for the farm pass
        let warehouses_for_farms = warehouses.clone();

        let warehouse_recommendations = if mode.includes_warehouse_pass() {
            WarehouseRebalancer::new(params.clone())
                .plan(warehouses)
                .recommendations
        } else {
            Vec::new()
        };

        let farm_recommendations = if mode.includes_farm_pass() {
            FarmRouter::new(params.clone())
                .route(farms, warehouses_for_farms)
                .recommendations
        } else {
            Vec::new()
        };

        let report = PlanReport::assemble(
            run_id,
            mode,
            params.clone(),
            filter.clone(),
            warehouse_recommendations,
            farm_recommendations,
        );

        info!(
            run_id = %report.run_id,
            warehouse_to_warehouse = report.counts.warehouse_to_warehouse,
            farm_to_warehouse = report.counts.farm_to_warehouse,
            "Planning run complete"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn network() -> (Vec<RawNodeRecord>, Vec<RawBatchRecord>) {
        let nodes = vec![
            RawNodeRecord::new("wh-full", "warehouse")
                .with_capacity(10_000.0)
                .with_coordinates(10.0, 76.0),
            RawNodeRecord::new("wh-empty", "warehouse")
                .with_capacity(10_000.0)
                .with_coordinates(10.2, 76.0),
            RawNodeRecord::new("farm-1", "farm").with_coordinates(10.1, 76.0),
            RawNodeRecord::new("shop", "retailer").with_coordinates(10.1, 76.1),
        ];
        let batches = vec![
            RawBatchRecord::moved("farm-1", "wh-full", 9_000.0, "stored"),
            RawBatchRecord::at_origin("farm-1", 1_500.0, "stored"),
            RawBatchRecord::moved("farm-1", "shop", 700.0, "stored"),
        ];
        (nodes, batches)
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = PlannerConfig {
            parameters: PlanParameters {
                max_pairs: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_matches!(TransferPlanner::new(config), Err(Error::InvalidParameter { .. }));

        let no_statuses = PlannerConfig {
            inventory: InventoryConfig {
                active_statuses: Default::default(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_matches!(TransferPlanner::new(no_statuses), Err(Error::Config(_)));
    }

    #[test]
    fn test_build_states_splits_pools() {
        let (nodes, batches) = network();
        let planner = TransferPlanner::new(PlannerConfig::default()).unwrap();
        let (warehouses, farms) = planner.build_states(&nodes, &batches, &NodeFilter::new());

        assert_eq!(warehouses.len(), 2);
        assert_eq!(warehouses[0].inventory_kg, 9_000.0);
        assert_eq!(warehouses[1].inventory_kg, 0.0);
        assert_eq!(farms.len(), 1);
        assert_eq!(farms[0].supply_kg, 1_500.0);
    }

    #[test]
    fn test_passes_share_the_same_starting_snapshot() {
        let (nodes, batches) = network();
        let planner = TransferPlanner::new(PlannerConfig::default()).unwrap();
        let report = planner.plan(&nodes, &batches, &NodeFilter::new());

        assert_eq!(report.counts.warehouse_to_warehouse, 1);
        assert_eq!(report.warehouse_to_warehouse[0].suggested_quantity_kg, 3_000.0);

        // The farm pass still sees wh-empty at 0 kg despite the warehouse pass
        assert_eq!(report.counts.farm_to_warehouse, 1);
        let farm_rec = &report.farm_to_warehouse[0];
        assert_eq!(farm_rec.target.id, "wh-empty");
        assert_eq!(farm_rec.target.inventory_kg, 0.0);
        assert_eq!(farm_rec.suggested_quantity_kg, 1_500.0);
    }

    #[test]
    fn test_mode_selects_passes() {
        let (nodes, batches) = network();
        let only_farms = TransferPlanner::new(PlannerConfig {
            mode: PlanMode::FarmToWarehouse,
            ..Default::default()
        })
        .unwrap()
        .plan(&nodes, &batches, &NodeFilter::new());
        assert!(only_farms.warehouse_to_warehouse.is_empty());
        assert_eq!(only_farms.farm_to_warehouse.len(), 1);

        let only_warehouses = TransferPlanner::new(PlannerConfig {
            mode: PlanMode::WarehouseToWarehouse,
            ..Default::default()
        })
        .unwrap()
        .plan(&nodes, &batches, &NodeFilter::new());
        assert_eq!(only_warehouses.warehouse_to_warehouse.len(), 1);
        assert!(only_warehouses.farm_to_warehouse.is_empty());
    }

    #[test]
    fn test_filter_applies_before_classification() {
        let (nodes, batches) = network();
        let planner = TransferPlanner::new(PlannerConfig::default()).unwrap();
        let filter = NodeFilter::new().with_node_ids(["wh-full", "farm-1"]);
        let report = planner.plan(&nodes, &batches, &filter);

        assert!(report.warehouse_to_warehouse.is_empty());
        assert_eq!(report.farm_to_warehouse.len(), 0);
        assert_eq!(report.filters, filter);
    }

    #[test]
    fn test_empty_input_is_not_an_error() {
        let planner = TransferPlanner::new(PlannerConfig::default()).unwrap();
        let report = planner.plan(&[], &[], &NodeFilter::new());
        assert!(report.is_empty());
        assert_eq!(report.counts, PlanCounts::default());
    }

    #[test]
    fn test_yaml_config() {
        let config = PlannerConfig::from_yaml_str(
            "mode: farm_to_warehouse\nparameters:\n  max_pairs: 3\n  target_ratio: 0.7\ninventory:\n  active_statuses: [stored]\n",
        )
        .unwrap();
        assert_eq!(config.mode, PlanMode::FarmToWarehouse);
        assert_eq!(config.parameters.max_pairs, 3);
        assert_eq!(config.parameters.target_ratio, 0.7);
        assert_eq!(config.parameters.min_transfer_kg, 200.0);
        assert_eq!(config.directory, DirectoryConfig::default());
        assert_eq!(config.inventory.active_statuses.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_config_rejects_unknown_mode() {
        assert_matches!(
            PlannerConfig::from_yaml_str("mode: sideways\n"),
            Err(Error::Yaml(_))
        );
    }
}
