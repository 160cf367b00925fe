//! Recommendation Assembler
//!
//! Output types consumed outside the planner, and the assembly of both
//! passes into one [`PlanReport`]. No planning decisions are made here.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::params::{PlanMode, PlanParameters};
use crate::directory::{Node, NodeFilter};
use crate::domain::{DomainEvent, GeoPoint};

/// Recommendation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    WarehouseToWarehouse,
    FarmToWarehouse,
}

impl std::fmt::Display for TransferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferKind::WarehouseToWarehouse => write!(f, "warehouse_to_warehouse"),
            TransferKind::FarmToWarehouse => write!(f, "farm_to_warehouse"),
        }
    }
}

// =============================================================================
// Rounding
// =============================================================================

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Ratio rendered as a percentage with one decimal.
pub(crate) fn format_pct(ratio: Option<f64>) -> Option<f64> {
    ratio
        .filter(|r| r.is_finite())
        .map(|r| round_to(r * 100.0, 1))
}

// =============================================================================
// Snapshots
// =============================================================================

/// A node as seen before and after one recommended transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeSnapshot {
    #[serde(rename = "mongoId")]
    pub id: String,

    #[serde(rename = "nodeId")]
    pub code: Option<String>,

    pub name: Option<String>,

    #[serde(rename = "type")]
    pub node_type: Option<String>,

    pub state: Option<String>,
    pub district: Option<String>,

    #[serde(rename = "regionId")]
    pub region_id: Option<String>,

    pub capacity_kg: f64,

    /// Quantity held before the transfer
    pub inventory_kg: f64,

    pub location: Option<GeoPoint>,

    pub projected_inventory_kg: f64,

    /// Room left after the transfer
    pub available_capacity_kg: f64,

    pub utilization_pct: Option<f64>,
    pub projected_utilization_pct: Option<f64>,

    /// Overstocked source: surplus above target before the transfer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excess_before_kg: Option<f64>,

    /// Receiving warehouse: gap to target before the transfer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortage_before_kg: Option<f64>,

    /// Farm source: supply left after the transfer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_supply_kg: Option<f64>,
}

impl NodeSnapshot {
    /// Snapshot a node moving from `before` to `after` kilograms.
    pub fn project(node: &Node, before: f64, after: f64) -> Self {
        let capacity = node.capacity_kg;
        let ratio = |quantity: f64| (capacity > 0.0).then(|| quantity / capacity);

        Self {
            id: node.id.to_string(),
            code: node.code.clone(),
            name: node.name.clone(),
            node_type: node.type_label.clone(),
            state: node.state.clone(),
            district: node.district.clone(),
            region_id: node.region_id.clone(),
            capacity_kg: round_to(capacity, 2),
            inventory_kg: round_to(before, 2),
            location: node.location,
            projected_inventory_kg: round_to(after, 2),
            available_capacity_kg: round_to((capacity - after).max(0.0), 2),
            utilization_pct: format_pct(ratio(before)),
            projected_utilization_pct: format_pct(ratio(after)),
            excess_before_kg: None,
            shortage_before_kg: None,
            remaining_supply_kg: None,
        }
    }

    pub fn with_excess(mut self, excess_kg: f64) -> Self {
        self.excess_before_kg = Some(round_to(excess_kg.max(0.0), 2));
        self
    }

    pub fn with_shortage(mut self, shortage_kg: f64) -> Self {
        self.shortage_before_kg = Some(round_to(shortage_kg.max(0.0), 2));
        self
    }

    pub fn with_remaining_supply(mut self, supply_kg: f64) -> Self {
        self.remaining_supply_kg = Some(round_to(supply_kg, 2));
        self
    }
}

/// One recommended movement of stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TransferRecommendation {
    #[serde(rename = "type")]
    pub kind: TransferKind,

    pub suggested_quantity_kg: f64,

    /// Great-circle distance; null when either end is unlocated
    pub distance_km: Option<f64>,

    pub source: NodeSnapshot,
    pub target: NodeSnapshot,

    pub notes: String,
}

impl TransferRecommendation {
    pub fn new(
        kind: TransferKind,
        quantity_kg: f64,
        distance_km: Option<f64>,
        source: NodeSnapshot,
        target: NodeSnapshot,
    ) -> Self {
        let notes = match kind {
            TransferKind::WarehouseToWarehouse => {
                "Balance utilization by shifting inventory from an overstocked warehouse to a low-utilization peer."
            }
            TransferKind::FarmToWarehouse => {
                "Route fresh harvest from farm to nearest warehouse with available capacity."
            }
        };
        Self {
            kind,
            suggested_quantity_kg: round_to(quantity_kg, 2),
            distance_km: distance_km.map(|d| round_to(d, 3)),
            source,
            target,
            notes: notes.to_string(),
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// Number of recommendations per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PlanCounts {
    pub warehouse_to_warehouse: usize,
    pub farm_to_warehouse: usize,
}

/// Result of one planning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub mode: PlanMode,
    pub parameters: PlanParameters,
    pub filters: NodeFilter,
    pub counts: PlanCounts,
    pub warehouse_to_warehouse: Vec<TransferRecommendation>,
    pub farm_to_warehouse: Vec<TransferRecommendation>,
}

impl PlanReport {
    /// Package both passes' outputs with the run inputs.
    pub fn assemble(
        run_id: impl Into<String>,
        mode: PlanMode,
        parameters: PlanParameters,
        filters: NodeFilter,
        warehouse_to_warehouse: Vec<TransferRecommendation>,
        farm_to_warehouse: Vec<TransferRecommendation>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            generated_at: Utc::now(),
            mode,
            parameters,
            filters,
            counts: PlanCounts {
                warehouse_to_warehouse: warehouse_to_warehouse.len(),
                farm_to_warehouse: farm_to_warehouse.len(),
            },
            warehouse_to_warehouse,
            farm_to_warehouse,
        }
    }

    /// All recommendations, warehouse pass first.
    pub fn recommendations(&self) -> impl Iterator<Item = &TransferRecommendation> {
        self.warehouse_to_warehouse
            .iter()
            .chain(self.farm_to_warehouse.iter())
    }

    pub fn total_quantity_kg(&self) -> f64 {
        round_to(
            self.recommendations().map(|r| r.suggested_quantity_kg).sum(),
            2,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.warehouse_to_warehouse.is_empty() && self.farm_to_warehouse.is_empty()
    }

    /// One `TransferRecommended` event per recommendation.
    pub fn recommendation_events(&self) -> Vec<DomainEvent> {
        self.recommendations()
            .map(|r| {
                DomainEvent::transfer_recommended(
                    self.run_id.clone(),
                    r.kind,
                    r.source.id.clone(),
                    r.target.id.clone(),
                    r.suggested_quantity_kg,
                    r.distance_km,
                )
            })
            .collect()
    }

    /// JSON Schema of the report, for downstream consumers.
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(PlanReport)
    }
}
