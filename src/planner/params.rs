//! Run parameters
//!
//! Every threshold the passes use lives here and is validated before any
//! computation starts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which recommendation categories a run computes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlanMode {
    #[default]
    All,
    WarehouseToWarehouse,
    FarmToWarehouse,
}

impl PlanMode {
    pub fn includes_warehouse_pass(&self) -> bool {
        matches!(self, PlanMode::All | PlanMode::WarehouseToWarehouse)
    }

    pub fn includes_farm_pass(&self) -> bool {
        matches!(self, PlanMode::All | PlanMode::FarmToWarehouse)
    }
}

impl std::fmt::Display for PlanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanMode::All => write!(f, "all"),
            PlanMode::WarehouseToWarehouse => write!(f, "warehouse_to_warehouse"),
            PlanMode::FarmToWarehouse => write!(f, "farm_to_warehouse"),
        }
    }
}

impl std::str::FromStr for PlanMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(PlanMode::All),
            "warehouse_to_warehouse" => Ok(PlanMode::WarehouseToWarehouse),
            "farm_to_warehouse" => Ok(PlanMode::FarmToWarehouse),
            other => Err(Error::invalid_parameter(
                "mode",
                format!(
                    "'{}' is not one of all, warehouse_to_warehouse, farm_to_warehouse",
                    other
                ),
            )),
        }
    }
}

/// Thresholds shared by both matching passes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PlanParameters {
    /// Maximum recommendations per category
    pub max_pairs: usize,

    /// Smallest transfer worth recommending, in kg
    pub min_transfer_kg: f64,

    /// Utilization above which a warehouse may be overstocked
    pub overstock_ratio: f64,

    /// Utilization below which a warehouse is understocked
    pub understock_ratio: f64,

    /// Utilization both passes move warehouses toward
    pub target_ratio: f64,
}

impl Default for PlanParameters {
    fn default() -> Self {
        Self {
            max_pairs: 5,
            min_transfer_kg: 200.0,
            overstock_ratio: 0.8,
            understock_ratio: 0.4,
            target_ratio: 0.6,
        }
    }
}

impl PlanParameters {
    /// Reject out-of-range or inconsistent thresholds.
    ///
    /// Comparisons are written so that NaN fails every check.
    pub fn validate(&self) -> Result<()> {
        if !(self.target_ratio > 0.0 && self.target_ratio <= 1.0) {
            return Err(Error::invalid_parameter(
                "target_ratio",
                format!("must be in (0, 1], got {}", self.target_ratio),
            ));
        }
        if !(0.0 < self.understock_ratio
            && self.understock_ratio < self.overstock_ratio
            && self.overstock_ratio <= 1.0)
        {
            return Err(Error::invalid_parameter(
                "understock_ratio/overstock_ratio",
                format!(
                    "ensure 0 < understock_ratio < overstock_ratio <= 1, got {} and {}",
                    self.understock_ratio, self.overstock_ratio
                ),
            ));
        }
        if !(self.min_transfer_kg > 0.0 && self.min_transfer_kg.is_finite()) {
            return Err(Error::invalid_parameter(
                "min_transfer_kg",
                format!("must be positive, got {}", self.min_transfer_kg),
            ));
        }
        if self.max_pairs == 0 {
            return Err(Error::invalid_parameter("max_pairs", "must be positive"));
        }
        Ok(())
    }

    /// Inventory level the passes aim for at a given capacity.
    pub fn target_inventory(&self, capacity_kg: f64) -> f64 {
        capacity_kg * self.target_ratio
    }
}
