//! Farm Router
//!
//! Routes unshipped farm supply to the nearest warehouses that sit below
//! their target inventory. Farms with the most supply go first.

use tracing::{debug, info, instrument};

use super::params::PlanParameters;
use super::report::{NodeSnapshot, TransferKind, TransferRecommendation};
use super::state::{FarmState, WarehouseState};
use crate::geo::{compare_distance, distance_km};

/// Output of the farm pass, including the mutated states.
#[derive(Debug, Clone)]
pub struct RoutingOutcome {
    pub recommendations: Vec<TransferRecommendation>,
    pub farms: Vec<FarmState>,
    pub warehouses: Vec<WarehouseState>,
}

/// Greedy farm-to-warehouse router.
#[derive(Debug, Clone)]
pub struct FarmRouter {
    params: PlanParameters,
}

impl FarmRouter {
    pub fn new(params: PlanParameters) -> Self {
        Self { params }
    }

    /// How much a warehouse can take before reaching its target, bounded
    /// by its free capacity. Zero for warehouses at or above target.
    pub fn receivable(&self, warehouse: &WarehouseState) -> f64 {
        let capacity = warehouse.capacity();
        if capacity <= 0.0 {
            return 0.0;
        }
        let target = self.params.target_inventory(capacity);
        if warehouse.inventory_kg >= target {
            return 0.0;
        }
        (target - warehouse.inventory_kg)
            .max(0.0)
            .min(warehouse.available_capacity())
    }

    /// Run the pass over farms and warehouses owned by this call.
    ///
    /// Each farm's remaining supply is written back as soon as its own
    /// matching finishes.
    #[instrument(skip_all, fields(farms = farms.len(), warehouses = warehouses.len()))]
    pub fn route(
        &self,
        mut farms: Vec<FarmState>,
        mut warehouses: Vec<WarehouseState>,
    ) -> RoutingOutcome {
        let max_pairs = self.params.max_pairs;
        let min_transfer = self.params.min_transfer_kg;

        let mut order: Vec<usize> = (0..farms.len())
            .filter(|&i| farms[i].supply_kg >= min_transfer)
            .collect();
        order.sort_by(|&a, &b| farms[b].supply_kg.total_cmp(&farms[a].supply_kg));

        debug!(
            eligible_farms = order.len(),
            excluded_farms = farms.len() - order.len(),
            "Ranked farms by supply"
        );

        let mut recommendations = Vec::new();

        for farm_index in order {
            if recommendations.len() >= max_pairs {
                break;
            }

            let farm_node = farms[farm_index].node.clone();
            let mut remaining = farms[farm_index].supply_kg;

            let mut candidates: Vec<(usize, Option<f64>)> = warehouses
                .iter()
                .enumerate()
                .map(|(i, w)| (i, distance_km(&farm_node, &w.node)))
                .collect();
            candidates.sort_by(|a, b| compare_distance(a.1, b.1));

            for (warehouse_index, distance) in candidates {
                if recommendations.len() >= max_pairs || remaining < min_transfer {
                    break;
                }

                let warehouse = &mut warehouses[warehouse_index];
                let receivable = self.receivable(warehouse);
                if receivable < min_transfer {
                    continue;
                }
                let quantity = remaining.min(receivable);
                if quantity < min_transfer {
                    continue;
                }

                let supply_before = remaining;
                let supply_after = (remaining - quantity).max(0.0);
                let target_before = warehouse.inventory_kg;
                let shortage_before = self.params.target_inventory(warehouse.capacity()) - target_before;
                warehouse.receive(quantity);

                debug!(
                    farm = %farm_node.id,
                    warehouse = %warehouse.node.id,
                    quantity_kg = quantity,
                    distance_km = ?distance,
                    "Routed farm supply"
                );

                recommendations.push(TransferRecommendation::new(
                    TransferKind::FarmToWarehouse,
                    quantity,
                    distance,
                    NodeSnapshot::project(&farm_node, supply_before, supply_after)
                        .with_remaining_supply(supply_after),
                    NodeSnapshot::project(&warehouse.node, target_before, warehouse.inventory_kg)
                        .with_shortage(shortage_before),
                ));

                remaining = supply_after;
            }

            farms[farm_index].supply_kg = remaining;
        }

        recommendations.truncate(max_pairs);
        info!(
            recommendations = recommendations.len(),
            "Farm routing complete"
        );

        RoutingOutcome {
            recommendations,
            farms,
            warehouses,
        }
    }
}
