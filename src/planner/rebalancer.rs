//! Warehouse Rebalancer
//!
//! Moves surplus from overstocked warehouses to understocked peers.
//!
//! # Pass
//!
//! 1. **Classify** every warehouse with capacity against the thresholds
//! 2. **Order** sources most-pressured first, targets most-starved first
//! 3. **Match** each source greedily with its nearest remaining targets
//!
//! The result is deterministic for a given input order but not globally
//! optimal: a source takes the nearest targets even if a later source
//! would have been closer to them.

use tracing::{debug, info, instrument};

use super::params::PlanParameters;
use super::report::{NodeSnapshot, TransferKind, TransferRecommendation};
use super::state::WarehouseState;
use crate::geo::{compare_distance, distance_km};

/// A warehouse's distance from its target inventory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Imbalance {
    /// Position in the warehouse list handed to the pass
    pub index: usize,

    /// Utilization at classification time
    pub utilization: f64,

    /// Surplus (sources) or shortage (targets) still unmatched, in kg
    pub remaining_kg: f64,
}

/// Warehouses eligible as sources and targets, in matching order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub overstocked: Vec<Imbalance>,
    pub understocked: Vec<Imbalance>,
}

/// Output of the warehouse pass, including the mutated states.
#[derive(Debug, Clone)]
pub struct RebalanceOutcome {
    pub recommendations: Vec<TransferRecommendation>,
    pub warehouses: Vec<WarehouseState>,
}

/// Greedy warehouse-to-warehouse matcher.
#[derive(Debug, Clone)]
pub struct WarehouseRebalancer {
    params: PlanParameters,
}

impl WarehouseRebalancer {
    pub fn new(params: PlanParameters) -> Self {
        Self { params }
    }

    /// Split warehouses into sources and targets.
    ///
    /// Zero-capacity warehouses are skipped. Imbalances below
    /// `min_transfer_kg` are dropped. Sources are ordered by utilization
    /// descending, targets ascending; equal utilizations keep input order.
    pub fn classify(&self, warehouses: &[WarehouseState]) -> Classification {
        let min_transfer = self.params.min_transfer_kg;
        let mut classification = Classification::default();

        for (index, state) in warehouses.iter().enumerate() {
            let Some(utilization) = state.utilization() else {
                continue;
            };
            let target = self.params.target_inventory(state.capacity());

            if utilization > self.params.overstock_ratio && state.inventory_kg > target {
                let surplus = state.inventory_kg - target;
                if surplus >= min_transfer {
                    classification.overstocked.push(Imbalance {
                        index,
                        utilization,
                        remaining_kg: surplus,
                    });
                }
            }

            if utilization < self.params.understock_ratio {
                let shortage = target - state.inventory_kg;
                if shortage >= min_transfer {
                    classification.understocked.push(Imbalance {
                        index,
                        utilization,
                        remaining_kg: shortage,
                    });
                }
            }
        }

        classification
            .overstocked
            .sort_by(|a, b| b.utilization.total_cmp(&a.utilization));
        classification
            .understocked
            .sort_by(|a, b| a.utilization.total_cmp(&b.utilization));

        classification
    }

    /// Run the pass over warehouses owned by this call.
    #[instrument(skip_all, fields(warehouses = warehouses.len()))]
    pub fn plan(&self, mut warehouses: Vec<WarehouseState>) -> RebalanceOutcome {
        let Classification {
            mut overstocked,
            mut understocked,
        } = self.classify(&warehouses);

        debug!(
            overstocked = overstocked.len(),
            understocked = understocked.len(),
            "Classified warehouses"
        );

        if overstocked.is_empty() || understocked.is_empty() {
            return RebalanceOutcome {
                recommendations: Vec::new(),
                warehouses,
            };
        }

        let max_pairs = self.params.max_pairs;
        let min_transfer = self.params.min_transfer_kg;
        let mut recommendations = Vec::new();

        for source in overstocked.iter_mut() {
            if recommendations.len() >= max_pairs {
                break;
            }

            let source_node = warehouses[source.index].node.clone();
            let mut candidates: Vec<(usize, Option<f64>)> = understocked
                .iter()
                .enumerate()
                .map(|(slot, target)| {
                    (slot, distance_km(&source_node, &warehouses[target.index].node))
                })
                .collect();
            // Stable: equal distances stay in ascending-utilization order
            candidates.sort_by(|a, b| compare_distance(a.1, b.1));

            for (slot, distance) in candidates {
                if recommendations.len() >= max_pairs || source.remaining_kg < min_transfer {
                    break;
                }

                let target = &mut understocked[slot];
                if target.remaining_kg < min_transfer {
                    continue;
                }

                let room = warehouses[target.index].available_capacity();
                let quantity = source.remaining_kg.min(target.remaining_kg).min(room);
                if quantity < min_transfer {
                    continue;
                }

                let source_before = warehouses[source.index].inventory_kg;
                let target_before = warehouses[target.index].inventory_kg;
                warehouses[source.index].release(quantity);
                warehouses[target.index].receive(quantity);

                let source_state = &warehouses[source.index];
                let target_state = &warehouses[target.index];
                let source_target = self.params.target_inventory(source_state.capacity());
                let target_target = self.params.target_inventory(target_state.capacity());

                debug!(
                    source = %source_state.node.id,
                    target = %target_state.node.id,
                    quantity_kg = quantity,
                    distance_km = ?distance,
                    "Matched overstocked warehouse"
                );

                recommendations.push(TransferRecommendation::new(
                    TransferKind::WarehouseToWarehouse,
                    quantity,
                    distance,
                    NodeSnapshot::project(&source_state.node, source_before, source_state.inventory_kg)
                        .with_excess(source_before - source_target),
                    NodeSnapshot::project(&target_state.node, target_before, target_state.inventory_kg)
                        .with_shortage(target_target - target_before),
                ));

                source.remaining_kg -= quantity;
                target.remaining_kg -= quantity;
            }
        }

        recommendations.truncate(max_pairs);
        info!(
            recommendations = recommendations.len(),
            "Warehouse rebalancing complete"
        );

        RebalanceOutcome {
            recommendations,
            warehouses,
        }
    }
}
