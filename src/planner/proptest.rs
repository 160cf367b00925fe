//! Property-Based Tests for the Matching Passes
//!
//! # Test Properties
//!
//! 1. **Minimum Size**: every suggested quantity is at least `min_transfer_kg`
//! 2. **Bounded Output**: each category holds at most `max_pairs` entries
//! 3. **Capacity**: no target is filled beyond its capacity
//! 4. **Conservation**: nothing is moved twice or created out of thin air
//! 5. **Determinism**: the same input always yields the same recommendations

#![cfg(test)]

use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;

use super::{FarmRouter, FarmState, PlanParameters, WarehouseRebalancer, WarehouseState};
use crate::directory::Node;
use crate::domain::NodeKind;

const EPSILON: f64 = 1e-6;

// =============================================================================
// Property Strategies
// =============================================================================

/// Optional coordinates in a small region; `None` leaves the node unlocated.
fn location_strategy() -> impl Strategy<Value = Option<(f64, f64)>> {
    prop::option::weighted(0.85, (8.0f64..12.0, 74.0f64..78.0))
}

/// Warehouses with capacities up to 20 t, filled between 0% and 120%.
fn warehouses_strategy() -> impl Strategy<Value = Vec<WarehouseState>> {
    prop::collection::vec(
        (0.0f64..20_000.0, 0.0f64..1.2, location_strategy()),
        0..12,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (capacity, fill, location))| {
                let mut node = Node::new(format!("wh-{}", i), NodeKind::Warehouse, capacity);
                if let Some((lat, lon)) = location {
                    node = node.with_location(lat, lon);
                }
                WarehouseState::new(Arc::new(node), capacity * fill)
            })
            .collect()
    })
}

fn farms_strategy() -> impl Strategy<Value = Vec<FarmState>> {
    prop::collection::vec((0.0f64..6_000.0, location_strategy()), 0..8).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (supply, location))| {
                let mut node = Node::new(format!("farm-{}", i), NodeKind::Farm, 5_000.0);
                if let Some((lat, lon)) = location {
                    node = node.with_location(lat, lon);
                }
                FarmState::new(Arc::new(node), supply)
            })
            .collect()
    })
}

/// Valid parameter sets: 0 < understock < overstock <= 1, 0 < target <= 1.
fn params_strategy() -> impl Strategy<Value = PlanParameters> {
    (1usize..=8, 50.0f64..500.0, 0.05f64..0.5, 0.05f64..0.5, 0.1f64..=1.0).prop_map(
        |(max_pairs, min_transfer_kg, understock, gap, target_ratio)| PlanParameters {
            max_pairs,
            min_transfer_kg,
            understock_ratio: understock,
            overstock_ratio: (understock + gap).min(1.0),
            target_ratio,
        },
    )
}

// =============================================================================
// Warehouse Pass Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: quantities respect the minimum and the pair limit.
    #[test]
    fn prop_rebalance_respects_limits(
        params in params_strategy(),
        warehouses in warehouses_strategy(),
    ) {
        prop_assert!(params.validate().is_ok());
        let outcome = WarehouseRebalancer::new(params.clone()).plan(warehouses);

        prop_assert!(outcome.recommendations.len() <= params.max_pairs);
        for rec in &outcome.recommendations {
            prop_assert!(rec.suggested_quantity_kg >= params.min_transfer_kg - 0.01);
            prop_assert_ne!(&rec.source.id, &rec.target.id);
        }
    }

    /// Property: receiving warehouses never exceed capacity and total stock
    /// is conserved.
    #[test]
    fn prop_rebalance_conserves_stock(
        params in params_strategy(),
        warehouses in warehouses_strategy(),
    ) {
        let before: Vec<f64> = warehouses.iter().map(|w| w.inventory_kg).collect();
        let outcome = WarehouseRebalancer::new(params).plan(warehouses);

        let total_before: f64 = before.iter().sum();
        let total_after: f64 = outcome.warehouses.iter().map(|w| w.inventory_kg).sum();
        prop_assert!((total_before - total_after).abs() < EPSILON * (1.0 + total_before));

        for (state, initial) in outcome.warehouses.iter().zip(&before) {
            if state.inventory_kg > *initial + EPSILON {
                prop_assert!(state.inventory_kg <= state.capacity() + EPSILON);
            }
        }
    }

    /// Property: a warehouse is never both a source and a target, and no
    /// source gives away more than its surplus.
    #[test]
    fn prop_rebalance_no_double_counting(
        params in params_strategy(),
        warehouses in warehouses_strategy(),
    ) {
        let surplus: HashMap<String, f64> = warehouses
            .iter()
            .map(|w| {
                let target = params.target_inventory(w.capacity());
                (w.node.id.to_string(), (w.inventory_kg - target).max(0.0))
            })
            .collect();
        let outcome = WarehouseRebalancer::new(params).plan(warehouses);

        let mut sent: HashMap<&str, f64> = HashMap::new();
        for rec in &outcome.recommendations {
            *sent.entry(rec.source.id.as_str()).or_default() += rec.suggested_quantity_kg;
        }
        for rec in &outcome.recommendations {
            prop_assert!(!sent.contains_key(rec.target.id.as_str()));
        }
        for (id, total) in sent {
            prop_assert!(total <= surplus[id] + 0.01 * outcome.recommendations.len() as f64);
        }
    }

    /// Property: the pass is a pure function of its input.
    #[test]
    fn prop_rebalance_deterministic(
        params in params_strategy(),
        warehouses in warehouses_strategy(),
    ) {
        let rebalancer = WarehouseRebalancer::new(params);
        let first = rebalancer.plan(warehouses.clone()).recommendations;
        let second = rebalancer.plan(warehouses).recommendations;
        prop_assert_eq!(first, second);
    }
}

// =============================================================================
// Farm Pass Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: quantities respect the minimum, the pair limit and the
    /// warehouse capacities.
    #[test]
    fn prop_route_respects_limits(
        params in params_strategy(),
        farms in farms_strategy(),
        warehouses in warehouses_strategy(),
    ) {
        let before: Vec<f64> = warehouses.iter().map(|w| w.inventory_kg).collect();
        let outcome = FarmRouter::new(params.clone()).route(farms, warehouses);

        prop_assert!(outcome.recommendations.len() <= params.max_pairs);
        for rec in &outcome.recommendations {
            prop_assert!(rec.suggested_quantity_kg >= params.min_transfer_kg - 0.01);
        }
        for (state, initial) in outcome.warehouses.iter().zip(&before) {
            if state.inventory_kg > *initial + EPSILON {
                prop_assert!(state.inventory_kg <= state.capacity() + EPSILON);
            }
        }
    }

    /// Property: every kilogram routed is accounted for by exactly one farm.
    #[test]
    fn prop_route_conserves_supply(
        params in params_strategy(),
        farms in farms_strategy(),
        warehouses in warehouses_strategy(),
    ) {
        let supply_before: f64 = farms.iter().map(|f| f.supply_kg).sum();
        let stock_before: f64 = warehouses.iter().map(|w| w.inventory_kg).sum();
        let outcome = FarmRouter::new(params).route(farms, warehouses);

        let supply_after: f64 = outcome.farms.iter().map(|f| f.supply_kg).sum();
        let stock_after: f64 = outcome.warehouses.iter().map(|w| w.inventory_kg).sum();
        let moved = supply_before - supply_after;

        prop_assert!(moved >= -EPSILON);
        prop_assert!((stock_after - stock_before - moved).abs() < EPSILON * (1.0 + stock_after));
    }

    /// Property: the pass is a pure function of its input.
    #[test]
    fn prop_route_deterministic(
        params in params_strategy(),
        farms in farms_strategy(),
        warehouses in warehouses_strategy(),
    ) {
        let router = FarmRouter::new(params);
        let first = router.route(farms.clone(), warehouses.clone()).recommendations;
        let second = router.route(farms, warehouses).recommendations;
        prop_assert_eq!(first, second);
    }
}
