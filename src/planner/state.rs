//! Mutable per-run node state
//!
//! Each planning pass takes these by value and mutates them as transfers
//! are provisionally applied. A second, independent pass gets a clone.

use std::sync::Arc;

use crate::directory::Node;

/// A warehouse and the stock it holds during a planning run.
#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseState {
    pub node: Arc<Node>,
    pub inventory_kg: f64,
}

impl WarehouseState {
    pub fn new(node: Arc<Node>, inventory_kg: f64) -> Self {
        Self {
            node,
            inventory_kg: inventory_kg.max(0.0),
        }
    }

    pub fn capacity(&self) -> f64 {
        self.node.capacity_kg.max(0.0)
    }

    pub fn available_capacity(&self) -> f64 {
        (self.capacity() - self.inventory_kg).max(0.0)
    }

    /// Fraction of capacity in use; `None` for zero-capacity warehouses.
    pub fn utilization(&self) -> Option<f64> {
        let capacity = self.capacity();
        (capacity > 0.0).then(|| self.inventory_kg / capacity)
    }

    pub(crate) fn receive(&mut self, quantity_kg: f64) {
        self.inventory_kg += quantity_kg;
    }

    pub(crate) fn release(&mut self, quantity_kg: f64) {
        self.inventory_kg = (self.inventory_kg - quantity_kg).max(0.0);
    }
}

/// A farm and its unallocated production during a planning run.
#[derive(Debug, Clone, PartialEq)]
pub struct FarmState {
    pub node: Arc<Node>,
    pub supply_kg: f64,
}

impl FarmState {
    pub fn new(node: Arc<Node>, supply_kg: f64) -> Self {
        Self {
            node,
            supply_kg: supply_kg.max(0.0),
        }
    }
}
