//! Typed network nodes
//!
//! `Node` is the normalized, immutable view of a raw node record. All
//! permissive parsing and defaulting happens in [`Node::from_record`].

use serde::{Deserialize, Serialize};

use super::record::{value_as_coordinates, value_as_f64, value_as_string, RawNodeRecord};
use crate::domain::{GeoPoint, NodeId, NodeKind};

// =============================================================================
// Configuration
// =============================================================================

/// Defaults applied while normalizing node records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Capacity assumed for warehouses with no usable declared capacity
    pub default_warehouse_capacity_kg: f64,

    /// Capacity assumed for farms with no usable declared capacity
    pub default_farm_capacity_kg: f64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            default_warehouse_capacity_kg: 10_000.0,
            default_farm_capacity_kg: 5_000.0,
        }
    }
}

impl DirectoryConfig {
    /// Default capacity for a kind, if that kind has one.
    pub fn default_capacity(&self, kind: NodeKind) -> Option<f64> {
        match kind {
            NodeKind::Warehouse => Some(self.default_warehouse_capacity_kg),
            NodeKind::Farm => Some(self.default_farm_capacity_kg),
            NodeKind::Other => None,
        }
    }
}

// =============================================================================
// Node
// =============================================================================

/// A production, storage or other node in the supply network.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Stable identity (store object id, or the best available fallback)
    pub id: NodeId,

    /// External node code
    pub code: Option<String>,

    pub name: Option<String>,

    pub kind: NodeKind,

    /// Normalized type label as declared (lowercase); `None` when missing
    pub type_label: Option<String>,

    pub state: Option<String>,
    pub district: Option<String>,
    pub region_id: Option<String>,

    /// Capacity in kilograms, never negative
    pub capacity_kg: f64,

    pub location: Option<GeoPoint>,
}

impl Node {
    /// Create a node with no labels and no location.
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, capacity_kg: f64) -> Self {
        Self {
            id: id.into(),
            code: None,
            name: None,
            kind,
            type_label: Some(kind.to_string()),
            state: None,
            district: None,
            region_id: None,
            capacity_kg: capacity_kg.max(0.0),
            location: None,
        }
    }

    /// Set coordinates; invalid coordinates leave the node unlocated.
    pub fn with_location(mut self, lat: f64, lon: f64) -> Self {
        self.location = GeoPoint::new(lat, lon);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Normalize a raw record.
    ///
    /// Identity is the first non-empty of `_id`, `mongoId`, `nodeId`, `id`.
    /// Capacity falls back to the kind's default when absent, non-numeric
    /// or not positive.
    pub fn from_record(record: &RawNodeRecord, config: &DirectoryConfig) -> Self {
        let id = value_as_string(record.object_id.as_ref())
            .or_else(|| value_as_string(record.mongo_id.as_ref()))
            .or_else(|| value_as_string(record.node_id.as_ref()))
            .or_else(|| value_as_string(record.id.as_ref()))
            .unwrap_or_default();

        let type_label = match record.node_type.as_ref() {
            Some(serde_json::Value::String(s)) => {
                let cleaned = s.trim().to_lowercase();
                (!cleaned.is_empty()).then_some(cleaned)
            }
            _ => None,
        };
        let kind = NodeKind::from_label(type_label.as_deref());

        let declared = value_as_f64(record.capacity_kg.as_ref()).unwrap_or(0.0);
        let capacity_kg = match config.default_capacity(kind) {
            Some(default) if declared <= 0.0 => default,
            _ => declared.max(0.0),
        };

        let location = value_as_coordinates(record.location.as_ref())
            .and_then(|(lat, lon)| GeoPoint::new(lat, lon));

        Self {
            id: NodeId::new(id),
            code: value_as_string(record.node_id.as_ref()),
            name: value_as_string(record.name.as_ref()),
            kind,
            type_label,
            state: value_as_string(record.state.as_ref()),
            district: value_as_string(record.district.as_ref()),
            region_id: value_as_string(record.region_id.as_ref()),
            capacity_kg,
            location,
        }
    }

    pub fn is_located(&self) -> bool {
        self.location.is_some()
    }

    pub fn is_warehouse(&self) -> bool {
        self.kind == NodeKind::Warehouse
    }

    pub fn is_farm(&self) -> bool {
        self.kind == NodeKind::Farm
    }
}
