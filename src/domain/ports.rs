//! Domain Ports (DDD Port/Adapter Pattern)
//!
//! This module defines the core abstractions (ports) that the planner
//! depends on, together with the value objects shared across modules.
//! Infrastructure adapters implement these traits to provide concrete
//! record stores and event sinks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Domain Layer                            │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                    Ports (Traits)                    │    │
//! │  │        RecordSource      │      EventPublisher       │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Infrastructure Layer                       │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                  Adapters (Impls)                    │    │
//! │  │  PayloadSource │ InMemorySource │ LoggingPublisher  │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::events::DomainEvent;
use crate::directory::RawNodeRecord;
use crate::error::Result;
use crate::inventory::RawBatchRecord;

// =============================================================================
// Value Objects
// =============================================================================

/// Stable node identifier (value object).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Role a node plays in the network.
///
/// Only warehouses and farms take part in planning; everything else is
/// carried as `Other` and ignored by both passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Warehouse,
    Farm,
    Other,
}

impl NodeKind {
    /// Classify an already trimmed, lowercased type label.
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some("warehouse") => NodeKind::Warehouse,
            Some("farm") => NodeKind::Farm,
            _ => NodeKind::Other,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Warehouse => write!(f, "warehouse"),
            NodeKind::Farm => write!(f, "farm"),
            NodeKind::Other => write!(f, "other"),
        }
    }
}

/// Geographic coordinate in decimal degrees (value object).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Build a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }
        Some(Self { lat, lon })
    }
}

// =============================================================================
// Record Source Port
// =============================================================================

/// Port for reading node and batch records.
///
/// This trait abstracts the data-access collaborator (a document store,
/// a JSON payload handed over by a server, a test fixture). Records are
/// returned raw; normalization happens in the planner.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Fetch every node record.
    async fn fetch_nodes(&self) -> Result<Vec<RawNodeRecord>>;

    /// Fetch every batch / consignment record.
    async fn fetch_batches(&self) -> Result<Vec<RawBatchRecord>>;

    /// Check if the source is reachable.
    async fn health_check(&self) -> Result<bool>;
}

// =============================================================================
// Event Publisher Port
// =============================================================================

/// Port for publishing domain events.
///
/// This trait abstracts event publishing, allowing different backends
/// (logs, in-memory collectors, message buses) to be used.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a domain event.
    async fn publish(&self, event: DomainEvent) -> Result<()>;

    /// Publish multiple events.
    async fn publish_all(&self, events: Vec<DomainEvent>) -> Result<()>;
}

#[async_trait]
impl<P: EventPublisher + ?Sized> EventPublisher for std::sync::Arc<P> {
    async fn publish(&self, event: DomainEvent) -> Result<()> {
        (**self).publish(event).await
    }

    async fn publish_all(&self, events: Vec<DomainEvent>) -> Result<()> {
        (**self).publish_all(events).await
    }
}

// =============================================================================
// Tests
// =============================================================================
