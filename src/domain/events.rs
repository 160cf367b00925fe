//! Domain Events
//!
//! This module defines domain events that represent significant occurrences
//! during a planning run. Events are immutable records of things that have
//! happened.
//!
//! # Usage
//!
//! Domain events are used for:
//! - Audit logging of recommendations
//! - Decoupling the planner from downstream consumers
//!
//! # Example
//!
//! ```ignore
//! let event = DomainEvent::plan_started("run-1", PlanMode::All, 12, 40);
//! event_publisher.publish(event).await?;
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::planner::{PlanMode, TransferKind};

/// Domain event representing a significant occurrence in a planning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    // =========================================================================
    // Run Lifecycle Events
    // =========================================================================
    /// A planning run started.
    PlanStarted {
        run_id: String,
        mode: String,
        node_count: usize,
        batch_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A planning run finished.
    PlanCompleted {
        run_id: String,
        warehouse_transfers: usize,
        farm_transfers: usize,
        total_quantity_kg: f64,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Run parameters were rejected before planning.
    PlanRejected {
        reason: String,
        timestamp: DateTime<Utc>,
    },

    // =========================================================================
    // Recommendation Events
    // =========================================================================
    /// A transfer was recommended.
    TransferRecommended {
        run_id: String,
        category: String,
        source_id: String,
        target_id: String,
        quantity_kg: f64,
        distance_km: Option<f64>,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            DomainEvent::PlanStarted { timestamp, .. } => *timestamp,
            DomainEvent::PlanCompleted { timestamp, .. } => *timestamp,
            DomainEvent::PlanRejected { timestamp, .. } => *timestamp,
            DomainEvent::TransferRecommended { timestamp, .. } => *timestamp,
        }
    }

    /// Get the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::PlanStarted { .. } => "PlanStarted",
            DomainEvent::PlanCompleted { .. } => "PlanCompleted",
            DomainEvent::PlanRejected { .. } => "PlanRejected",
            DomainEvent::TransferRecommended { .. } => "TransferRecommended",
        }
    }

    /// Get the run ID if applicable.
    pub fn run_id(&self) -> Option<&str> {
        match self {
            DomainEvent::PlanStarted { run_id, .. } => Some(run_id),
            DomainEvent::PlanCompleted { run_id, .. } => Some(run_id),
            DomainEvent::TransferRecommended { run_id, .. } => Some(run_id),
            DomainEvent::PlanRejected { .. } => None,
        }
    }
}

// =============================================================================
// Event Builders
// =============================================================================

impl DomainEvent {
    /// Create a PlanStarted event.
    pub fn plan_started(
        run_id: impl Into<String>,
        mode: PlanMode,
        node_count: usize,
        batch_count: usize,
    ) -> Self {
        DomainEvent::PlanStarted {
            run_id: run_id.into(),
            mode: mode.to_string(),
            node_count,
            batch_count,
            timestamp: Utc::now(),
        }
    }

    /// Create a PlanCompleted event.
    pub fn plan_completed(
        run_id: impl Into<String>,
        warehouse_transfers: usize,
        farm_transfers: usize,
        total_quantity_kg: f64,
        duration: Duration,
    ) -> Self {
        DomainEvent::PlanCompleted {
            run_id: run_id.into(),
            warehouse_transfers,
            farm_transfers,
            total_quantity_kg,
            duration_ms: duration.as_millis() as u64,
            timestamp: Utc::now(),
        }
    }

    /// Create a PlanRejected event.
    pub fn plan_rejected(reason: impl Into<String>) -> Self {
        DomainEvent::PlanRejected {
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a TransferRecommended event.
    pub fn transfer_recommended(
        run_id: impl Into<String>,
        category: TransferKind,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        quantity_kg: f64,
        distance_km: Option<f64>,
    ) -> Self {
        DomainEvent::TransferRecommended {
            run_id: run_id.into(),
            category: category.to_string(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            quantity_kg,
            distance_km,
            timestamp: Utc::now(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
