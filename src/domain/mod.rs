//! Domain Layer
//!
//! This module contains the value objects, ports and events shared by the
//! planner and its adapters.
//!
//! # Architecture
//!
//! - **Ports** (`ports.rs`) - Trait abstractions for record stores and event sinks
//! - **Events** (`events.rs`) - Domain events for audit and decoupling
//!
//! # Usage
//!
//! ```ignore
//! use freshflow::domain::ports::{EventPublisher, RecordSource};
//!
//! async fn load<S: RecordSource>(source: &S) -> Result<usize> {
//!     Ok(source.fetch_nodes().await?.len())
//! }
//! ```

pub mod events;
pub mod ports;

pub use events::DomainEvent;
pub use ports::{EventPublisher, GeoPoint, NodeId, NodeKind, RecordSource};
