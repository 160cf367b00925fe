//! Infrastructure Adapters
//!
//! Concrete implementations of the domain ports.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Domain Layer                          │
//! │  ┌────────────────────────────────────────────────────────┐ │
//! │  │                    Ports (Traits)                       │ │
//! │  │          RecordSource      │      EventPublisher        │ │
//! │  └────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Adapters (This Module)                     │
//! │  ┌────────────────────────────────────────────────────────┐ │
//! │  │ PayloadSource │ InMemorySource                          │ │
//! │  │ LoggingEventPublisher │ InMemoryEventCollector          │ │
//! │  │ JsonLinesEventPublisher │ CompositeEventPublisher       │ │
//! │  └────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use freshflow::adapters::{LoggingEventPublisher, PayloadSource};
//! use freshflow::{PlannerConfig, PlanningService};
//!
//! let source = PayloadSource::parse(&request_body);
//! let filter = source.filter().clone();
//! let service = PlanningService::new(PlannerConfig::default(), source, LoggingEventPublisher::new());
//! let report = service.run(&filter).await?;
//! ```

mod event_publisher;
mod memory;
mod payload;

pub use event_publisher::{
    CompositeEventPublisher, InMemoryEventCollector, JsonLinesEventPublisher, LoggingEventPublisher,
};
pub use memory::InMemorySource;
pub use payload::PayloadSource;
