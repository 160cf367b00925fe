//! Event Publisher Adapters
//!
//! Sinks for planning events: the tracing log, an in-memory journal, a
//! JSON-lines file, and a fan-out over several sinks.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::domain::events::DomainEvent;
use crate::domain::ports::EventPublisher;
use crate::error::Result;

// =============================================================================
// Log Sink
// =============================================================================

/// Writes planning events to the tracing log as structured fields.
///
/// Run lifecycle events go out at info, rejections at warn. Individual
/// transfers go out at debug unless [`with_transfers`] is set.
///
/// [`with_transfers`]: LoggingEventPublisher::with_transfers
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventPublisher {
    transfers_at_info: bool,
}

impl LoggingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log every recommended transfer at info level.
    pub fn with_transfers(mut self) -> Self {
        self.transfers_at_info = true;
        self
    }

    fn log(&self, event: &DomainEvent) {
        match event {
            DomainEvent::PlanStarted {
                run_id,
                mode,
                node_count,
                batch_count,
                ..
            } => info!(
                run_id = %run_id,
                mode = %mode,
                nodes = *node_count,
                batches = *batch_count,
                "Plan started"
            ),
            DomainEvent::TransferRecommended {
                run_id,
                category,
                source_id,
                target_id,
                quantity_kg,
                distance_km,
                ..
            } => {
                if self.transfers_at_info {
                    info!(
                        run_id = %run_id,
                        kind = %category,
                        source = %source_id,
                        target = %target_id,
                        quantity_kg = *quantity_kg,
                        distance_km = ?distance_km,
                        "Transfer recommended"
                    );
                } else {
                    debug!(
                        run_id = %run_id,
                        kind = %category,
                        source = %source_id,
                        target = %target_id,
                        quantity_kg = *quantity_kg,
                        distance_km = ?distance_km,
                        "Transfer recommended"
                    );
                }
            }
            DomainEvent::PlanCompleted {
                run_id,
                warehouse_transfers,
                farm_transfers,
                total_quantity_kg,
                duration_ms,
                ..
            } => info!(
                run_id = %run_id,
                warehouse_to_warehouse = *warehouse_transfers,
                farm_to_warehouse = *farm_transfers,
                total_quantity_kg = *total_quantity_kg,
                duration_ms = *duration_ms,
                "Plan completed"
            ),
            DomainEvent::PlanRejected { reason, .. } => {
                warn!(reason = %reason, "Plan rejected")
            }
        }
    }
}

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish(&self, event: DomainEvent) -> Result<()> {
        self.log(&event);
        Ok(())
    }

    async fn publish_all(&self, events: Vec<DomainEvent>) -> Result<()> {
        events.iter().for_each(|event| self.log(event));
        Ok(())
    }
}

// =============================================================================
// In-Memory Journal
// =============================================================================

/// Keeps every published event in publication order.
#[derive(Debug, Default)]
pub struct InMemoryEventCollector {
    events: RwLock<Vec<DomainEvent>>,
}

impl InMemoryEventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.read().clone()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<DomainEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .cloned()
            .collect()
    }

    /// Kilograms recommended across all transfers of one run.
    pub fn recommended_kg(&self, run_id: &str) -> f64 {
        self.events
            .read()
            .iter()
            .filter_map(|e| match e {
                DomainEvent::TransferRecommended {
                    run_id: id,
                    quantity_kg,
                    ..
                } if id == run_id => Some(*quantity_kg),
                _ => None,
            })
            .sum()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventCollector {
    async fn publish(&self, event: DomainEvent) -> Result<()> {
        self.events.write().push(event);
        Ok(())
    }

    async fn publish_all(&self, events: Vec<DomainEvent>) -> Result<()> {
        self.events.write().extend(events);
        Ok(())
    }
}

// =============================================================================
// JSON Lines Sink
// =============================================================================

/// Appends one JSON document per event to a writer, flushing after each
/// publish call.
pub struct JsonLinesEventPublisher {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesEventPublisher {
    /// Create (or truncate) `path` and write events to it.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }

    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    fn write_events<'a>(&self, events: impl IntoIterator<Item = &'a DomainEvent>) -> Result<()> {
        let mut writer = self.writer.lock();
        for event in events {
            serde_json::to_writer(&mut *writer, event)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for JsonLinesEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesEventPublisher").finish_non_exhaustive()
    }
}

#[async_trait]
impl EventPublisher for JsonLinesEventPublisher {
    async fn publish(&self, event: DomainEvent) -> Result<()> {
        self.write_events([&event])
    }

    async fn publish_all(&self, events: Vec<DomainEvent>) -> Result<()> {
        self.write_events(&events)
    }
}

// =============================================================================
// Fan-Out
// =============================================================================

/// Delivers every event to each sink in registration order.
///
/// A failing sink does not stop delivery to the others; the first error
/// is returned once every sink has been tried.
#[derive(Default)]
pub struct CompositeEventPublisher {
    sinks: Vec<Box<dyn EventPublisher>>,
}

impl CompositeEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_publisher<P: EventPublisher + 'static>(mut self, publisher: P) -> Self {
        self.sinks.push(Box::new(publisher));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for CompositeEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeEventPublisher")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

fn first_failure(results: Vec<Result<()>>) -> Result<()> {
    let mut first = None;
    for result in results {
        if let Err(e) = result {
            warn!(error = %e, "Event sink failed");
            first.get_or_insert(e);
        }
    }
    first.map_or(Ok(()), Err)
}

#[async_trait]
impl EventPublisher for CompositeEventPublisher {
    async fn publish(&self, event: DomainEvent) -> Result<()> {
        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            results.push(sink.publish(event.clone()).await);
        }
        first_failure(results)
    }

    async fn publish_all(&self, events: Vec<DomainEvent>) -> Result<()> {
        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            results.push(sink.publish_all(events.clone()).await);
        }
        first_failure(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::planner::{PlanMode, TransferKind};
    use assert_matches::assert_matches;
    use std::sync::Arc;
    use std::time::Duration;

    fn transfer(run_id: &str, quantity_kg: f64) -> DomainEvent {
        DomainEvent::transfer_recommended(
            run_id,
            TransferKind::FarmToWarehouse,
            "farm-1",
            "wh-1",
            quantity_kg,
            Some(12.5),
        )
    }

    struct BrokenSink;

    #[async_trait]
    impl EventPublisher for BrokenSink {
        async fn publish(&self, _event: DomainEvent) -> Result<()> {
            Err(Error::Internal("sink offline".into()))
        }

        async fn publish_all(&self, _events: Vec<DomainEvent>) -> Result<()> {
            Err(Error::Internal("sink offline".into()))
        }
    }

    #[tokio::test]
    async fn test_logging_publisher_handles_every_event() {
        let publisher = LoggingEventPublisher::new().with_transfers();
        publisher
            .publish_all(vec![
                DomainEvent::plan_started("run-1", PlanMode::All, 3, 7),
                transfer("run-1", 400.0),
                DomainEvent::plan_completed("run-1", 0, 1, 400.0, Duration::from_millis(2)),
                DomainEvent::plan_rejected("max_pairs must be positive"),
            ])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_collector_sums_transfers_per_run() {
        let collector = InMemoryEventCollector::new();
        assert!(collector.is_empty());

        collector
            .publish(DomainEvent::plan_started("run-1", PlanMode::All, 2, 1))
            .await
            .unwrap();
        collector
            .publish_all(vec![
                transfer("run-1", 400.0),
                transfer("run-1", 250.5),
                transfer("run-2", 999.0),
            ])
            .await
            .unwrap();

        assert_eq!(collector.len(), 4);
        assert_eq!(collector.events()[0].event_type(), "PlanStarted");
        assert_eq!(collector.events_of_type("TransferRecommended").len(), 3);
        assert_eq!(collector.recommended_kg("run-1"), 650.5);
        assert_eq!(collector.recommended_kg("run-3"), 0.0);
    }

    #[tokio::test]
    async fn test_json_lines_file_holds_one_event_per_line() {
        let dir = std::env::temp_dir().join(format!("freshflow-events-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("events.jsonl");

        let publisher = JsonLinesEventPublisher::create(&path).unwrap();
        publisher
            .publish(DomainEvent::plan_started("run-1", PlanMode::FarmToWarehouse, 2, 2))
            .await
            .unwrap();
        publisher
            .publish_all(vec![transfer("run-1", 300.0), transfer("run-1", 200.0)])
            .await
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<DomainEvent> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].event_type(), "PlanStarted");
        assert_eq!(lines[2].run_id(), Some("run-1"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_composite_keeps_delivering_past_a_broken_sink() {
        let before = Arc::new(InMemoryEventCollector::new());
        let after = Arc::new(InMemoryEventCollector::new());
        let composite = CompositeEventPublisher::new()
            .with_publisher(before.clone())
            .with_publisher(BrokenSink)
            .with_publisher(after.clone());
        assert_eq!(composite.len(), 3);

        let result = composite
            .publish(DomainEvent::plan_rejected("bad ratio"))
            .await;
        assert_matches!(result, Err(Error::Internal(_)));
        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 1);

        let ok = CompositeEventPublisher::new()
            .with_publisher(LoggingEventPublisher::new())
            .with_publisher(after.clone());
        ok.publish_all(vec![transfer("run-9", 210.0)]).await.unwrap();
        assert_eq!(after.recommended_kg("run-9"), 210.0);
    }
}
