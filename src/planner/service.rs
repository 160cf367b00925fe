//! Planning Service
//!
//! Drives one planning run end to end: validates the configuration,
//! fetches records through the [`RecordSource`] port, runs the synchronous
//! planner and publishes the outcome as domain events.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use super::{PlanReport, PlannerConfig, TransferPlanner};
use crate::directory::NodeFilter;
use crate::domain::{DomainEvent, EventPublisher, RecordSource};
use crate::error::Result;
use crate::metrics::PlannerMetrics;

/// Runs planning passes against a record source.
pub struct PlanningService<S, P> {
    config: PlannerConfig,
    source: S,
    publisher: P,
    metrics: Option<Arc<PlannerMetrics>>,
}

impl<S, P> PlanningService<S, P>
where
    S: RecordSource,
    P: EventPublisher,
{
    pub fn new(config: PlannerConfig, source: S, publisher: P) -> Self {
        Self {
            config,
            source,
            publisher,
            metrics: None,
        }
    }

    /// Record every run in the given metrics registry.
    pub fn with_metrics(mut self, metrics: Arc<PlannerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Execute one planning run.
    ///
    /// Invalid parameters are rejected before the source is touched.
    pub async fn run(&self, filter: &NodeFilter) -> Result<PlanReport> {
        let planner = match TransferPlanner::new(self.config.clone()) {
            Ok(planner) => planner,
            Err(e) => {
                error!("Rejected planning parameters: {}", e);
                if let Some(metrics) = &self.metrics {
                    metrics.record_rejection();
                }
                self.publisher
                    .publish(DomainEvent::plan_rejected(e.to_string()))
                    .await?;
                return Err(e);
            }
        };

        let nodes = self.source.fetch_nodes().await?;
        let batches = self.source.fetch_batches().await?;
        if nodes.is_empty() {
            warn!(source = self.source.name(), "Record source returned no nodes");
        }

        let run_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        info!(
            run_id = %run_id,
            source = self.source.name(),
            nodes = nodes.len(),
            batches = batches.len(),
            "Starting planning run"
        );
        self.publisher
            .publish(DomainEvent::plan_started(
                run_id.clone(),
                self.config.mode,
                nodes.len(),
                batches.len(),
            ))
            .await?;

        let report = planner.plan_run(run_id, &nodes, &batches, filter);

        self.publisher
            .publish_all(report.recommendation_events())
            .await?;
        self.publisher
            .publish(DomainEvent::plan_completed(
                report.run_id.clone(),
                report.counts.warehouse_to_warehouse,
                report.counts.farm_to_warehouse,
                report.total_quantity_kg(),
                started.elapsed(),
            ))
            .await?;

        if let Some(metrics) = &self.metrics {
            metrics.record(&report, started.elapsed());
        }

        Ok(report)
    }
}
