//! Planner Metrics
//!
//! Prometheus counters for planning runs. The planner is a batch job, so
//! instead of serving `/metrics` the registry is rendered in text format
//! and written to a file for a node-exporter textfile collector.

use std::path::Path;
use std::time::Duration;

use prometheus::{
    Encoder, GaugeVec, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use tracing::debug;

use crate::error::Result;
use crate::planner::{PlanReport, TransferKind};

const CATEGORIES: [TransferKind; 2] = [
    TransferKind::WarehouseToWarehouse,
    TransferKind::FarmToWarehouse,
];

/// Metrics for planning runs, held in a private registry.
#[derive(Clone)]
pub struct PlannerMetrics {
    registry: Registry,
    runs_total: IntCounter,
    rejected_total: IntCounter,
    recommendations_total: IntCounterVec,
    recommended_kg: GaugeVec,
    run_duration: Histogram,
}

impl std::fmt::Debug for PlannerMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlannerMetrics")
            .field("runs_total", &self.runs_total.get())
            .field("rejected_total", &self.rejected_total.get())
            .finish()
    }
}

impl PlannerMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let runs_total = IntCounter::new(
            "freshflow_plan_runs_total",
            "Total number of completed planning runs",
        )?;
        let rejected_total = IntCounter::new(
            "freshflow_plan_rejected_total",
            "Total number of runs rejected during parameter validation",
        )?;
        let recommendations_total = IntCounterVec::new(
            Opts::new(
                "freshflow_recommendations_total",
                "Total number of transfer recommendations",
            ),
            &["category"],
        )?;
        let recommended_kg = GaugeVec::new(
            Opts::new(
                "freshflow_recommended_kg",
                "Kilograms recommended for transfer by the latest run",
            ),
            &["category"],
        )?;
        let run_duration = Histogram::with_opts(
            HistogramOpts::new(
                "freshflow_plan_duration_seconds",
                "Wall-clock duration of planning runs",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;

        registry.register(Box::new(runs_total.clone()))?;
        registry.register(Box::new(rejected_total.clone()))?;
        registry.register(Box::new(recommendations_total.clone()))?;
        registry.register(Box::new(recommended_kg.clone()))?;
        registry.register(Box::new(run_duration.clone()))?;

        for category in CATEGORIES {
            let label = category.to_string();
            recommendations_total.with_label_values(&[label.as_str()]);
            recommended_kg.with_label_values(&[label.as_str()]).set(0.0);
        }

        Ok(Self {
            registry,
            runs_total,
            rejected_total,
            recommendations_total,
            recommended_kg,
            run_duration,
        })
    }

    /// Record a completed run.
    pub fn record(&self, report: &PlanReport, elapsed: Duration) {
        self.runs_total.inc();
        self.run_duration.observe(elapsed.as_secs_f64());

        for category in CATEGORIES {
            let label = category.to_string();
            let (count, kg) = report
                .recommendations()
                .filter(|r| r.kind == category)
                .fold((0u64, 0.0), |(n, kg), r| (n + 1, kg + r.suggested_quantity_kg));

            self.recommendations_total
                .with_label_values(&[label.as_str()])
                .inc_by(count);
            self.recommended_kg
                .with_label_values(&[label.as_str()])
                .set(kg);
        }
    }

    pub fn record_rejection(&self) {
        self.rejected_total.inc();
    }

    pub fn completed_runs(&self) -> u64 {
        self.runs_total.get()
    }

    pub fn rejected_runs(&self) -> u64 {
        self.rejected_total.get()
    }

    /// Recommendations counted so far for a category label.
    pub fn recommendations(&self, category: &str) -> u64 {
        self.recommendations_total
            .get_metric_with_label_values(&[category])
            .map(|c| c.get())
            .unwrap_or(0)
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| crate::error::Error::Internal(format!("metrics are not UTF-8: {}", e)))
    }

    /// Atomically replace `path` with the rendered metrics.
    pub fn write_textfile(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let rendered = self.render()?;
        let tmp = path.with_extension("prom.tmp");
        std::fs::write(&tmp, rendered)?;
        std::fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "Wrote metrics textfile");
        Ok(())
    }
}
