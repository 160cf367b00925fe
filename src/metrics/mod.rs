//! Metrics module
//!
//! Prometheus counters for planning runs, exported as a textfile.

mod recorder;

pub use recorder::PlannerMetrics;
