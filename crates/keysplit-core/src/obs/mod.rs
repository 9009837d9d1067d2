//! Observability: planner telemetry and the sink abstraction.
//!
//! Core logic never holds metrics state itself. Every instrumentation point
//! emits a `MetricsEvent` into a sink the caller passes in.

pub mod metrics;
pub mod sink;

// re-exports
pub use metrics::{EventCounters, EventOps, MetricsReport};
pub use sink::{CountingSink, MetricsEvent, MetricsSink, NOOP_SINK, NoopSink};
