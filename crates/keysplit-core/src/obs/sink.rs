//! Metrics sink boundary.
//!
//! Budget and partition logic MUST NOT touch counter state directly.
//! All instrumentation flows through MetricsEvent and MetricsSink, and the
//! sink is always injected by the caller.
use crate::obs::metrics::{self, EventCounters, MetricsReport};
use std::sync::{Mutex, PoisonError};

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent<'a> {
    CatalogLookup {
        table: &'a str,
    },
    BudgetComputed {
        table: &'a str,
        fanout: u64,
        batch_size: u64,
    },
    ScanStart {
        table: &'a str,
        columns: &'a [String],
    },
    RowsScanned {
        table: &'a str,
        rows: u64,
    },
    RangeClosed {
        table: &'a str,
        row_count: u64,
    },
    OversizedRange {
        table: &'a str,
        row_count: u64,
        batch_size: u64,
    },
    PartitionFinish {
        table: &'a str,
        ranges: u64,
        rows: u64,
        limit_reached: bool,
    },
}

impl MetricsEvent<'_> {
    #[must_use]
    pub const fn table(&self) -> &str {
        match *self {
            Self::CatalogLookup { table }
            | Self::BudgetComputed { table, .. }
            | Self::ScanStart { table, .. }
            | Self::RowsScanned { table, .. }
            | Self::RangeClosed { table, .. }
            | Self::OversizedRange { table, .. }
            | Self::PartitionFinish { table, .. } => table,
        }
    }
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

impl<T> MetricsSink for &T
where
    T: MetricsSink + ?Sized,
{
    fn record(&self, event: MetricsEvent<'_>) {
        (**self).record(event);
    }
}

///
/// NoopSink
/// Default sink when the caller does not collect metrics.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn record(&self, _: MetricsEvent<'_>) {}
}

pub const NOOP_SINK: NoopSink = NoopSink;

///
/// CountingSink
/// Accumulates per-table counters. Safe to share across threads planning
/// different tables.
///

#[derive(Debug, Default)]
pub struct CountingSink {
    state: Mutex<MetricsReport>,
}

impl CountingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the counters recorded so far.
    #[must_use]
    pub fn report(&self) -> MetricsReport {
        self.with_state(|report| report.clone())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.with_state(|report| *report = MetricsReport::default());
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MetricsReport) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl MetricsSink for CountingSink {
    fn record(&self, event: MetricsEvent<'_>) {
        self.with_state(|m| {
            let ops = &mut m.ops;
            let entry = m.tables.entry(event.table().to_string()).or_default();

            match event {
                MetricsEvent::CatalogLookup { .. } => {
                    metrics::add(&mut ops.catalog_lookups, 1);
                    metrics::add(&mut entry.catalog_lookups, 1);
                }
                MetricsEvent::BudgetComputed {
                    fanout, batch_size, ..
                } => {
                    metrics::add(&mut ops.budgets_computed, 1);
                    metrics::add(&mut entry.budgets_computed, 1);
                    entry.last_fanout = Some(fanout);
                    entry.last_batch_size = Some(batch_size);
                }
                MetricsEvent::ScanStart { .. } => {
                    metrics::add(&mut ops.scans_started, 1);
                    metrics::add(&mut entry.scans_started, 1);
                }
                MetricsEvent::RowsScanned { rows, .. } => {
                    metrics::add(&mut ops.rows_scanned, rows);
                    metrics::add(&mut entry.rows_scanned, rows);
                }
                MetricsEvent::RangeClosed { .. } => {
                    metrics::add(&mut ops.ranges_closed, 1);
                    metrics::add(&mut entry.ranges_closed, 1);
                }
                MetricsEvent::OversizedRange { .. } => {
                    metrics::add(&mut ops.oversized_ranges, 1);
                    metrics::add(&mut entry.oversized_ranges, 1);
                }
                MetricsEvent::PartitionFinish { limit_reached, .. } => {
                    metrics::add(&mut ops.partitions_finished, 1);
                    metrics::add(&mut entry.partitions_finished, 1);
                    if limit_reached {
                        metrics::add(&mut ops.pages_truncated, 1);
                        metrics::add(&mut entry.pages_truncated, 1);
                    }
                }
            }
        });
    }
}

impl CountingSink {
    /// Counters for one table, if anything was recorded for it.
    #[must_use]
    pub fn table(&self, table: &str) -> Option<EventCounters> {
        self.with_state(|report| report.tables.get(table).cloned())
    }
}
