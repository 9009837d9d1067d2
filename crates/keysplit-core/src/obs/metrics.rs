//! Counter state accumulated from metrics events.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// MetricsReport
///
/// Point-in-time copy of everything a counting sink has recorded.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MetricsReport {
    pub ops: EventOps,
    pub tables: BTreeMap<String, EventCounters>,
}

impl MetricsReport {
    #[must_use]
    pub fn table(&self, table: &str) -> Option<&EventCounters> {
        self.tables.get(table)
    }
}

///
/// EventOps
///
/// Totals across every table.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Catalog
    pub catalog_lookups: u64,
    pub budgets_computed: u64,

    // Scans
    pub scans_started: u64,
    pub rows_scanned: u64,

    // Partitioning
    pub ranges_closed: u64,
    pub oversized_ranges: u64,
    pub partitions_finished: u64,
    pub pages_truncated: u64,
}

///
/// EventCounters
///
/// Per-table counters plus the most recent budget computed for the table.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventCounters {
    pub catalog_lookups: u64,
    pub budgets_computed: u64,
    pub scans_started: u64,
    pub rows_scanned: u64,
    pub ranges_closed: u64,
    pub oversized_ranges: u64,
    pub partitions_finished: u64,
    pub pages_truncated: u64,

    pub last_fanout: Option<u64>,
    pub last_batch_size: Option<u64>,
}

pub(crate) fn add(counter: &mut u64, n: u64) {
    *counter = counter.saturating_add(n);
}
