//! Key-range partitioning over an ordered key scan.
//!
//! Rows arrive ascending by key. Consecutive rows sharing a key form a run;
//! runs accumulate into a window that closes into a `CountedKeyRange` once it
//! holds `batch_size` rows. A run is never split across two ranges, so a
//! prefix range delete never removes rows counted in a neighbouring range.

#[cfg(test)]
mod tests;

use crate::{
    db::{
        key::{CountedKeyRange, KeyValue},
        scan::{BudgetedRowStream, RowScanner, RowStream, ScanRequest, ScanRow},
    },
    error::{ErrorOrigin, InternalError},
    obs::{MetricsEvent, MetricsSink, NOOP_SINK},
    value::DecodedValue,
};
use std::cmp::Ordering;

///
/// PartitionPage
///
/// Result of one bounded scan. `resume_after` is set when the scan limit was
/// reached: the next page must scan strictly after that key. Rows of a
/// trailing run withheld from a truncated page are counted in
/// `rows_scanned` but appear in no range; the next page reads them again.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PartitionPage {
    pub ranges: Vec<CountedKeyRange>,
    pub rows_scanned: u64,
    pub resume_after: Option<KeyValue>,
}

impl PartitionPage {
    #[must_use]
    pub fn row_count(&self) -> u64 {
        self.ranges.iter().map(|range| range.row_count).sum()
    }

    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.resume_after.is_some()
    }
}

///
/// KeyRangePartitioner
///
/// Splits the ordered key space of one table into counted ranges of at most
/// `batch_size` rows. `scan_limit` caps rows read per page and is unrelated
/// to the batch size.
///

pub struct KeyRangePartitioner<'a> {
    scanner: &'a dyn RowScanner,
    sink: &'a dyn MetricsSink,
    batch_size: u64,
    scan_limit: Option<u64>,
    distinct_keys: bool,
}

impl<'a> KeyRangePartitioner<'a> {
    #[must_use]
    pub fn new(scanner: &'a dyn RowScanner, batch_size: u64) -> Self {
        Self {
            scanner,
            sink: &NOOP_SINK,
            batch_size,
            scan_limit: None,
            distinct_keys: false,
        }
    }

    #[must_use]
    pub const fn with_sink(mut self, sink: &'a dyn MetricsSink) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub const fn scan_limit(mut self, scan_limit: Option<u64>) -> Self {
        self.scan_limit = scan_limit;
        self
    }

    /// Declare that the key columns form the whole primary key, so every row
    /// carries a distinct key and truncated pages need not withhold rows.
    #[must_use]
    pub const fn distinct_keys(mut self, distinct: bool) -> Self {
        self.distinct_keys = distinct;
        self
    }

    #[must_use]
    pub const fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// Partition the first page of `table` by `key_columns`.
    ///
    /// Every scanned row lands in exactly one range. When the scan limit
    /// cuts the table short, the last key group is counted as far as it was
    /// read.
    pub fn partition(
        &self,
        table: &str,
        key_columns: &[String],
    ) -> Result<Vec<CountedKeyRange>, InternalError> {
        self.scan_page(table, key_columns, None, false)
            .map(|page| page.ranges)
    }

    /// Partition every page of `table`, re-issuing the scan after each
    /// truncated page until the key space is exhausted.
    pub fn partition_all(
        &self,
        table: &str,
        key_columns: &[String],
    ) -> Result<Vec<CountedKeyRange>, InternalError> {
        let mut ranges = Vec::new();
        let mut start_after = None;

        loop {
            let page = self.partition_page(table, key_columns, start_after.as_ref())?;
            ranges.extend(page.ranges);

            match page.resume_after {
                Some(key) => start_after = Some(key),
                None => return Ok(ranges),
            }
        }
    }

    /// Partition one page of `table`, scanning strictly after `start_after`.
    ///
    /// Unless keys are distinct, a truncated page withholds its last key
    /// group so the next page reads that group whole.
    pub fn partition_page(
        &self,
        table: &str,
        key_columns: &[String],
        start_after: Option<&KeyValue>,
    ) -> Result<PartitionPage, InternalError> {
        self.scan_page(table, key_columns, start_after, !self.distinct_keys)
    }

    fn scan_page(
        &self,
        table: &str,
        key_columns: &[String],
        start_after: Option<&KeyValue>,
        hold_trailing_run: bool,
    ) -> Result<PartitionPage, InternalError> {
        self.validate(table, key_columns, start_after)?;

        // One row past the limit shows whether the page was cut short.
        let request = ScanRequest {
            table: table.to_string(),
            columns: key_columns.to_vec(),
            start_after: start_after.cloned(),
            limit: self.scan_limit.map(|limit| limit.saturating_add(1)),
        };
        self.sink.record(MetricsEvent::ScanStart {
            table,
            columns: key_columns,
        });

        let mut stream = BudgetedRowStream::new(
            self.scanner.scan(&request)?,
            self.scan_limit.unwrap_or(u64::MAX),
        );

        let mut ranges = RangeAccumulator::new(table, self.batch_size, self.sink);
        let mut run: Option<Run> = None;
        let mut rows_scanned = 0_u64;

        while let Some(row) = stream.next_row()? {
            rows_scanned = rows_scanned.saturating_add(1);
            let key = decode_key(table, key_columns, row)?;

            let Some(current) = run.as_mut() else {
                if let Some(after) = start_after
                    && key.cmp_prefix(after).is_le()
                {
                    return Err(InternalError::scan_corruption(
                        table,
                        format!(
                            "scan of table '{table}' returned key {key} at or before resume key {after}"
                        ),
                    ));
                }
                run = Some(Run::new(key));
                continue;
            };

            match key.cmp(&current.key) {
                Ordering::Greater => {
                    let done = std::mem::replace(current, Run::new(key));
                    ranges.push_run(done);
                }
                Ordering::Equal if !self.distinct_keys => {
                    current.rows = current.rows.saturating_add(1);
                }
                Ordering::Equal => {
                    return Err(InternalError::scan_corruption(
                        table,
                        format!("scan of table '{table}' returned duplicate key {key}"),
                    ));
                }
                Ordering::Less => {
                    return Err(InternalError::scan_corruption(
                        table,
                        format!(
                            "scan of table '{table}' returned key {key} after {}",
                            current.key
                        ),
                    ));
                }
            }
        }

        let limit_reached = stream.is_truncated();

        if let Some(last) = run {
            if limit_reached && hold_trailing_run {
                // The trailing run continues past the limit.
                if ranges.is_empty() {
                    return Err(InternalError::invalid_argument(
                        ErrorOrigin::Partition,
                        format!(
                            "key group {} of table '{table}' does not fit in a scan limit of {} rows",
                            last.key, rows_scanned
                        ),
                    ));
                }
            } else {
                ranges.push_run(last);
            }
        }

        let ranges = ranges.finish();
        let resume_after = if limit_reached {
            ranges.last().map(|range| range.end.clone())
        } else {
            None
        };

        self.sink.record(MetricsEvent::RowsScanned {
            table,
            rows: rows_scanned,
        });
        self.sink.record(MetricsEvent::PartitionFinish {
            table,
            ranges: ranges.len() as u64,
            rows: rows_scanned,
            limit_reached,
        });

        Ok(PartitionPage {
            ranges,
            rows_scanned,
            resume_after,
        })
    }

    fn validate(
        &self,
        table: &str,
        key_columns: &[String],
        start_after: Option<&KeyValue>,
    ) -> Result<(), InternalError> {
        if key_columns.is_empty() {
            return Err(InternalError::invalid_argument(
                ErrorOrigin::Partition,
                format!("partitioning table '{table}' requires at least one key column"),
            ));
        }
        if self.batch_size == 0 {
            return Err(InternalError::invalid_argument(
                ErrorOrigin::Partition,
                format!("batch size for table '{table}' must be at least 1"),
            ));
        }
        if self.scan_limit == Some(0) {
            return Err(InternalError::invalid_argument(
                ErrorOrigin::Partition,
                format!("scan limit for table '{table}' must be at least 1"),
            ));
        }
        if let Some(after) = start_after
            && after.len() != key_columns.len()
        {
            return Err(InternalError::invalid_argument(
                ErrorOrigin::Partition,
                format!(
                    "resume key {after} of table '{table}' has {} components, expected {}",
                    after.len(),
                    key_columns.len()
                ),
            ));
        }

        Ok(())
    }
}

// Decode every key column of one row.
fn decode_key(table: &str, key_columns: &[String], row: ScanRow) -> Result<KeyValue, InternalError> {
    if row.cells.len() != key_columns.len() {
        return Err(InternalError::scan_internal(format!(
            "scan of table '{table}' returned {} cells for {} key columns",
            row.cells.len(),
            key_columns.len()
        )));
    }

    row.cells
        .iter()
        .zip(key_columns)
        .map(|(cell, column)| {
            cell.decode()
                .map_err(|err| InternalError::key_decode(table, column, err))
        })
        .collect::<Result<Vec<DecodedValue>, _>>()
        .map(KeyValue::new)
}

///
/// Run
/// Consecutive rows sharing one key.
///

struct Run {
    key: KeyValue,
    rows: u64,
}

impl Run {
    const fn new(key: KeyValue) -> Self {
        Self { key, rows: 1 }
    }
}

///
/// Window
///

struct Window {
    start: KeyValue,
    end: KeyValue,
    rows: u64,
}

///
/// RangeAccumulator
/// Packs complete runs into ranges of at most `batch_size` rows.
///

struct RangeAccumulator<'a> {
    table: &'a str,
    batch_size: u64,
    sink: &'a dyn MetricsSink,
    window: Option<Window>,
    ranges: Vec<CountedKeyRange>,
}

impl<'a> RangeAccumulator<'a> {
    fn new(table: &'a str, batch_size: u64, sink: &'a dyn MetricsSink) -> Self {
        Self {
            table,
            batch_size,
            sink,
            window: None,
            ranges: Vec::new(),
        }
    }

    const fn is_empty(&self) -> bool {
        self.window.is_none() && self.ranges.is_empty()
    }

    fn push_run(&mut self, run: Run) {
        // Close early rather than let the run push the window past the batch.
        if self
            .window
            .as_ref()
            .is_some_and(|w| w.rows.saturating_add(run.rows) > self.batch_size)
        {
            self.close();
        }

        match self.window.as_mut() {
            Some(window) => {
                window.end = run.key;
                window.rows = window.rows.saturating_add(run.rows);
            }
            None => {
                self.window = Some(Window {
                    start: run.key.clone(),
                    end: run.key,
                    rows: run.rows,
                });
            }
        }

        if self
            .window
            .as_ref()
            .is_some_and(|w| w.rows >= self.batch_size)
        {
            self.close();
        }
    }

    fn close(&mut self) {
        let Some(window) = self.window.take() else {
            return;
        };

        if window.rows > self.batch_size {
            self.sink.record(MetricsEvent::OversizedRange {
                table: self.table,
                row_count: window.rows,
                batch_size: self.batch_size,
            });
        }
        self.sink.record(MetricsEvent::RangeClosed {
            table: self.table,
            row_count: window.rows,
        });

        self.ranges.push(CountedKeyRange {
            start: window.start,
            end: window.end,
            row_count: window.rows,
        });
    }

    fn finish(mut self) -> Vec<CountedKeyRange> {
        self.close();
        self.ranges
    }
}
