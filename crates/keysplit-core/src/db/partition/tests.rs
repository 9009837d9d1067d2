use super::*;
use crate::{
    db::{
        UNBOUNDED_BATCH_SIZE,
        memory::MemoryTable,
        scan::{RowStreamBox, VecRowStream},
    },
    error::{ErrorClass, ErrorDetail},
    obs::CountingSink,
    value::{ColumnType, RawCell, TypeCode},
};
use proptest::prelude::*;
use serde_json::json;

///
/// StaticScanner
///
/// Replays a fixed row list regardless of the request, optionally failing
/// with a transient error before the row at `fail_at`.
///

struct StaticScanner {
    rows: Vec<ScanRow>,
    fail_at: Option<usize>,
}

impl StaticScanner {
    fn new(rows: Vec<ScanRow>) -> Self {
        Self {
            rows,
            fail_at: None,
        }
    }
}

impl RowScanner for StaticScanner {
    fn scan(&self, request: &ScanRequest) -> Result<RowStreamBox<'_>, InternalError> {
        match self.fail_at {
            None => Ok(Box::new(VecRowStream::new(self.rows.clone()))),
            Some(fail_at) => Ok(Box::new(FailingStream {
                table: request.table.clone(),
                rows: VecRowStream::new(self.rows.clone()),
                emitted: 0,
                fail_at,
            })),
        }
    }
}

struct FailingStream {
    table: String,
    rows: VecRowStream,
    emitted: usize,
    fail_at: usize,
}

impl RowStream for FailingStream {
    fn next_row(&mut self) -> Result<Option<ScanRow>, InternalError> {
        if self.emitted == self.fail_at {
            return Err(InternalError::transient_scan(&self.table, "session expired"));
        }
        self.emitted += 1;

        self.rows.next_row()
    }
}

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

fn int_row(values: &[i64]) -> ScanRow {
    ScanRow::new(
        values
            .iter()
            .map(|v| RawCell::new(TypeCode::Int64, json!(v.to_string())))
            .collect(),
    )
}

fn key(values: &[i64]) -> KeyValue {
    values.iter().map(|v| DecodedValue::from(*v)).collect()
}

fn single_column_table(rows: i64) -> MemoryTable {
    let mut table = MemoryTable::new("Orders", [("OrderId", ColumnType::scalar(TypeCode::Int64))]);
    for id in 1..=rows {
        table.insert_values([id]).unwrap();
    }

    table
}

// (GroupId, ItemId) with `sizes[g]` items in group g + 1.
fn grouped_table(sizes: &[usize]) -> MemoryTable {
    let mut table = MemoryTable::new(
        "Items",
        [
            ("GroupId", ColumnType::scalar(TypeCode::Int64)),
            ("ItemId", ColumnType::scalar(TypeCode::Int64)),
        ],
    );
    for (group, size) in sizes.iter().enumerate() {
        for item in 0..*size {
            table
                .insert_values([group as i64 + 1, item as i64])
                .unwrap();
        }
    }

    table
}

fn assert_ascending(ranges: &[CountedKeyRange]) {
    for range in ranges {
        assert!(range.start <= range.end, "{range} is inverted");
    }
    for pair in ranges.windows(2) {
        assert!(pair[0].end < pair[1].start, "{} overlaps {}", pair[0], pair[1]);
    }
}

#[test]
fn full_primary_key_splits_into_batch_sized_ranges() {
    let table = single_column_table(39_998);
    let partitioner = KeyRangePartitioner::new(&table, 19_999).distinct_keys(true);

    let ranges = partitioner.partition("Orders", &cols(&["OrderId"])).unwrap();

    assert_eq!(ranges.len(), 2);
    assert_eq!(ranges[0].start, key(&[1]));
    assert_eq!(ranges[0].end, key(&[19_999]));
    assert_eq!(ranges[0].row_count, 19_999);
    assert_eq!(ranges[1].start, key(&[20_000]));
    assert_eq!(ranges[1].end, key(&[39_998]));
    assert_eq!(ranges[1].row_count, 19_999);
}

#[test]
fn trailing_partial_range_is_emitted() {
    let table = single_column_table(7);
    let ranges = KeyRangePartitioner::new(&table, 3)
        .partition("Orders", &cols(&["OrderId"]))
        .unwrap();

    let counts: Vec<u64> = ranges.iter().map(|r| r.row_count).collect();
    assert_eq!(counts, [3, 3, 1]);
    assert_eq!(ranges[2].start, key(&[7]));
    assert_eq!(ranges[2].end, key(&[7]));
}

#[test]
fn empty_tables_produce_no_ranges() {
    let table = single_column_table(0);
    let sink = CountingSink::new();

    let ranges = KeyRangePartitioner::new(&table, 10)
        .with_sink(&sink)
        .partition("Orders", &cols(&["OrderId"]))
        .unwrap();

    assert!(ranges.is_empty());
    let report = sink.report();
    assert_eq!(report.ops.scans_started, 1);
    assert_eq!(report.ops.partitions_finished, 1);
    assert_eq!(report.ops.ranges_closed, 0);
}

#[test]
fn unbounded_batches_cover_the_table_in_one_range() {
    let table = single_column_table(50);

    let ranges = KeyRangePartitioner::new(&table, UNBOUNDED_BATCH_SIZE)
        .partition("Orders", &cols(&["OrderId"]))
        .unwrap();

    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0].row_count, 50);
}

#[test]
fn key_prefix_groups_are_never_split() {
    let table = grouped_table(&[2, 2, 1, 4]);
    let sink = CountingSink::new();

    let ranges = KeyRangePartitioner::new(&table, 3)
        .with_sink(&sink)
        .partition("Items", &cols(&["GroupId"]))
        .unwrap();

    let summary: Vec<(KeyValue, KeyValue, u64)> = ranges
        .iter()
        .map(|r| (r.start.clone(), r.end.clone(), r.row_count))
        .collect();
    assert_eq!(
        summary,
        [
            (key(&[1]), key(&[1]), 2),
            (key(&[2]), key(&[3]), 3),
            (key(&[4]), key(&[4]), 4),
        ]
    );

    let report = sink.report();
    assert_eq!(report.ops.ranges_closed, 3);
    assert_eq!(report.ops.oversized_ranges, 1);
    assert_eq!(report.ops.rows_scanned, 9);
}

#[test]
fn range_deletes_of_a_prefix_partition_remove_exactly_the_counted_rows() {
    let mut table = grouped_table(&[3, 1, 5, 2, 2]);

    let ranges = KeyRangePartitioner::new(&table, 4)
        .partition("Items", &cols(&["GroupId"]))
        .unwrap();
    assert_ascending(&ranges);

    for range in &ranges {
        assert_eq!(table.delete_range(range), range.row_count);
    }
    assert!(table.is_empty());
}

#[test]
fn out_of_order_scans_are_corruption() {
    let scanner = StaticScanner::new(vec![int_row(&[1]), int_row(&[3]), int_row(&[2])]);

    let err = KeyRangePartitioner::new(&scanner, 10)
        .partition("Orders", &cols(&["OrderId"]))
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::Corruption);
    assert_eq!(err.origin, ErrorOrigin::Scan);
    assert!(matches!(err.detail, Some(ErrorDetail::Scan { .. })));
}

#[test]
fn duplicate_full_keys_are_corruption() {
    let scanner = StaticScanner::new(vec![int_row(&[1]), int_row(&[1])]);

    let err = KeyRangePartitioner::new(&scanner, 10)
        .distinct_keys(true)
        .partition("Orders", &cols(&["OrderId"]))
        .unwrap_err();
    assert_eq!(err.class, ErrorClass::Corruption);
    assert!(err.message.contains("duplicate"));

    // The same rows under a prefix are one run.
    let ranges = KeyRangePartitioner::new(&scanner, 10)
        .partition("Orders", &cols(&["OrderId"]))
        .unwrap();
    assert_eq!(ranges[0].row_count, 2);
}

#[test]
fn undecodable_key_columns_abort_the_partition() {
    let scanner = StaticScanner::new(vec![
        int_row(&[1]),
        ScanRow::new(vec![RawCell::new(TypeCode::Json, json!("{}"))]),
    ]);

    let err = KeyRangePartitioner::new(&scanner, 10)
        .partition("Docs", &cols(&["Body"]))
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::Unsupported);
    assert!(err.message.contains("Body"));
    assert!(matches!(err.detail, Some(ErrorDetail::Decode(_))));
}

#[test]
fn short_rows_are_a_scanner_bug() {
    let scanner = StaticScanner::new(vec![int_row(&[1])]);

    let err = KeyRangePartitioner::new(&scanner, 10)
        .partition("Items", &cols(&["GroupId", "ItemId"]))
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::Internal);
    assert_eq!(err.origin, ErrorOrigin::Scan);
}

#[test]
fn transient_scan_failures_surface_as_retryable() {
    let scanner = StaticScanner {
        rows: (1..=10).map(|i| int_row(&[i])).collect(),
        fail_at: Some(4),
    };

    let err = KeyRangePartitioner::new(&scanner, 2)
        .partition("Orders", &cols(&["OrderId"]))
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(err.class, ErrorClass::Transient);
}

#[test]
fn invalid_arguments_are_rejected_before_scanning() {
    let scanner = StaticScanner {
        rows: Vec::new(),
        fail_at: Some(0),
    };

    for partitioner in [
        KeyRangePartitioner::new(&scanner, 0),
        KeyRangePartitioner::new(&scanner, 5).scan_limit(Some(0)),
    ] {
        let err = partitioner
            .partition("Orders", &cols(&["OrderId"]))
            .unwrap_err();
        assert_eq!(err.class, ErrorClass::InvalidArgument);
    }

    let partitioner = KeyRangePartitioner::new(&scanner, 5);
    let err = partitioner.partition("Orders", &[]).unwrap_err();
    assert_eq!(err.class, ErrorClass::InvalidArgument);

    let err = partitioner
        .partition_page("Orders", &cols(&["OrderId"]), Some(&key(&[1, 2])))
        .unwrap_err();
    assert_eq!(err.class, ErrorClass::InvalidArgument);
}

#[test]
fn resumed_scans_must_start_after_the_resume_key() {
    let scanner = StaticScanner::new(vec![int_row(&[3]), int_row(&[4])]);

    let err = KeyRangePartitioner::new(&scanner, 5)
        .partition_page("Orders", &cols(&["OrderId"]), Some(&key(&[3])))
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::Corruption);
}

#[test]
fn distinct_key_pages_resume_after_the_last_range() {
    let table = single_column_table(10);
    let partitioner = KeyRangePartitioner::new(&table, 3)
        .scan_limit(Some(4))
        .distinct_keys(true);
    let columns = cols(&["OrderId"]);

    let first = partitioner.partition_page("Orders", &columns, None).unwrap();
    assert_eq!(first.rows_scanned, 4);
    assert_eq!(first.row_count(), 4);
    assert_eq!(first.resume_after, Some(key(&[4])));

    let second = partitioner
        .partition_page("Orders", &columns, first.resume_after.as_ref())
        .unwrap();
    assert_eq!(second.ranges[0].start, key(&[5]));

    let all = partitioner.partition_all("Orders", &columns).unwrap();
    assert_ascending(&all);
    assert_eq!(all.iter().map(|r| r.row_count).sum::<u64>(), 10);
    assert!(all.iter().all(|r| r.row_count <= 3));
}

#[test]
fn prefix_pages_withhold_the_trailing_group() {
    let table = grouped_table(&[2, 2, 2]);
    let sink = CountingSink::new();
    let partitioner = KeyRangePartitioner::new(&table, 10)
        .scan_limit(Some(5))
        .with_sink(&sink);
    let columns = cols(&["GroupId"]);

    let first = partitioner.partition_page("Items", &columns, None).unwrap();
    assert!(first.is_truncated());
    assert_eq!(first.rows_scanned, 5);
    assert_eq!(first.row_count(), 4);
    assert_eq!(first.resume_after, Some(key(&[2])));

    let all = partitioner.partition_all("Items", &columns).unwrap();
    let summary: Vec<(KeyValue, KeyValue, u64)> = all
        .iter()
        .map(|r| (r.start.clone(), r.end.clone(), r.row_count))
        .collect();
    assert_eq!(
        summary,
        [(key(&[1]), key(&[2]), 4), (key(&[3]), key(&[3]), 2)]
    );
    assert!(sink.report().ops.pages_truncated >= 2);
}

#[test]
fn single_page_partitions_cover_every_scanned_row() {
    for rows in [5, 10] {
        let table = single_column_table(rows);
        let sink = CountingSink::new();

        let ranges = KeyRangePartitioner::new(&table, 2)
            .scan_limit(Some(5))
            .with_sink(&sink)
            .partition("Orders", &cols(&["OrderId"]))
            .unwrap();

        let covered: u64 = ranges.iter().map(|r| r.row_count).sum();
        assert_eq!(covered, 5);
        assert_eq!(covered, sink.report().ops.rows_scanned);
        assert_eq!(ranges.last().map(|r| r.end.clone()), Some(key(&[5])));
    }
}

#[test]
fn single_page_prefix_partitions_keep_the_last_group_read() {
    let table = grouped_table(&[2, 3]);

    let ranges = KeyRangePartitioner::new(&table, 10)
        .scan_limit(Some(4))
        .partition("Items", &cols(&["GroupId"]))
        .unwrap();

    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0].end, key(&[2]));
    assert_eq!(ranges[0].row_count, 4);
}

#[test]
fn last_group_filling_the_scan_limit_exactly_is_not_truncated() {
    let table = grouped_table(&[3]);
    let partitioner = KeyRangePartitioner::new(&table, 10).scan_limit(Some(3));
    let columns = cols(&["GroupId"]);

    let page = partitioner.partition_page("Items", &columns, None).unwrap();
    assert!(!page.is_truncated());
    assert_eq!(page.row_count(), 3);

    let ranges = partitioner.partition_all("Items", &columns).unwrap();
    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0].row_count, 3);
}

#[test]
fn distinct_tables_filling_the_last_page_exactly_finish_in_that_page() {
    let table = single_column_table(8);
    let sink = CountingSink::new();
    let partitioner = KeyRangePartitioner::new(&table, 3)
        .scan_limit(Some(4))
        .distinct_keys(true)
        .with_sink(&sink);

    let ranges = partitioner.partition_all("Orders", &cols(&["OrderId"])).unwrap();

    assert_eq!(ranges.iter().map(|r| r.row_count).sum::<u64>(), 8);
    let report = sink.report();
    assert_eq!(report.ops.partitions_finished, 2);
    assert_eq!(report.ops.pages_truncated, 1);
}

#[test]
fn groups_larger_than_the_scan_limit_cannot_be_paged() {
    let table = grouped_table(&[5]);

    let err = KeyRangePartitioner::new(&table, 10)
        .scan_limit(Some(3))
        .partition_all("Items", &cols(&["GroupId"]))
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::InvalidArgument);
    assert!(err.message.contains("scan limit"));
}

proptest! {
    #[test]
    fn distinct_keys_yield_ceil_n_over_b_ranges(rows in 0_i64..400, batch in 1_u64..40) {
        let table = single_column_table(rows);
        let ranges = KeyRangePartitioner::new(&table, batch)
            .distinct_keys(true)
            .partition("Orders", &cols(&["OrderId"]))
            .unwrap();

        let rows = rows as u64;
        prop_assert_eq!(ranges.len() as u64, rows.div_ceil(batch));
        prop_assert_eq!(ranges.iter().map(|r| r.row_count).sum::<u64>(), rows);
        prop_assert!(ranges.iter().all(|r| r.row_count <= batch));
    }

    #[test]
    fn prefix_ranges_cover_every_row_once(
        sizes in prop::collection::vec(1_usize..6, 0..30),
        batch in 1_u64..12,
        scan_limit in prop::option::of(6_u64..20),
    ) {
        let table = grouped_table(&sizes);
        let ranges = KeyRangePartitioner::new(&table, batch)
            .scan_limit(scan_limit)
            .partition_all("Items", &cols(&["GroupId"]))
            .unwrap();

        let total: usize = sizes.iter().sum();
        prop_assert_eq!(ranges.iter().map(|r| r.row_count).sum::<u64>(), total as u64);

        for pair in ranges.windows(2) {
            prop_assert!(pair[0].end < pair[1].start);
        }
        for range in &ranges {
            prop_assert!(range.row_count <= batch || range.start == range.end);
        }
    }
}
