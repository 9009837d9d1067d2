//! Mutation budgeting for bulk deletes.
//!
//! Deleting one base row costs one mutation for the row itself plus one per
//! secondary index entry it carries. Cascading interleaved children are
//! deleted with it, each carrying its own index fanout, recursively.

use crate::{
    error::{ErrorOrigin, InternalError},
    obs::{MetricsEvent, MetricsSink},
    schema::Catalog,
};
use serde::Serialize;
use std::{
    collections::BTreeSet,
    fmt::{self, Display},
};

/// Batch size reported when nothing in the cascade subtree is indexed and
/// the mutation limit does not constrain row count.
pub const UNBOUNDED_BATCH_SIZE: u64 = u64::MAX;

///
/// MutationBudget
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MutationBudget {
    pub table: String,
    pub fanout: u64,
    pub batch_size: u64,
}

impl MutationBudget {
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.batch_size == UNBOUNDED_BATCH_SIZE
    }
}

impl Display for MutationBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            write!(f, "{}: fanout=0, batch_size=unbounded", self.table)
        } else {
            write!(
                f,
                "{}: fanout={}, batch_size={}",
                self.table, self.fanout, self.batch_size
            )
        }
    }
}

/// Secondary indexes maintained directly on `table`.
pub fn index_fanout(
    catalog: &dyn Catalog,
    table: &str,
    sink: &dyn MetricsSink,
) -> Result<u64, InternalError> {
    sink.record(MetricsEvent::CatalogLookup { table });
    let indexes = catalog.secondary_indexes(table)?;

    Ok(indexes.len() as u64)
}

/// Index fanout of `table` plus every cascade-reachable descendant.
///
/// No-action children and everything below them contribute nothing. A table
/// reached twice means the interleave graph is not a forest, and the walk
/// fails rather than guessing.
pub fn total_fanout(
    catalog: &dyn Catalog,
    table: &str,
    sink: &dyn MetricsSink,
) -> Result<u64, InternalError> {
    let mut visited = BTreeSet::new();
    let mut pending = vec![table.to_string()];
    let mut total = 0_u64;

    while let Some(current) = pending.pop() {
        if !visited.insert(current.clone()) {
            return Err(InternalError::schema_unavailable(
                table,
                format!("interleave graph revisits table '{current}'"),
            ));
        }

        total = total.saturating_add(index_fanout(catalog, &current, sink)?);

        let children = catalog.interleave_children(&current)?;
        pending.extend(
            children
                .into_iter()
                .filter(|child| child.cascades())
                .map(|child| child.table),
        );
    }

    Ok(total)
}

/// Base rows per transaction for a given fanout and mutation limit.
///
/// `floor(limit / fanout) - 1`, saturating at zero; unbounded when the
/// fanout is zero.
pub fn batch_size_for(fanout: u64, transaction_mutation_limit: u64) -> Result<u64, InternalError> {
    if transaction_mutation_limit == 0 {
        return Err(InternalError::invalid_argument(
            ErrorOrigin::Budget,
            "transaction mutation limit must be at least 1",
        ));
    }
    if fanout == 0 {
        return Ok(UNBOUNDED_BATCH_SIZE);
    }

    Ok((transaction_mutation_limit / fanout).saturating_sub(1))
}

/// Maximum base-row deletions that fit in one transaction on `table`.
pub fn max_rows_per_transaction(
    catalog: &dyn Catalog,
    table: &str,
    transaction_mutation_limit: u64,
    sink: &dyn MetricsSink,
) -> Result<u64, InternalError> {
    compute_budget(catalog, table, transaction_mutation_limit, sink).map(|b| b.batch_size)
}

/// Full budget for `table`: fanout and resulting batch size.
pub fn compute_budget(
    catalog: &dyn Catalog,
    table: &str,
    transaction_mutation_limit: u64,
    sink: &dyn MetricsSink,
) -> Result<MutationBudget, InternalError> {
    let fanout = total_fanout(catalog, table, sink)?;
    let batch_size = batch_size_for(fanout, transaction_mutation_limit)?;

    sink.record(MetricsEvent::BudgetComputed {
        table,
        fanout,
        batch_size,
    });

    Ok(MutationBudget {
        table: table.to_string(),
        fanout,
        batch_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorClass,
        obs::{CountingSink, NOOP_SINK},
        schema::{Column, Index, InterleaveChild, MemoryCatalog, OnDelete, TableSchema},
    };
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn indexed(name: &str, count: usize) -> TableSchema {
        (0..count).fold(TableSchema::new(name, ["Id"]), |table, i| {
            table.with_index(format!("{name}ByCol{i}"), [format!("Col{i}")])
        })
    }

    fn child(name: &str, count: usize, parent: &str, on_delete: OnDelete) -> TableSchema {
        indexed(name, count).interleaved_in(parent, on_delete)
    }

    fn catalog(tables: Vec<TableSchema>) -> MemoryCatalog {
        tables
            .into_iter()
            .fold(MemoryCatalog::builder(), |b, t| b.table(t))
            .build()
            .expect("catalog should build")
    }

    #[test]
    fn unindexed_tables_are_unbounded() {
        let catalog = catalog(vec![indexed("Plain", 0)]);

        let budget = compute_budget(&catalog, "Plain", 20_000, &NOOP_SINK).unwrap();
        assert_eq!(budget.fanout, 0);
        assert!(budget.is_unbounded());
        assert!(budget.to_string().contains("unbounded"));
    }

    #[test]
    fn single_index_leaves_one_slot_of_headroom() {
        let catalog = catalog(vec![indexed("Orders", 1)]);

        assert_eq!(
            max_rows_per_transaction(&catalog, "Orders", 20_000, &NOOP_SINK).unwrap(),
            19_999
        );
    }

    #[test]
    fn cascade_children_add_their_own_fanout() {
        let catalog = catalog(vec![
            indexed("Parent", 0),
            child("Left", 1, "Parent", OnDelete::Cascade),
            child("Right", 1, "Parent", OnDelete::Cascade),
        ]);

        assert_eq!(total_fanout(&catalog, "Parent", &NOOP_SINK).unwrap(), 2);
    }

    #[test]
    fn unindexed_cascade_children_contribute_nothing() {
        let catalog = catalog(vec![
            indexed("Parent", 1),
            child("Left", 0, "Parent", OnDelete::Cascade),
            child("Right", 0, "Parent", OnDelete::Cascade),
        ]);

        assert_eq!(total_fanout(&catalog, "Parent", &NOOP_SINK).unwrap(), 1);
    }

    #[test]
    fn no_action_children_never_count() {
        let catalog = catalog(vec![
            indexed("Parent", 1),
            child("Restricted", 5, "Parent", OnDelete::NoAction),
            child("Below", 7, "Restricted", OnDelete::Cascade),
        ]);

        assert_eq!(total_fanout(&catalog, "Parent", &NOOP_SINK).unwrap(), 1);
    }

    #[test]
    fn cascades_accumulate_through_grandchildren() {
        let catalog = catalog(vec![
            indexed("Singers", 1),
            child("Albums", 2, "Singers", OnDelete::Cascade),
            child("Songs", 3, "Albums", OnDelete::Cascade),
        ]);

        let budget = compute_budget(&catalog, "Singers", 20_000, &NOOP_SINK).unwrap();
        assert_eq!(budget.fanout, 6);
        assert_eq!(budget.batch_size, 20_000 / 6 - 1);
    }

    #[test]
    fn unknown_tables_abort_the_budget() {
        let catalog = catalog(vec![indexed("Orders", 1)]);

        let err = compute_budget(&catalog, "Missing", 20_000, &NOOP_SINK).unwrap_err();
        assert_eq!(err.class, ErrorClass::SchemaUnavailable);
        assert!(err.message.contains("Missing"));
    }

    #[test]
    fn zero_limit_is_rejected() {
        let err = batch_size_for(1, 0).unwrap_err();

        assert_eq!(err.class, ErrorClass::InvalidArgument);
        assert_eq!(err.origin, ErrorOrigin::Budget);
    }

    #[test]
    fn limit_equal_to_fanout_yields_zero() {
        assert_eq!(batch_size_for(3, 3).unwrap(), 0);
        assert_eq!(batch_size_for(3, 2).unwrap(), 0);
    }

    #[test]
    fn one_lookup_per_table_in_the_subtree() {
        let catalog = catalog(vec![
            indexed("Singers", 1),
            child("Albums", 1, "Singers", OnDelete::Cascade),
            child("Concerts", 1, "Singers", OnDelete::NoAction),
        ]);
        let sink = CountingSink::new();

        compute_budget(&catalog, "Singers", 100, &sink).unwrap();

        let report = sink.report();
        assert_eq!(report.ops.catalog_lookups, 2);
        assert!(report.table("Concerts").is_none());
        assert_eq!(
            report.table("Singers").and_then(|c| c.last_batch_size),
            Some(49)
        );
    }

    ///
    /// CyclicCatalog
    /// Two tables that claim each other as cascade children.
    ///

    struct CyclicCatalog;

    impl Catalog for CyclicCatalog {
        fn primary_key_columns(&self, _: &str) -> Result<Vec<Column>, InternalError> {
            Ok(vec![Column::new("Id")])
        }

        fn table_indexes(&self, _: &str) -> Result<Vec<Index>, InternalError> {
            Ok(Vec::new())
        }

        fn interleave_children(&self, table: &str) -> Result<Vec<InterleaveChild>, InternalError> {
            let other = if table == "A" { "B" } else { "A" };

            Ok(vec![InterleaveChild {
                table: other.to_string(),
                on_delete: OnDelete::Cascade,
            }])
        }

        fn parent(&self, table: &str) -> Result<Option<String>, InternalError> {
            Ok(Some(if table == "A" { "B" } else { "A" }.to_string()))
        }
    }

    #[test]
    fn cycles_are_detected_instead_of_looping() {
        let err = total_fanout(&CyclicCatalog, "A", &NOOP_SINK).unwrap_err();

        assert_eq!(err.class, ErrorClass::SchemaUnavailable);
        assert!(err.message.contains("revisits"));
    }

    proptest! {
        #[test]
        fn batch_size_matches_floor_minus_one(fanout in 1_u64..1_000, limit in 1_u64..1_000_000) {
            let batch = batch_size_for(fanout, limit).unwrap();

            prop_assert_eq!(batch, (limit / fanout).saturating_sub(1));
            prop_assert!(batch.saturating_add(1).saturating_mul(fanout) <= limit || batch == 0);
        }

        #[test]
        fn fanout_is_additive_over_cascade_children(counts in prop::collection::vec(0_usize..4, 0..6), own in 0_usize..4) {
            let mut tables = vec![indexed("Root", own)];
            let mut expected = BTreeMap::new();
            for (i, count) in counts.iter().enumerate() {
                let name = format!("Child{i}");
                expected.insert(name.clone(), *count);
                tables.push(child(&name, *count, "Root", OnDelete::Cascade));
            }
            let catalog = catalog(tables);

            let total = total_fanout(&catalog, "Root", &NOOP_SINK).unwrap();
            prop_assert_eq!(total, (own + expected.values().sum::<usize>()) as u64);
        }
    }
}
