use crate::error::{Error, ErrorKind, ErrorOrigin};
use keysplit_core::{
    config::PlannerConfig,
    db::{CountedKeyRange, KeyRangePartitioner, KeyValue, MutationBudget, RowScanner, compute_budget},
    obs::{MetricsSink, NOOP_SINK},
    schema::Catalog,
};
use serde::Serialize;

///
/// DeletePlan
///
/// Everything needed to delete one table in bounded transactions: each
/// range is an inclusive prefix range delete over `key_columns` holding
/// `row_count` base rows.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DeletePlan {
    pub table: String,
    pub key_columns: Vec<String>,
    pub budget: MutationBudget,
    pub ranges: Vec<CountedKeyRange>,
}

impl DeletePlan {
    /// Base rows covered by every range.
    #[must_use]
    pub fn row_count(&self) -> u64 {
        self.ranges.iter().map(|range| range.row_count).sum()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

///
/// DeletePlanner
///
/// Session wiring the catalog and scanner collaborators into a budget and
/// a partition. Holds no state between calls.
///

pub struct DeletePlanner<'a> {
    catalog: &'a dyn Catalog,
    scanner: &'a dyn RowScanner,
    config: PlannerConfig,
    sink: &'a dyn MetricsSink,
}

impl<'a> DeletePlanner<'a> {
    #[must_use]
    pub fn new(catalog: &'a dyn Catalog, scanner: &'a dyn RowScanner, config: PlannerConfig) -> Self {
        Self {
            catalog,
            scanner,
            config,
            sink: &NOOP_SINK,
        }
    }

    /// Enable debug logging for subsequent calls on this planner.
    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.config.debug = true;
        self
    }

    #[must_use]
    pub const fn with_sink(mut self, sink: &'a dyn MetricsSink) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    fn debug_log(&self, s: impl Into<String>) {
        if self.config.debug {
            println!("[debug] {}", s.into());
        }
    }

    /// Budget for deleting from `table`. A limit too small to delete even
    /// one base row is rejected.
    pub fn batch_size(&self, table: &str) -> Result<MutationBudget, Error> {
        let limit = self.config.transaction_mutation_limit;
        let budget = compute_budget(self.catalog, table, limit, self.sink)?;
        self.debug_log(format!("budget {budget} (limit={limit})"));

        if budget.batch_size == 0 {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                ErrorOrigin::Budget,
                format!(
                    "transaction mutation limit {limit} cannot delete a row of table '{table}' with fanout {}",
                    budget.fanout
                ),
            ));
        }

        Ok(budget)
    }

    /// Primary-key column names of `table`, in key order.
    pub fn key_columns(&self, table: &str) -> Result<Vec<String>, Error> {
        let columns = self.catalog.primary_key_columns(table)?;

        Ok(columns.into_iter().map(|column| column.name).collect())
    }

    /// Plan a delete of `table` partitioned by its full primary key.
    pub fn plan(&self, table: &str) -> Result<DeletePlan, Error> {
        let key_columns = self.key_columns(table)?;

        self.plan_by(table, key_columns, true)
    }

    /// Plan a delete of `table` partitioned by a leading prefix of its
    /// primary key. Rows sharing a prefix always land in the same range.
    pub fn plan_with_key_columns<S>(&self, table: &str, columns: &[S]) -> Result<DeletePlan, Error>
    where
        S: AsRef<str>,
    {
        let primary_key = self.key_columns(table)?;
        let columns: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();

        if columns.is_empty() || !primary_key.starts_with(&columns) {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                ErrorOrigin::Partition,
                format!(
                    "key columns [{}] are not a prefix of the primary key [{}] of table '{table}'",
                    columns.join(", "),
                    primary_key.join(", ")
                ),
            ));
        }
        let distinct = columns.len() == primary_key.len();

        self.plan_by(table, columns, distinct)
    }

    fn plan_by(
        &self,
        table: &str,
        key_columns: Vec<String>,
        distinct_keys: bool,
    ) -> Result<DeletePlan, Error> {
        let budget = self.batch_size(table)?;
        let partitioner = KeyRangePartitioner::new(self.scanner, budget.batch_size)
            .with_sink(self.sink)
            .scan_limit(self.config.scan_limit)
            .distinct_keys(distinct_keys);

        self.debug_log(format!(
            "partition {table} by [{}] (scan_limit={})",
            key_columns.join(", "),
            self.config
                .scan_limit
                .map_or_else(|| "none".to_string(), |limit| limit.to_string())
        ));

        let mut ranges = Vec::new();
        let mut start_after: Option<KeyValue> = None;
        loop {
            let page = partitioner.partition_page(table, &key_columns, start_after.as_ref())?;
            self.debug_log(format!(
                "page: {} rows scanned -> {} ranges",
                page.rows_scanned,
                page.ranges.len()
            ));
            for range in &page.ranges {
                self.debug_log(format!("range {range}"));
            }

            ranges.extend(page.ranges);
            match page.resume_after {
                Some(key) => start_after = Some(key),
                None => break,
            }
        }

        Ok(DeletePlan {
            table: table.to_string(),
            key_columns,
            budget,
            ranges,
        })
    }
}
