//! In-memory tables implementing the scan contract.
//!
//! Rows are kept as full primary keys in canonical order, which is exactly
//! the order a store scan returns them in. Scans may request any prefix of
//! the primary key; `delete_range` applies a counted range the way a store's
//! inclusive range delete would.

use crate::{
    db::{
        key::{CountedKeyRange, KeyValue},
        scan::{RowScanner, RowStream, RowStreamBox, ScanRequest, ScanRow},
    },
    error::{ErrorOrigin, InternalError},
    value::{ColumnType, DecodedValue},
};
use std::collections::{BTreeMap, BTreeSet, btree_set};

///
/// MemoryTable
///

#[derive(Clone, Debug)]
pub struct MemoryTable {
    name: String,
    key_columns: Vec<(String, ColumnType)>,
    rows: BTreeSet<KeyValue>,
}

impl MemoryTable {
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, key_columns: I) -> Self
    where
        I: IntoIterator<Item = (S, ColumnType)>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            key_columns: key_columns
                .into_iter()
                .map(|(column, ty)| (column.into(), ty))
                .collect(),
            rows: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn key_columns(&self) -> Vec<String> {
        self.key_columns.iter().map(|(name, _)| name.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Insert one row by its full primary key. Returns false when the key
    /// already exists.
    pub fn insert(&mut self, key: KeyValue) -> Result<bool, InternalError> {
        if key.len() != self.key_columns.len() {
            return Err(self.invalid(format!(
                "key {key} has {} components, expected {}",
                key.len(),
                self.key_columns.len()
            )));
        }
        for (value, (column, ty)) in key.iter().zip(&self.key_columns) {
            if value.column_type() != *ty {
                return Err(self.invalid(format!(
                    "value {value} does not match column '{column}' of type {ty}"
                )));
            }
        }

        Ok(self.rows.insert(key))
    }

    /// Insert one row from its key values.
    pub fn insert_values<I, V>(&mut self, values: I) -> Result<bool, InternalError>
    where
        I: IntoIterator<Item = V>,
        V: Into<DecodedValue>,
    {
        self.insert(values.into_iter().map(Into::into).collect())
    }

    /// Delete every row whose key falls inside `range`, returning how many
    /// rows were removed.
    pub fn delete_range(&mut self, range: &CountedKeyRange) -> u64 {
        let before = self.rows.len();
        self.rows.retain(|key| !range.contains(key));

        (before - self.rows.len()) as u64
    }

    fn invalid(&self, message: String) -> InternalError {
        InternalError::invalid_argument(
            ErrorOrigin::Scan,
            format!("table '{}': {message}", self.name),
        )
    }

    fn open(&self, request: &ScanRequest) -> Result<MemoryRowStream<'_>, InternalError> {
        let width = request.columns.len();
        let is_prefix = width > 0
            && width <= self.key_columns.len()
            && request
                .columns
                .iter()
                .zip(&self.key_columns)
                .all(|(requested, (column, _))| requested == column);
        if !is_prefix {
            return Err(self.invalid(format!(
                "scan columns [{}] are not a prefix of the primary key",
                request.columns.join(", ")
            )));
        }

        Ok(MemoryRowStream {
            rows: self.rows.iter(),
            width,
            start_after: request.start_after.clone(),
            remaining: request.limit,
        })
    }
}

impl RowScanner for MemoryTable {
    fn scan(&self, request: &ScanRequest) -> Result<RowStreamBox<'_>, InternalError> {
        if request.table != self.name {
            return Err(InternalError::table_not_found(&request.table));
        }

        Ok(Box::new(self.open(request)?))
    }
}

///
/// MemoryDatabase
///
/// Named collection of in-memory tables.
///

#[derive(Clone, Debug, Default)]
pub struct MemoryDatabase {
    tables: BTreeMap<String, MemoryTable>,
}

impl MemoryDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_table(mut self, table: MemoryTable) -> Self {
        self.add_table(table);
        self
    }

    pub fn add_table(&mut self, table: MemoryTable) {
        self.tables.insert(table.name.clone(), table);
    }

    #[must_use]
    pub fn table(&self, name: &str) -> Option<&MemoryTable> {
        self.tables.get(name)
    }

    pub fn table_mut(&mut self, name: &str) -> Result<&mut MemoryTable, InternalError> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| InternalError::table_not_found(name))
    }

    /// Apply one range delete to `table`.
    pub fn delete_range(
        &mut self,
        table: &str,
        range: &CountedKeyRange,
    ) -> Result<u64, InternalError> {
        Ok(self.table_mut(table)?.delete_range(range))
    }
}

impl RowScanner for MemoryDatabase {
    fn scan(&self, request: &ScanRequest) -> Result<RowStreamBox<'_>, InternalError> {
        let table = self
            .tables
            .get(&request.table)
            .ok_or_else(|| InternalError::table_not_found(&request.table))?;

        Ok(Box::new(table.open(request)?))
    }
}

///
/// MemoryRowStream
///
/// Projects full keys onto the requested prefix. Rows sharing a prefix are
/// emitted once per full row.
///

struct MemoryRowStream<'a> {
    rows: btree_set::Iter<'a, KeyValue>,
    width: usize,
    start_after: Option<KeyValue>,
    remaining: Option<u64>,
}

impl RowStream for MemoryRowStream<'_> {
    fn next_row(&mut self) -> Result<Option<ScanRow>, InternalError> {
        if self.remaining == Some(0) {
            return Ok(None);
        }

        for key in self.rows.by_ref() {
            let projected = key.prefix(self.width);
            if let Some(after) = &self.start_after {
                if projected.cmp_prefix(after).is_le() {
                    continue;
                }
                self.start_after = None;
            }

            if let Some(remaining) = self.remaining.as_mut() {
                *remaining -= 1;
            }

            return Ok(Some(ScanRow::new(projected.to_cells())));
        }

        Ok(None)
    }
}
