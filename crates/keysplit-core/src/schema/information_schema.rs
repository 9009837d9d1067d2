//! Assembly of catalog structures from flat `INFORMATION_SCHEMA` rows.
//!
//! The store reports one row per (index, column) pair and repeats index
//! attributes on every row; these helpers fold that shape back into
//! [`Index`] values and a queryable [`MemoryCatalog`].

use crate::{
    error::{ErrorOrigin, InternalError},
    schema::{
        Column, Index, IndexKind, IndexSpec, IndexState, MemoryCatalog, OnDelete,
        PRIMARY_KEY_INDEX, TableSchema,
    },
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

///
/// IndexColumnRow
///
/// One `INDEX_COLUMNS` row joined with its `INDEXES` attributes.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IndexColumnRow {
    pub table_name: String,
    pub index_name: String,
    pub index_type: IndexKind,

    #[serde(default)]
    pub parent_table_name: Option<String>,

    #[serde(default)]
    pub is_unique: bool,

    #[serde(default)]
    pub is_null_filtered: bool,

    #[serde(default)]
    pub index_state: Option<String>,

    pub column_name: String,

    #[serde(default)]
    pub ordinal_position: Option<i64>,
}

///
/// TableRow
///
/// One `TABLES` row.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableRow {
    pub table_name: String,

    #[serde(default)]
    pub parent_table_name: Option<String>,

    #[serde(default)]
    pub on_delete_action: Option<String>,
}

/// Fold index-column rows into indexes.
///
/// Indexes keep first-seen order. Repeated (table, index) rows contribute
/// columns only, and a repeated (table, index, column) row is ignored.
/// Columns are ordered by ordinal position; columns without one (storing
/// columns) follow in first-seen order.
#[must_use]
pub fn indexes_from_rows(rows: &[IndexColumnRow]) -> Vec<Index> {
    let mut indexes: Vec<Index> = Vec::new();
    let mut slots: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    let mut seen_columns: BTreeSet<(&str, &str, &str)> = BTreeSet::new();

    for row in rows {
        let key = (row.table_name.as_str(), row.index_name.as_str());
        let slot = *slots.entry(key).or_insert_with(|| {
            indexes.push(index_from_row(row));
            indexes.len() - 1
        });

        if seen_columns.insert((key.0, key.1, row.column_name.as_str())) {
            let mut column = Column::new(row.column_name.clone());
            column.ordinal_position = row.ordinal_position;
            indexes[slot].columns.push(column);
        }
    }

    for index in &mut indexes {
        index
            .columns
            .sort_by_key(|column| (column.ordinal_position.is_none(), column.ordinal_position));
    }

    indexes
}

fn index_from_row(row: &IndexColumnRow) -> Index {
    let kind = if row.index_name == PRIMARY_KEY_INDEX {
        IndexKind::PrimaryKey
    } else {
        row.index_type
    };
    let state = row
        .index_state
        .as_deref()
        .map_or(IndexState::Unknown, |s| s.parse().unwrap_or_default());

    Index {
        name: row.index_name.clone(),
        kind,
        table: row.table_name.clone(),
        parent_table: row
            .parent_table_name
            .clone()
            .filter(|parent| !parent.is_empty()),
        unique: row.is_unique,
        null_filtered: row.is_null_filtered,
        state,
        columns: Vec::new(),
    }
}

/// Build a catalog from `TABLES` and `INDEX_COLUMNS` rows.
///
/// Every table must have primary-key rows; an unknown delete action or a
/// parent that is not itself listed fails the whole build.
pub fn catalog_from_rows(
    tables: &[TableRow],
    index_columns: &[IndexColumnRow],
) -> Result<MemoryCatalog, InternalError> {
    let indexes = indexes_from_rows(index_columns);
    let mut builder = MemoryCatalog::builder();

    for row in tables {
        let on_delete = match row.on_delete_action.as_deref() {
            Some(action) => action.parse::<OnDelete>().map_err(|err| {
                InternalError::invalid_argument(
                    ErrorOrigin::Catalog,
                    format!("table '{}': {err}", row.table_name),
                )
            })?,
            None => OnDelete::NoAction,
        };

        let mut schema = TableSchema::new(row.table_name.clone(), Vec::<String>::new());
        for index in indexes.iter().filter(|index| index.table == row.table_name) {
            let columns = index.columns.iter().map(|column| column.name.clone());
            if index.is_primary_key() {
                schema.primary_key = columns.collect();
            } else {
                let mut spec = IndexSpec::new(index.name.clone(), columns).with_state(index.state);
                spec.unique = index.unique;
                spec.null_filtered = index.null_filtered;
                schema = schema.with_index_spec(spec);
            }
        }

        if let Some(parent) = row.parent_table_name.as_deref().filter(|p| !p.is_empty()) {
            schema = schema.interleaved_in(parent, on_delete);
        }

        builder = builder.table(schema);
    }

    builder.build()
}
