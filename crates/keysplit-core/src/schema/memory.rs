//! In-memory catalog backed by plain table descriptions.
//!
//! Tables can be assembled with the builder or deserialized from a TOML
//! snapshot:
//!
//! ```toml
//! [[tables]]
//! name = "Singers"
//! primary_key = ["SingerId"]
//! indexes = [{ name = "SingersByName", columns = ["LastName"] }]
//!
//! [[tables]]
//! name = "Albums"
//! primary_key = ["SingerId", "AlbumId"]
//! parent = "Singers"
//! on_delete = "CASCADE"
//! ```

use crate::{
    error::{ErrorOrigin, InternalError},
    schema::{
        Catalog, Column, Index, IndexKind, IndexState, InterleaveChild, OnDelete,
        PRIMARY_KEY_INDEX,
    },
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path};

///
/// IndexSpec
///
/// Secondary index description within a [`TableSchema`].
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IndexSpec {
    pub name: String,
    pub columns: Vec<String>,

    #[serde(default)]
    pub unique: bool,

    #[serde(default)]
    pub null_filtered: bool,

    #[serde(default)]
    pub state: IndexState,
}

impl IndexSpec {
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
            null_filtered: false,
            state: IndexState::ReadWrite,
        }
    }

    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub const fn with_state(mut self, state: IndexState) -> Self {
        self.state = state;
        self
    }
}

///
/// TableSchema
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableSchema {
    pub name: String,
    pub primary_key: Vec<String>,

    #[serde(default)]
    pub indexes: Vec<IndexSpec>,

    #[serde(default)]
    pub parent: Option<String>,

    #[serde(default)]
    pub on_delete: OnDelete,
}

impl TableSchema {
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, primary_key: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            primary_key: primary_key.into_iter().map(Into::into).collect(),
            indexes: Vec::new(),
            parent: None,
            on_delete: OnDelete::NoAction,
        }
    }

    /// Add a read-write, non-unique secondary index.
    #[must_use]
    pub fn with_index<I, S>(self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_index_spec(IndexSpec::new(name, columns))
    }

    #[must_use]
    pub fn with_index_spec(mut self, index: IndexSpec) -> Self {
        self.indexes.push(index);
        self
    }

    #[must_use]
    pub fn interleaved_in(mut self, parent: impl Into<String>, on_delete: OnDelete) -> Self {
        self.parent = Some(parent.into());
        self.on_delete = on_delete;
        self
    }

    fn primary_key_index(&self) -> Index {
        Index {
            name: PRIMARY_KEY_INDEX.to_string(),
            kind: IndexKind::PrimaryKey,
            table: self.name.clone(),
            parent_table: self.parent.clone(),
            unique: true,
            null_filtered: false,
            state: IndexState::Unknown,
            columns: self.primary_key_columns(),
        }
    }

    fn primary_key_columns(&self) -> Vec<Column> {
        (1_i64..)
            .zip(&self.primary_key)
            .map(|(pos, name)| Column::new(name.clone()).at(pos))
            .collect()
    }

    fn secondary_index(&self, spec: &IndexSpec) -> Index {
        Index {
            name: spec.name.clone(),
            kind: IndexKind::Index,
            table: self.name.clone(),
            parent_table: self.parent.clone(),
            unique: spec.unique,
            null_filtered: spec.null_filtered,
            state: spec.state,
            columns: (1_i64..)
                .zip(&spec.columns)
                .map(|(pos, name)| Column::new(name.clone()).at(pos))
                .collect(),
        }
    }
}

///
/// CatalogSnapshot
///
/// Serialized form of a [`MemoryCatalog`].
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub tables: Vec<TableSchema>,
}

///
/// MemoryCatalog
///
/// Immutable catalog over a fixed set of tables. Parent links must name a
/// known table; the interleave graph itself is not checked for cycles.
///

#[derive(Clone, Debug, Default)]
pub struct MemoryCatalog {
    tables: BTreeMap<String, TableSchema>,
}

impl MemoryCatalog {
    #[must_use]
    pub fn builder() -> MemoryCatalogBuilder {
        MemoryCatalogBuilder::default()
    }

    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Result<Self, InternalError> {
        snapshot
            .tables
            .into_iter()
            .fold(Self::builder(), MemoryCatalogBuilder::table)
            .build()
    }

    pub fn from_toml_str(source: &str) -> Result<Self, InternalError> {
        let snapshot: CatalogSnapshot = toml::from_str(source).map_err(|err| {
            InternalError::invalid_argument(
                ErrorOrigin::Catalog,
                format!("invalid catalog snapshot: {err}"),
            )
        })?;

        Self::from_snapshot(snapshot)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InternalError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|err| {
            InternalError::invalid_argument(
                ErrorOrigin::Catalog,
                format!("cannot read catalog snapshot '{}': {err}", path.display()),
            )
        })?;

        Self::from_toml_str(&source)
    }

    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            tables: self.tables.values().cloned().collect(),
        }
    }

    #[must_use]
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    fn table(&self, table: &str) -> Result<&TableSchema, InternalError> {
        self.tables
            .get(table)
            .ok_or_else(|| InternalError::table_not_found(table))
    }
}

impl Catalog for MemoryCatalog {
    fn primary_key_columns(&self, table: &str) -> Result<Vec<Column>, InternalError> {
        Ok(self.table(table)?.primary_key_columns())
    }

    fn table_indexes(&self, table: &str) -> Result<Vec<Index>, InternalError> {
        let schema = self.table(table)?;
        let mut indexes = vec![schema.primary_key_index()];
        indexes.extend(schema.indexes.iter().map(|spec| schema.secondary_index(spec)));

        Ok(indexes)
    }

    fn interleave_children(&self, table: &str) -> Result<Vec<InterleaveChild>, InternalError> {
        self.table(table)?;

        Ok(self
            .tables
            .values()
            .filter(|child| child.parent.as_deref() == Some(table))
            .map(|child| InterleaveChild {
                table: child.name.clone(),
                on_delete: child.on_delete,
            })
            .collect())
    }

    fn parent(&self, table: &str) -> Result<Option<String>, InternalError> {
        Ok(self.table(table)?.parent.clone())
    }
}

///
/// MemoryCatalogBuilder
///

#[derive(Debug, Default)]
pub struct MemoryCatalogBuilder {
    tables: Vec<TableSchema>,
}

impl MemoryCatalogBuilder {
    #[must_use]
    pub fn table(mut self, table: TableSchema) -> Self {
        self.tables.push(table);
        self
    }

    /// Validate and freeze the catalog.
    pub fn build(self) -> Result<MemoryCatalog, InternalError> {
        let mut tables = BTreeMap::new();

        for table in self.tables {
            if table.primary_key.is_empty() {
                return Err(invalid_schema(&table.name, "primary key has no columns"));
            }
            if let Some(index) = table
                .indexes
                .iter()
                .find(|index| index.name == PRIMARY_KEY_INDEX)
            {
                return Err(invalid_schema(
                    &table.name,
                    format!("index name '{}' is reserved", index.name),
                ));
            }
            if tables.contains_key(&table.name) {
                return Err(invalid_schema(&table.name, "table declared twice"));
            }

            tables.insert(table.name.clone(), table);
        }

        for table in tables.values() {
            if let Some(parent) = &table.parent
                && !tables.contains_key(parent)
            {
                return Err(invalid_schema(
                    &table.name,
                    format!("parent table '{parent}' is not declared"),
                ));
            }
        }

        Ok(MemoryCatalog { tables })
    }
}

fn invalid_schema(table: &str, message: impl Into<String>) -> InternalError {
    let message = message.into();

    InternalError::invalid_argument(
        ErrorOrigin::Catalog,
        format!("invalid schema for table '{table}': {message}"),
    )
}
