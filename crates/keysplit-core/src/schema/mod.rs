//! Schema vocabulary and the catalog contract the planner depends on.
//!
//! The catalog is an external collaborator; this module only names what it
//! must answer (primary keys, indexes, interleave edges) and ships two
//! reference implementations.

pub mod information_schema;
pub mod memory;


use crate::error::InternalError;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

// re-exports
pub use memory::{CatalogSnapshot, IndexSpec, MemoryCatalog, MemoryCatalogBuilder, TableSchema};

/// Index name the store reserves for every table's primary key.
pub const PRIMARY_KEY_INDEX: &str = "PRIMARY_KEY";

///
/// Column
///
/// Column identity within one table. Ordinal position is absent for some
/// catalog sources (storing columns, hand-written snapshots).
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Column {
    pub name: String,

    #[serde(default)]
    pub ordinal_position: Option<i64>,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ordinal_position: None,
        }
    }

    #[must_use]
    pub const fn at(mut self, ordinal_position: i64) -> Self {
        self.ordinal_position = Some(ordinal_position);
        self
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

///
/// IndexKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexKind {
    Index,
    PrimaryKey,
}

///
/// IndexState
///
/// Index lifecycle state. Every state counts toward write fanout: the store
/// maintains entries for an index from the moment it accepts writes.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexState {
    Prepare,
    WriteOnly,
    WriteOnlyCleanup,
    WriteOnlyValidateUnique,
    ReadWrite,
    #[default]
    Unknown,
}

impl IndexState {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Prepare => "PREPARE",
            Self::WriteOnly => "WRITE_ONLY",
            Self::WriteOnlyCleanup => "WRITE_ONLY_CLEANUP",
            Self::WriteOnlyValidateUnique => "WRITE_ONLY_VALIDATE_UNIQUE",
            Self::ReadWrite => "READ_WRITE",
            Self::Unknown => "",
        }
    }
}

impl FromStr for IndexState {
    type Err = std::convert::Infallible;

    // Unrecognized states map to `Unknown` rather than failing the lookup.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "PREPARE" => Self::Prepare,
            "WRITE_ONLY" => Self::WriteOnly,
            "WRITE_ONLY_CLEANUP" => Self::WriteOnlyCleanup,
            "WRITE_ONLY_VALIDATE_UNIQUE" => Self::WriteOnlyValidateUnique,
            "READ_WRITE" => Self::ReadWrite,
            _ => Self::Unknown,
        })
    }
}

impl Display for IndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

///
/// Index
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Index {
    pub name: String,
    pub kind: IndexKind,
    pub table: String,
    pub parent_table: Option<String>,
    pub unique: bool,
    pub null_filtered: bool,
    pub state: IndexState,
    pub columns: Vec<Column>,
}

impl Index {
    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        matches!(self.kind, IndexKind::PrimaryKey)
    }

    #[must_use]
    pub const fn is_secondary(&self) -> bool {
        !self.is_primary_key()
    }
}

///
/// OnDelete
///
/// Delete action of an interleaved child relative to its parent.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnDelete {
    Cascade,
    #[default]
    NoAction,
}

impl OnDelete {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::NoAction => "NO ACTION",
        }
    }
}

impl FromStr for OnDelete {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('_', " ").as_str() {
            "CASCADE" => Ok(Self::Cascade),
            "NO ACTION" | "" => Ok(Self::NoAction),
            other => Err(format!("unknown delete action '{other}'")),
        }
    }
}

impl Display for OnDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

///
/// InterleaveChild
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InterleaveChild {
    pub table: String,
    pub on_delete: OnDelete,
}

impl InterleaveChild {
    #[must_use]
    pub const fn cascades(&self) -> bool {
        matches!(self.on_delete, OnDelete::Cascade)
    }
}

///
/// Catalog
///
/// Read-only schema lookups for one database. Answers must reflect committed
/// schema state; an unknown table fails with a `SchemaUnavailable` error.
///

pub trait Catalog {
    /// Primary-key columns of `table`, in key order.
    fn primary_key_columns(&self, table: &str) -> Result<Vec<Column>, InternalError>;

    /// Every index on `table`, the primary key included.
    fn table_indexes(&self, table: &str) -> Result<Vec<Index>, InternalError>;

    /// Tables interleaved directly under `table`.
    fn interleave_children(&self, table: &str) -> Result<Vec<InterleaveChild>, InternalError>;

    /// Parent of `table`, if it is interleaved.
    fn parent(&self, table: &str) -> Result<Option<String>, InternalError>;

    /// Indexes on `table` other than its primary key.
    fn secondary_indexes(&self, table: &str) -> Result<Vec<Index>, InternalError> {
        let mut indexes = self.table_indexes(table)?;
        indexes.retain(Index::is_secondary);

        Ok(indexes)
    }
}

impl<T> Catalog for &T
where
    T: Catalog + ?Sized,
{
    fn primary_key_columns(&self, table: &str) -> Result<Vec<Column>, InternalError> {
        (**self).primary_key_columns(table)
    }

    fn table_indexes(&self, table: &str) -> Result<Vec<Index>, InternalError> {
        (**self).table_indexes(table)
    }

    fn interleave_children(&self, table: &str) -> Result<Vec<InterleaveChild>, InternalError> {
        (**self).interleave_children(table)
    }

    fn parent(&self, table: &str) -> Result<Option<String>, InternalError> {
        (**self).parent(table)
    }

    fn secondary_indexes(&self, table: &str) -> Result<Vec<Index>, InternalError> {
        (**self).secondary_indexes(table)
    }
}
