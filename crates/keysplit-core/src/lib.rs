//! Core engine for keysplit: the value codec, the mutation budget, the
//! key-range partitioner, and the catalog and scan contracts they consume.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod obs;
pub mod schema;
pub mod value;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, sinks, or reference collaborators are re-exported here.
///

pub mod prelude {
    pub use crate::{
        config::PlannerConfig,
        db::{
            CountedKeyRange, KeyValue, MutationBudget, RowScanner, RowStream, ScanRequest,
            ScanRow,
        },
        schema::{Catalog, Index, InterleaveChild, OnDelete},
        value::{ColumnType, DecodedValue, RawCell, Scalar, TypeCode},
    };
}
