//! ## Crate layout
//! - `core`: value codec, mutation budget, key-range partitioner, and the
//!   catalog and scan contracts they consume.
//! - `error`: public error taxonomy mapped from core errors.
//! - `planner`: the `DeletePlanner` session that turns a table into a
//!   budgeted list of counted key ranges.
//!
//! The `prelude` module carries the vocabulary most callers need.

pub use keysplit_core as core;

pub mod error;
pub mod planner;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{Error, ErrorKind};
pub use planner::{DeletePlan, DeletePlanner};

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        core::{
            config::PlannerConfig,
            db::{CountedKeyRange, KeyValue, MutationBudget, RowScanner},
            schema::Catalog,
            value::DecodedValue,
        },
        error::{Error, ErrorKind},
        planner::{DeletePlan, DeletePlanner},
    };
}
