//! Budget and partition engine plus the scan contract it consumes.
//!
//! Flow: `budget` turns catalog fanout into a batch size, `partition` turns
//! an ordered key scan into counted ranges of at most that many rows.

pub mod budget;
pub mod key;
pub mod memory;
pub mod partition;
pub mod scan;

// re-exports
pub use budget::{
    MutationBudget, UNBOUNDED_BATCH_SIZE, batch_size_for, compute_budget, index_fanout,
    max_rows_per_transaction, total_fanout,
};
pub use key::{CountedKeyRange, KeyValue};
pub use memory::{MemoryDatabase, MemoryTable};
pub use partition::{KeyRangePartitioner, PartitionPage};
pub use scan::{
    BudgetedRowStream, RowScanner, RowStream, RowStreamBox, ScanRequest, ScanRow, VecRowStream,
};
