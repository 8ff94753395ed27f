//! Core types used throughout the harness
//!
//! The store under test is keyed two levels deep: table, then item.

/// Table ID - in `[0, table_amount)`.
///
/// Known to every writer and to the verifier before the run starts.
pub type TableId = u32;

/// Item ID - in `[0, item_amount * worker_count)`.
///
/// # Ownership:
/// - Partitioned into one contiguous range per worker
/// - No item id is ever written by two workers
pub type ItemId = u32;

/// Worker index - in `[0, worker_count)`.
pub type WorkerIndex = u32;
