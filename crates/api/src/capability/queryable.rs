//! Cursor-based query operations
//!
//! A query runs in two steps: `run_query` opens a cursor and applies the
//! offset, then `next` pulls batches until `more_results` is false. Cursors
//! that are abandoned early should be released with `discard`.

use dsbridge_core::{Query, Result};
use dsbridge_engine::{Batch, RunQueryResult};

/// Query execution by cursor id
///
/// ## Error Handling
///
/// | Condition | Error |
/// |-----------|-------|
/// | Ill-formed query | `BadRequest` |
/// | Composite index not registered | `MissingRequiredIndex` |
/// | Unknown `__x__` kind | `UnsupportedPseudoKind` |
/// | Unknown or exhausted cursor id | `CursorNotFound` |
pub trait Queryable {
    /// Start a query
    fn run_query(&self, query: &Query) -> Result<RunQueryResult>;

    /// Pull up to `count` results
    ///
    /// Fewer results than requested only when the cursor is exhausted.
    fn next(&self, cursor_id: u64, count: usize) -> Result<Batch>;

    /// Release a cursor; returns whether it was open
    fn discard(&self, cursor_id: u64) -> bool;
}
