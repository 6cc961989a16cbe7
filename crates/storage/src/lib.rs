//! Storage layer for dsbridge
//!
//! This crate defines what the engine consumes from a schema-less document
//! store and provides an in-process implementation:
//! - DocumentStore: find/upsert/remove/drop/ensure-index capability set
//! - Filter / Condition: typed query AST with document-store matching rules
//! - Cross-type ordering shared by sorting engines and result merging
//! - MemoryStore: BTreeMap-based store with RwLock and write accounting

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod filter;
pub mod memory;
pub mod order;
pub mod store;

pub use document::{project, resolve, Document, JsonValue, ID_FIELD};
pub use filter::{Condition, Filter};
pub use memory::MemoryStore;
pub use order::{compare_documents, compare_values, sort_key, SortSpec};
pub use store::{DocumentCursor, DocumentStore, FindOptions, IndexSpec};
