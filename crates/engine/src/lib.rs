//! Datastore engine for dsbridge
//!
//! This crate maps datastore semantics onto a schema-less document store:
//! - Codecs: keys, values and entities to and from storage documents
//! - Schema tracking: per-kind property types, persisted and cached
//! - Queries: translation, merged result cursors, offset emulation,
//!   projection splitting and introspection pseudo-kinds
//! - Index policy: composite index enforcement
//! - `Datastore`: the long-lived engine tying it together, with its cursor
//!   table
//!
//! The engine is the only component that knows how entities are laid out in
//! storage.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod config;
pub mod datastore;
pub mod ids;
pub mod index;
pub mod query;
pub mod schema;

pub use config::{DatastoreConfig, CONFIG_FILE_NAME, DEFAULT_SCHEMA_COLLECTION};
pub use datastore::{Batch, Datastore, RunQueryResult};
pub use ids::IdAllocator;
pub use index::{required_index, AllowAll, CompositeIndexPolicy, IndexPolicy};
pub use query::{EntityCursor, PseudoKindCursor, ResultCursor, TranslatedQuery};
pub use schema::{SchemaRecord, SchemaTracker};
