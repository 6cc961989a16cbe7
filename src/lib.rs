//! dsbridge - datastore entities on a schema-less document store
//!
//! dsbridge lets an application written against a datastore-style API
//! (kinds, hierarchical keys, typed properties, ancestor and projection
//! queries) run on top of a document database.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use dsbridge::{Datastore, DatastoreConfig, Entity, Key, MemoryStore, Query};
//!
//! let db = Datastore::open(Arc::new(MemoryStore::new()), DatastoreConfig::new("guestbook"))?;
//! db.put(&[Entity::new(Key::incomplete("Greeting")).with("text", "hello")])?;
//!
//! let started = db.run_query(&Query::new("Greeting"))?;
//! let batch = db.next(started.cursor_id, 20)?;
//! ```
//!
//! # Architecture
//!
//! - `dsbridge-core`: keys, values, entities, queries, errors
//! - `dsbridge-storage`: the document-store capability and an in-memory engine
//! - `dsbridge-engine`: codecs, schema tracking, query execution, cursors
//! - `dsbridge-api`: narrow capabilities for a host dispatcher

pub use dsbridge_api::{Clearable, EntityStore, ErrorResponse, Queryable};
pub use dsbridge_core::*;
pub use dsbridge_engine::{
    Batch, CompositeIndexPolicy, Datastore, DatastoreConfig, EntityCursor, IndexPolicy,
    RunQueryResult, SchemaTracker,
};
pub use dsbridge_storage::{DocumentStore, MemoryStore};
