//! The document-store capability set
//!
//! [`DocumentStore`] is everything the engine needs from a schema-less
//! storage engine: filtered and sorted finds, upsert by `_id`, filtered
//! removal, database drop and best-effort index creation. Drivers for real
//! engines implement it; [`crate::MemoryStore`] is the in-process reference.

use serde::{Deserialize, Serialize};

use dsbridge_core::{Direction, Result};

use crate::document::Document;
use crate::filter::Filter;
use crate::order::SortSpec;

/// Lazy sequence of documents returned by a find
pub type DocumentCursor = Box<dyn Iterator<Item = Result<Document>> + Send>;

/// Modifiers applied to a find
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Field paths to return; `None` returns whole documents. `_id` is
    /// always returned.
    pub projection: Option<Vec<String>>,
    /// Sort specification
    pub sort: SortSpec,
    /// Number of leading documents to skip
    pub skip: usize,
    /// Maximum number of documents to return
    pub limit: Option<usize>,
}

impl FindOptions {
    /// Options returning every matching document in natural order
    pub fn new() -> Self {
        FindOptions::default()
    }

    /// Restrict returned fields
    pub fn projection(mut self, fields: Vec<String>) -> Self {
        self.projection = Some(fields);
        self
    }

    /// Add a sort term
    pub fn sort(mut self, path: impl Into<String>, direction: Direction) -> Self {
        self.sort.push((path.into(), direction));
        self
    }

    /// Skip leading documents
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Cap the number of documents
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Storage index specification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Indexed field paths, most significant first
    pub fields: Vec<(String, Direction)>,
}

impl IndexSpec {
    /// Single-field ascending index
    pub fn ascending(path: impl Into<String>) -> Self {
        IndexSpec {
            fields: vec![(path.into(), Direction::Ascending)],
        }
    }

    /// Index over the given fields
    pub fn new(fields: Vec<(String, Direction)>) -> Self {
        IndexSpec { fields }
    }

    /// Conventional index name, e.g. `price_1_rating_-1`
    pub fn name(&self) -> String {
        self.fields
            .iter()
            .map(|(path, direction)| match direction {
                Direction::Ascending => format!("{}_1", path),
                Direction::Descending => format!("{}_-1", path),
            })
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// Schema-less document storage engine
///
/// Every failure to reach or execute on the engine is reported as
/// `Error::StorageUnavailable`.
pub trait DocumentStore: Send + Sync {
    /// Find documents in `collection` matching `filter`
    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<DocumentCursor>;

    /// Insert `document`, replacing any document with the same `_id`
    fn upsert(&self, collection: &str, document: Document) -> Result<()>;

    /// Remove every document in `collection` matching `filter`
    fn remove(&self, collection: &str, filter: &Filter) -> Result<usize>;

    /// Drop every collection
    fn drop_database(&self) -> Result<()>;

    /// Request an index; completion may be asynchronous
    fn ensure_index(&self, collection: &str, spec: &IndexSpec) -> Result<()>;

    /// Names of existing collections
    fn collection_names(&self) -> Result<Vec<String>>;
}
