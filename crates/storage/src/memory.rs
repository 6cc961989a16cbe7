//! MemoryStore: in-process document store
//!
//! This module implements [`DocumentStore`] using:
//! - `BTreeMap<String, Collection>` keyed by collection name
//! - `BTreeMap<String, Document>` per collection keyed by rendered `_id`
//! - `parking_lot::RwLock` for thread-safe access
//!
//! # Design Notes
//!
//! - **Snapshot finds**: a find evaluates filter, sort, skip and limit under
//!   the read lock and hands back an iterator over the copied result
//! - **Natural order** is ascending `_id` text
//! - **Write accounting**: every upsert and every removed document counts as
//!   one write on its collection, so callers can observe write amortisation
//! - **Failure injection**: [`MemoryStore::set_unavailable`] makes every call
//!   fail with `StorageUnavailable`; [`MemoryStore::reject_writes`] does the
//!   same for upserts and removals on one collection

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use dsbridge_core::{Error, Result};

use crate::document::{project, Document, JsonValue, ID_FIELD};
use crate::filter::Filter;
use crate::order::compare_documents;
use crate::store::{DocumentCursor, DocumentStore, FindOptions, IndexSpec};

#[derive(Debug, Default, Clone)]
struct Collection {
    documents: BTreeMap<String, Document>,
    indexes: Vec<IndexSpec>,
    writes: u64,
}

/// In-memory document store
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<BTreeMap<String, Collection>>>,
    unavailable: AtomicBool,
    read_only: RwLock<BTreeSet<String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or succeed again)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make upserts and removals on `collection` fail (or succeed again)
    pub fn reject_writes(&self, collection: &str, reject: bool) {
        let mut read_only = self.read_only.write();
        if reject {
            read_only.insert(collection.to_string());
        } else {
            read_only.remove(collection);
        }
    }

    /// Number of writes applied to `collection` since creation or drop
    pub fn write_count(&self, collection: &str) -> u64 {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.writes)
            .unwrap_or(0)
    }

    /// Number of documents in `collection`
    pub fn document_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.documents.len())
            .unwrap_or(0)
    }

    /// Indexes requested on `collection`
    pub fn indexes(&self, collection: &str) -> Vec<IndexSpec> {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.indexes.clone())
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::storage("memory store marked unavailable"));
        }
        Ok(())
    }

    fn check_writable(&self, collection: &str) -> Result<()> {
        self.check_available()?;
        if self.read_only.read().contains(collection) {
            return Err(Error::storage(format!(
                "memory store rejects writes to '{}'",
                collection
            )));
        }
        Ok(())
    }

    fn id_of(document: &Document) -> Result<String> {
        match document.get(ID_FIELD) {
            Some(JsonValue::String(id)) => Ok(id.clone()),
            Some(other) => Ok(other.to_string()),
            None => Err(Error::invalid_value("document has no _id")),
        }
    }
}

impl DocumentStore for MemoryStore {
    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<DocumentCursor> {
        self.check_available()?;
        let collections = self.collections.read();
        let mut matched: Vec<Document> = match collections.get(collection) {
            Some(c) => c
                .documents
                .values()
                .filter(|doc| filter.matches(doc))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        drop(collections);

        if !options.sort.is_empty() {
            matched.sort_by(|a, b| compare_documents(a, b, &options.sort));
        }

        let limit = options.limit.unwrap_or(usize::MAX);
        let projection = options.projection.clone();
        let results: Vec<Document> = matched
            .into_iter()
            .skip(options.skip)
            .take(limit)
            .map(|doc| match &projection {
                Some(fields) => project(&doc, fields),
                None => doc,
            })
            .collect();

        trace!(
            target: "dsbridge::storage",
            collection,
            filter = %filter.to_json(),
            results = results.len(),
            "find"
        );
        Ok(Box::new(results.into_iter().map(Ok)))
    }

    fn upsert(&self, collection: &str, document: Document) -> Result<()> {
        self.check_writable(collection)?;
        let id = Self::id_of(&document)?;
        let mut collections = self.collections.write();
        let entry = collections.entry(collection.to_string()).or_default();
        entry.documents.insert(id, document);
        entry.writes += 1;
        Ok(())
    }

    fn remove(&self, collection: &str, filter: &Filter) -> Result<usize> {
        self.check_writable(collection)?;
        let mut collections = self.collections.write();
        let Some(entry) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = entry.documents.len();
        entry.documents.retain(|_, doc| !filter.matches(doc));
        let removed = before - entry.documents.len();
        entry.writes += removed as u64;
        Ok(removed)
    }

    fn drop_database(&self) -> Result<()> {
        self.check_available()?;
        self.collections.write().clear();
        Ok(())
    }

    fn ensure_index(&self, collection: &str, spec: &IndexSpec) -> Result<()> {
        self.check_available()?;
        let mut collections = self.collections.write();
        let entry = collections.entry(collection.to_string()).or_default();
        if !entry.indexes.contains(spec) {
            entry.indexes.push(spec.clone());
        }
        Ok(())
    }

    fn collection_names(&self) -> Result<Vec<String>> {
        self.check_available()?;
        Ok(self.collections.read().keys().cloned().collect())
    }
}
