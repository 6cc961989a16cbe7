//! Per-kind schema tracking
//!
//! The tracker records, for every kind ever written, the collection its
//! entities were first written to and the type tag last observed for each
//! property. It only serves introspection queries; it never validates or
//! coerces writes and never decides which collections a query scans.
//!
//! ## Persistence
//!
//! One flat record per kind in the schema collection:
//!
//! ```text
//! { "_id": "Product", "__kind__": "Product", "__collection__": "product",
//!   "price": "int", "tags": "list:string" }
//! ```
//!
//! Property names are stored like entity fields (`.` as `#!#`). Put rejects
//! `_id` and `__x__` property names, so they never clash with the record's
//! own fields.
//!
//! A record is written only when it differs from the cached one, so repeated
//! puts of same-shaped entities cost no schema writes.
//!
//! ## Consistency
//!
//! Within one tracker, merging into a record and persisting it happen under a
//! single lock, so concurrent writers of one kind never drop each other's
//! properties. Entity writes and schema writes stay independent, and two
//! engines sharing one storage database each keep their own cache and may
//! overwrite each other's records; the next write of a kind re-derives its
//! record.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use dsbridge_core::{Entity, Error, Result};
use dsbridge_storage::{Document, DocumentStore, Filter, FindOptions, JsonValue, ID_FIELD};

use crate::codec::{
    collection_for_kind, decode_field_name, encode_field_name, schema_tag, KIND_FIELD,
};

/// Field holding a schema record's collection
pub const COLLECTION_FIELD: &str = "__collection__";

/// Schema of one kind
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaRecord {
    /// Kind name
    pub kind: String,
    /// Collection the kind was first written to
    pub collection: String,
    /// Property name to type tag
    pub properties: BTreeMap<String, String>,
}

impl SchemaRecord {
    /// Empty record for a kind
    pub fn new(kind: impl Into<String>, collection: impl Into<String>) -> Self {
        SchemaRecord {
            kind: kind.into(),
            collection: collection.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Record for one entity written to `collection`
    pub fn of_entity(entity: &Entity, collection: &str) -> Self {
        let mut record = SchemaRecord::new(entity.key().kind(), collection);
        for (name, value) in entity.properties() {
            record.properties.insert(name.to_string(), schema_tag(value));
        }
        record
    }

    /// Union of `self` and `newer`
    ///
    /// Property tags from `newer` win; the collection of `self` is kept.
    pub fn merged(&self, newer: &SchemaRecord) -> SchemaRecord {
        let mut out = self.clone();
        if out.collection.is_empty() {
            out.collection = newer.collection.clone();
        }
        for (name, tag) in &newer.properties {
            out.properties.insert(name.clone(), tag.clone());
        }
        out
    }

    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(ID_FIELD.to_string(), JsonValue::from(self.kind.clone()));
        doc.insert(KIND_FIELD.to_string(), JsonValue::from(self.kind.clone()));
        doc.insert(
            COLLECTION_FIELD.to_string(),
            JsonValue::from(self.collection.clone()),
        );
        for (name, tag) in &self.properties {
            doc.insert(encode_field_name(name), JsonValue::from(tag.clone()));
        }
        doc
    }

    fn from_document(doc: &Document) -> Result<Self> {
        let kind = doc
            .get(KIND_FIELD)
            .or_else(|| doc.get(ID_FIELD))
            .and_then(JsonValue::as_str)
            .ok_or_else(|| Error::corrupt("schema record has no kind"))?;
        let collection = doc
            .get(COLLECTION_FIELD)
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| collection_for_kind(kind));
        let mut record = SchemaRecord::new(kind, collection);
        for (field, tag) in doc {
            if field == ID_FIELD || field == KIND_FIELD || field == COLLECTION_FIELD {
                continue;
            }
            let tag = tag.as_str().ok_or_else(|| {
                Error::corrupt(format!("schema of '{}' has a non-string tag", kind))
            })?;
            record.properties.insert(decode_field_name(field), tag.to_string());
        }
        Ok(record)
    }
}

/// Cached, persisted per-kind schema
pub struct SchemaTracker {
    store: Arc<dyn DocumentStore>,
    collection: String,
    cache: RwLock<HashMap<String, SchemaRecord>>,
    writer: Mutex<()>,
}

impl std::fmt::Debug for SchemaTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaTracker")
            .field("collection", &self.collection)
            .field("kinds", &self.cache.read().len())
            .finish()
    }
}

impl SchemaTracker {
    /// Create a tracker persisting to `collection`; the cache starts empty
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        SchemaTracker {
            store,
            collection: collection.into(),
            cache: RwLock::new(HashMap::new()),
            writer: Mutex::new(()),
        }
    }

    /// Name of the schema collection
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Repopulate the cache from storage, returning the number of kinds
    pub fn load(&self) -> Result<usize> {
        let _writer = self.writer.lock();
        let mut loaded = HashMap::new();
        for doc in self
            .store
            .find(&self.collection, &Filter::all(), &FindOptions::new())?
        {
            let record = SchemaRecord::from_document(&doc?)?;
            loaded.insert(record.kind.clone(), record);
        }
        let count = loaded.len();
        *self.cache.write() = loaded;
        info!(target: "dsbridge::schema", kinds = count, "Loaded schema");
        Ok(count)
    }

    /// Persist `record` if it differs from the cached one
    ///
    /// Returns whether a write happened.
    pub fn update_if_changed(&self, record: SchemaRecord) -> Result<bool> {
        let _writer = self.writer.lock();
        self.write_if_changed(record)
    }

    /// Caller holds `writer`
    fn write_if_changed(&self, record: SchemaRecord) -> Result<bool> {
        if self.cache.read().get(&record.kind) == Some(&record) {
            return Ok(false);
        }
        self.store.upsert(&self.collection, record.to_document())?;
        debug!(
            target: "dsbridge::schema",
            kind = %record.kind,
            properties = record.properties.len(),
            "Schema updated"
        );
        self.cache.write().insert(record.kind.clone(), record);
        Ok(true)
    }

    /// Fold one written entity into its kind's schema
    pub fn observe(&self, entity: &Entity, collection: &str) -> Result<bool> {
        let observed = SchemaRecord::of_entity(entity, collection);
        let _writer = self.writer.lock();
        let merged = match self.cache.read().get(&observed.kind) {
            Some(known) => known.merged(&observed),
            None => observed,
        };
        self.write_if_changed(merged)
    }

    /// Every known kind, sorted
    pub fn get_kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.cache.read().keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Type tag of `kind.property`
    pub fn get_type(&self, kind: &str, property: &str) -> Result<String> {
        let cache = self.cache.read();
        let record = cache
            .get(kind)
            .ok_or_else(|| Error::NotFound(format!("no such kind '{}' in schema", kind)))?;
        record.properties.get(property).cloned().ok_or_else(|| {
            Error::NotFound(format!("no such property {}.{}", kind, property))
        })
    }

    /// Cached record of a kind
    pub fn get(&self, kind: &str) -> Option<SchemaRecord> {
        self.cache.read().get(kind).cloned()
    }

    /// Forget every cached record
    pub fn clear(&self) {
        let _writer = self.writer.lock();
        self.cache.write().clear();
    }
}
