//! The datastore engine
//!
//! [`Datastore`] owns everything that lives as long as the host: the storage
//! handle, the schema cache, the id allocator, the index policy and the table
//! of open cursors. It is built once with [`Datastore::open`], which loads the
//! persisted schema, and is shared by reference across request handlers.
//!
//! ## Writes
//!
//! A batch `put` validates and encodes every entity before writing any of
//! them, so a malformed entity fails the batch without partial writes. Entity
//! writes and schema writes are separate storage operations; the schema only
//! feeds introspection, so a schema write lost after an entity write never
//! hides that entity from queries.
//!
//! ## Cursors
//!
//! [`Datastore::run_query`] registers a cursor under a fresh id and
//! [`Datastore::next`] pulls batches from it. Each cursor sits behind its own
//! mutex, so concurrent pulls on one id are serialized while pulls on
//! different ids proceed in parallel. Exhausted cursors are dropped; nothing
//! expires cursors that are abandoned before exhaustion, call
//! [`Datastore::discard`] for those.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use dsbridge_core::{
    is_pseudo_kind, Direction, Entity, Error, IndexDefinition, Key, Limits, Query, Result,
};
use dsbridge_storage::{
    Condition, DocumentStore, Filter, FindOptions, IndexSpec, JsonValue, ID_FIELD,
};

use crate::codec::{
    collection_for_kind, collection_of, encode_field_name, encode_for_storage, from_document,
    to_document, KIND_FIELD, PATH_FIELD,
};
use crate::config::DatastoreConfig;
use crate::ids::IdAllocator;
use crate::index::{AllowAll, CompositeIndexPolicy, IndexPolicy};
use crate::query::{translate, EntityCursor, MergedDocuments, PseudoKindCursor, ResultCursor};
use crate::schema::SchemaTracker;

type SharedCursor = Arc<Mutex<Box<dyn EntityCursor>>>;

// ============================================================================
// Results
// ============================================================================

/// Outcome of starting a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunQueryResult {
    /// Id to pass to [`Datastore::next`]
    pub cursor_id: u64,
    /// Results skipped for the query offset, capped at the configured maximum
    pub skipped_results: usize,
}

/// One batch pulled from a cursor
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Results in query order
    pub entities: Vec<Entity>,
    /// False once the cursor is exhausted
    pub more_results: bool,
    /// Whether projection splitting was abandoned for some results
    pub degraded: bool,
}

// ============================================================================
// Datastore
// ============================================================================

/// Datastore semantics on top of a document store
pub struct Datastore {
    store: Arc<dyn DocumentStore>,
    config: DatastoreConfig,
    limits: Limits,
    schema: SchemaTracker,
    ids: IdAllocator,
    index_policy: Arc<dyn IndexPolicy>,
    cursors: DashMap<u64, SharedCursor>,
    next_cursor: AtomicU64,
    indexed_collections: RwLock<HashSet<String>>,
}

impl std::fmt::Debug for Datastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Datastore")
            .field("app_id", &self.config.app_id)
            .field("limits", &self.limits)
            .field("schema", &self.schema)
            .field("open_cursors", &self.cursors.len())
            .finish()
    }
}

impl Datastore {
    /// Open a datastore over `store`
    ///
    /// Composite indexes are enforced when `config.require_indexes` is set.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid config, or the storage error
    /// raised while loading the schema.
    pub fn open(store: Arc<dyn DocumentStore>, config: DatastoreConfig) -> Result<Self> {
        let policy: Arc<dyn IndexPolicy> = if config.require_indexes {
            Arc::new(CompositeIndexPolicy::new())
        } else {
            Arc::new(AllowAll)
        };
        Self::with_index_policy(store, config, policy)
    }

    /// Open a datastore with a caller-supplied index policy
    pub fn with_index_policy(
        store: Arc<dyn DocumentStore>,
        config: DatastoreConfig,
        index_policy: Arc<dyn IndexPolicy>,
    ) -> Result<Self> {
        config.validate()?;
        let schema = SchemaTracker::new(Arc::clone(&store), config.schema_collection.clone());
        let kinds = schema.load()?;
        info!(
            target: "dsbridge::db",
            app_id = %config.app_id,
            kinds,
            require_indexes = config.require_indexes,
            "Opened datastore"
        );
        Ok(Datastore {
            store,
            limits: config.limits(),
            config,
            schema,
            ids: IdAllocator::new(),
            index_policy,
            cursors: DashMap::new(),
            next_cursor: AtomicU64::new(1),
            indexed_collections: RwLock::new(HashSet::new()),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &DatastoreConfig {
        &self.config
    }

    /// Active limits
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Schema tracker
    pub fn schema(&self) -> &SchemaTracker {
        &self.schema
    }

    /// Number of registered, unexhausted cursors
    pub fn open_cursors(&self) -> usize {
        self.cursors.len()
    }

    // ========================================================================
    // Entities
    // ========================================================================

    fn complete_key(&self, key: &Key) -> Result<Key> {
        key.validate_for_put()?;
        if let Some(element) = key.path().iter().find(|e| is_pseudo_kind(&e.kind)) {
            return Err(Error::malformed_key(format!(
                "kind '{}' is reserved",
                element.kind
            )));
        }
        if key.is_complete() {
            Ok(key.clone())
        } else {
            Ok(key.with_id(self.ids.next_id()))
        }
    }

    fn ensure_collection_indexes(&self, collection: &str) {
        if self.indexed_collections.read().contains(collection) {
            return;
        }
        for field in [PATH_FIELD, KIND_FIELD] {
            if let Err(e) = self
                .store
                .ensure_index(collection, &IndexSpec::ascending(field))
            {
                warn!(
                    target: "dsbridge::db",
                    collection,
                    field,
                    error = %e,
                    "Could not create index"
                );
            }
        }
        self.indexed_collections
            .write()
            .insert(collection.to_string());
    }

    /// Insert or replace entities
    ///
    /// Incomplete keys get a fresh numeric id. Returns the stored keys in
    /// input order.
    ///
    /// # Errors
    ///
    /// Fails before writing anything if a key is malformed, a property name
    /// is reserved or a value cannot be stored. Storage errors propagate.
    pub fn put(&self, entities: &[Entity]) -> Result<Vec<Key>> {
        let mut prepared = Vec::with_capacity(entities.len());
        for entity in entities {
            let key = self.complete_key(entity.key())?;
            for (name, value) in entity.properties() {
                self.limits.validate_value(name, value)?;
            }
            let entity = entity.with_key(key);
            let document = to_document(&entity)?;
            let collection = collection_of(entity.key());
            prepared.push((entity, collection, document));
        }

        let mut keys = Vec::with_capacity(prepared.len());
        for (entity, collection, document) in prepared {
            self.store.upsert(&collection, document)?;
            self.ensure_collection_indexes(&collection);
            self.schema.observe(&entity, &collection)?;
            keys.push(entity.key().clone());
        }
        debug!(target: "dsbridge::put", count = keys.len(), "Put entities");
        Ok(keys)
    }

    /// Group complete keys by collection, keeping each key's input position
    fn by_collection(keys: &[Key]) -> Result<BTreeMap<String, Vec<(usize, String)>>> {
        let mut groups: BTreeMap<String, Vec<(usize, String)>> = BTreeMap::new();
        for (position, key) in keys.iter().enumerate() {
            key.validate()?;
            groups
                .entry(collection_of(key))
                .or_default()
                .push((position, encode_for_storage(key)?));
        }
        Ok(groups)
    }

    fn id_filter(ids: &[(usize, String)]) -> Filter {
        Filter::field(
            ID_FIELD,
            Condition::In(ids.iter().map(|(_, id)| JsonValue::from(id.clone())).collect()),
        )
    }

    /// Fetch entities by key
    ///
    /// One find per collection; results come back in input order with `None`
    /// for missing entities.
    pub fn get(&self, keys: &[Key]) -> Result<Vec<Option<Entity>>> {
        let mut results: Vec<Option<Entity>> = vec![None; keys.len()];
        for (collection, ids) in Self::by_collection(keys)? {
            let mut found: HashMap<String, Entity> = HashMap::new();
            for doc in self
                .store
                .find(&collection, &Self::id_filter(&ids), &FindOptions::new())?
            {
                let doc = doc?;
                let Some(JsonValue::String(id)) = doc.get(ID_FIELD) else {
                    return Err(Error::corrupt("document without a string _id"));
                };
                let id = id.clone();
                found.insert(id, from_document(&doc)?);
            }
            for (position, id) in ids {
                results[position] = found.get(&id).cloned();
            }
        }
        debug!(
            target: "dsbridge::get",
            requested = keys.len(),
            found = results.iter().filter(|r| r.is_some()).count(),
            "Got entities"
        );
        Ok(results)
    }

    /// Delete entities by key; missing keys are ignored
    pub fn delete(&self, keys: &[Key]) -> Result<()> {
        let mut removed = 0;
        for (collection, ids) in Self::by_collection(keys)? {
            removed += self.store.remove(&collection, &Self::id_filter(&ids))?;
        }
        debug!(target: "dsbridge::delete", requested = keys.len(), removed, "Deleted entities");
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Entity collections present in storage
    fn entity_collections(&self) -> Result<Vec<String>> {
        let mut names = self.store.collection_names()?;
        names.retain(|name| name != self.schema.collection());
        Ok(names)
    }

    /// Start a query and return its cursor
    ///
    /// # Errors
    ///
    /// `MissingRequiredIndex` when the index policy rejects the query,
    /// `BadRequest` for ill-formed queries, `UnsupportedPseudoKind` for
    /// unknown introspection kinds. Storage errors propagate.
    pub fn query(&self, query: &Query) -> Result<Box<dyn EntityCursor>> {
        if query.is_pseudo() {
            return Ok(Box::new(PseudoKindCursor::new(query, &self.schema, self.limits)?));
        }
        self.index_policy.check(query)?;
        let stored = match (&query.kind, &query.ancestor) {
            (Some(_), None) => self.entity_collections()?,
            _ => Vec::new(),
        };
        let translated = translate(query, &stored)?;
        debug!(
            target: "dsbridge::query",
            kind = ?translated.kind,
            collections = ?translated.collections,
            filter = %translated.filter.to_json(),
            "Translated query"
        );

        let mut sources = Vec::with_capacity(translated.collections.len());
        for collection in &translated.collections {
            sources.push(
                self.store
                    .find(collection, &translated.filter, &translated.options)?,
            );
        }
        let merged = MergedDocuments::new(sources, translated.options.sort.clone());
        Ok(Box::new(ResultCursor::new(merged, translated, self.limits)))
    }

    /// Start a query and register its cursor
    ///
    /// The offset is applied immediately.
    pub fn run_query(&self, query: &Query) -> Result<RunQueryResult> {
        let mut cursor = self.query(query)?;
        let skipped_results = cursor.skipped_results()?;
        let cursor_id = self.next_cursor.fetch_add(1, Ordering::Relaxed);
        self.cursors.insert(cursor_id, Arc::new(Mutex::new(cursor)));
        debug!(target: "dsbridge::cursor", cursor_id, skipped_results, "Opened cursor");
        Ok(RunQueryResult {
            cursor_id,
            skipped_results,
        })
    }

    /// Pull the next batch from a registered cursor
    ///
    /// `count` is clamped to `1..=max_batch_size`. A batch shorter than the
    /// clamped count means the cursor is exhausted; it is then unregistered.
    ///
    /// # Errors
    ///
    /// `CursorNotFound` for unknown or exhausted cursor ids.
    pub fn next(&self, cursor_id: u64, count: usize) -> Result<Batch> {
        let cursor = self
            .cursors
            .get(&cursor_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(Error::CursorNotFound(cursor_id))?;
        let count = self.limits.batch_size(count);

        let (entities, degraded) = {
            let mut cursor = cursor.lock();
            let entities = cursor.fetch(count)?;
            (entities, cursor.is_degraded())
        };
        let more_results = entities.len() == count;
        if !more_results {
            self.cursors.remove(&cursor_id);
            debug!(target: "dsbridge::cursor", cursor_id, "Cursor exhausted");
        }
        Ok(Batch {
            entities,
            more_results,
            degraded,
        })
    }

    /// Unregister a cursor; returns whether it existed
    pub fn discard(&self, cursor_id: u64) -> bool {
        self.cursors.remove(&cursor_id).is_some()
    }

    // ========================================================================
    // Administration
    // ========================================================================

    /// Register a composite index with the policy and request its storage
    /// counterpart
    ///
    /// The storage index is best-effort; failures are logged.
    pub fn register_index(&self, index: IndexDefinition) {
        let mut fields: Vec<(String, Direction)> = Vec::new();
        if index.ancestor {
            fields.push((PATH_FIELD.to_string(), Direction::Ascending));
        }
        fields.push((KIND_FIELD.to_string(), Direction::Ascending));
        for (property, direction) in &index.properties {
            fields.push((encode_field_name(property), *direction));
        }
        let spec = IndexSpec::new(fields);

        let mut collections = self.entity_collections().unwrap_or_else(|e| {
            warn!(
                target: "dsbridge::index",
                error = %e,
                "Could not list collections"
            );
            Vec::new()
        });
        let own = collection_for_kind(&index.kind);
        if !collections.contains(&own) {
            collections.push(own);
        }
        for collection in &collections {
            if let Err(e) = self.store.ensure_index(collection, &spec) {
                warn!(
                    target: "dsbridge::index",
                    collection = %collection,
                    index = %spec.name(),
                    error = %e,
                    "Could not create index"
                );
            }
        }
        self.index_policy.register(index);
    }

    /// Drop every entity and schema record
    ///
    /// Open cursors are discarded.
    pub fn clear(&self) -> Result<()> {
        self.store.drop_database()?;
        self.schema.clear();
        self.cursors.clear();
        self.indexed_collections.write().clear();
        info!(target: "dsbridge::db", app_id = %self.config.app_id, "Cleared datastore");
        Ok(())
    }
}
