//! Entity CRUD operations
//!
//! ## Batch Semantics
//!
//! Every operation takes a batch. Results follow input order, and a failure
//! rejects the whole call rather than a single element.

use dsbridge_core::{Entity, Key, Result};

/// Put, get and delete by key
///
/// ## Error Handling
///
/// | Condition | Error |
/// |-----------|-------|
/// | Empty key path, unassigned ancestor id | `MalformedKey` |
/// | Reserved property name, nested list | `InvalidValue` |
/// | Storage engine unreachable | `StorageUnavailable` |
pub trait EntityStore {
    /// Insert or replace entities
    ///
    /// Keys whose final element has no id are completed with a fresh numeric
    /// id. Returns the stored keys in input order.
    fn put(&self, entities: &[Entity]) -> Result<Vec<Key>>;

    /// Fetch entities by key
    ///
    /// Returns one slot per input key, `None` where no entity exists.
    fn get(&self, keys: &[Key]) -> Result<Vec<Option<Entity>>>;

    /// Delete entities by key
    ///
    /// Keys without an entity are ignored.
    fn delete(&self, keys: &[Key]) -> Result<()>;
}
