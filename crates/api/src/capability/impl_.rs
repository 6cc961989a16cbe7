//! Capability implementations for the datastore engine

use dsbridge_core::{Entity, Key, Query, Result};
use dsbridge_engine::{Batch, Datastore, RunQueryResult};

use super::{Clearable, EntityStore, Queryable};

impl EntityStore for Datastore {
    fn put(&self, entities: &[Entity]) -> Result<Vec<Key>> {
        Datastore::put(self, entities)
    }

    fn get(&self, keys: &[Key]) -> Result<Vec<Option<Entity>>> {
        Datastore::get(self, keys)
    }

    fn delete(&self, keys: &[Key]) -> Result<()> {
        Datastore::delete(self, keys)
    }
}

impl Queryable for Datastore {
    fn run_query(&self, query: &Query) -> Result<RunQueryResult> {
        Datastore::run_query(self, query)
    }

    fn next(&self, cursor_id: u64, count: usize) -> Result<Batch> {
        Datastore::next(self, cursor_id, count)
    }

    fn discard(&self, cursor_id: u64) -> bool {
        Datastore::discard(self, cursor_id)
    }
}

impl Clearable for Datastore {
    fn clear(&self) -> Result<()> {
        Datastore::clear(self)
    }
}
