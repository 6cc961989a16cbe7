//! Datastore integration tests
//!
//! End-to-end behavior of the engine over the in-memory document store.


mod crud;
mod cursors;
mod offset;
mod projection;
mod queries;
mod schema;
