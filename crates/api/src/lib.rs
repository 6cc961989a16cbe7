//! Public API layer for dsbridge
//!
//! The engine is exposed to a host dispatcher as three narrow capabilities
//! rather than one wide interface:
//! - [`EntityStore`]: batch put, get and delete
//! - [`Queryable`]: run a query, pull batches by cursor id, discard cursors
//! - [`Clearable`]: drop everything (test and reset tooling)
//!
//! [`Datastore`] implements all three. Errors are turned into wire-level
//! [`ErrorResponse`]s with a datastore error code.
//!
//! ## Quick Start
//!
//! ```ignore
//! use dsbridge_api::{Datastore, DatastoreConfig, EntityStore, Queryable};
//!
//! let db = Datastore::open(store, DatastoreConfig::new("guestbook"))?;
//! let keys = db.put(&[Entity::new(Key::incomplete("Greeting")).with("text", "hi")])?;
//! let started = db.run_query(&Query::new("Greeting"))?;
//! let batch = db.next(started.cursor_id, 20)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod capability;
pub mod error;

pub use capability::{Clearable, EntityStore, Queryable};
pub use error::ErrorResponse;

pub use dsbridge_engine::{Batch, Datastore, DatastoreConfig, RunQueryResult};
