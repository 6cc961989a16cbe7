//! Narrow capabilities a host dispatcher composes
//!
//! - `entity_store`: put, get and delete
//! - `queryable`: cursor-based queries
//! - `clearable`: full reset
//!
//! A dispatcher holds explicit references to the capabilities it routes to;
//! the same engine usually provides all three.

pub mod clearable;
pub mod entity_store;
mod impl_;
pub mod queryable;

pub use clearable::Clearable;
pub use entity_store::EntityStore;
pub use queryable::Queryable;
