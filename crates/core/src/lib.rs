//! Core types for dsbridge
//!
//! This crate defines the datastore data model the rest of the system speaks:
//! - Key: hierarchical `(kind, id-or-name)` path
//! - Value: closed variant over every property type
//! - Entity: key plus insertion-ordered properties
//! - Timestamp: microsecond-precision UTC instant
//! - Query: kind, filters, orders, ancestor, projection, offset and limit
//! - IndexDefinition: composite index description
//! - Limits: offset and batch caps
//! - Error: error type hierarchy and wire codes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entity;
pub mod error;
pub mod index;
pub mod key;
pub mod limits;
pub mod query;
pub mod timestamp;
pub mod value;

pub use entity::Entity;
pub use error::{Error, ErrorCode, Result};
pub use index::IndexDefinition;
pub use key::{Identifier, Key, PathElement};
pub use limits::{Limits, MAX_BATCH_SIZE, MAX_QUERY_OFFSET};
pub use query::{
    is_pseudo_kind, Direction, FilterOp, PropertyFilter, PropertyOrder, Query, KEY_PROPERTY,
};
pub use timestamp::Timestamp;
pub use value::{GeoPt, User, Value};
