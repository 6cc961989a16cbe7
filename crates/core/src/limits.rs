//! Query and value limits
//!
//! This module defines the limits enforced by the engine when running
//! queries and encoding values. Defaults match the datastore's documented
//! behavior; custom limits can be set at open time through the engine config.

use crate::error::{Error, Result};
use crate::value::Value;

/// Default cap on the number of results skipped by an offset
pub const MAX_QUERY_OFFSET: usize = 1000;

/// Default cap on the number of results returned per fetch
pub const MAX_BATCH_SIZE: usize = 1000;

/// Runtime limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of skipped results reported for an offset (default: 1000)
    pub max_query_offset: usize,

    /// Maximum number of results per fetch (default: 1000)
    pub max_batch_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_query_offset: MAX_QUERY_OFFSET,
            max_batch_size: MAX_BATCH_SIZE,
        }
    }
}

impl Limits {
    /// Create limits with small values for testing
    pub fn with_small_limits() -> Self {
        Limits {
            max_query_offset: 5,
            max_batch_size: 3,
        }
    }

    /// Effective batch size for a fetch request
    ///
    /// A request for zero results is treated as a request for one.
    pub fn batch_size(&self, requested: usize) -> usize {
        requested.max(1).min(self.max_batch_size.max(1))
    }

    /// Skipped count reported for `skipped` results actually discarded
    pub fn reported_skip(&self, skipped: usize) -> usize {
        skipped.min(self.max_query_offset)
    }

    /// Validate the shape of a property value
    ///
    /// Lists must not contain lists.
    pub fn validate_value(&self, name: &str, value: &Value) -> Result<()> {
        if let Value::List(items) = value {
            if items.iter().any(Value::is_list) {
                return Err(Error::invalid_value(format!(
                    "property '{}' holds a nested list",
                    name
                )));
            }
        }
        Ok(())
    }
}
