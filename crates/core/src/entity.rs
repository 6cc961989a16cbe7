//! Entities: a key plus insertion-ordered properties
//!
//! Repeated properties are stored as a single [`Value::List`]. Structured
//! (nested) property names use `.` as the path separator, e.g. `address.city`.
//!
//! Equality ignores property order: two entities are equal when their keys
//! match and they hold the same set of `(name, value)` pairs.

use serde::{Deserialize, Serialize};

use crate::key::Key;
use crate::value::Value;

/// Datastore entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    key: Key,
    properties: Vec<(String, Value)>,
}

impl Entity {
    /// Create an entity with no properties
    pub fn new(key: Key) -> Self {
        Entity {
            key,
            properties: Vec::new(),
        }
    }

    /// Builder-style property setter
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a property, replacing an existing value in place
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.properties.push((name, value)),
        }
    }

    /// Remove a property, returning its value
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let pos = self.properties.iter().position(|(n, _)| n == name)?;
        Some(self.properties.remove(pos).1)
    }

    /// Get a property value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Entity key
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Return a copy carrying a different key
    pub fn with_key(&self, key: Key) -> Entity {
        Entity {
            key,
            properties: self.properties.clone(),
        }
    }

    /// Properties in insertion order
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the entity has no properties
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.properties.len() == other.properties.len()
            && self
                .properties
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }
}
