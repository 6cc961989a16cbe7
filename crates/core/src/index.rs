//! Composite index definitions
//!
//! An [`IndexDefinition`] names the kind, whether the index is ancestor-scoped,
//! and the ordered list of indexed properties. The engine's index policy
//! derives the definition a query needs and compares it against the
//! registered ones.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::query::Direction;

/// Composite index definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Indexed kind
    pub kind: String,
    /// Whether the index is scoped to an ancestor
    pub ancestor: bool,
    /// Indexed properties, most significant first
    pub properties: Vec<(String, Direction)>,
}

impl IndexDefinition {
    /// Create a definition with no properties
    pub fn new(kind: impl Into<String>) -> Self {
        IndexDefinition {
            kind: kind.into(),
            ancestor: false,
            properties: Vec::new(),
        }
    }

    /// Mark the index as ancestor-scoped
    pub fn with_ancestor(mut self) -> Self {
        self.ancestor = true;
        self
    }

    /// Append an indexed property
    pub fn property(mut self, name: impl Into<String>, direction: Direction) -> Self {
        self.properties.push((name.into(), direction));
        self
    }
}

impl fmt::Display for IndexDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kind: {}", self.kind)?;
        if self.ancestor {
            write!(f, ", ancestor: yes")?;
        }
        write!(f, ", properties: [")?;
        for (i, (name, direction)) in self.properties.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", name, direction.as_str())?;
        }
        write!(f, "]")
    }
}
