//! Hierarchical entity keys
//!
//! A [`Key`] is an ordered, non-empty chain of `(kind, identifier)` pairs.
//! The last pair identifies the entity itself, every preceding pair one of its
//! ancestors. Keys are immutable values; completing a new key produces a new
//! `Key`.
//!
//! ## Validity
//!
//! - The path must not be empty
//! - Every kind must be non-empty
//! - Every ancestor element must carry an id or a name
//! - Only the final element may be [`Identifier::Unassigned`], and only on
//!   keys that are about to be written
//! - Numeric ids must be non-zero, names non-empty
//!
//! Storage encodings live in the engine's key codec; this module only models
//! the key.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Identifier of one path element
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Identifier {
    /// Numeric id
    Id(i64),
    /// String name
    Name(String),
    /// Not assigned yet; completed on put
    Unassigned,
}

impl Identifier {
    /// Whether this identifier has been assigned
    pub fn is_assigned(&self) -> bool {
        !matches!(self, Identifier::Unassigned)
    }

    fn validate(&self) -> Result<()> {
        match self {
            Identifier::Id(0) => Err(Error::malformed_key("numeric id 0 is reserved")),
            Identifier::Name(name) if name.is_empty() => {
                Err(Error::malformed_key("element has neither id nor name"))
            }
            Identifier::Unassigned => {
                Err(Error::malformed_key("element has neither id nor name"))
            }
            _ => Ok(()),
        }
    }
}

impl From<i64> for Identifier {
    fn from(id: i64) -> Self {
        Identifier::Id(id)
    }
}

impl From<i32> for Identifier {
    fn from(id: i32) -> Self {
        Identifier::Id(i64::from(id))
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Identifier::Name(name.to_string())
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Identifier::Name(name)
    }
}

/// One `(kind, identifier)` pair of a key path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathElement {
    /// Kind name
    pub kind: String,
    /// Id, name, or unassigned
    pub id: Identifier,
}

impl PathElement {
    /// Create a path element
    pub fn new(kind: impl Into<String>, id: impl Into<Identifier>) -> Self {
        PathElement {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Create a path element whose identifier is not assigned yet
    pub fn incomplete(kind: impl Into<String>) -> Self {
        PathElement {
            kind: kind.into(),
            id: Identifier::Unassigned,
        }
    }
}

/// Hierarchical entity key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    path: Vec<PathElement>,
}

impl Key {
    /// Create a root key with a numeric id or name
    pub fn new(kind: impl Into<String>, id: impl Into<Identifier>) -> Self {
        Key {
            path: vec![PathElement::new(kind, id)],
        }
    }

    /// Create a root key whose id will be assigned on put
    pub fn incomplete(kind: impl Into<String>) -> Self {
        Key {
            path: vec![PathElement::incomplete(kind)],
        }
    }

    /// Build a key from an explicit path
    ///
    /// Fails with `MalformedKey` when the path is empty. Identifier checks are
    /// left to [`Key::validate`] so that incomplete keys can be built.
    pub fn from_path(path: Vec<PathElement>) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::malformed_key("key path is empty"));
        }
        Ok(Key { path })
    }

    /// Create a child key below this one
    pub fn child(&self, kind: impl Into<String>, id: impl Into<Identifier>) -> Self {
        let mut path = self.path.clone();
        path.push(PathElement::new(kind, id));
        Key { path }
    }

    /// Create an incomplete child key below this one
    pub fn incomplete_child(&self, kind: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.push(PathElement::incomplete(kind));
        Key { path }
    }

    /// Full ancestor chain, root first
    pub fn path(&self) -> &[PathElement] {
        &self.path
    }

    /// Number of path elements
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// The element identifying the entity itself
    pub fn last(&self) -> &PathElement {
        // from_path and every constructor guarantee a non-empty path
        &self.path[self.path.len() - 1]
    }

    /// The root element of the entity group
    pub fn root(&self) -> &PathElement {
        &self.path[0]
    }

    /// Kind of the entity itself
    pub fn kind(&self) -> &str {
        &self.last().kind
    }

    /// Identifier of the entity itself
    pub fn id(&self) -> &Identifier {
        &self.last().id
    }

    /// Parent key, if this key is not a root
    pub fn parent(&self) -> Option<Key> {
        if self.path.len() < 2 {
            return None;
        }
        Some(Key {
            path: self.path[..self.path.len() - 1].to_vec(),
        })
    }

    /// Whether the final element carries an id or name
    pub fn is_complete(&self) -> bool {
        self.last().id.is_assigned()
    }

    /// Whether `self` is a strict path-prefix of `other`
    pub fn is_ancestor_of(&self, other: &Key) -> bool {
        self.path.len() < other.path.len() && other.path.starts_with(&self.path)
    }

    /// Return a copy with the final element's identifier set to `id`
    pub fn with_id(&self, id: i64) -> Key {
        let mut path = self.path.clone();
        let last = path.len() - 1;
        path[last].id = Identifier::Id(id);
        Key { path }
    }

    /// Validate a key that is about to be read, deleted or used as an ancestor
    pub fn validate(&self) -> Result<()> {
        self.validate_ancestors()?;
        self.last().id.validate()
    }

    /// Validate a key that is about to be written
    ///
    /// The final element may still be unassigned.
    pub fn validate_for_put(&self) -> Result<()> {
        self.validate_ancestors()?;
        match self.last().id {
            Identifier::Unassigned => Ok(()),
            ref id => id.validate(),
        }
    }

    fn validate_ancestors(&self) -> Result<()> {
        if self.path.is_empty() {
            return Err(Error::malformed_key("key path is empty"));
        }
        for element in &self.path {
            if element.kind.is_empty() {
                return Err(Error::malformed_key("element has an empty kind"));
            }
        }
        for element in &self.path[..self.path.len() - 1] {
            element.id.validate()?;
        }
        Ok(())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.path.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            match &element.id {
                Identifier::Id(id) => write!(f, "{}:{}", element.kind, id)?,
                Identifier::Name(name) => write!(f, "{}:{:?}", element.kind, name)?,
                Identifier::Unassigned => write!(f, "{}:?", element.kind)?,
            }
        }
        Ok(())
    }
}
