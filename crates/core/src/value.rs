//! Value types for dsbridge
//!
//! This module defines:
//! - Value: closed variant over every datastore property type
//! - GeoPt: geographic point
//! - User: user identity
//!
//! ## Type Rules
//!
//! - Different variants are never equal: `Int(1) != Double(1.0)`,
//!   `String(b"x") != Text("x")`, `String(b"x") != Blob(b"x")`
//! - `String` holds raw bytes; short strings need not be valid UTF-8
//! - `List` cannot contain another `List`; the codec rejects nested lists
//! - Double equality is IEEE-754 (`NaN != NaN`)

use serde::{Deserialize, Serialize};

use crate::key::Key;
use crate::timestamp::Timestamp;

/// Geographic point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPt {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
}

impl GeoPt {
    /// Create a point
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPt { lat, lon }
    }
}

/// User identity
///
/// Empty strings and `None` are both treated as "not set" by the codec.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    /// Email address
    pub email: String,
    /// Federated identity URL
    pub federated_identity: Option<String>,
    /// Federated identity provider
    pub federated_provider: Option<String>,
}

impl User {
    /// Create a user identified by email
    pub fn new(email: impl Into<String>) -> Self {
        User {
            email: email.into(),
            federated_identity: None,
            federated_provider: None,
        }
    }

    /// Set the federated identity and provider
    pub fn federated(
        mut self,
        identity: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        self.federated_identity = Some(identity.into());
        self.federated_provider = Some(provider.into());
        self
    }
}

/// Datastore property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point
    Double(f64),
    /// Short, indexed string; raw bytes
    String(Vec<u8>),
    /// Long, unindexed text
    Text(String),
    /// Raw byte string, unindexed
    Blob(Vec<u8>),
    /// UTC timestamp, microsecond precision
    Timestamp(Timestamp),
    /// Geographic point
    GeoPt(GeoPt),
    /// Reference to another entity
    Key(Key),
    /// Opaque serialized embedded entity
    EmbeddedEntity(Vec<u8>),
    /// Blob-reference identifier
    BlobKey(String),
    /// User identity
    User(User),
    /// Repeated property values; never nested
    List(Vec<Value>),
}

impl Value {
    /// Build a short string value from text
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(s.as_ref().as_bytes().to_vec())
    }

    /// Build a long text value
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Double(_) => "Double",
            Value::String(_) => "String",
            Value::Text(_) => "Text",
            Value::Blob(_) => "Blob",
            Value::Timestamp(_) => "Timestamp",
            Value::GeoPt(_) => "GeoPt",
            Value::Key(_) => "Key",
            Value::EmbeddedEntity(_) => "EmbeddedEntity",
            Value::BlobKey(_) => "BlobKey",
            Value::User(_) => "User",
            Value::List(_) => "List",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this is a list value
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as &str if this is a String value holding UTF-8
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    /// Get as &Key if this is a Key value
    pub fn as_key(&self) -> Option<&Key> {
        match self {
            Value::Key(key) => Some(key),
            _ => None,
        }
    }

    /// Get as &[Value] if this is a List value
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into_bytes())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Double(f)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<GeoPt> for Value {
    fn from(pt: GeoPt) -> Self {
        Value::GeoPt(pt)
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        Value::Key(key)
    }
}

impl From<User> for Value {
    fn from(user: User) -> Self {
        Value::User(user)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::List(values)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}
