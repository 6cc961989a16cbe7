//! Value codec: typed property values to and from storage values
//!
//! ## Storage Forms
//!
//! | Value | Storage |
//! |-------|---------|
//! | Null, Bool, Int | bare JSON |
//! | Double (finite) | bare JSON number |
//! | Double (NaN, ±inf) | `{"t": "float", "v": "NaN" \| "Infinity" \| "-Infinity"}` |
//! | String (UTF-8) | bare JSON string |
//! | String (other bytes) | `"#!bytes#104,105"` |
//! | Text | `{"t": "text", "v": s}` |
//! | Blob | `{"t": "blob", "v": base64}` |
//! | Timestamp | `{"t": "datetime", "v": "2013-01-21T10:15:00.000250"}` |
//! | GeoPt | `{"t": "geo", "v": {"x": lon, "y": lat}}` |
//! | Key | `{"t": "key", "v": flat key}` |
//! | EmbeddedEntity | `{"t": "local", "v": base64}` |
//! | BlobKey | `{"t": "blobkey", "v": s}` |
//! | User | `{"t": "user", "v": {non-empty fields}}` |
//! | List | bare array of element encodings |
//!
//! A bare string that happens to start with the byte marker is also written
//! in the marked form so decoding stays unambiguous.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Map, Number};

use dsbridge_core::{Error, GeoPt, Result, Timestamp, User, Value};
use dsbridge_storage::JsonValue;

use crate::codec::key::{decode_from_storage, encode_for_storage};

/// Marker prefixing strings stored as byte ordinals
pub const BYTES_MARKER: &str = "#!bytes#";

/// Field holding the type tag of a tagged value
pub const TAG_FIELD: &str = "t";

/// Field holding the payload of a tagged value
pub const PAYLOAD_FIELD: &str = "v";

/// Closed vocabulary of stored type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Null
    Null,
    /// Boolean
    Bool,
    /// 64-bit integer
    Int,
    /// Double
    Float,
    /// Short string
    String,
    /// Long text
    Text,
    /// Byte blob
    Blob,
    /// Timestamp
    Datetime,
    /// Geographic point
    Geo,
    /// Entity key
    Key,
    /// Embedded entity
    Local,
    /// Blob reference
    BlobKey,
    /// User identity
    User,
}

impl TypeTag {
    /// Every tag, in declaration order
    pub const ALL: [TypeTag; 13] = [
        TypeTag::Null,
        TypeTag::Bool,
        TypeTag::Int,
        TypeTag::Float,
        TypeTag::String,
        TypeTag::Text,
        TypeTag::Blob,
        TypeTag::Datetime,
        TypeTag::Geo,
        TypeTag::Key,
        TypeTag::Local,
        TypeTag::BlobKey,
        TypeTag::User,
    ];

    /// Tag of a scalar value; `None` for lists
    pub fn of(value: &Value) -> Option<TypeTag> {
        Some(match value {
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Double(_) => TypeTag::Float,
            Value::String(_) => TypeTag::String,
            Value::Text(_) => TypeTag::Text,
            Value::Blob(_) => TypeTag::Blob,
            Value::Timestamp(_) => TypeTag::Datetime,
            Value::GeoPt(_) => TypeTag::Geo,
            Value::Key(_) => TypeTag::Key,
            Value::EmbeddedEntity(_) => TypeTag::Local,
            Value::BlobKey(_) => TypeTag::BlobKey,
            Value::User(_) => TypeTag::User,
            Value::List(_) => return None,
        })
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Null => "null",
            TypeTag::Bool => "bool",
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::String => "string",
            TypeTag::Text => "text",
            TypeTag::Blob => "blob",
            TypeTag::Datetime => "datetime",
            TypeTag::Geo => "geo",
            TypeTag::Key => "key",
            TypeTag::Local => "local",
            TypeTag::BlobKey => "blobkey",
            TypeTag::User => "user",
        }
    }

    /// Parse a wire name
    pub fn parse(name: &str) -> Result<TypeTag> {
        Ok(match name {
            "null" => TypeTag::Null,
            "bool" => TypeTag::Bool,
            "int" => TypeTag::Int,
            "float" => TypeTag::Float,
            "string" => TypeTag::String,
            "text" => TypeTag::Text,
            "blob" => TypeTag::Blob,
            "datetime" => TypeTag::Datetime,
            "geo" => TypeTag::Geo,
            "key" => TypeTag::Key,
            "local" => TypeTag::Local,
            "blobkey" => TypeTag::BlobKey,
            "user" => TypeTag::User,
            other => return Err(Error::UnknownTypeTag(other.to_string())),
        })
    }

    /// Whether values of this type take part in sort comparisons
    pub fn is_orderable(&self) -> bool {
        !matches!(self, TypeTag::Text | TypeTag::Blob | TypeTag::Local)
    }
}

/// Tags excluded from ordered results
pub fn unorderable_tags() -> Vec<JsonValue> {
    TypeTag::ALL
        .iter()
        .filter(|t| !t.is_orderable())
        .map(|t| JsonValue::from(t.as_str()))
        .collect()
}

/// Schema tag of a property value
///
/// Lists are tagged `list:<element tag>` after their first element, or
/// `list` when empty.
pub fn schema_tag(value: &Value) -> String {
    match value {
        Value::List(items) => match items.first().and_then(TypeTag::of) {
            Some(tag) => format!("list:{}", tag.as_str()),
            None => "list".to_string(),
        },
        scalar => TypeTag::of(scalar)
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
    }
}

fn tagged(tag: TypeTag, payload: JsonValue) -> JsonValue {
    json!({ TAG_FIELD: tag.as_str(), PAYLOAD_FIELD: payload })
}

fn encode_string(bytes: &[u8]) -> JsonValue {
    match std::str::from_utf8(bytes) {
        Ok(text) if !text.starts_with(BYTES_MARKER) => JsonValue::String(text.to_string()),
        _ => {
            let ordinals: Vec<String> = bytes.iter().map(|b| b.to_string()).collect();
            JsonValue::String(format!("{}{}", BYTES_MARKER, ordinals.join(",")))
        }
    }
}

fn decode_string(text: &str) -> Result<Value> {
    let Some(ordinals) = text.strip_prefix(BYTES_MARKER) else {
        return Ok(Value::String(text.as_bytes().to_vec()));
    };
    if ordinals.is_empty() {
        return Ok(Value::String(Vec::new()));
    }
    let bytes = ordinals
        .split(',')
        .map(|o| {
            o.parse::<u8>()
                .map_err(|_| Error::corrupt(format!("invalid byte ordinal '{}'", o)))
        })
        .collect::<Result<Vec<u8>>>()?;
    Ok(Value::String(bytes))
}

fn encode_double(d: f64) -> JsonValue {
    match Number::from_f64(d) {
        Some(n) => JsonValue::Number(n),
        None => {
            let text = if d.is_nan() {
                "NaN"
            } else if d > 0.0 {
                "Infinity"
            } else {
                "-Infinity"
            };
            tagged(TypeTag::Float, JsonValue::from(text))
        }
    }
}

fn encode_user(user: &User) -> JsonValue {
    let mut fields = Map::new();
    if !user.email.is_empty() {
        fields.insert("email".to_string(), JsonValue::from(user.email.clone()));
    }
    if let Some(identity) = user.federated_identity.as_deref().filter(|s| !s.is_empty()) {
        fields.insert("federated_identity".to_string(), JsonValue::from(identity));
    }
    if let Some(provider) = user.federated_provider.as_deref().filter(|s| !s.is_empty()) {
        fields.insert("federated_provider".to_string(), JsonValue::from(provider));
    }
    tagged(TypeTag::User, JsonValue::Object(fields))
}

fn coordinate(value: f64, name: &str) -> Result<JsonValue> {
    Number::from_f64(value)
        .map(JsonValue::Number)
        .ok_or_else(|| Error::invalid_value(format!("geo {} must be finite", name)))
}

/// Encode a property value for storage
pub fn encode(value: &Value) -> Result<JsonValue> {
    Ok(match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::from(*i),
        Value::Double(d) => encode_double(*d),
        Value::String(bytes) => encode_string(bytes),
        Value::Text(s) => tagged(TypeTag::Text, JsonValue::from(s.clone())),
        Value::Blob(bytes) => tagged(TypeTag::Blob, JsonValue::from(BASE64.encode(bytes))),
        Value::Timestamp(ts) => tagged(TypeTag::Datetime, JsonValue::from(ts.to_iso()?)),
        Value::GeoPt(pt) => tagged(
            TypeTag::Geo,
            json!({ "x": coordinate(pt.lon, "longitude")?, "y": coordinate(pt.lat, "latitude")? }),
        ),
        Value::Key(key) => {
            key.validate()?;
            tagged(TypeTag::Key, JsonValue::from(encode_for_storage(key)?))
        }
        Value::EmbeddedEntity(bytes) => {
            tagged(TypeTag::Local, JsonValue::from(BASE64.encode(bytes)))
        }
        Value::BlobKey(s) => tagged(TypeTag::BlobKey, JsonValue::from(s.clone())),
        Value::User(user) => encode_user(user),
        Value::List(items) => JsonValue::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::List(_) => Err(Error::invalid_value("lists cannot contain lists")),
                    scalar => encode(scalar),
                })
                .collect::<Result<Vec<_>>>()?,
        ),
    })
}

fn payload_str<'a>(payload: &'a JsonValue, tag: TypeTag) -> Result<&'a str> {
    payload
        .as_str()
        .ok_or_else(|| Error::corrupt(format!("'{}' payload must be a string", tag.as_str())))
}

fn decode_base64(payload: &JsonValue, tag: TypeTag) -> Result<Vec<u8>> {
    BASE64
        .decode(payload_str(payload, tag)?)
        .map_err(|e| Error::corrupt(format!("invalid base64 in '{}' payload: {}", tag.as_str(), e)))
}

fn decode_f64(payload: &JsonValue, field: &str) -> Result<f64> {
    payload
        .get(field)
        .and_then(JsonValue::as_f64)
        .ok_or_else(|| Error::corrupt(format!("geo payload lacks numeric '{}'", field)))
}

fn optional_field(payload: &JsonValue, field: &str) -> Option<String> {
    payload
        .get(field)
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}

fn decode_tagged(map: &Map<String, JsonValue>) -> Result<Value> {
    let tag = map
        .get(TAG_FIELD)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| Error::corrupt("tagged value has no type tag"))?;
    let tag = TypeTag::parse(tag)?;
    let payload = map
        .get(PAYLOAD_FIELD)
        .ok_or_else(|| Error::corrupt(format!("'{}' value has no payload", tag.as_str())))?;
    Ok(match tag {
        TypeTag::Float => match payload_str(payload, tag)? {
            "NaN" => Value::Double(f64::NAN),
            "Infinity" => Value::Double(f64::INFINITY),
            "-Infinity" => Value::Double(f64::NEG_INFINITY),
            other => return Err(Error::corrupt(format!("invalid float payload '{}'", other))),
        },
        TypeTag::Text => Value::Text(payload_str(payload, tag)?.to_string()),
        TypeTag::Blob => Value::Blob(decode_base64(payload, tag)?),
        TypeTag::Datetime => Value::Timestamp(Timestamp::parse_iso(payload_str(payload, tag)?)?),
        TypeTag::Geo => Value::GeoPt(GeoPt::new(
            decode_f64(payload, "y")?,
            decode_f64(payload, "x")?,
        )),
        TypeTag::Key => Value::Key(decode_from_storage(payload_str(payload, tag)?)?),
        TypeTag::Local => Value::EmbeddedEntity(decode_base64(payload, tag)?),
        TypeTag::BlobKey => Value::BlobKey(payload_str(payload, tag)?.to_string()),
        TypeTag::User => Value::User(User {
            email: optional_field(payload, "email").unwrap_or_default(),
            federated_identity: optional_field(payload, "federated_identity"),
            federated_provider: optional_field(payload, "federated_provider"),
        }),
        TypeTag::Null | TypeTag::Bool | TypeTag::Int | TypeTag::String => {
            return Err(Error::corrupt(format!(
                "'{}' values are never stored tagged",
                tag.as_str()
            )))
        }
    })
}

/// Decode a storage value into a property value
pub fn decode(stored: &JsonValue) -> Result<Value> {
    match stored {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(b) => Ok(Value::Bool(*b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Int(i)),
            None => n
                .as_f64()
                .map(Value::Double)
                .ok_or_else(|| Error::corrupt(format!("unrepresentable number {}", n))),
        },
        JsonValue::String(s) => decode_string(s),
        JsonValue::Object(map) => decode_tagged(map),
        JsonValue::Array(items) => Ok(Value::List(
            items
                .iter()
                .map(|item| match item {
                    JsonValue::Array(_) => Err(Error::corrupt("stored list contains a list")),
                    scalar => decode(scalar),
                })
                .collect::<Result<Vec<_>>>()?,
        )),
    }
}
