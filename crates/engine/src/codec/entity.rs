//! Entity codec: entities to and from storage documents
//!
//! Document layout:
//!
//! ```text
//! { "_id": "A-#8000000000000001/B-'x",
//!   "__path__": ["A-#8000000000000001", "B-'x"],
//!   "__kind__": "B", <properties...> }
//! ```
//!
//! Property names use `#!#` in place of the structured-property separator
//! `.`, which document field names cannot contain.

use dsbridge_core::{is_pseudo_kind, Entity, Error, Key, Result};
use dsbridge_storage::{Document, JsonValue, ID_FIELD};

use crate::codec::key::{decode_from_storage, decode_path, encode_for_storage, encode_path};
use crate::codec::key::{KIND_FIELD, PATH_FIELD};
use crate::codec::value;

/// Stand-in for `.` in stored field names
pub const STRUCTURED_PROPERTY_DELIMITER: &str = "#!#";

/// Stored field name of a property
pub fn encode_field_name(name: &str) -> String {
    name.replace('.', STRUCTURED_PROPERTY_DELIMITER)
}

/// Property name of a stored field
pub fn decode_field_name(field: &str) -> String {
    field.replace(STRUCTURED_PROPERTY_DELIMITER, ".")
}

/// Reject property names that collide with the document layout
pub fn validate_property_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_value("property name is empty"));
    }
    if name == ID_FIELD || is_pseudo_kind(name) {
        return Err(Error::invalid_value(format!(
            "property name '{}' is reserved",
            name
        )));
    }
    Ok(())
}

/// Encode a complete entity as a storage document
pub fn to_document(entity: &Entity) -> Result<Document> {
    let key = entity.key();
    let mut doc = Document::new();
    doc.insert(ID_FIELD.to_string(), JsonValue::from(encode_for_storage(key)?));
    doc.insert(PATH_FIELD.to_string(), JsonValue::from(encode_path(key)?));
    doc.insert(KIND_FIELD.to_string(), JsonValue::from(key.kind()));
    for (name, value) in entity.properties() {
        validate_property_name(name)?;
        doc.insert(encode_field_name(name), value::encode(value)?);
    }
    Ok(doc)
}

/// Key of a stored document
///
/// Read from the structural path when present, else from `_id`.
pub fn document_key(doc: &Document) -> Result<Key> {
    if let Some(JsonValue::Array(tokens)) = doc.get(PATH_FIELD) {
        let tokens = tokens
            .iter()
            .map(|t| {
                t.as_str()
                    .ok_or_else(|| Error::corrupt("key path holds a non-string token"))
            })
            .collect::<Result<Vec<_>>>()?;
        return decode_path(&tokens);
    }
    match doc.get(ID_FIELD) {
        Some(JsonValue::String(flat)) => decode_from_storage(flat),
        _ => Err(Error::corrupt("document has neither key path nor string _id")),
    }
}

/// Decode a storage document into an entity
pub fn from_document(doc: &Document) -> Result<Entity> {
    let mut entity = Entity::new(document_key(doc)?);
    for (field, stored) in doc {
        if field == ID_FIELD || field == PATH_FIELD || field == KIND_FIELD {
            continue;
        }
        entity.set(decode_field_name(field), value::decode(stored)?);
    }
    Ok(entity)
}
