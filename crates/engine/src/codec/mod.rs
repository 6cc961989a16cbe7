//! Codecs between the entity model and storage documents
//!
//! - [`key`]: keys to `__path__` token lists and flat `_id` strings
//! - [`value`]: typed values to bare or `{t, v}`-tagged JSON
//! - [`entity`]: whole entities to documents

pub mod entity;
pub mod key;
pub mod value;

pub use entity::{
    decode_field_name, encode_field_name, from_document, to_document, validate_property_name,
    STRUCTURED_PROPERTY_DELIMITER,
};
pub use key::{
    collection_for_kind, collection_of, decode_from_storage, decode_path, encode_for_storage,
    encode_path, KIND_FIELD, PATH_FIELD,
};
pub use value::{schema_tag, unorderable_tags, TypeTag};
