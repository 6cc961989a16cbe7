//! Storage documents and dotted-path resolution
//!
//! A [`Document`] is a JSON object with insertion order preserved. Field paths
//! use `.` to descend into sub-documents; when a path step meets an array the
//! step is applied to every element, and a numeric step also indexes the
//! array directly.

use serde_json::Map;

pub use serde_json::Value as JsonValue;

/// Schema-less storage document
pub type Document = Map<String, JsonValue>;

/// Unique document identifier field
pub const ID_FIELD: &str = "_id";

/// Every value reachable from `document` along the dotted `path`
pub fn resolve<'a>(document: &'a Document, path: &str) -> Vec<&'a JsonValue> {
    let mut out = Vec::new();
    let mut segments = path.split('.');
    if let Some(first) = segments.next() {
        if let Some(value) = document.get(first) {
            let rest: Vec<&str> = segments.collect();
            resolve_in(value, &rest, &mut out);
        }
    }
    out
}

fn resolve_in<'a>(value: &'a JsonValue, segments: &[&str], out: &mut Vec<&'a JsonValue>) {
    let Some((head, rest)) = segments.split_first() else {
        out.push(value);
        return;
    };
    match value {
        JsonValue::Object(map) => {
            if let Some(child) = map.get(*head) {
                resolve_in(child, rest, out);
            }
        }
        JsonValue::Array(items) => {
            if let Ok(index) = head.parse::<usize>() {
                if let Some(item) = items.get(index) {
                    resolve_in(item, rest, out);
                }
            }
            for item in items {
                if item.is_object() {
                    resolve_in(item, segments, out);
                }
            }
        }
        _ => {}
    }
}

/// Copy of `document` restricted to `_id` and the given field paths
pub fn project(document: &Document, fields: &[String]) -> Document {
    let mut out = Document::new();
    if let Some(id) = document.get(ID_FIELD) {
        out.insert(ID_FIELD.to_string(), id.clone());
    }
    for field in fields {
        let segments: Vec<&str> = field.split('.').collect();
        copy_path(document, &segments, &mut out);
    }
    out
}

fn copy_path(source: &Document, segments: &[&str], target: &mut Document) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    let Some(value) = source.get(*head) else {
        return;
    };
    if rest.is_empty() {
        target.insert(head.to_string(), value.clone());
        return;
    }
    if let JsonValue::Object(child) = value {
        let slot = target
            .entry(head.to_string())
            .or_insert_with(|| JsonValue::Object(Document::new()));
        if let JsonValue::Object(child_target) = slot {
            copy_path(child, rest, child_target);
        }
    }
}
