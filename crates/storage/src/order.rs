//! Cross-type value ordering
//!
//! Values of different JSON types never compare by content; they sort by
//! type bracket first:
//!
//! `null < numbers < strings < objects < arrays < booleans`
//!
//! Within a bracket numbers compare numerically, strings by bytes, objects
//! field by field (name, then value) and arrays element by element.
//!
//! ## Sorting documents
//!
//! A missing field sorts as null. A field holding an array sorts by its
//! smallest element when ascending and by its largest when descending.

use std::cmp::Ordering;

use dsbridge_core::Direction;

use crate::document::{resolve, Document, JsonValue};

static NULL: JsonValue = JsonValue::Null;

/// Sort specification: `(field path, direction)` pairs, most significant first
pub type SortSpec = Vec<(String, Direction)>;

/// Type bracket rank of a value
pub fn bracket(value: &JsonValue) -> u8 {
    match value {
        JsonValue::Null => 0,
        JsonValue::Number(_) => 1,
        JsonValue::String(_) => 2,
        JsonValue::Object(_) => 3,
        JsonValue::Array(_) => 4,
        JsonValue::Bool(_) => 5,
    }
}

/// Total order over storage values
pub fn compare_values(a: &JsonValue, b: &JsonValue) -> Ordering {
    let by_bracket = bracket(a).cmp(&bracket(b));
    if by_bracket != Ordering::Equal {
        return by_bracket;
    }
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let x = x.as_f64().unwrap_or(0.0);
                let y = y.as_f64().unwrap_or(0.0);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
        },
        (JsonValue::String(x), JsonValue::String(y)) => x.as_bytes().cmp(y.as_bytes()),
        (JsonValue::Object(x), JsonValue::Object(y)) => {
            for ((kx, vx), (ky, vy)) in x.iter().zip(y.iter()) {
                let ord = kx
                    .as_bytes()
                    .cmp(ky.as_bytes())
                    .then_with(|| compare_values(vx, vy));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (JsonValue::Array(x), JsonValue::Array(y)) => {
            for (vx, vy) in x.iter().zip(y.iter()) {
                let ord = compare_values(vx, vy);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// The value a document sorts by on `path` in `direction`
pub fn sort_key<'a>(document: &'a Document, path: &str, direction: Direction) -> &'a JsonValue {
    let candidates = resolve(document, path)
        .into_iter()
        .flat_map(|value| match value {
            JsonValue::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        });
    let chosen = match direction {
        Direction::Ascending => candidates.min_by(|a, b| compare_values(a, b)),
        Direction::Descending => candidates.max_by(|a, b| compare_values(a, b)),
    };
    chosen.unwrap_or(&NULL)
}

/// Compare two documents under a sort specification
pub fn compare_documents(a: &Document, b: &Document, sort: &[(String, Direction)]) -> Ordering {
    for (path, direction) in sort {
        let ord = compare_values(
            sort_key(a, path, *direction),
            sort_key(b, path, *direction),
        );
        let ord = match direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
