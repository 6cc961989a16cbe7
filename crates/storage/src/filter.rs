//! Typed document filters
//!
//! A [`Filter`] is a conjunction of per-field [`Condition`]s. It is evaluated
//! directly against documents by in-process engines and rendered to the
//! document-store query syntax with [`Filter::to_json`] for drivers and logs.
//!
//! ## Matching Rules
//!
//! - A field holding an array matches a condition when the array itself or
//!   any of its elements matches
//! - Range comparisons only succeed between values of the same type bracket
//! - `Eq(null)` matches a missing field; `Nin` matches a missing field
//! - `Exists(true)` needs at least one value reachable on the path

use std::cmp::Ordering;

use serde_json::json;

use crate::document::{resolve, Document, JsonValue};
use crate::order::{bracket, compare_values};

/// Per-field condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Equal to the value
    Eq(JsonValue),
    /// Less than the value
    Lt(JsonValue),
    /// Less than or equal to the value
    Lte(JsonValue),
    /// Greater than the value
    Gt(JsonValue),
    /// Greater than or equal to the value
    Gte(JsonValue),
    /// Field presence
    Exists(bool),
    /// Equal to one of the values
    In(Vec<JsonValue>),
    /// Equal to none of the values
    Nin(Vec<JsonValue>),
    /// Array field containing every value
    All(Vec<JsonValue>),
}

impl Condition {
    /// Whether one resolved value satisfies the condition
    ///
    /// Only valid for the value-level conditions; `Exists`, `Nin` and `All`
    /// are decided over the whole candidate set in [`Filter::matches`].
    fn matches_scalar(&self, value: &JsonValue) -> bool {
        match self {
            Condition::Eq(operand) => values_equal(value, operand),
            Condition::Lt(operand) => compare_same_bracket(value, operand) == Some(Ordering::Less),
            Condition::Lte(operand) => matches!(
                compare_same_bracket(value, operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Condition::Gt(operand) => {
                compare_same_bracket(value, operand) == Some(Ordering::Greater)
            }
            Condition::Gte(operand) => matches!(
                compare_same_bracket(value, operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Condition::In(operands) => operands.iter().any(|op| values_equal(value, op)),
            Condition::Exists(_) | Condition::Nin(_) | Condition::All(_) => false,
        }
    }

    fn matches_candidates(&self, candidates: &[&JsonValue]) -> bool {
        match self {
            Condition::Exists(wanted) => !candidates.is_empty() == *wanted,
            Condition::Nin(operands) => {
                !Condition::In(operands.clone()).matches_candidates(candidates)
            }
            Condition::All(operands) => {
                !operands.is_empty()
                    && operands
                        .iter()
                        .all(|op| Condition::Eq(op.clone()).matches_candidates(candidates))
            }
            Condition::Eq(JsonValue::Null) if candidates.is_empty() => true,
            _ => candidates.iter().any(|candidate| {
                self.matches_scalar(candidate)
                    || matches!(candidate, JsonValue::Array(items)
                        if items.iter().any(|item| self.matches_scalar(item)))
            }),
        }
    }

    /// Render as a document-store query operand
    pub fn to_json(&self) -> JsonValue {
        match self {
            Condition::Eq(v) => v.clone(),
            Condition::Lt(v) => json!({ "$lt": v }),
            Condition::Lte(v) => json!({ "$lte": v }),
            Condition::Gt(v) => json!({ "$gt": v }),
            Condition::Gte(v) => json!({ "$gte": v }),
            Condition::Exists(b) => json!({ "$exists": b }),
            Condition::In(vs) => json!({ "$in": vs }),
            Condition::Nin(vs) => json!({ "$nin": vs }),
            Condition::All(vs) => json!({ "$all": vs }),
        }
    }
}

fn values_equal(a: &JsonValue, b: &JsonValue) -> bool {
    bracket(a) == bracket(b) && compare_values(a, b) == Ordering::Equal
}

fn compare_same_bracket(a: &JsonValue, b: &JsonValue) -> Option<Ordering> {
    if bracket(a) != bracket(b) {
        return None;
    }
    Some(compare_values(a, b))
}

/// Document filter
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every sub-filter matches; an empty conjunction matches everything
    And(Vec<Filter>),
    /// One condition on one field path
    Field {
        /// Dotted field path
        path: String,
        /// Condition on the resolved values
        condition: Condition,
    },
}

impl Default for Filter {
    fn default() -> Self {
        Filter::all()
    }
}

impl Filter {
    /// Filter matching every document
    pub fn all() -> Self {
        Filter::And(Vec::new())
    }

    /// Single-field filter
    pub fn field(path: impl Into<String>, condition: Condition) -> Self {
        Filter::Field {
            path: path.into(),
            condition,
        }
    }

    /// Equality filter
    pub fn eq(path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Filter::field(path, Condition::Eq(value.into()))
    }

    /// Conjunction of `self` and `other`, flattened
    pub fn and(self, other: Filter) -> Self {
        let mut parts = match self {
            Filter::And(parts) => parts,
            single => vec![single],
        };
        match other {
            Filter::And(more) => parts.extend(more),
            single => parts.push(single),
        }
        Filter::And(parts)
    }

    /// Evaluate the filter against a document
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::And(parts) => parts.iter().all(|part| part.matches(document)),
            Filter::Field { path, condition } => {
                condition.matches_candidates(&resolve(document, path))
            }
        }
    }

    /// Render in document-store query syntax
    pub fn to_json(&self) -> JsonValue {
        match self {
            Filter::And(parts) if parts.is_empty() => json!({}),
            Filter::And(parts) => {
                json!({ "$and": parts.iter().map(Filter::to_json).collect::<Vec<_>>() })
            }
            Filter::Field { path, condition } => {
                let mut map = Document::new();
                map.insert(path.clone(), condition.to_json());
                JsonValue::Object(map)
            }
        }
    }
}
