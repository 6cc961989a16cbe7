//! Structured datastore queries
//!
//! A [`Query`] carries the kind, filters, orderings, ancestor constraint,
//! projection, offset and limit exactly as the host receives them. Translation
//! into storage primitives happens in the engine.

use serde::{Deserialize, Serialize};

use crate::key::Key;
use crate::value::Value;

/// Special property name addressing the entity key
pub const KEY_PROPERTY: &str = "__key__";

/// Whether `kind` names a synthetic introspection kind (`__x__`)
pub fn is_pseudo_kind(kind: &str) -> bool {
    kind.len() > 4 && kind.starts_with("__") && kind.ends_with("__")
}

/// Filter comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOp {
    /// `=`
    Equal,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
}

impl FilterOp {
    /// Whether this operator is a range comparison
    pub fn is_inequality(&self) -> bool {
        !matches!(self, FilterOp::Equal)
    }
}

/// One `property op value` filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFilter {
    /// Property name, `.`-separated for structured properties
    pub property: String,
    /// Comparison operator
    pub op: FilterOp,
    /// Operand
    pub value: Value,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Smallest first
    Ascending,
    /// Largest first
    Descending,
}

impl Direction {
    /// Short lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }
}

/// One sort order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyOrder {
    /// Property name
    pub property: String,
    /// Direction
    pub direction: Direction,
}

/// Datastore query
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Query {
    /// Kind to query; `None` for kindless (ancestor-only) queries
    pub kind: Option<String>,
    /// Conjunction of property filters
    pub filters: Vec<PropertyFilter>,
    /// Sort orders, most significant first
    pub orders: Vec<PropertyOrder>,
    /// Ancestor constraint
    pub ancestor: Option<Key>,
    /// Projected property names; empty means full entities
    pub projection: Vec<String>,
    /// Number of leading results to skip
    pub offset: usize,
    /// Maximum number of results
    pub limit: Option<usize>,
    /// Return keys only
    pub keys_only: bool,
}

impl Query {
    /// Create a query on one kind
    pub fn new(kind: impl Into<String>) -> Self {
        Query {
            kind: Some(kind.into()),
            ..Default::default()
        }
    }

    /// Create a kindless query; needs an ancestor to be runnable
    pub fn kindless() -> Self {
        Query::default()
    }

    /// Add a filter
    pub fn filter(
        mut self,
        property: impl Into<String>,
        op: FilterOp,
        value: impl Into<Value>,
    ) -> Self {
        self.filters.push(PropertyFilter {
            property: property.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Add a sort order
    pub fn order(mut self, property: impl Into<String>, direction: Direction) -> Self {
        self.orders.push(PropertyOrder {
            property: property.into(),
            direction,
        });
        self
    }

    /// Restrict results to descendants of `ancestor` (inclusive)
    pub fn ancestor(mut self, ancestor: Key) -> Self {
        self.ancestor = Some(ancestor);
        self
    }

    /// Project onto the given properties
    pub fn project<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = properties.into_iter().map(Into::into).collect();
        self
    }

    /// Skip the first `offset` results
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Return at most `limit` results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Return keys only
    pub fn keys_only(mut self) -> Self {
        self.keys_only = true;
        self
    }

    /// Whether the query targets a pseudo-kind
    pub fn is_pseudo(&self) -> bool {
        self.kind.as_deref().map(is_pseudo_kind).unwrap_or(false)
    }

    /// Filters on one property
    pub fn filters_on<'a>(&'a self, property: &'a str) -> impl Iterator<Item = &'a PropertyFilter> {
        self.filters.iter().filter(move |f| f.property == property)
    }
}
