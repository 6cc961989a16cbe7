//! Introspection pseudo-kinds
//!
//! Queries on `__kind__`, `__namespace__` and `__property__` never reach the
//! storage engine; their results are synthesized from the schema tracker.
//!
//! - `__kind__`: one key-only entity per kind, keyed `__kind__:"<kind>"`
//! - `__namespace__`: a single entity for the default namespace, keyed
//!   `__namespace__:1`
//! - `__property__`: one entity per property, keyed
//!   `__kind__:"<kind>"/__property__:"<property>"`, holding the stored type
//!   tag in `property_representation`; an `__kind__` ancestor restricts the
//!   results to that kind
//!
//! Results come in key order. `__key__` filters and orders apply to the
//! synthesized keys; filters, orders and projections on anything else are
//! rejected.

use std::cmp::Ordering;
use std::collections::VecDeque;

use dsbridge_core::{
    Direction, Entity, Error, FilterOp, Identifier, Key, Limits, Query, Result, Value,
    KEY_PROPERTY,
};

use crate::query::cursor::EntityCursor;
use crate::schema::SchemaTracker;

/// Pseudo-kind listing kinds
pub const KIND_KIND: &str = "__kind__";

/// Pseudo-kind listing namespaces
pub const NAMESPACE_KIND: &str = "__namespace__";

/// Pseudo-kind listing properties
pub const PROPERTY_KIND: &str = "__property__";

/// Property holding a property's type tags
pub const PROPERTY_REPRESENTATION: &str = "property_representation";

/// Cursor over synthesized introspection entities
#[derive(Debug)]
pub struct PseudoKindCursor {
    entities: VecDeque<Entity>,
    offset: usize,
    limits: Limits,
    skipped: Option<usize>,
}

impl PseudoKindCursor {
    /// Build the results of a pseudo-kind query
    pub fn new(query: &Query, schema: &SchemaTracker, limits: Limits) -> Result<Self> {
        let kind = query.kind.as_deref().unwrap_or_default();
        let mut entities: VecDeque<Entity> = match kind {
            KIND_KIND => schema
                .get_kinds()
                .into_iter()
                .map(|k| Entity::new(Key::new(KIND_KIND, k)))
                .collect(),
            NAMESPACE_KIND => VecDeque::from(vec![Entity::new(Key::new(NAMESPACE_KIND, 1))]),
            PROPERTY_KIND => properties(query, schema)?,
            other => return Err(Error::UnsupportedPseudoKind(other.to_string())),
        };
        restrict(&mut entities, query, kind)?;
        if let Some(limit) = query.limit {
            entities.truncate(query.offset.saturating_add(limit));
        }
        Ok(PseudoKindCursor {
            entities,
            offset: query.offset,
            limits,
            skipped: None,
        })
    }
}

fn key_operand<'a>(value: &'a Value, kind: &str) -> Result<&'a Key> {
    match value {
        Value::Key(key) => Ok(key),
        other => Err(Error::bad_request(format!(
            "{} __key__ filter value must be a key, got {}",
            kind,
            other.type_name()
        ))),
    }
}

fn satisfies(ordering: Ordering, op: FilterOp) -> bool {
    match op {
        FilterOp::Equal => ordering == Ordering::Equal,
        FilterOp::LessThan => ordering == Ordering::Less,
        FilterOp::LessThanOrEqual => ordering != Ordering::Greater,
        FilterOp::GreaterThan => ordering == Ordering::Greater,
        FilterOp::GreaterThanOrEqual => ordering != Ordering::Less,
    }
}

/// Apply `__key__` filters and the leading `__key__` order
fn restrict(entities: &mut VecDeque<Entity>, query: &Query, kind: &str) -> Result<()> {
    if !query.projection.is_empty() {
        return Err(Error::bad_request(format!("{} queries cannot project", kind)));
    }
    let mut bounds = Vec::with_capacity(query.filters.len());
    for filter in &query.filters {
        if filter.property != KEY_PROPERTY {
            return Err(Error::bad_request(format!(
                "{} queries only filter on __key__",
                kind
            )));
        }
        bounds.push((filter.op, key_operand(&filter.value, kind)?));
    }
    if query.orders.iter().any(|o| o.property != KEY_PROPERTY) {
        return Err(Error::bad_request(format!(
            "{} queries only order on __key__",
            kind
        )));
    }

    entities.retain(|entity| {
        bounds
            .iter()
            .all(|(op, operand)| satisfies(entity.key().cmp(*operand), *op))
    });
    entities
        .make_contiguous()
        .sort_by(|a, b| a.key().cmp(b.key()));
    if let Some(order) = query.orders.first() {
        if order.direction == Direction::Descending {
            entities.make_contiguous().reverse();
        }
    }
    Ok(())
}

fn properties(query: &Query, schema: &SchemaTracker) -> Result<VecDeque<Entity>> {
    let only_kind = match &query.ancestor {
        None => None,
        Some(ancestor) => match (ancestor.kind(), ancestor.id()) {
            (KIND_KIND, Identifier::Name(kind)) if ancestor.depth() == 1 => Some(kind.clone()),
            _ => {
                return Err(Error::bad_request(
                    "__property__ queries only accept a __kind__ ancestor",
                ))
            }
        },
    };

    let mut out = VecDeque::new();
    for kind in schema.get_kinds() {
        if only_kind.as_deref().map(|k| k != kind).unwrap_or(false) {
            continue;
        }
        let Some(record) = schema.get(&kind) else {
            continue;
        };
        let kind_key = Key::new(KIND_KIND, kind.clone());
        for (property, tag) in &record.properties {
            let mut entity = Entity::new(kind_key.child(PROPERTY_KIND, property.clone()));
            if !query.keys_only {
                entity.set(
                    PROPERTY_REPRESENTATION,
                    Value::List(vec![Value::string(tag)]),
                );
            }
            out.push_back(entity);
        }
    }
    Ok(out)
}

impl EntityCursor for PseudoKindCursor {
    fn next_item(&mut self) -> Result<Option<Entity>> {
        self.skipped_results()?;
        Ok(self.entities.pop_front())
    }

    fn skipped_results(&mut self) -> Result<usize> {
        if let Some(skipped) = self.skipped {
            return Ok(skipped);
        }
        let discarded = self.offset.min(self.entities.len());
        self.entities.drain(..discarded);
        let reported = self.limits.reported_skip(discarded);
        self.skipped = Some(reported);
        Ok(reported)
    }
}
