//! Query translation
//!
//! Turns a datastore [`Query`] into a storage filter, sort specification and
//! projection, plus the bookkeeping the result cursor needs to reproduce
//! datastore semantics on top of plain finds.
//!
//! ## Rules
//!
//! - every filter becomes its own conjunct, so several filters on one
//!   property all apply
//! - `__key__` filters and orders address `_id` with the flat key encoding
//! - an ancestor selects documents whose `__path__` holds every ancestor
//!   token at the same position
//! - every sort order also requires the property to exist and to hold an
//!   orderable type
//! - `_id` ascending always ends the sort so results are deterministic
//! - a projection also requires every projected property to exist
//! - an ancestor query scans the ancestor's collection; a kind query without
//!   an ancestor scans every stored entity collection plus the kind's own,
//!   since descendants live in the collection of their root kind

use std::collections::BTreeSet;

use dsbridge_core::{
    Direction, Error, FilterOp, Query, Result, Value, KEY_PROPERTY,
};
use dsbridge_storage::{Condition, Filter, FindOptions, JsonValue, SortSpec, ID_FIELD};

use crate::codec::value::{encode as encode_value, TAG_FIELD};
use crate::codec::{
    collection_for_kind, collection_of, encode_field_name, encode_for_storage, encode_path,
    unorderable_tags, KIND_FIELD, PATH_FIELD,
};

/// Storage-level form of a query
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedQuery {
    /// Queried kind, `None` for kindless queries
    pub kind: Option<String>,
    /// Collections to scan, merged in sort order
    pub collections: Vec<String>,
    /// Storage filter
    pub filter: Filter,
    /// Find modifiers (sort, projection, native limit)
    pub options: FindOptions,
    /// Projected property names, as requested
    pub projection: Vec<String>,
    /// Return keys only
    pub keys_only: bool,
    /// Number of results to skip
    pub offset: usize,
    /// Maximum number of results
    pub limit: Option<usize>,
    /// Filter conditions per property, as `(property, stored field, conditions)`
    pub property_conditions: Vec<(String, String, Vec<Condition>)>,
}

impl TranslatedQuery {
    /// Conditions declared on one property
    pub fn conditions_on(&self, property: &str) -> Option<(&str, &[Condition])> {
        self.property_conditions
            .iter()
            .find(|(name, _, _)| name == property)
            .map(|(_, field, conditions)| (field.as_str(), conditions.as_slice()))
    }
}

fn condition(op: FilterOp, operand: JsonValue) -> Condition {
    match op {
        FilterOp::Equal => Condition::Eq(operand),
        FilterOp::LessThan => Condition::Lt(operand),
        FilterOp::LessThanOrEqual => Condition::Lte(operand),
        FilterOp::GreaterThan => Condition::Gt(operand),
        FilterOp::GreaterThanOrEqual => Condition::Gte(operand),
    }
}

fn key_operand(value: &Value) -> Result<JsonValue> {
    match value {
        Value::Key(key) => {
            key.validate()?;
            Ok(JsonValue::from(encode_for_storage(key)?))
        }
        other => Err(Error::bad_request(format!(
            "__key__ filter value must be a key, got {}",
            other.type_name()
        ))),
    }
}

fn validate_kindless(query: &Query) -> Result<()> {
    if query.ancestor.is_none() {
        return Err(Error::bad_request("kindless queries require an ancestor"));
    }
    let non_key_filter = query.filters.iter().any(|f| f.property != KEY_PROPERTY);
    let non_key_order = query.orders.iter().any(|o| o.property != KEY_PROPERTY);
    if non_key_filter || non_key_order {
        return Err(Error::bad_request(
            "kindless queries only filter and order on __key__",
        ));
    }
    if !query.projection.is_empty() {
        return Err(Error::bad_request("kindless queries cannot project"));
    }
    Ok(())
}

/// Translate a query for the document store
///
/// `stored` names the entity collections present in storage.
pub fn translate(query: &Query, stored: &[String]) -> Result<TranslatedQuery> {
    if query.kind.is_none() {
        validate_kindless(query)?;
    }
    if query.projection.iter().any(|p| p == KEY_PROPERTY) {
        return Err(Error::bad_request("__key__ cannot be projected"));
    }
    if query.keys_only && !query.projection.is_empty() {
        return Err(Error::bad_request("keys-only queries cannot project"));
    }

    let mut parts: Vec<Filter> = Vec::new();
    if let Some(kind) = &query.kind {
        parts.push(Filter::eq(KIND_FIELD, kind.clone()));
    }

    if let Some(ancestor) = &query.ancestor {
        ancestor.validate()?;
        let tokens = encode_path(ancestor)?;
        parts.push(Filter::field(
            PATH_FIELD,
            Condition::All(tokens.iter().cloned().map(JsonValue::from).collect()),
        ));
        for (position, token) in tokens.into_iter().enumerate() {
            parts.push(Filter::eq(format!("{}.{}", PATH_FIELD, position), token));
        }
    }

    let mut property_conditions: Vec<(String, String, Vec<Condition>)> = Vec::new();
    for filter in &query.filters {
        if filter.property == KEY_PROPERTY {
            let cond = condition(filter.op, key_operand(&filter.value)?);
            parts.push(Filter::field(ID_FIELD, cond));
            continue;
        }
        if filter.value.is_list() {
            return Err(Error::bad_request(format!(
                "filter on '{}' cannot compare against a list",
                filter.property
            )));
        }
        let field = encode_field_name(&filter.property);
        let cond = condition(filter.op, encode_value(&filter.value)?);
        parts.push(Filter::field(field.clone(), cond.clone()));
        match property_conditions
            .iter_mut()
            .find(|(name, _, _)| *name == filter.property)
        {
            Some((_, _, conditions)) => conditions.push(cond),
            None => property_conditions.push((filter.property.clone(), field, vec![cond])),
        }
    }

    let mut sort: SortSpec = Vec::new();
    for order in &query.orders {
        if order.property == KEY_PROPERTY {
            sort.push((ID_FIELD.to_string(), order.direction));
            continue;
        }
        let field = encode_field_name(&order.property);
        sort.push((field.clone(), order.direction));
        parts.push(Filter::field(field.clone(), Condition::Exists(true)));
        parts.push(Filter::field(
            format!("{}.{}", field, TAG_FIELD),
            Condition::Nin(unorderable_tags()),
        ));
    }
    if !sort.iter().any(|(field, _)| field == ID_FIELD) {
        sort.push((ID_FIELD.to_string(), Direction::Ascending));
    }

    let mut options = FindOptions::new();
    options.sort = sort;
    if query.keys_only {
        options.projection = Some(vec![PATH_FIELD.to_string()]);
    } else if !query.projection.is_empty() {
        let mut fields: Vec<String> = Vec::new();
        for property in &query.projection {
            let field = encode_field_name(property);
            if !fields.contains(&field) {
                parts.push(Filter::field(field.clone(), Condition::Exists(true)));
                fields.push(field);
            }
        }
        fields.push(PATH_FIELD.to_string());
        options.projection = Some(fields);
    }
    if query.projection.is_empty() {
        if let Some(limit) = query.limit {
            options.limit = Some(query.offset.saturating_add(limit));
        }
    }

    let collections = match (&query.ancestor, &query.kind) {
        (Some(ancestor), _) => vec![collection_of(ancestor)],
        (None, Some(kind)) => {
            let mut set: BTreeSet<String> = stored.iter().cloned().collect();
            set.insert(collection_for_kind(kind));
            set.into_iter().collect()
        }
        (None, None) => Vec::new(),
    };

    Ok(TranslatedQuery {
        kind: query.kind.clone(),
        collections,
        filter: parts.into_iter().fold(Filter::all(), Filter::and),
        options,
        projection: query.projection.clone(),
        keys_only: query.keys_only,
        offset: query.offset,
        limit: query.limit,
        property_conditions,
    })
}
