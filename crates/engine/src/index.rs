//! Composite index policy
//!
//! The engine consults an [`IndexPolicy`] once per query, before translating
//! it. [`AllowAll`] never objects. [`CompositeIndexPolicy`] derives the
//! composite index a query needs and fails with `MissingRequiredIndex` when
//! no registered definition covers it.
//!
//! ## Derivation
//!
//! Properties of a required index, in order:
//! 1. equality-filtered properties (any order)
//! 2. the inequality-filtered property, unless it is also the first sort order
//! 3. sort orders
//!
//! No composite index is needed for kindless queries, queries with neither
//! inequality filters nor sort orders, and queries touching a single property
//! with no equality filters and no ancestor.

use parking_lot::RwLock;
use tracing::debug;

use dsbridge_core::{Direction, Error, IndexDefinition, Query, Result, KEY_PROPERTY};

/// Pass/fail gate consulted before a query runs
pub trait IndexPolicy: Send + Sync {
    /// Fail with `MissingRequiredIndex` if the query cannot run
    fn check(&self, query: &Query) -> Result<()>;

    /// Record a composite index as available
    fn register(&self, index: IndexDefinition);
}

/// Policy that lets every query run
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl IndexPolicy for AllowAll {
    fn check(&self, _query: &Query) -> Result<()> {
        Ok(())
    }

    fn register(&self, _index: IndexDefinition) {}
}

/// Composite index required by `query`, with the number of leading
/// equality properties whose order does not matter
pub fn required_index(query: &Query) -> Option<(IndexDefinition, usize)> {
    let kind = query.kind.as_ref()?;

    let mut equality: Vec<&str> = Vec::new();
    let mut inequality: Option<&str> = None;
    for filter in &query.filters {
        if filter.op.is_inequality() {
            inequality.get_or_insert(filter.property.as_str());
        } else if !equality.contains(&filter.property.as_str()) {
            equality.push(filter.property.as_str());
        }
    }

    if inequality.is_none() && query.orders.is_empty() {
        return None;
    }

    let mut touched: Vec<&str> = equality.clone();
    touched.extend(inequality);
    touched.extend(query.orders.iter().map(|o| o.property.as_str()));
    touched.sort_unstable();
    touched.dedup();
    if touched.iter().all(|p| *p == KEY_PROPERTY) {
        return None;
    }
    if touched.len() == 1 && equality.is_empty() && query.ancestor.is_none() {
        return None;
    }

    let mut index = IndexDefinition::new(kind.clone());
    if query.ancestor.is_some() {
        index = index.with_ancestor();
    }
    for property in &equality {
        index = index.property(*property, Direction::Ascending);
    }
    if let Some(property) = inequality {
        let leads_orders = query
            .orders
            .first()
            .map(|o| o.property == property)
            .unwrap_or(false);
        if !leads_orders {
            index = index.property(property, Direction::Ascending);
        }
    }
    for order in &query.orders {
        if !equality.contains(&order.property.as_str()) {
            index = index.property(order.property.clone(), order.direction);
        }
    }
    Some((index, equality.len()))
}

fn covers(available: &IndexDefinition, required: &IndexDefinition, equality: usize) -> bool {
    if available.kind != required.kind
        || available.ancestor != required.ancestor
        || available.properties.len() != required.properties.len()
    {
        return false;
    }
    let mut have: Vec<&(String, Direction)> = available.properties[..equality].iter().collect();
    let mut want: Vec<&(String, Direction)> = required.properties[..equality].iter().collect();
    have.sort_by(|a, b| a.0.cmp(&b.0));
    want.sort_by(|a, b| a.0.cmp(&b.0));
    have.iter().map(|p| &p.0).eq(want.iter().map(|p| &p.0))
        && available.properties[equality..] == required.properties[equality..]
}

/// Policy enforcing registered composite indexes
#[derive(Debug, Default)]
pub struct CompositeIndexPolicy {
    indexes: RwLock<Vec<IndexDefinition>>,
}

impl CompositeIndexPolicy {
    /// Create a policy with no registered indexes
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered definitions
    pub fn indexes(&self) -> Vec<IndexDefinition> {
        self.indexes.read().clone()
    }
}

impl IndexPolicy for CompositeIndexPolicy {
    fn check(&self, query: &Query) -> Result<()> {
        let Some((required, equality)) = required_index(query) else {
            return Ok(());
        };
        if self
            .indexes
            .read()
            .iter()
            .any(|available| covers(available, &required, equality))
        {
            return Ok(());
        }
        debug!(target: "dsbridge::index", index = %required, "Missing composite index");
        Err(Error::MissingRequiredIndex {
            kind: required.kind.clone(),
            index: required,
        })
    }

    fn register(&self, index: IndexDefinition) {
        let mut indexes = self.indexes.write();
        if !indexes.contains(&index) {
            debug!(target: "dsbridge::index", index = %index, "Registered composite index");
            indexes.push(index);
        }
    }
}
